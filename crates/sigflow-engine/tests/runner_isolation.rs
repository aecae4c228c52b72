//! Per-signal and per-loader failure isolation, driven by scripted components.

mod common;

use common::{loader, params, Scripted};
use indexmap::IndexMap;
use serde_json::json;
use sigflow_engine::{
    run_signals, ComponentSpec, Environment, ErrorKind, ExecutionOptions, OutcomeStatus,
    SignalDefinition, Stage,
};

fn signal(name: &str, extractor: ComponentSpec, loaders: Vec<ComponentSpec>) -> SignalDefinition {
    SignalDefinition {
        name: name.into(),
        extractor,
        transformer: None,
        loaders,
        secrets: Vec::new(),
        secret_mapping: IndexMap::new(),
    }
}

fn scripted_extractor(fail: bool) -> ComponentSpec {
    ComponentSpec::alias("scripted_extractor").with_params(params(json!({"fail": fail})))
}

async fn run_one(scripted: &Scripted, signal: SignalDefinition) -> sigflow_engine::RunOutcome {
    let report = run_signals(
        &[signal],
        &scripted.catalog,
        &Environment::default(),
        &ExecutionOptions::default(),
    )
    .await;
    report.outcomes.into_iter().next().unwrap()
}

#[tokio::test]
async fn zero_loaders_is_success_with_warning() {
    let scripted = Scripted::new();
    let outcome = run_one(&scripted, signal("lonely", scripted_extractor(false), vec![])).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert_eq!(outcome.stage_reached, Stage::Load);
    assert_eq!(outcome.records_processed, Some(1));
    assert!(outcome.warnings.iter().any(|w| w.contains("no loaders")));
}

#[tokio::test]
async fn extractor_failure_stops_before_transform_and_load() {
    let scripted = Scripted::new();
    let mut sig = signal("broken_source", scripted_extractor(true), vec![loader("sink", false)]);
    sig.transformer = Some(ComponentSpec::alias("scripted_transformer"));

    let outcome = run_one(&scripted, sig).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.stage_reached, Stage::Extract);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Extract);
    assert_eq!(error.category, Some(sigflow_sdk::errors::ErrorCategory::Network));
    assert!(outcome.loaders.is_empty());
    assert_eq!(outcome.records_processed, None);
    // close still runs after a failed fetch
    assert_eq!(scripted.events(), ["fetch", "close"]);
}

#[tokio::test]
async fn close_failure_is_only_a_warning() {
    let scripted = Scripted::new();
    let extractor =
        ComponentSpec::alias("scripted_extractor").with_params(params(json!({"close_fails": true})));
    let outcome = run_one(&scripted, signal("sticky", extractor, vec![loader("sink", false)])).await;

    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert!(outcome.warnings.iter().any(|w| w.contains("close failed")));
}

#[tokio::test]
async fn some_loaders_failing_is_partial_and_all_are_attempted() {
    let scripted = Scripted::new();
    let loaders = vec![loader("first", false), loader("second", true), loader("third", false)];
    let outcome = run_one(&scripted, signal("mixed", scripted_extractor(false), loaders)).await;

    assert_eq!(outcome.status, OutcomeStatus::Partial);
    assert_eq!(outcome.stage_reached, Stage::Load);
    assert_eq!(
        scripted.events(),
        ["fetch", "close", "load:first", "load:second", "load:third"]
    );
    let message = outcome.error.unwrap().message;
    assert!(message.contains("second cannot write"), "{message}");
    assert!(!message.contains("first") && !message.contains("third"), "{message}");
    assert_eq!(outcome.loaders.iter().filter(|l| l.succeeded()).count(), 2);
}

#[tokio::test]
async fn all_loaders_failing_is_failed_at_load() {
    let scripted = Scripted::new();
    let loaders = vec![loader("a", true), loader("b", true)];
    let outcome = run_one(&scripted, signal("doomed", scripted_extractor(false), loaders)).await;

    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.stage_reached, Stage::Load);
    assert_eq!(outcome.error.unwrap().kind, ErrorKind::Load);
    assert_eq!(outcome.loaders.len(), 2);
}

#[tokio::test]
async fn loader_resolution_failure_is_isolated_to_that_loader() {
    let scripted = Scripted::new();
    let loaders = vec![ComponentSpec::alias("no_such_loader"), loader("good", false)];
    let outcome = run_one(&scripted, signal("half", scripted_extractor(false), loaders)).await;

    assert_eq!(outcome.status, OutcomeStatus::Partial);
    let bad = &outcome.loaders[0];
    assert_eq!(bad.loader, "no_such_loader");
    assert_eq!(bad.error.as_ref().unwrap().kind, ErrorKind::UnknownAlias);
    assert!(outcome.loaders[1].succeeded());
}

#[tokio::test]
async fn transformer_resolution_failure_fails_at_transform() {
    let scripted = Scripted::new();
    let mut sig = signal("picky", scripted_extractor(false), vec![loader("sink", false)]);
    sig.transformer =
        Some(ComponentSpec::alias("scripted_transformer").with_params(params(json!({"reject": true}))));

    let outcome = run_one(&scripted, sig).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.stage_reached, Stage::Transform);
    assert_eq!(outcome.error.unwrap().kind, ErrorKind::ComponentInit);
    assert!(!scripted.events().iter().any(|e| e.starts_with("load")));
}

#[tokio::test]
async fn transform_failure_fails_at_transform() {
    let scripted = Scripted::new();
    let mut sig = signal("garbled", scripted_extractor(false), vec![loader("sink", false)]);
    sig.transformer =
        Some(ComponentSpec::alias("scripted_transformer").with_params(params(json!({"fail": true}))));

    let outcome = run_one(&scripted, sig).await;
    assert_eq!(outcome.stage_reached, Stage::Transform);
    assert_eq!(outcome.error.unwrap().kind, ErrorKind::Transform);
}

#[tokio::test]
async fn failing_signal_does_not_stop_the_batch() {
    let scripted = Scripted::new();
    let signals = vec![
        signal("one", scripted_extractor(false), vec![loader("l1", false)]),
        signal("two", scripted_extractor(true), vec![loader("l2", false)]),
        signal("three", scripted_extractor(false), vec![loader("l3", false)]),
    ];
    let report = run_signals(
        &signals,
        &scripted.catalog,
        &Environment::default(),
        &ExecutionOptions::default(),
    )
    .await;

    let names: Vec<_> = report.outcomes.iter().map(|o| o.signal_name.as_str()).collect();
    assert_eq!(names, ["one", "two", "three"]);
    let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        [OutcomeStatus::Success, OutcomeStatus::Failed, OutcomeStatus::Success]
    );
    assert!(scripted.events().contains(&"load:l3".to_string()));
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn two_missing_secrets_reported_in_one_error() {
    let scripted = Scripted::new();
    let mut sig = signal("secretive", scripted_extractor(false), vec![loader("sink", false)]);
    sig.secrets = vec!["SUPABASE_URL".into(), "SUPABASE_KEY".into()];

    let outcome = run_one(&scripted, sig).await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.stage_reached, Stage::Extract);
    let error = outcome.error.unwrap();
    assert_eq!(error.kind, ErrorKind::MissingSecret);
    assert!(error.message.contains("SUPABASE_URL, SUPABASE_KEY"), "{}", error.message);
    assert!(scripted.events().is_empty());
}

#[tokio::test]
async fn signal_name_is_stamped_before_load() {
    let scripted = Scripted::new();
    let mut sig = signal("fear_and_greed", scripted_extractor(false), vec![loader("sink", false)]);
    sig.transformer = Some(ComponentSpec::alias("scripted_transformer"));

    run_one(&scripted, sig).await;
    let received = scripted.received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![json!({"value": 1, "transformed": true, "signal_name": "fear_and_greed"})]
    );
}

#[tokio::test]
async fn dry_run_skips_loaders_and_keeps_preview() {
    let scripted = Scripted::new();
    let sig = signal("preview", scripted_extractor(false), vec![loader("sink", false)]);
    let report = run_signals(
        &[sig],
        &scripted.catalog,
        &Environment::default(),
        &ExecutionOptions { dry_run: true },
    )
    .await;

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Success);
    assert!(outcome.loaders.is_empty());
    assert_eq!(outcome.preview, Some(json!({"value": 1, "signal_name": "preview"})));
    assert!(outcome.warnings.iter().any(|w| w.contains("dry run")));
    assert!(report.dry_run);
    assert!(!scripted.events().iter().any(|e| e.starts_with("load")));
}

#[tokio::test]
async fn array_payload_counts_records() {
    let scripted = Scripted::new();
    let extractor = ComponentSpec::alias("scripted_extractor")
        .with_params(params(json!({"payload": [{"value": 1}, {"value": 2}, {"value": 3}]})));
    let outcome = run_one(&scripted, signal("many", extractor, vec![loader("sink", false)])).await;

    assert_eq!(outcome.records_processed, Some(3));
    assert_eq!(outcome.loaders[0].records_written, Some(3));
}

#[tokio::test]
async fn panicking_extractor_fails_only_its_signal() {
    let scripted = Scripted::new();
    let panicking =
        ComponentSpec::alias("scripted_extractor").with_params(params(json!({"panics": true})));
    let signals = vec![
        signal("first", panicking, vec![loader("l1", false)]),
        signal("second", scripted_extractor(false), vec![loader("l2", false)]),
    ];
    let report = run_signals(
        &signals,
        &scripted.catalog,
        &Environment::default(),
        &ExecutionOptions::default(),
    )
    .await;

    assert_eq!(report.outcomes.len(), 2);
    let first = &report.outcomes[0];
    assert_eq!(first.status, OutcomeStatus::Failed);
    assert_eq!(first.stage_reached, Stage::Extract);
    let error = first.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Panicked);
    assert_eq!(error.category, Some(sigflow_sdk::errors::ErrorCategory::Internal));
    assert!(error.message.starts_with("scripted_extractor panicked"), "{}", error.message);

    assert_eq!(report.outcomes[1].status, OutcomeStatus::Success);
    assert!(scripted.events().contains(&"load:l2".to_string()));
    assert!(!scripted.events().contains(&"load:l1".to_string()));
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn panicking_loader_fails_only_itself() {
    let scripted = Scripted::new();
    let panicking = ComponentSpec::alias("scripted_loader")
        .with_params(params(json!({"name": "pooled", "panics": true})));
    let loaders = vec![panicking, loader("after", false)];
    let outcome = run_one(&scripted, signal("shaky", scripted_extractor(false), loaders)).await;

    assert_eq!(outcome.status, OutcomeStatus::Partial);
    let bad = outcome.loaders[0].error.as_ref().unwrap();
    assert_eq!(bad.kind, ErrorKind::Panicked);
    assert!(bad.message.contains("pooled lost its connection pool"), "{}", bad.message);
    assert!(outcome.loaders[1].succeeded());
    assert_eq!(scripted.events(), ["fetch", "close", "load:pooled", "load:after"]);
}
