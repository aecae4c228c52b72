//! Scripted components shared by the engine integration tests.
//!
//! Every scripted component appends to a shared event log so tests can assert which
//! stages ran and in what order.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use sigflow_engine::{ComponentCatalog, ComponentSpec};
use sigflow_sdk::errors::ComponentError;
use sigflow_sdk::export::{ClassExport, Constructor, ModuleExport};
use sigflow_sdk::{Extractor, LoadResult, Loader, Params, Transformer};

pub const SCRIPTED_MODULE: &str = "tests::scripted";

pub type Events = Arc<Mutex<Vec<String>>>;

pub fn fixture(relative: &str) -> PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
        .join(relative)
}

pub fn params(value: Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}

pub fn events(log: &Events) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn flag(params: &Params, key: &str) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(false)
}

struct ScriptedExtractor {
    events: Events,
    payload: Value,
    fail: bool,
    panics: bool,
    close_fails: bool,
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn fetch(&mut self) -> Result<Value, ComponentError> {
        self.events.lock().unwrap().push("fetch".into());
        if self.panics {
            let readings: Vec<Value> = Vec::new();
            return Ok(readings[3].clone());
        }
        if self.fail {
            return Err(ComponentError::network("UPSTREAM_DOWN", "scripted source unavailable"));
        }
        Ok(self.payload.clone())
    }

    async fn close(&mut self) -> Result<(), ComponentError> {
        self.events.lock().unwrap().push("close".into());
        if self.close_fails {
            return Err(ComponentError::internal("CLOSE_FAILED", "scripted close failed"));
        }
        Ok(())
    }
}

struct ScriptedTransformer {
    events: Events,
    fail: bool,
}

impl Transformer for ScriptedTransformer {
    fn transform(&self, raw: Value) -> Result<Value, ComponentError> {
        self.events.lock().unwrap().push("transform".into());
        if self.fail {
            return Err(ComponentError::data("BAD_SHAPE", "scripted transformer cannot handle input"));
        }
        let mut out = raw;
        if let Value::Object(fields) = &mut out {
            fields.insert("transformed".into(), Value::Bool(true));
        }
        Ok(out)
    }
}

struct ScriptedLoader {
    events: Events,
    name: String,
    fail: bool,
    panics: bool,
    received: Arc<Mutex<Vec<Value>>>,
}

#[async_trait]
impl Loader for ScriptedLoader {
    async fn load(&mut self, data: &Value) -> Result<LoadResult, ComponentError> {
        self.events.lock().unwrap().push(format!("load:{}", self.name));
        if self.panics {
            panic!("{} lost its connection pool", self.name);
        }
        self.received.lock().unwrap().push(data.clone());
        if self.fail {
            return Err(ComponentError::io("DISK_FULL", format!("{} cannot write", self.name)));
        }
        Ok(LoadResult::written(sigflow_sdk::record_count(data)))
    }
}

/// Catalog with the built-ins plus scripted classes under [`SCRIPTED_MODULE`].
pub struct Scripted {
    pub catalog: ComponentCatalog,
    pub events: Events,
    /// Merged parameters seen by `CaptureExtractor`, one entry per construction.
    pub captured: Arc<Mutex<Vec<Params>>>,
    /// Data handed to scripted loaders.
    pub received: Arc<Mutex<Vec<Value>>>,
}

impl Scripted {
    pub fn new() -> Self {
        let events: Events = Arc::default();
        let captured: Arc<Mutex<Vec<Params>>> = Arc::default();
        let received: Arc<Mutex<Vec<Value>>> = Arc::default();

        let extractor_events = events.clone();
        let capture_events = events.clone();
        let capture_log = captured.clone();
        let transformer_events = events.clone();
        let loader_events = events.clone();
        let loader_received = received.clone();

        let module = ModuleExport::new(SCRIPTED_MODULE)
            .class(
                ClassExport::from_constructor(
                    "ScriptedExtractor",
                    Constructor::Extractor(Arc::new(
                        move |params: Params| -> Result<Box<dyn Extractor>, ComponentError> {
                            Ok(Box::new(ScriptedExtractor {
                                events: extractor_events.clone(),
                                payload: params.get("payload").cloned().unwrap_or(json!({"value": 1})),
                                fail: flag(&params, "fail"),
                                panics: flag(&params, "panics"),
                                close_fails: flag(&params, "close_fails"),
                            }))
                        },
                    )),
                ),
            )
            .class(
                ClassExport::from_constructor(
                    "CaptureExtractor",
                    Constructor::Extractor(Arc::new(
                        move |params: Params| -> Result<Box<dyn Extractor>, ComponentError> {
                            capture_log.lock().unwrap().push(params.clone());
                            Ok(Box::new(ScriptedExtractor {
                                events: capture_events.clone(),
                                payload: Value::Object(params),
                                fail: false,
                                panics: false,
                                close_fails: false,
                            }))
                        },
                    )),
                )
                .with_defaults(params(json!({"origin": "default", "level": "default"}))),
            )
            .class(ClassExport::from_constructor(
                "ScriptedTransformer",
                Constructor::Transformer(Arc::new(
                    move |params: Params| -> Result<Box<dyn Transformer>, ComponentError> {
                        if flag(&params, "reject") {
                            return Err(ComponentError::config("REJECTED", "scripted transformer rejected params"));
                        }
                        Ok(Box::new(ScriptedTransformer {
                            events: transformer_events.clone(),
                            fail: flag(&params, "fail"),
                        }))
                    },
                )),
            ))
            .class(ClassExport::from_constructor(
                "ScriptedLoader",
                Constructor::Loader(Arc::new(
                    move |params: Params| -> Result<Box<dyn Loader>, ComponentError> {
                        Ok(Box::new(ScriptedLoader {
                            events: loader_events.clone(),
                            name: params
                                .get("name")
                                .and_then(Value::as_str)
                                .unwrap_or("scripted")
                                .to_string(),
                            fail: flag(&params, "fail"),
                            panics: flag(&params, "panics"),
                            received: loader_received.clone(),
                        }))
                    },
                )),
            ));

        let mut catalog = ComponentCatalog::with_builtins();
        catalog.register_module(module);
        catalog.register_alias("scripted_extractor", SCRIPTED_MODULE, "ScriptedExtractor");
        catalog.register_alias("capture_extractor", SCRIPTED_MODULE, "CaptureExtractor");
        catalog.register_alias("scripted_transformer", SCRIPTED_MODULE, "ScriptedTransformer");
        catalog.register_alias("scripted_loader", SCRIPTED_MODULE, "ScriptedLoader");

        Self {
            catalog,
            events,
            captured,
            received,
        }
    }

    pub fn events(&self) -> Vec<String> {
        events(&self.events)
    }
}

pub fn loader(name: &str, fail: bool) -> ComponentSpec {
    ComponentSpec::alias("scripted_loader").with_params(params(json!({"name": name, "fail": fail})))
}
