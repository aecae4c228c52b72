//! Inserts signal records into a Supabase table through its REST interface.

use serde::Deserialize;
use serde_json::Value;
use sigflow_sdk::prelude::*;

use super::build_signal_records;
use crate::http::{build_client, default_timeout_secs, send_json, trim_base};

pub const MODULE: &str = "sigflow_plugins::load::supabase";

fn default_table() -> String {
    "financial_signals".to_string()
}

#[derive(Clone, Deserialize)]
pub struct Config {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

pub struct SupabaseLoader {
    client: reqwest::Client,
    endpoint: String,
    key: String,
}

impl Component for SupabaseLoader {
    type Config = Config;
    const CLASS: &'static str = "SupabaseLoader";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if config.url.trim().is_empty() || config.key.trim().is_empty() {
            return Err(ComponentError::config(
                "MISSING_CREDENTIALS",
                "SupabaseLoader requires non-empty 'url' and 'key'",
            ));
        }
        if config.table.trim().is_empty() {
            return Err(ComponentError::config(
                "MISSING_TABLE",
                "SupabaseLoader: table must not be empty",
            ));
        }
        let client = build_client(Self::CLASS, config.timeout_secs)?;
        let endpoint = format!("{}/rest/v1/{}", trim_base(&config.url), config.table);
        tracing::debug!(table = config.table, "Supabase loader ready");
        Ok(Self {
            client,
            endpoint,
            key: config.key,
        })
    }
}

#[async_trait]
impl Loader for SupabaseLoader {
    async fn load(&mut self, data: &NormalizedData) -> Result<LoadResult, ComponentError> {
        let records = build_signal_records(Self::CLASS, data)?;
        if records.is_empty() {
            return Err(ComponentError::data(
                "EMPTY_DATA",
                "SupabaseLoader: no records to insert",
            ));
        }
        let count = records.len();
        let body: Vec<Value> = records.into_iter().map(Value::Object).collect();

        let request = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=representation")
            .json(&body);
        let inserted = send_json(Self::CLASS, request).await?;

        let returned = match &inserted {
            Value::Array(rows) => rows.len(),
            Value::Object(_) => 1,
            _ => 0,
        };
        if returned == 0 {
            return Err(ComponentError::data(
                "EMPTY_RESPONSE",
                format!("SupabaseLoader: insert returned no rows: {inserted}"),
            ));
        }

        tracing::info!(records = count, "Inserted into Supabase");
        Ok(LoadResult::written(returned as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn loader(url: String) -> SupabaseLoader {
        SupabaseLoader::init(Config {
            url,
            key: "service-key".into(),
            table: default_table(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_record_with_auth_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/financial_signals"))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=representation"))
            .and(body_partial_json(json!([
                {"signal_name": "fear_and_greed", "value": 45, "units": "index"}
            ])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let result = loader(server.uri())
            .load(&json!({"signal_name": "fear_and_greed", "value": 45, "units": "index"}))
            .await
            .unwrap();
        assert_eq!(result.records_written, 1);
    }

    #[tokio::test]
    async fn empty_response_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = loader(server.uri())
            .load(&json!({"signal_name": "m2", "value": 1.0}))
            .await
            .unwrap_err();
        assert_eq!(err.code, "EMPTY_RESPONSE");
    }

    #[tokio::test]
    async fn rejected_key_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = loader(server.uri())
            .load(&json!({"signal_name": "m2", "value": 1.0}))
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Auth);
    }

    #[tokio::test]
    async fn record_without_value_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": 1}])))
            .expect(0)
            .mount(&server)
            .await;

        let err = loader(server.uri())
            .load(&json!({"signal_name": "m2"}))
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::Data);
    }

    #[test]
    fn empty_key_rejected() {
        let Err(err) = SupabaseLoader::init(Config {
            url: "https://xyz.supabase.co".into(),
            key: String::new(),
            table: default_table(),
            timeout_secs: 5,
        }) else {
            panic!("empty key should be rejected");
        };
        assert_eq!(err.category, ErrorCategory::Config);
    }
}
