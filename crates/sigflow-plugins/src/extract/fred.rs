//! St. Louis Fed (FRED) series observations.

use std::path::PathBuf;

use serde::Deserialize;
use sigflow_sdk::prelude::*;

use crate::http::{build_client, default_timeout_secs, send_json, trim_base};

pub const MODULE: &str = "sigflow_plugins::extract::fred";

/// M2 money stock for the United States.
const DEFAULT_SERIES_ID: &str = "MANMM101XXM189S";

fn default_series_id() -> String {
    DEFAULT_SERIES_ID.to_string()
}

fn default_base_url() -> String {
    "https://api.stlouisfed.org".to_string()
}

#[derive(Clone, Deserialize)]
pub struct Config {
    pub api_key: String,
    #[serde(default = "default_series_id")]
    pub series_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

pub struct FredExtractor {
    client: reqwest::Client,
    config: Config,
}

impl Component for FredExtractor {
    type Config = Config;
    const CLASS: &'static str = "FredExtractor";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if config.api_key.trim().is_empty() {
            return Err(ComponentError::config(
                "MISSING_API_KEY",
                "FredExtractor: api_key must not be empty",
            ));
        }
        let client = build_client(Self::CLASS, config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Extractor for FredExtractor {
    async fn fetch(&mut self) -> Result<RawData, ComponentError> {
        let url = format!(
            "{}/fred/series/observations",
            trim_base(&self.config.base_url)
        );
        let request = self.client.get(&url).query(&[
            ("series_id", self.config.series_id.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("file_type", "json"),
        ]);
        let data = send_json(Self::CLASS, request).await?;

        let count = data
            .get("observations")
            .and_then(serde_json::Value::as_array)
            .map(Vec::len)
            .ok_or_else(|| {
                ComponentError::data(
                    "UNEXPECTED_SHAPE",
                    format!(
                        "FredExtractor: no 'observations' for series {}",
                        self.config.series_id
                    ),
                )
            })?;

        tracing::debug!(
            component = Self::CLASS,
            series = self.config.series_id,
            observations = count,
            "Fetched FRED observations"
        );
        if let Some(path) = &self.config.output_file {
            super::save_snapshot(Self::CLASS, path, &data).await;
        }
        Ok(data)
    }
}
