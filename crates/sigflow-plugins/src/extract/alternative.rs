//! Alternative.me crypto sentiment and global market endpoints.

use std::path::PathBuf;

use serde::Deserialize;
use sigflow_sdk::prelude::*;

use crate::http::{build_client, default_timeout_secs, send_json, trim_base};

pub const MODULE: &str = "sigflow_plugins::extract::alternative";

fn default_base_url() -> String {
    "https://api.alternative.me".to_string()
}

fn default_limit() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct FearGreedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of daily readings to request.
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

/// Fetches the Crypto Fear & Greed index.
pub struct AlternativeExtractor {
    client: reqwest::Client,
    config: FearGreedConfig,
}

impl Component for AlternativeExtractor {
    type Config = FearGreedConfig;
    const CLASS: &'static str = "AlternativeExtractor";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if config.limit == 0 {
            return Err(ComponentError::config(
                "INVALID_LIMIT",
                "AlternativeExtractor: limit must be at least 1",
            ));
        }
        let client = build_client(Self::CLASS, config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Extractor for AlternativeExtractor {
    async fn fetch(&mut self) -> Result<RawData, ComponentError> {
        let url = format!("{}/fng/", trim_base(&self.config.base_url));
        let request = self
            .client
            .get(&url)
            .query(&[("limit", self.config.limit.to_string())]);
        let data = send_json(Self::CLASS, request).await?;

        let readings = data.get("data").and_then(serde_json::Value::as_array);
        if readings.map_or(true, Vec::is_empty) {
            return Err(ComponentError::data(
                "UNEXPECTED_SHAPE",
                "AlternativeExtractor: response has no 'data' readings",
            ));
        }

        tracing::debug!(component = Self::CLASS, "Fetched Fear & Greed index");
        if let Some(path) = &self.config.output_file {
            super::save_snapshot(Self::CLASS, path, &data).await;
        }
        Ok(data)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

/// Fetches global crypto market data (total market cap, volume, dominance).
pub struct AlternativeGlobalExtractor {
    client: reqwest::Client,
    config: GlobalConfig,
}

impl Component for AlternativeGlobalExtractor {
    type Config = GlobalConfig;
    const CLASS: &'static str = "AlternativeGlobalExtractor";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        let client = build_client(Self::CLASS, config.timeout_secs)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Extractor for AlternativeGlobalExtractor {
    async fn fetch(&mut self) -> Result<RawData, ComponentError> {
        let url = format!("{}/v2/global/", trim_base(&self.config.base_url));
        let data = send_json(Self::CLASS, self.client.get(&url)).await?;

        if data.get("data").is_none() {
            return Err(ComponentError::data(
                "UNEXPECTED_SHAPE",
                format!("AlternativeGlobalExtractor: missing 'data' in response from {url}"),
            ));
        }

        if let Some(path) = &self.config.output_file {
            super::save_snapshot(Self::CLASS, path, &data).await;
        }
        Ok(data)
    }
}
