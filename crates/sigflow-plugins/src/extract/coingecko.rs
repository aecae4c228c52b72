//! CoinGecko `simple/price` quotes for a single coin.

use std::path::PathBuf;

use serde::Deserialize;
use sigflow_sdk::prelude::*;

use crate::http::{build_client, default_timeout_secs, send_json, trim_base};

pub const MODULE: &str = "sigflow_plugins::extract::coingecko";

const PRO_KEY_HEADER: &str = "x-cg-pro-api-key";

fn default_coin_id() -> String {
    "bitcoin".to_string()
}

fn default_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_coin_id")]
    pub coin_id: String,
    /// Pro plan key; the free tier is used when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

/// Returns the coin's quote object: `usd`, `usd_market_cap`, `usd_24h_vol`,
/// `usd_24h_change`, `last_updated_at`.
pub struct CoinGeckoExtractor {
    client: reqwest::Client,
    config: Config,
}

impl Component for CoinGeckoExtractor {
    type Config = Config;
    const CLASS: &'static str = "CoinGeckoExtractor";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        let client = build_client(Self::CLASS, config.timeout_secs)?;
        let plan = if config.api_key.is_some() { "pro" } else { "free" };
        tracing::debug!(component = Self::CLASS, coin = config.coin_id, plan, "Initialized");
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Extractor for CoinGeckoExtractor {
    async fn fetch(&mut self) -> Result<RawData, ComponentError> {
        let url = format!("{}/simple/price", trim_base(&self.config.base_url));
        let mut request = self.client.get(&url).query(&[
            ("ids", self.config.coin_id.as_str()),
            ("vs_currencies", "usd"),
            ("include_market_cap", "true"),
            ("include_24hr_vol", "true"),
            ("include_24hr_change", "true"),
            ("include_last_updated_at", "true"),
        ]);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header(PRO_KEY_HEADER, key);
        }

        let mut data = send_json(Self::CLASS, request).await?;
        let coin = data
            .get_mut(&self.config.coin_id)
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                ComponentError::not_found(
                    "COIN_NOT_FOUND",
                    format!(
                        "CoinGeckoExtractor: no data for coin_id '{}'",
                        self.config.coin_id
                    ),
                )
            })?;

        if let Some(path) = &self.config.output_file {
            super::save_snapshot(Self::CLASS, path, &coin).await;
        }
        Ok(coin)
    }
}
