//! Reads a previously captured JSON payload from disk.

use std::path::PathBuf;

use serde::Deserialize;
use sigflow_sdk::prelude::*;

pub const MODULE: &str = "sigflow_plugins::extract::file";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub path: PathBuf,
}

pub struct JsonFileExtractor {
    path: PathBuf,
}

impl Component for JsonFileExtractor {
    type Config = Config;
    const CLASS: &'static str = "JsonFileExtractor";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        Ok(Self { path: config.path })
    }
}

#[async_trait]
impl Extractor for JsonFileExtractor {
    async fn fetch(&mut self) -> Result<RawData, ComponentError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            let mut err = ComponentError::from(e);
            err.message = format!("{}: {}", self.path.display(), err.message);
            if err.code == "FILE_NOT_FOUND" {
                err.category = ErrorCategory::NotFound;
            }
            err
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ComponentError::data(
                "INVALID_JSON",
                format!("{} is not valid JSON: {e}", self.path.display()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_json_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(&path, r#"{"observations": []}"#).unwrap();

        let mut extractor = JsonFileExtractor::init(Config { path }).unwrap();
        let data = extractor.fetch().await.unwrap();
        assert!(data["observations"].is_array());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let mut extractor = JsonFileExtractor::init(Config {
            path: "/nonexistent/raw.json".into(),
        })
        .unwrap();
        let err = extractor.fetch().await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::NotFound);
        assert!(err.message.contains("/nonexistent/raw.json"));
    }

    #[tokio::test]
    async fn invalid_json_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(&path, "not json").unwrap();

        let mut extractor = JsonFileExtractor::init(Config { path }).unwrap();
        let err = extractor.fetch().await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::Data);
    }
}
