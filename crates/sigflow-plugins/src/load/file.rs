//! Writes normalized data to a local JSON or CSV file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use sigflow_sdk::prelude::*;

pub const MODULE: &str = "sigflow_plugins::load::file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub file_path: PathBuf,
    #[serde(default)]
    pub format: FileFormat,
}

pub struct FileLoader {
    path: PathBuf,
    format: FileFormat,
}

impl Component for FileLoader {
    type Config = Config;
    const CLASS: &'static str = "FileLoader";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if config.file_path.as_os_str().is_empty() {
            return Err(ComponentError::config(
                "MISSING_FILE_PATH",
                "FileLoader requires 'file_path'",
            ));
        }
        Ok(Self {
            path: config.file_path,
            format: config.format,
        })
    }
}

#[async_trait]
impl Loader for FileLoader {
    async fn load(&mut self, data: &NormalizedData) -> Result<LoadResult, ComponentError> {
        let body = match self.format {
            FileFormat::Json => serde_json::to_string_pretty(data).map_err(|e| {
                ComponentError::data("SERIALIZE_FAILED", format!("FileLoader: {e}"))
            })?,
            FileFormat::Csv => to_csv(data)?,
        };

        write_file(&self.path, body.as_bytes()).await.map_err(|e| {
            let mut err = ComponentError::from(e);
            err.message = format!(
                "FileLoader: cannot write {}: {}",
                self.path.display(),
                err.message
            );
            err
        })?;

        tracing::info!(path = %self.path.display(), format = ?self.format, "Data saved");
        Ok(LoadResult::written(record_count(data)))
    }
}

async fn write_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, body).await
}

/// Header from the union of keys in first-seen order, one row per object.
fn to_csv(data: &Value) -> Result<String, ComponentError> {
    let rows: Vec<&serde_json::Map<String, Value>> = match data {
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    ComponentError::data(
                        "CSV_UNSUPPORTED",
                        "FileLoader: csv output needs an object or an array of objects",
                    )
                })
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(ComponentError::data(
                "CSV_UNSUPPORTED",
                "FileLoader: csv output needs an object or an array of objects",
            ))
        }
    };

    let mut headers: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key.as_str());
            }
        }
    }

    let mut out = String::new();
    let header_line: Vec<String> = headers.iter().map(|h| csv_field(h)).collect();
    let _ = writeln!(out, "{}", header_line.join(","));
    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| match row.get(*h) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => csv_field(s),
                Some(other) => csv_field(&other.to_string()),
            })
            .collect();
        let _ = writeln!(out, "{}", cells.join(","));
    }
    Ok(out)
}

fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
