//! Appends signal records to a local SQLite database.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use rusqlite::{params, Connection};
use serde::Deserialize;
use serde_json::Value;
use sigflow_sdk::prelude::*;

use super::build_signal_records;

pub const MODULE: &str = "sigflow_plugins::load::sqlite";

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier regex is valid")
});

fn default_table() -> String {
    "financial_signals".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub path: PathBuf,
    #[serde(default = "default_table")]
    pub table: String,
}

pub struct SqliteLoader {
    path: PathBuf,
    table: String,
}

impl Component for SqliteLoader {
    type Config = Config;
    const CLASS: &'static str = "SqliteLoader";

    fn init(config: Self::Config) -> Result<Self, ComponentError> {
        if !IDENTIFIER.is_match(&config.table) {
            return Err(ComponentError::config(
                "INVALID_TABLE",
                format!("SqliteLoader: '{}' is not a valid table name", config.table),
            ));
        }
        Ok(Self {
            path: config.path,
            table: config.table,
        })
    }
}

impl SqliteLoader {
    fn open(&self) -> Result<Connection, ComponentError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(&self.path).map_err(|e| {
            ComponentError::io(
                "SQLITE_OPEN",
                format!("SqliteLoader: cannot open {}: {e}", self.path.display()),
            )
        })?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                signal_name TEXT NOT NULL,
                value TEXT NOT NULL,
                units TEXT NOT NULL,
                metadata TEXT NOT NULL,
                inserted_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
            self.table
        ))
        .map_err(sql_error)?;
        Ok(conn)
    }
}

fn sql_error(e: rusqlite::Error) -> ComponentError {
    ComponentError::io("SQLITE_ERROR", format!("SqliteLoader: {e}"))
}

/// Scalars are stored as their plain text, everything else as JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Loader for SqliteLoader {
    async fn load(&mut self, data: &NormalizedData) -> Result<LoadResult, ComponentError> {
        let records = build_signal_records(Self::CLASS, data)?;
        let mut conn = self.open()?;

        let tx = conn.transaction().map_err(sql_error)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} (date, signal_name, value, units, metadata) VALUES (?1, ?2, ?3, ?4, ?5)",
                    self.table
                ))
                .map_err(sql_error)?;
            for record in &records {
                stmt.execute(params![
                    as_text(&record["date"]),
                    as_text(&record["signal_name"]),
                    as_text(&record["value"]),
                    as_text(&record["units"]),
                    record["metadata"].to_string(),
                ])
                .map_err(sql_error)?;
            }
        }
        tx.commit().map_err(sql_error)?;

        tracing::info!(
            path = %self.path.display(),
            table = self.table,
            records = records.len(),
            "Inserted into SQLite"
        );
        Ok(LoadResult::written(records.len() as u64))
    }
}
