//! Built-in extractors.

pub mod alternative;
pub mod coingecko;
pub mod file;
pub mod fred;

use std::path::Path;

use sigflow_sdk::RawData;

/// Write the raw payload to `path` as pretty JSON.
///
/// Snapshots are best effort: a failed write is logged and never fails the
/// extraction.
pub(crate) async fn save_snapshot(component: &str, path: &Path, data: &RawData) {
    let result = write_pretty(path, data).await;

    match result {
        Ok(()) => tracing::info!(component, path = %path.display(), "Raw data snapshot saved"),
        Err(e) => tracing::warn!(
            component,
            path = %path.display(),
            error = %e,
            "Failed to save raw data snapshot"
        ),
    }
}

async fn write_pretty(path: &Path, data: &RawData) -> std::io::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    let body = serde_json::to_vec_pretty(data).map_err(std::io::Error::other)?;
    tokio::fs::write(path, body).await
}
