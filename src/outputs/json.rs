//! The generated-articles index: a JSON array of [`ArticleSummary`] rows.
//!
//! The whole file is rewritten on every append. A missing or corrupt index
//! starts a fresh one.

use crate::models::ArticleSummary;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Read the index at `path`. Missing or unparsable files yield an empty list.
pub async fn load_index(path: &Path) -> Vec<ArticleSummary> {
    match fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Articles index is corrupt; starting a new one");
            Vec::new()
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Articles index is unreadable; starting a new one");
            Vec::new()
        }
    }
}

/// Append `rows` to the index and write it back. Returns the new row count.
#[instrument(level = "info", skip_all, fields(path = %path.display(), added = rows.len()))]
pub async fn append_to_index(path: &Path, rows: &[ArticleSummary]) -> Result<usize, Box<dyn Error>> {
    let mut index = load_index(path).await;
    index.extend_from_slice(rows);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&index)?;
    fs::write(path, json).await?;
    info!(total = index.len(), "Wrote articles index");
    Ok(index.len())
}
