//! Sidecar metadata records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Metadata stored alongside a cached payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    pub content_type: String,
    pub size: u64,
    pub cached_at: DateTime<Utc>,
}

/// Sidecar path for a payload path (`<payload-filename>.json`).
pub(crate) fn sidecar_path(payload: &Path) -> PathBuf {
    let mut path = payload.as_os_str().to_os_string();
    path.push(".json");
    PathBuf::from(path)
}

/// Read the sidecar record for a payload.
///
/// A missing or corrupt record reads as `None`; callers treat either the
/// same as a cache miss.
pub(crate) async fn read_sidecar(payload: &Path) -> Option<ImageMeta> {
    let raw = fs::read(sidecar_path(payload)).await.ok()?;
    serde_json::from_slice(&raw).ok()
}

/// Persist the sidecar record next to its payload.
pub(crate) async fn write_sidecar(payload: &Path, meta: &ImageMeta) -> std::io::Result<()> {
    let raw = serde_json::to_vec(meta)?;
    fs::write(sidecar_path(payload), raw).await
}
