//! Disk-backed cache operations
//!
//! Payloads are staged under `<cache_dir>/tmp` while downloading and
//! published into place with an atomic rename, so readers never observe a
//! partial file. The payload mtime doubles as the recency marker for
//! eviction; atime is unreliable on noatime mounts.

use crate::error::IngestError;
use crate::key::payload_name;
use crate::meta::{self, ImageMeta};
use bytes::Bytes;
use chrono::Utc;
use filetime::FileTime;
use futures_util::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Directory under the cache root holding in-flight downloads.
const STAGING_DIR: &str = "tmp";

/// A cache entry ready for streaming: its metadata plus an open read handle
/// positioned at the start of the payload.
#[derive(Debug)]
pub struct CachedImage {
    pub meta: ImageMeta,
    pub file: fs::File,
}

/// Disk-backed image cache with no in-memory index.
///
/// Every lookup and eviction pass re-reads the directory, so concurrent
/// processes and restarts always see disk-observable truth.
pub struct ImageCache {
    cache_dir: PathBuf,
    max_cache_bytes: u64,
    max_object_bytes: u64,
}

struct PayloadEntry {
    name: String,
    size: u64,
    mtime: FileTime,
}

impl ImageCache {
    /// Create a new image cache rooted at `cache_dir`.
    pub fn new(cache_dir: PathBuf, max_cache_bytes: u64, max_object_bytes: u64) -> Self {
        Self {
            cache_dir,
            max_cache_bytes,
            max_object_bytes,
        }
    }

    /// Initialize the cache directories and sweep leftover staging files
    /// from a previous run.
    pub async fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        let staging = self.cache_dir.join(STAGING_DIR);
        fs::create_dir_all(&staging).await?;

        let mut swept = 0usize;
        let mut dir = fs::read_dir(&staging).await?;
        while let Some(entry) = dir.next_entry().await? {
            if fs::remove_file(entry.path()).await.is_ok() {
                swept += 1;
            }
        }
        if swept > 0 {
            debug!(swept, "Removed leftover staging files");
        }

        info!(cache_dir = ?self.cache_dir, "Cache initialized");
        Ok(())
    }

    /// Look up a cached entry for `target`.
    ///
    /// A missing or corrupt sidecar reads as a miss, as does a sidecar whose
    /// payload cannot be opened. On a hit the payload mtime is refreshed so
    /// eviction sees the entry as recently used.
    pub async fn open(&self, target: &str) -> Option<CachedImage> {
        let path = self.payload_path(target);
        let meta = meta::read_sidecar(&path).await?;

        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) => {
                debug!(path = ?path, error = %e, "Sidecar present but payload unreadable, treating as miss");
                return None;
            }
        };

        touch(&path);
        debug!(path = ?path, size = meta.size, "Cache hit");
        Some(CachedImage { meta, file })
    }

    /// Stream an upstream body into the cache.
    ///
    /// Bytes are staged in a temporary file and published with an atomic
    /// rename once the stream ends cleanly within the per-object ceiling;
    /// the sidecar is written only after the payload is visible. Any failure
    /// discards the staging file. On success the returned handle is opened
    /// onto the published payload before the eviction pass runs, so the
    /// entry can still be served even if eviction removes it immediately.
    pub async fn ingest<S, E>(
        &self,
        target: &str,
        content_type: &str,
        declared_len: Option<u64>,
        body: S,
    ) -> Result<CachedImage, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        if let Some(declared) = declared_len {
            if declared > self.max_object_bytes {
                return Err(IngestError::OversizeDeclared {
                    declared,
                    limit: self.max_object_bytes,
                });
            }
        }

        let staging = NamedTempFile::new_in(self.cache_dir.join(STAGING_DIR))?;
        let mut file = fs::File::from_std(staging.reopen()?);
        let mut written: u64 = 0;

        let mut body = std::pin::pin!(body);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| IngestError::Transport(Box::new(e)))?;
            written += chunk.len() as u64;
            if written > self.max_object_bytes {
                return Err(IngestError::OversizeActual {
                    limit: self.max_object_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        let path = self.payload_path(target);
        let published = staging
            .persist(&path)
            .map_err(|e| IngestError::Io(Box::new(e.error)))?;

        let meta = ImageMeta {
            content_type: content_type.to_string(),
            size: written,
            cached_at: Utc::now(),
        };
        if let Err(e) = meta::write_sidecar(&path, &meta).await {
            // A payload without a sidecar would never be served; remove it
            // rather than stranding it on disk.
            let _ = fs::remove_file(&path).await;
            return Err(IngestError::Io(Box::new(e)));
        }

        debug!(path = ?path, size = written, content_type, "Cached image");
        self.enforce_limit().await;

        Ok(CachedImage {
            meta,
            file: fs::File::from_std(published),
        })
    }

    /// Bring the cache directory back under the total-bytes ceiling.
    ///
    /// Payload files are deleted oldest-mtime-first, ties broken by
    /// filename, each together with its sidecar, until the total fits.
    /// Delete failures are logged and skipped; eviction is best-effort,
    /// never an error.
    pub async fn enforce_limit(&self) {
        let mut entries = match self.list_payloads().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to scan cache directory for eviction");
                return;
            }
        };

        let mut total: u64 = entries.iter().map(|e| e.size).sum();
        if total <= self.max_cache_bytes {
            return;
        }

        entries.sort_by(|a, b| a.mtime.cmp(&b.mtime).then_with(|| a.name.cmp(&b.name)));

        for entry in entries {
            if total <= self.max_cache_bytes {
                break;
            }
            let path = self.cache_dir.join(&entry.name);
            match fs::remove_file(&path).await {
                Ok(()) => {}
                // Already gone, its bytes no longer count either way.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to evict cache entry");
                    continue;
                }
            }
            let _ = fs::remove_file(meta::sidecar_path(&path)).await;
            total -= entry.size;
            debug!(path = ?path, size = entry.size, "Evicted cache entry");
        }
    }

    fn payload_path(&self, target: &str) -> PathBuf {
        self.cache_dir.join(payload_name(target))
    }

    /// List payload files in the cache directory, skipping sidecars and
    /// subdirectories (including the staging directory).
    async fn list_payloads(&self) -> std::io::Result<Vec<PayloadEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.ends_with(".json") {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            if !metadata.is_file() {
                continue;
            }
            entries.push(PayloadEntry {
                name,
                size: metadata.len(),
                mtime: FileTime::from_last_modification_time(&metadata),
            });
        }
        Ok(entries)
    }
}

/// Refresh the payload mtime, the recency marker used by eviction.
fn touch(path: &Path) {
    if let Err(e) = filetime::set_file_mtime(path, FileTime::now()) {
        debug!(path = ?path, error = %e, "Failed to refresh access time");
    }
}
