//! Relay configuration
//!
//! Loaded once at startup from a JSON file named by `RELAY_CONFIG`
//! (default `relay.json`). Every field is optional; a missing or
//! unparseable file falls back entirely to the defaults with a warning,
//! never a startup failure.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Process configuration, immutable after startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelayConfig {
    pub port: u16,
    pub upstream_base_url: String,
    pub cache_dir: PathBuf,
    pub max_cache_bytes: u64,
    pub max_download_bytes: u64,
    pub upstream_timeout_secs: u64,
    pub placeholder_width: u32,
    pub placeholder_height: u32,
    pub placeholder_background: String,
    pub placeholder_text_color: String,
    pub placeholder_accent_color: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            upstream_base_url: "https://images.example.com".to_string(),
            cache_dir: PathBuf::from("./cache/images"),
            max_cache_bytes: 1024 * 1024 * 1024, // 1GB
            max_download_bytes: 10 * 1024 * 1024, // 10MB
            upstream_timeout_secs: 30,
            placeholder_width: 480,
            placeholder_height: 360,
            placeholder_background: "#262629".to_string(),
            placeholder_text_color: "#e8e8e8".to_string(),
            placeholder_accent_color: "#d64545".to_string(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from the file named by `RELAY_CONFIG`.
    pub fn load() -> Self {
        let path = std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "relay.json".to_string());
        Self::from_file(Path::new(&path))
    }

    fn from_file(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = ?path, error = %e, "Config file not readable, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = ?path, error = %e, "Config file not parseable, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 3001);
        assert_eq!(config.upstream_base_url, "https://images.example.com");
        assert_eq!(config.cache_dir, PathBuf::from("./cache/images"));
        assert_eq!(config.max_cache_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.max_download_bytes, 10 * 1024 * 1024);
        assert_eq!(config.upstream_timeout_secs, 30);
        assert_eq!(config.placeholder_width, 480);
        assert_eq!(config.placeholder_height, 360);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("relay.json");
        std::fs::write(
            &path,
            r#"{"port": 8080, "maxDownloadBytes": 1048576, "upstreamBaseUrl": "http://img.internal"}"#,
        )
        .unwrap();

        let config = RelayConfig::from_file(&path);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_download_bytes, 1024 * 1024);
        assert_eq!(config.upstream_base_url, "http://img.internal");
        // Unmentioned keys keep their defaults
        assert_eq!(config.max_cache_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.placeholder_background, "#262629");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = RelayConfig::from_file(&dir.path().join("absent.json"));
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_unparseable_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("relay.json");
        std::fs::write(&path, "{port: nope").unwrap();

        let config = RelayConfig::from_file(&path);
        assert_eq!(config.port, 3001);
        assert_eq!(config.max_cache_bytes, 1024 * 1024 * 1024);
    }
}
