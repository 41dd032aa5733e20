//! Cache key derivation

use sha2::{Digest, Sha256};

/// Longest extension considered real; anything longer is treated as noise.
const MAX_EXT_LEN: usize = 10;

/// Derive the on-disk payload filename for a request target.
///
/// The stem is the SHA-256 of the full target (path plus query), so distinct
/// targets never collide. The original file extension is kept as a suffix so
/// content types stay inferable from the filename.
pub fn payload_name(target: &str) -> String {
    let mut name = cache_key(target);
    if let Some(ext) = extension(target) {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// SHA-256 of the target, hex encoded.
pub(crate) fn cache_key(target: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.as_bytes());
    hex::encode(hasher.finalize())
}

/// File extension of the target's path portion, if it looks like one.
/// `json` is excluded: that suffix names sidecar records on disk.
fn extension(target: &str) -> Option<&str> {
    let path = target.split('?').next().unwrap_or(target);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXT_LEN {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    if ext == "json" {
        return None;
    }
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_deterministic() {
        let key1 = cache_key("/photos/abc123.png");
        let key2 = cache_key("/photos/abc123.png");
        let key3 = cache_key("/photos/xyz789.png");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);

        // Keys are hex strings (64 chars for SHA256)
        assert_eq!(key1.len(), 64);
        assert!(key1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_query_changes_key() {
        assert_ne!(
            cache_key("/photos/abc.png"),
            cache_key("/photos/abc.png?w=100")
        );
    }

    #[test]
    fn test_payload_name_keeps_extension() {
        let name = payload_name("/photos/abc123.png");
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + 4);
    }

    #[test]
    fn test_payload_name_strips_query_from_extension() {
        let name = payload_name("/photos/abc.jpeg?size=large");
        assert!(name.ends_with(".jpeg"));
    }

    #[test]
    fn test_payload_name_without_extension() {
        let name = payload_name("/photos/abc123");
        assert_eq!(name.len(), 64);
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(extension("/a/b.png"), Some("png"));
        assert_eq!(extension("/a/b.tar.gz"), Some("gz"));
        assert_eq!(extension("/a/b"), None);
        // Dotfiles have no extension
        assert_eq!(extension("/a/.hidden"), None);
        // Trailing dot
        assert_eq!(extension("/a/b."), None);
        // Too long to be a real extension
        assert_eq!(extension("/a/b.abcdefghijk"), None);
        // Non-alphanumeric
        assert_eq!(extension("/a/b.pn~g"), None);
    }

    #[test]
    fn test_json_extension_is_not_kept() {
        // A kept json suffix would make the payload look like a sidecar
        assert_eq!(extension("/data/widget.json"), None);
        let name = payload_name("/data/widget.json");
        assert_eq!(name.len(), 64);
        assert!(!name.ends_with(".json"));
    }
}
