//! File-based image cache with sidecar metadata and LRU eviction
//!
//! Stores each cached payload as `<sha256-hex><original-extension>` with a
//! `<payload-filename>.json` sidecar describing it. The directory is the
//! source of truth: lookups and eviction passes re-read the filesystem, and
//! ingestion stages downloads in a temporary file that is published with an
//! atomic rename.

mod cache;
mod error;
mod key;
mod meta;

pub use cache::{CachedImage, ImageCache};
pub use error::IngestError;
pub use key::payload_name;
pub use meta::ImageMeta;
