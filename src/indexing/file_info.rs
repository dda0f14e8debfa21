//! File identity helpers for incremental indexing
//!
//! Documents are keyed by `file://` URIs. A file is re-indexed when its
//! modification time moves past the one recorded with the document.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Calculate SHA256 hash of content
pub fn calculate_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Get current UTC timestamp in seconds since UNIX_EPOCH
pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

/// Modification time of `path` in seconds since UNIX_EPOCH.
pub fn file_mtime(path: &Path) -> std::io::Result<i64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified).timestamp())
}

/// `file://` URI of a path. Relative paths are made absolute first.
pub fn path_to_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    format!("file://{}", absolute.to_string_lossy().replace('\\', "/"))
}

/// Path behind a `file://` URI, `None` for any other scheme.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    uri.strip_prefix("file://").map(PathBuf::from)
}
