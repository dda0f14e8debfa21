//! File discovery, incremental indexing and the query front door.

pub mod file_info;
pub mod lock;
pub mod overlay;
pub mod progress;
pub mod walker;
pub mod workspace;

pub use file_info::{calculate_hash, file_mtime, get_utc_timestamp, path_to_uri, uri_to_path};
pub use lock::{UriGuard, UriLocks};
pub use overlay::{OpenDocuments, OpenOverlay};
pub use progress::IndexStats;
pub use walker::FileWalker;
pub use workspace::{SyncOutcome, Workspace};
