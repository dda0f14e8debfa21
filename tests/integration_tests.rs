// Gateway file for the tests under integration/

mod common;

#[path = "integration/test_end_to_end.rs"]
mod test_end_to_end;

#[path = "integration/test_cross_file_resolution.rs"]
mod test_cross_file_resolution;

#[path = "integration/test_completion.rs"]
mod test_completion;

#[path = "integration/test_index_cleanup.rs"]
mod test_index_cleanup;

#[path = "integration/test_persistence.rs"]
mod test_persistence;

#[path = "integration/test_lock_exclusion.rs"]
mod test_lock_exclusion;

#[path = "integration/test_config.rs"]
mod test_config;

#[path = "integration/test_open_documents.rs"]
mod test_open_documents;
