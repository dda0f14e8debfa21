//! The index survives a restart and a damaged snapshot is reported.

use crate::common::TestProject;
use phpsense::storage::kv::SNAPSHOT_FILE;
use phpsense::{IndexError, StorageError, Workspace};
use std::fs;

#[tokio::test]
async fn test_reopened_index_keeps_documents() {
    let project = TestProject::new();
    project.add_file("src/Invoice.php", "<?php\nclass Invoice { public function total() {} }\n");
    project.add_file("src/helpers.php", "<?php\nfunction invoice_total() {}\n");

    {
        let workspace = project.workspace();
        let stats = workspace.index_workspace(project.path()).await.unwrap();
        assert_eq!(stats.files_indexed, 2);
    }
    assert!(project.settings().index_dir().join(SNAPSHOT_FILE).exists());

    let workspace = project.workspace();
    let found = workspace.workspace_symbols("invoice").await.unwrap();
    let names: Vec<&str> = found.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["Invoice", "invoice_total"]);

    // Nothing changed on disk
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 0);
    assert_eq!(stats.files_unchanged, 2);
}

#[tokio::test]
async fn test_in_memory_settings_write_nothing() {
    let project = TestProject::new();
    project.add_file("a.php", "<?php\nfunction a() {}\n");
    let mut settings = project.settings();
    settings.index.persist = false;

    let workspace = Workspace::open(settings.clone()).unwrap();
    workspace.index_workspace(project.path()).await.unwrap();
    assert!(!settings.index_dir().exists());
}

#[tokio::test]
async fn test_corrupted_snapshot_is_an_error() {
    let project = TestProject::new();
    let dir = project.settings().index_dir();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(SNAPSHOT_FILE), b"not a snapshot at all").unwrap();

    let err = Workspace::open(project.settings()).unwrap_err();
    assert!(matches!(
        err,
        IndexError::Storage(StorageError::SnapshotCorrupted { .. })
    ));
    assert_eq!(err.status_code(), "STORAGE_ERROR");
    assert!(!err.recovery_suggestions().is_empty());
}
