//! Re-indexing replaces or drops everything a document contributed.

use crate::common::{TestProject, offset_of};
use phpsense::SyncOutcome;
use phpsense::indexing::file_mtime;
use std::fs;

const CALLER: &str = "<?php\nfunction run() { return helper(); }\n";

#[tokio::test]
async fn test_deleted_file_disappears_from_every_index() {
    let project = TestProject::new();
    project.add_file("lib/helper.php", "<?php\nclass HelperBox {}\nfunction helper() {}\n");
    project.add_file("caller.php", CALLER);
    let caller = project.uri("caller.php");
    let helper = project.uri("lib/helper.php");

    let workspace = project.workspace();
    workspace.index_workspace(project.path()).await.unwrap();
    let at = offset_of(CALLER, "helper()", 1);
    assert_eq!(workspace.definition(&caller, at).await.unwrap().len(), 1);
    assert_eq!(workspace.workspace_symbols("helper").await.unwrap().len(), 2);

    fs::remove_file(project.path().join("lib/helper.php")).unwrap();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_removed, 1);
    assert_eq!(stats.files_unchanged, 1);

    assert!(workspace.definition(&caller, at).await.unwrap().is_empty());
    assert!(workspace.workspace_symbols("helper").await.unwrap().is_empty());
    assert!(workspace.engine().document(&helper).unwrap().is_none());
    assert!(workspace.engine().references_of(&helper).unwrap().is_empty());
}

#[tokio::test]
async fn test_changed_file_replaces_old_rows() {
    let project = TestProject::new();
    let path = project.add_file("a.php", "<?php\nfunction old_name() {}\nold_name();\n");
    let uri = project.uri("a.php");

    let workspace = project.workspace();
    assert_eq!(
        workspace.index_path(&path).await.unwrap(),
        SyncOutcome::Indexed { symbols: 1 }
    );

    let source = "<?php\nfunction new_name($x) {}\nnew_name(1);\n";
    fs::write(&path, source).unwrap();
    // Coarse mtimes may not move within the same second
    let mtime = file_mtime(&path).unwrap() + 1;
    assert_eq!(
        workspace.sync_file_system(&uri, mtime).await.unwrap(),
        SyncOutcome::Indexed { symbols: 1 }
    );

    assert!(workspace.workspace_symbols("old").await.unwrap().is_empty());
    let found = workspace
        .definition(&uri, offset_of(source, "new_name(1)", 1))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), "new_name");

    let record = workspace.engine().document(&uri).unwrap().unwrap();
    assert_eq!(record.mtime, mtime);
    assert_eq!(record.content_hash, phpsense::calculate_hash(source));
}

#[tokio::test]
async fn test_unreadable_files_are_reported_not_fatal() {
    let project = TestProject::new();
    project.add_file("good.php", "<?php\nfunction good() {}\n");
    // Not valid UTF-8
    fs::write(project.path().join("bad.php"), [0x3c, 0x3f, 0xff, 0xfe]).unwrap();

    let workspace = project.workspace();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 1);
    assert_eq!(stats.files_failed, 1);
    assert!(stats.errors[0].0.ends_with("bad.php"));
    assert_eq!(workspace.workspace_symbols("good").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_broken_php_still_indexes_what_parses() {
    let project = TestProject::new();
    project.add_file("broken.php", "<?php\nfunction ok() {}\n$x = ;\n");

    let workspace = project.workspace();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_failed, 0);
    assert_eq!(workspace.workspace_symbols("ok").await.unwrap().len(), 1);
}
