//! Completion through the workspace, with the cursor inside partly typed
//! names.

use crate::common::sample_code::MODELS;
use crate::common::{TestProject, offset_of};
use phpsense::{Symbol, Workspace};

const TYPING: &str = r#"<?php
use App\Models\Admin;
use App\Models\User;

function demo(Admin $admin) {
    $admin->sa;
    Admin::cr;
    Admin::RO;
    $admin->zz;
    make;
    $ad;
}
"#;

async fn workspace_with_buffer() -> (TestProject, Workspace, String) {
    let project = TestProject::new();
    project.add_file("src/Models/User.php", MODELS);
    let workspace = project.workspace();
    workspace.index_workspace(project.path()).await.unwrap();

    // An unsaved editor buffer
    let uri = "untitled:Typing-1".to_string();
    workspace.open_document(&uri, TYPING.to_string()).await.unwrap();
    (project, workspace, uri)
}

fn names(symbols: &[Symbol]) -> Vec<&str> {
    symbols.iter().map(|s| s.name()).collect()
}

#[tokio::test]
async fn test_member_completion_filters_by_typed_prefix() {
    let (_project, workspace, uri) = workspace_with_buffer().await;

    let found = workspace
        .completion(&uri, offset_of(TYPING, "sa;", 2))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["save"]);

    let found = workspace
        .completion(&uri, offset_of(TYPING, "cr;", 2))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["create"]);

    // Both classes declare ROLE, the nearest one is offered once
    let found = workspace
        .completion(&uri, offset_of(TYPING, "RO;", 2))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["ROLE"]);
    assert_eq!(found[0].scope(), Some("App\\Models\\Admin"));
}

#[tokio::test]
async fn test_empty_member_prefix_lists_instance_members() {
    let (_project, workspace, uri) = workspace_with_buffer().await;

    let found = workspace
        .completion(&uri, offset_of(TYPING, "$admin->zz", 8))
        .await
        .unwrap();
    let found = names(&found);
    // Own members come first
    assert_eq!(found.first(), Some(&"ban"));
    assert!(found.contains(&"save"));
    assert!(found.contains(&"name"));
    assert!(found.contains(&"touch"));
    // Static members are not offered on instances
    assert!(!found.contains(&"create"));
    assert!(!found.contains(&"count"));
}

#[tokio::test]
async fn test_top_level_and_variable_completion() {
    let (_project, workspace, uri) = workspace_with_buffer().await;

    let found = workspace
        .completion(&uri, offset_of(TYPING, "make;", 4))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["App\\Models\\make_admin"]);

    let found = workspace
        .completion(&uri, offset_of(TYPING, "$ad;", 3))
        .await
        .unwrap();
    assert_eq!(names(&found), vec!["$admin"]);
}

#[tokio::test]
async fn test_completion_respects_configured_limit() {
    let project = TestProject::new();
    project.add_file("src/Models/User.php", MODELS);
    let mut settings = project.settings();
    settings.completion.limit = 1;
    let workspace = Workspace::open(settings).unwrap();
    workspace.index_workspace(project.path()).await.unwrap();

    let uri = "untitled:Typing-2";
    workspace.open_document(uri, TYPING.to_string()).await.unwrap();
    let found = workspace
        .completion(uri, offset_of(TYPING, "$admin->zz", 8))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}
