//! Editor buffers stay out of the store and shadow what is on disk.

use crate::common::{TestProject, offset_of};
use phpsense::Symbol;

fn names(symbols: &[Symbol]) -> Vec<&str> {
    symbols.iter().map(|s| s.name()).collect()
}

#[tokio::test]
async fn test_open_buffer_is_never_stored() {
    let project = TestProject::new();
    let workspace = project.workspace();
    let uri = "untitled:Scratch-1";

    workspace
        .open_document(uri, "<?php\nfunction scratch() {}\n".to_string())
        .await
        .unwrap();
    assert!(workspace.engine().document(uri).unwrap().is_none());
    assert_eq!(names(&workspace.document_symbols(uri).await.unwrap()), vec!["scratch"]);

    workspace
        .update_document(uri, "<?php\nfunction scratch_two() {}\n".to_string())
        .await
        .unwrap();
    assert!(workspace.engine().document(uri).unwrap().is_none());
    workspace.flush().await.unwrap();

    // A fresh workspace over the same snapshot never saw the buffer
    drop(workspace);
    let reopened = project.workspace();
    assert!(reopened.workspace_symbols("scratch").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_other_documents_resolve_against_open_buffer() {
    let project = TestProject::new();
    project.add_file("lib.php", "<?php\nfunction helper(int $a) {}\n");
    let caller = "<?php\nhelper(1, 2);\n";
    project.add_file("main.php", caller);
    let lib = project.uri("lib.php");
    let main = project.uri("main.php");

    let workspace = project.workspace();
    workspace.index_workspace(project.path()).await.unwrap();

    workspace
        .open_document(&lib, "<?php\nfunction helper(int $a, int $b) {}\n".to_string())
        .await
        .unwrap();

    let found = workspace.definition(&main, offset_of(caller, "helper", 1)).await.unwrap();
    assert_eq!(found.len(), 1);
    let Symbol::Function(f) = &found[0] else {
        panic!("expected a function, got {:?}", found[0]);
    };
    assert_eq!(f.signature.parameters.len(), 2);

    let help = workspace
        .get_signature_help(&main, offset_of(caller, "2)", 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(help.signatures[0].parameters.len(), 2);
    assert!(help.signatures[0].parameters[1].ends_with("$b"));

    // The store still holds the file as it is on disk
    let stored = workspace.engine().document_symbols(&lib).unwrap();
    let Symbol::Function(f) = &stored[0] else {
        panic!("expected a function, got {:?}", stored[0]);
    };
    assert_eq!(f.signature.parameters.len(), 1);
}

#[tokio::test]
async fn test_close_reindexes_from_disk() {
    let project = TestProject::new();
    let path = project.add_file("a.php", "<?php\nfunction before() {}\n");
    let uri = project.uri("a.php");

    let workspace = project.workspace();
    workspace.index_path(&path).await.unwrap();
    workspace
        .open_document(&uri, "<?php\nfunction editing() {}\n".to_string())
        .await
        .unwrap();

    // Saved to disk while open: the store is left alone until close
    std::fs::write(&path, "<?php\nfunction after() {}\n").unwrap();
    workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(names(&workspace.engine().document_symbols(&uri).unwrap()), vec!["before"]);
    assert_eq!(names(&workspace.document_symbols(&uri).await.unwrap()), vec!["editing"]);

    workspace.close_document(&uri).await.unwrap();
    assert!(workspace.open_document_for(&uri).is_none());
    assert_eq!(names(&workspace.document_symbols(&uri).await.unwrap()), vec!["after"]);
    assert!(workspace.engine().document(&uri).unwrap().is_some());
}
