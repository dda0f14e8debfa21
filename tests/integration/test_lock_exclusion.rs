//! Readers never observe a document halfway through being replaced.

use phpsense::{SourceDocument, Symbol, Workspace};
use std::sync::Arc;
use tokio::task::JoinSet;

const URI: &str = "file:///virtual/versions.php";

fn version(n: usize) -> SourceDocument {
    let source = format!(
        "<?php\nclass Version{n} {{\n    public function a{n}() {{}}\n    public function b{n}() {{}}\n}}\n"
    );
    SourceDocument::from_source(URI, source).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_see_whole_versions() {
    let workspace = Arc::new(Workspace::in_memory());
    workspace.index_file(&version(0)).await.unwrap();

    let mut tasks = JoinSet::new();
    {
        let workspace = workspace.clone();
        tasks.spawn(async move {
            for n in 1..=50 {
                workspace.index_file(&version(n)).await.unwrap();
                tokio::task::yield_now().await;
            }
        });
    }
    for _ in 0..4 {
        let workspace = workspace.clone();
        tasks.spawn(async move {
            for _ in 0..100 {
                let symbols = workspace.document_symbols(URI).await.unwrap();
                assert_eq!(symbols.len(), 3);
                // Class and both methods come from the same version
                let class = symbols[0].name().trim_start_matches("Version").to_string();
                for method in &symbols[1..] {
                    assert_eq!(method.scope(), Some(format!("Version{class}").as_str()));
                }
                tokio::task::yield_now().await;
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }
    assert!(workspace.locks().is_empty());

    let symbols = workspace.document_symbols(URI).await.unwrap();
    assert_eq!(symbols[0].name(), "Version50");
}

const DECL: &str = "file:///virtual/decl.php";
const CALL: &str = "file:///virtual/call.php";

fn declaration(n: usize) -> SourceDocument {
    let source = if n % 2 == 0 {
        "<?php\nfunction foo(int $a): string { return ''; }\n"
    } else {
        "<?php\nfunction foo(int $a, int $b): int { return $a; }\n"
    };
    SourceDocument::from_source(DECL, source.to_string()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolution_sees_whole_signatures() {
    let workspace = Arc::new(Workspace::in_memory());
    workspace.index_file(&declaration(0)).await.unwrap();
    workspace
        .index_file(&SourceDocument::from_source(CALL, "<?php\nfoo(1);\n".to_string()).unwrap())
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    {
        let workspace = workspace.clone();
        tasks.spawn(async move {
            for n in 1..=40 {
                workspace.index_file(&declaration(n)).await.unwrap();
                tokio::task::yield_now().await;
            }
        });
    }
    for _ in 0..4 {
        let workspace = workspace.clone();
        tasks.spawn(async move {
            for _ in 0..100 {
                let reference = workspace.find_at(CALL, 7).await.unwrap().unwrap();
                let found = workspace.get_symbols_by_reference(CALL, &reference).await.unwrap();
                assert_eq!(found.len(), 1);
                let Symbol::Function(f) = &found[0] else {
                    panic!("expected a function, got {:?}", found[0]);
                };
                match f.signature.parameters.len() {
                    1 => assert!(f.signature.return_types.contains("string")),
                    2 => assert!(f.signature.return_types.contains("int")),
                    n => panic!("torn signature with {n} parameters"),
                }
                tokio::task::yield_now().await;
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }
    assert!(workspace.locks().is_empty());
}

#[tokio::test]
async fn test_documents_are_independent() {
    let workspace = Workspace::in_memory();
    let held = workspace.locks().lock("file:///virtual/a.php").await;

    // A query on another document completes while `a.php` is locked
    let other = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        workspace.document_symbols("file:///virtual/b.php"),
    )
    .await;
    assert!(other.unwrap().unwrap().is_empty());

    // And a query on the locked one waits
    let blocked = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        workspace.document_symbols("file:///virtual/a.php"),
    )
    .await;
    assert!(blocked.is_err());

    drop(held);
    assert!(workspace.document_symbols("file:///virtual/a.php").await.unwrap().is_empty());
}
