//! Index a one-file project and query it the way an editor would.

use crate::common::sample_code::FOO;
use crate::common::{TestProject, last_offset_of};
use phpsense::{RefKind, Symbol};

#[tokio::test]
async fn test_definition_and_signature_help_for_function_call() {
    let project = TestProject::new();
    project.add_file("foo.php", FOO);
    let uri = project.uri("foo.php");

    let workspace = project.workspace();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 1);
    assert_eq!(stats.symbols_found, 1);

    let found = workspace
        .definition(&uri, last_offset_of(FOO, "foo(", 1))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    match &found[0] {
        Symbol::Function(f) => {
            assert_eq!(f.name, "foo");
            assert_eq!(f.signature.parameters.len(), 2);
        }
        other => panic!("expected a function, got {other:?}"),
    }
    assert_eq!(found[0].location().uri(), uri);

    let help = workspace
        .get_signature_help(&uri, last_offset_of(FOO, "2)", 0))
        .await
        .unwrap()
        .expect("signature help inside the call");
    assert_eq!(help.active_signature, 0);
    assert_eq!(help.active_parameter, 1);
    assert_eq!(help.signatures.len(), 1);
    assert!(help.signatures[0].label.contains("foo($a, $b)"));
    assert_eq!(help.signatures[0].parameters, vec!["$a", "$b"]);

    let help = workspace
        .get_signature_help(&uri, last_offset_of(FOO, "1,", 0))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(help.active_parameter, 0);
}

#[tokio::test]
async fn test_positions_outside_references_find_nothing() {
    let project = TestProject::new();
    project.add_file("foo.php", FOO);
    let uri = project.uri("foo.php");

    let workspace = project.workspace();
    workspace.index_workspace(project.path()).await.unwrap();

    // Inside the `<?php` tag
    assert!(workspace.definition(&uri, 2).await.unwrap().is_empty());
    assert!(workspace.get_signature_help(&uri, 2).await.unwrap().is_none());
    assert!(workspace.hover(&uri, 2).await.unwrap().is_none());

    // Unknown documents are not an error
    let other = project.uri("missing.php");
    assert!(workspace.definition(&other, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_document_symbols_are_in_source_order() {
    let project = TestProject::new();
    let source = "<?php\nclass B { public function m() {} }\nfunction a() {}\nconst C = 1;\n";
    project.add_file("order.php", source);
    let uri = project.uri("order.php");

    let workspace = project.workspace();
    workspace.index_workspace(project.path()).await.unwrap();

    let symbols = workspace.document_symbols(&uri).await.unwrap();
    let names: Vec<&str> = symbols.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["B", "m", "a", "C"]);
}

#[tokio::test]
async fn test_call_in_one_file_resolves_declaration_in_another() {
    let project = TestProject::new();
    project.add_file("decl.php", "<?php\nfunction foo(int $a): string { return $a; }\n");
    let caller = "<?php\nfoo(1);\n";
    project.add_file("call.php", caller);
    let uri = project.uri("call.php");

    let workspace = project.workspace();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 2);

    let reference = workspace
        .find_at(&uri, last_offset_of(caller, "foo", 1))
        .await
        .unwrap()
        .expect("reference at the call name");
    assert_eq!(reference.ref_kind, RefKind::Function);
    assert_eq!(reference.name(), "foo");

    let found = workspace
        .get_symbols_by_reference(&uri, &reference)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    let Symbol::Function(f) = &found[0] else {
        panic!("expected a function, got {:?}", found[0]);
    };
    assert_eq!(f.signature.parameters.len(), 1);
    assert_eq!(f.signature.parameters[0].name, "a");
    assert!(f.signature.return_types.contains("string"));
    assert_eq!(found[0].location().uri(), project.uri("decl.php"));
}
