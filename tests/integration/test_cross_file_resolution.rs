//! Resolution across documents: imports, inheritance, traits and
//! constructors.

use crate::common::sample_code::{CONTROLLER, MODELS};
use crate::common::{TestProject, offset_of};
use phpsense::{Symbol, Workspace};

async fn indexed_project() -> (TestProject, Workspace, String) {
    let project = TestProject::new();
    project.add_file("src/Models/User.php", MODELS);
    project.add_file("src/Http/UserController.php", CONTROLLER);
    let workspace = project.workspace();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 2);
    assert_eq!(stats.files_failed, 0);
    let uri = project.uri("src/Http/UserController.php");
    (project, workspace, uri)
}

fn describe(symbols: &[Symbol]) -> Vec<String> {
    symbols
        .iter()
        .map(|s| match s.scope() {
            Some(scope) => format!("{scope}::{}", s.name()),
            None => s.name().to_string(),
        })
        .collect()
}

async fn definition(workspace: &Workspace, uri: &str, needle: &str, delta: u32) -> Vec<String> {
    let offset = offset_of(CONTROLLER, needle, delta);
    describe(&workspace.definition(uri, offset).await.unwrap())
}

#[tokio::test]
async fn test_typed_parameters_resolve_members() {
    let (_project, workspace, uri) = indexed_project().await;

    assert_eq!(
        definition(&workspace, &uri, "$user->save", 8).await,
        vec!["App\\Models\\User::save"]
    );
    assert_eq!(
        definition(&workspace, &uri, "$admin->ban", 9).await,
        vec!["App\\Models\\Admin::ban"]
    );
}

#[tokio::test]
async fn test_inherited_and_trait_members_resolve_to_their_owner() {
    let (_project, workspace, uri) = indexed_project().await;

    assert_eq!(
        definition(&workspace, &uri, "$admin->save", 9).await,
        vec!["App\\Models\\User::save"]
    );
    assert_eq!(
        definition(&workspace, &uri, "$admin->touch", 9).await,
        vec!["App\\Models\\HasTimestamps::touch"]
    );
    // The subclass constant shadows the parent's
    assert_eq!(
        definition(&workspace, &uri, "Admin::ROLE", 8).await,
        vec!["App\\Models\\Admin::ROLE"]
    );
}

#[tokio::test]
async fn test_imported_names_resolve() {
    let (_project, workspace, uri) = indexed_project().await;

    assert_eq!(
        definition(&workspace, &uri, "make_admin('y')", 2).await,
        vec!["App\\Models\\make_admin"]
    );
    assert_eq!(
        definition(&workspace, &uri, "new Admin", 5).await,
        vec!["App\\Models\\Admin"]
    );
    assert_eq!(
        definition(&workspace, &uri, "$fresh->ban", 9).await,
        vec!["App\\Models\\Admin::ban"]
    );
}

#[tokio::test]
async fn test_signature_help_across_files() {
    let (_project, workspace, uri) = indexed_project().await;

    let help = workspace
        .get_signature_help(&uri, offset_of(CONTROLLER, "'abuse'", 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(help.active_parameter, 1);
    let signature = &help.signatures[0];
    assert!(signature.label.contains("App\\Models\\Admin::ban("));
    assert_eq!(signature.parameters.len(), 2);
    assert!(signature.parameters[1].ends_with("$reason = 'spam'"));

    // Inherited constructor
    let help = workspace
        .get_signature_help(&uri, offset_of(CONTROLLER, "'x'", 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(help.active_parameter, 0);
    assert!(help.signatures[0].label.contains("App\\Models\\User::__construct("));
}

#[tokio::test]
async fn test_hover_shows_description() {
    let (project, workspace, _) = indexed_project().await;
    let models = project.uri("src/Models/User.php");

    let offset = offset_of(MODELS, "extends User", 9);
    let hover = workspace.hover(&models, offset).await.unwrap().unwrap();
    assert!(hover.contents.starts_with("class App\\Models\\User"));
    assert!(hover.contents.contains("A registered user."));
}
