//! Settings files drive what gets indexed.

use crate::common::TestProject;
use phpsense::Settings;
use phpsense::config::{CONFIG_DIR, IGNORE_FILE};
use std::fs;

#[tokio::test]
async fn test_init_then_index_honours_ignore_settings() {
    let project = TestProject::new();
    let config_path = Settings::init_config_file(project.path(), false).unwrap();
    assert_eq!(config_path, project.path().join(CONFIG_DIR).join("settings.toml"));
    assert!(project.path().join(IGNORE_FILE).exists());
    assert!(Settings::init_config_file(project.path(), false).is_err());

    project.add_file("app/Service.php", "<?php\nclass Service {}\n");
    project.add_file("vendor/lib/Vendored.php", "<?php\nclass Vendored {}\n");
    project.add_file("generated/Cache.php", "<?php\nclass Cache {}\n");
    project.add_file("templates/page.tpl", "<?php\nclass Template {}\n");
    fs::write(project.path().join(IGNORE_FILE), "generated/\n").unwrap();

    let mut settings = Settings::load_from(&config_path).unwrap();
    settings.indexing.ignore_patterns.push("vendor/**".to_string());
    settings.indexing.extensions.push("tpl".to_string());

    let workspace = phpsense::Workspace::open(settings).unwrap();
    let stats = workspace.index_workspace(project.path()).await.unwrap();
    assert_eq!(stats.files_indexed, 2);

    for (query, expected) in [("service", 1), ("template", 1), ("vendored", 0), ("cache", 0)] {
        let found = workspace.workspace_symbols(query).await.unwrap();
        assert_eq!(found.len(), expected, "query {query}");
    }
}

#[test]
fn test_settings_file_overrides_defaults() {
    let project = TestProject::new();
    let path = project.path().join("custom.toml");
    fs::write(
        &path,
        "[completion]\nlimit = 5\n\n[indexing]\nextensions = [\"php\"]\nmax_concurrent_files = 2\n",
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.completion.limit, 5);
    assert_eq!(settings.indexing.extensions, vec!["php"]);
    assert_eq!(settings.indexing.max_concurrent_files, 2);
    // Untouched sections keep their defaults
    assert!(settings.index.persist);
}
