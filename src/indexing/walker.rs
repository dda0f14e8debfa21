//! File system walker for discovering PHP files to index
//!
//! Honours `.gitignore`, `.phpsenseignore` and the configured ignore
//! patterns; only files with a configured extension are yielded.

use crate::config::{IGNORE_FILE, Settings};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Walks directories to find source files to index
#[derive(Debug)]
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Walk a directory and return an iterator of files to index
    pub fn walk(&self, root: &Path) -> impl Iterator<Item = PathBuf> + use<> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false);
        builder.add_custom_ignore_filename(IGNORE_FILE);

        if let Some(overrides) = self.ignore_overrides(root) {
            builder.overrides(overrides);
        }

        let extensions = self.settings.indexing.extensions.clone();
        builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(move |entry| {
                let path = entry.path();
                let extension = path.extension()?.to_str()?;
                extensions
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(extension))
                    .then(|| path.to_path_buf())
            })
    }

    /// Configured ignore patterns as negated overrides. Overrides normally
    /// whitelist, a leading `!` turns a glob into an exclusion.
    fn ignore_overrides(&self, root: &Path) -> Option<Override> {
        let patterns = &self.settings.indexing.ignore_patterns;
        if patterns.is_empty() {
            return None;
        }

        let mut builder = OverrideBuilder::new(root);
        for pattern in patterns {
            if let Err(e) = builder.add(&format!("!{pattern}")) {
                warn!(pattern = %pattern, error = %e, "skipping invalid ignore pattern");
            }
        }
        match builder.build() {
            Ok(overrides) => Some(overrides),
            Err(e) => {
                warn!(error = %e, "ignore patterns could not be compiled");
                None
            }
        }
    }

    /// Count files that would be indexed (useful for dry runs)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).count()
    }
}
