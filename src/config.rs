//! Layered configuration.
//!
//! Values are merged from, lowest priority first:
//! - built-in defaults
//! - `.phpsense/settings.toml` in the workspace
//! - environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `PS_` and use double underscores
//! to separate nested levels:
//! - `PS_INDEXING__MAX_CONCURRENT_FILES=8` sets `indexing.max_concurrent_files`
//! - `PS_COMPLETION__LIMIT=50` sets `completion.limit`
//! - `PS_INDEX__PERSIST=false` keeps the index in memory only

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding settings and the persisted index.
pub const CONFIG_DIR: &str = ".phpsense";

/// Per-directory ignore file, gitignore syntax.
pub const IGNORE_FILE: &str = ".phpsenseignore";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .phpsense is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub completion: CompletionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexConfig {
    /// Index directory, relative paths are taken from the workspace root
    #[serde(default = "default_index_path")]
    pub path: PathBuf,

    /// Write the index to disk; `false` keeps it in memory
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndexingConfig {
    /// File extensions treated as PHP source
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Gitignore-style patterns excluded from indexing
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Files parsed and stored at the same time during a workspace index
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Maximum number of completion candidates returned
    #[serde(default = "default_completion_limit")]
    pub limit: usize,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".phpsense/index")
}
fn default_true() -> bool {
    true
}
fn default_extensions() -> Vec<String> {
    vec!["php".to_string(), "phtml".to_string(), "inc".to_string()]
}
fn default_max_concurrent_files() -> usize {
    num_cpus::get().max(1)
}
fn default_completion_limit() -> usize {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            index: IndexConfig::default(),
            indexing: IndexingConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            persist: true,
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore_patterns: vec![".git/**".to_string(), "node_modules/**".to_string()],
            max_concurrent_files: default_max_concurrent_files(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            limit: default_completion_limit(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources, starting the workspace search
    /// at the current directory.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::load_from(config_path).map(|mut settings| {
            // If workspace_root is not set in config, detect it
            if settings.workspace_root.is_none() {
                settings.workspace_root = Self::workspace_root();
            }
            settings
        })
    }

    /// Load configuration from a specific file. A missing file only
    /// contributes nothing.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path).extract().map_err(Box::new)
    }

    /// The layered provider stack behind [`Self::load_from`].
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscores
            // stay inside field names
            .merge(Env::prefixed("PS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find `.phpsense/settings.toml` from the current directory upwards.
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .phpsense is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::workspace_root_from(&current)
    }

    pub fn workspace_root_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Absolute index directory.
    pub fn index_dir(&self) -> PathBuf {
        if self.index.path.is_absolute() {
            return self.index.path.clone();
        }
        match &self.workspace_root {
            Some(root) => root.join(&self.index.path),
            None => self.index.path.clone(),
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Write default settings under `root/.phpsense` plus an empty ignore
    /// file. Refuses to overwrite unless `force` is set.
    pub fn init_config_file(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let settings = Settings {
            workspace_root: Some(root.to_path_buf()),
            ..Settings::default()
        };
        settings.save(&config_path)?;

        let ignore_path = root.join(IGNORE_FILE);
        if force || !ignore_path.exists() {
            std::fs::write(
                &ignore_path,
                "# phpsense ignore patterns (gitignore syntax)\n# vendor/\n",
            )?;
        }

        Ok(config_path)
    }
}
