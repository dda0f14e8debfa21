//! Error types for the PHP intelligence engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for indexing and query operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Parser setup or parse failures
    #[error(transparent)]
    Parser(#[from] ParseError),

    /// Storage errors
    #[error("Storage operation failed: {0}")]
    Storage(#[from] StorageError),

    /// A spawned indexing task panicked or was aborted
    #[error("Indexing task for '{uri}' did not complete: {reason}")]
    TaskFailed { uri: String, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// General errors for cases where we need to preserve existing behavior
    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::Parser(_) => "PARSER_ERROR",
            Self::Storage(StorageError::Codec(_)) => "INDEX_CORRUPTED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::TaskFailed { .. } => "TASK_FAILED",
            Self::ConfigError { .. } => "CONFIG_ERROR",
            Self::General(_) => "GENERAL_ERROR",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Storage(StorageError::Codec(_))
            | Self::Storage(StorageError::SnapshotCorrupted { .. }) => vec![
                "Delete the index directory and run 'phpsense index' to rebuild it",
                "Check for disk errors or filesystem corruption",
            ],
            Self::Storage(_) => vec![
                "Check disk space and permissions in the index directory",
                "Run 'phpsense index' again, unchanged files are skipped",
            ],
            Self::Parser(_) => vec![
                "Ensure tree-sitter-php matches the version in Cargo.toml",
            ],
            Self::TaskFailed { .. } => vec![
                "The other files were indexed, try the operation again",
            ],
            Self::ConfigError { .. } => vec![
                "Run 'phpsense init --force' to regenerate the settings file",
            ],
            _ => vec![],
        }
    }
}

/// Errors specific to parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(
        "Failed to initialize {language} parser: {reason}\nSuggestion: Ensure tree-sitter-php is properly installed and the version matches Cargo.toml"
    )]
    ParserInit { language: String, reason: String },

    #[error("Parser produced no tree for '{uri}'")]
    NoTree { uri: String },
}

/// Errors raised while decoding stored records
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid encoding: needed {needed} bytes but only {remaining} remain")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("Invalid encoding: string is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid encoding: boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("Invalid encoding: unknown record tag {0}")]
    UnknownTag(u32),

    #[error("Invalid encoding: expected record tag {expected}, found {found}")]
    TagMismatch { expected: u32, found: u32 },

    #[error("Invalid encoding: unknown reference kind {0}")]
    UnknownRefKind(u32),

    #[error("Invalid encoding: unknown {set} bits {bits:#x}")]
    UnknownFlags { set: &'static str, bits: u32 },

    #[error("Invalid encoding: {0} trailing bytes after record")]
    TrailingBytes(usize),

    #[error("Invalid key encoding: {0}")]
    InvalidKey(&'static str),
}

/// Errors specific to storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Snapshot '{path}' is corrupted: {reason}")]
    SnapshotCorrupted { path: PathBuf, reason: String },

    #[error("Snapshot '{path}' has unsupported format version {version}")]
    UnsupportedSnapshotVersion { path: PathBuf, version: u32 },
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for record decoding
pub type CodecResult<T> = Result<T, CodecError>;
