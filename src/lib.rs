//! Source intelligence for PHP.
//!
//! Documents are parsed with tree-sitter-php, turned into symbols,
//! references and variable scopes by [`builder`], stored in the indexes of
//! [`storage`] and queried through [`resolve`]. [`Workspace`] ties these
//! together behind an async API.

pub mod builder;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod resolve;
pub mod storage;
pub mod symbol;

pub use config::Settings;
pub use document::SourceDocument;
pub use error::{
    CodecError, CodecResult, IndexError, IndexResult, ParseError, ParseResult, StorageError,
    StorageResult,
};
pub use indexing::{IndexStats, SyncOutcome, Workspace, calculate_hash};
pub use parsing::PhpParser;
pub use resolve::{DocumentContext, Hover, SignatureHelp, SignatureInformation, SymbolProvider};
pub use storage::{IndexEngine, SymbolTableKind};
pub use symbol::{Location, Position, Range, RefKind, Reference, ScopeVar, Symbol, SymbolKind};
