//! Persistent multi-index storage.
//!
//! Everything is layered over a single ordered [`KvStore`]: named
//! [`Table`]s carve it into versioned key spaces, and the
//! [`IndexEngine`] owns the tables the resolver queries.

pub mod completion_index;
pub mod document_table;
pub mod engine;
pub mod kv;
pub mod name_index;
pub mod position_index;
pub mod snapshot;
pub mod symbol_table;
pub mod table;
pub mod word_separator;

pub use completion_index::CompletionIndex;
pub use document_table::DocumentTable;
pub use engine::{IndexEngine, TABLE_VERSION, completion_word, sort_candidates};
pub use kv::{KvStore, MemoryStore, WriteBatch};
pub use name_index::NameIndex;
pub use position_index::{PositionIndex, RangeIndex, ScopeIndex};
pub use symbol_table::{SymbolTable, SymbolTableKind, index_name, member_key};
pub use table::Table;
pub use word_separator::{index_tokens, tokenize};
