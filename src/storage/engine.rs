//! The index engine: every table of the index over one store.
//!
//! Each stored symbol kind gets a primary [`SymbolTable`], a [`NameIndex`]
//! keyed by the (member) name, and a [`CompletionIndex`]. References and
//! function scopes live in range indexes, per-document state in the
//! [`DocumentTable`]. Re-indexing a document stages the removal of its old
//! rows and the insertion of the new ones into a single [`WriteBatch`], so a
//! reader sees either the previous or the new version of the document.

use super::completion_index::CompletionIndex;
use super::document_table::DocumentTable;
use super::kv::{KvStore, MemoryStore, WriteBatch};
use super::name_index::NameIndex;
use super::position_index::{PositionIndex, ScopeIndex};
use super::symbol_table::{SymbolTable, SymbolTableKind, index_name, member_key};
use crate::codec::DocumentRecord;
use crate::error::StorageResult;
use crate::resolve::SymbolProvider;
use crate::symbol::{RefKind, Reference, ScopeVar, Symbol};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Schema version of every table. Bump to abandon the stored rows.
pub const TABLE_VERSION: u32 = 1;

#[derive(Debug, Clone)]
struct KindTables {
    symbols: SymbolTable,
    names: NameIndex,
    completion: CompletionIndex,
}

impl KindTables {
    fn new(store: &Arc<dyn KvStore>, kind: SymbolTableKind) -> Self {
        let name = kind.table_name();
        Self {
            symbols: SymbolTable::new(store.clone(), kind, TABLE_VERSION),
            names: NameIndex::new(store.clone(), &format!("{name}_name"), TABLE_VERSION),
            completion: CompletionIndex::new(
                store.clone(),
                &format!("{name}_completion"),
                TABLE_VERSION,
            ),
        }
    }

    fn stage_put(&self, batch: &mut WriteBatch, uri: &str, symbol: &Symbol) {
        let name = index_name(symbol);
        self.symbols.stage_put(batch, uri, &name, symbol);
        self.names.stage_put(batch, &name, uri);
        self.completion.stage_put(
            batch,
            symbol.scope().unwrap_or(""),
            completion_word(symbol),
            uri,
            &name,
        );
    }

    fn stage_remove(&self, batch: &mut WriteBatch, uri: &str, symbol: &Symbol) {
        let name = index_name(symbol);
        self.names.stage_delete(batch, &name, uri);
        self.completion.stage_delete(
            batch,
            symbol.scope().unwrap_or(""),
            completion_word(symbol),
            uri,
            &name,
        );
    }
}

/// The word a user types to reach `symbol`: the member name, or the last
/// namespace segment of a top-level name.
pub fn completion_word(symbol: &Symbol) -> &str {
    match symbol.scope() {
        Some(_) => symbol.name(),
        None => symbol.short_name(),
    }
}

/// Sorts candidates by uri then declaration offset and drops repeats.
pub fn sort_candidates(symbols: &mut Vec<Symbol>) {
    symbols.sort_by(|a, b| {
        (a.location().uri(), a.location().start(), a.name())
            .cmp(&(b.location().uri(), b.location().start(), b.name()))
    });
    symbols.dedup();
}

pub struct IndexEngine {
    store: Arc<dyn KvStore>,
    kinds: [KindTables; 6],
    references: PositionIndex,
    scopes: ScopeIndex,
    documents: DocumentTable,
}

impl std::fmt::Debug for IndexEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexEngine")
            .field("tables", &self.kinds.len())
            .finish()
    }
}

impl IndexEngine {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        let kinds = SymbolTableKind::ALL.map(|kind| KindTables::new(&store, kind));
        Self {
            references: PositionIndex::new(store.clone(), "reference", TABLE_VERSION),
            scopes: ScopeIndex::new(store.clone(), "scope_var", TABLE_VERSION),
            documents: DocumentTable::new(store.clone(), TABLE_VERSION),
            kinds,
            store,
        }
    }

    /// Volatile engine, used for tests and `persist = false`.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Engine persisted under `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self::new(Arc::new(MemoryStore::open(dir)?)))
    }

    fn tables(&self, kind: SymbolTableKind) -> &KindTables {
        &self.kinds[kind.index()]
    }

    /// Symbols of every kind declared by `uri`.
    pub fn symbols_of(&self, uri: &str) -> StorageResult<Vec<Symbol>> {
        let mut symbols = Vec::new();
        for tables in &self.kinds {
            symbols.extend(tables.symbols.get_by_doc(uri)?);
        }
        Ok(symbols)
    }

    /// Symbols of one kind declared by `uri`.
    pub fn symbols_of_kind(&self, uri: &str, kind: SymbolTableKind) -> StorageResult<Vec<Symbol>> {
        self.tables(kind).symbols.get_by_doc(uri)
    }

    fn stage_remove(&self, batch: &mut WriteBatch, uri: &str) -> StorageResult<()> {
        for tables in &self.kinds {
            for symbol in tables.symbols.get_by_doc(uri)? {
                tables.stage_remove(batch, uri, &symbol);
            }
            tables.symbols.stage_remove_doc(batch, uri);
        }
        self.references.stage_remove_doc(batch, uri);
        self.scopes.stage_remove_doc(batch, uri);
        self.documents.stage_delete(batch, uri);
        Ok(())
    }

    /// Replaces everything stored for `record.uri` in one atomic batch.
    pub fn replace_document(
        &self,
        record: &DocumentRecord,
        symbols: &[Symbol],
        references: &[Reference],
        scopes: &[ScopeVar],
    ) -> StorageResult<()> {
        let uri = record.uri.as_str();
        let mut batch = WriteBatch::new();
        self.stage_remove(&mut batch, uri)?;

        for symbol in symbols {
            if let Some(kind) = SymbolTableKind::of(symbol) {
                self.tables(kind).stage_put(&mut batch, uri, symbol);
            }
        }

        let mut seq = 0u32;
        for reference in references {
            if reference.location.is_empty() {
                continue;
            }
            if let Some(range) = reference.range() {
                self.references
                    .stage_put(&mut batch, uri, range, seq, reference);
                seq += 1;
            }
        }

        for (seq, scope) in scopes.iter().enumerate() {
            if let Some(range) = scope.range() {
                self.scopes
                    .stage_put(&mut batch, uri, range, seq as u32, scope);
            }
        }

        self.documents.stage_put(&mut batch, record);

        debug!(
            uri,
            symbols = symbols.len(),
            references = seq,
            ops = batch.len(),
            "replacing document"
        );
        self.store.apply(batch)
    }

    /// Deletes every row belonging to `uri`. Returns whether it was indexed.
    pub fn remove_document(&self, uri: &str) -> StorageResult<bool> {
        let existed = self.documents.get(uri)?.is_some();
        let mut batch = WriteBatch::new();
        self.stage_remove(&mut batch, uri)?;
        self.store.apply(batch)?;
        debug!(uri, existed, "removed document");
        Ok(existed)
    }

    pub fn document(&self, uri: &str) -> StorageResult<Option<DocumentRecord>> {
        self.documents.get(uri)
    }

    pub fn document_uris(&self) -> StorageResult<Vec<String>> {
        self.documents.uris()
    }

    /// Innermost reference containing `offset`.
    pub fn find_at(&self, uri: &str, offset: u32) -> StorageResult<Option<Reference>> {
        self.references.find_at(uri, offset)
    }

    /// Innermost argument list containing `offset`.
    pub fn find_enclosing_call(&self, uri: &str, offset: u32) -> StorageResult<Option<Reference>> {
        self.references
            .find_where(uri, offset, |r| r.ref_kind == RefKind::ArgumentList)
    }

    pub fn references_of(&self, uri: &str) -> StorageResult<Vec<Reference>> {
        self.references.get_by_doc(uri)
    }

    /// Function scopes of `uri`, ordered by range end.
    pub fn scopes_of(&self, uri: &str) -> StorageResult<Vec<ScopeVar>> {
        self.scopes.get_by_doc(uri)
    }

    /// Every declaration of `uri` in source order.
    pub fn document_symbols(&self, uri: &str) -> StorageResult<Vec<Symbol>> {
        let mut symbols = self.symbols_of(uri)?;
        symbols.sort_by_key(|s| (s.location().start(), s.location().range.map(|r| r.end)));
        Ok(symbols)
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.store.flush()
    }
}

impl SymbolProvider for IndexEngine {
    fn find(&self, kind: SymbolTableKind, name: &str) -> StorageResult<Vec<Symbol>> {
        let tables = self.tables(kind);
        let mut found = Vec::new();
        for uri in tables.names.find(name)? {
            if let Some(symbol) = tables.symbols.get(&uri, name)? {
                found.push(symbol);
            }
        }
        sort_candidates(&mut found);
        Ok(found)
    }

    fn members_of(&self, kind: SymbolTableKind, class: &str) -> StorageResult<Vec<Symbol>> {
        let tables = self.tables(kind);
        let mut found = Vec::new();
        for (name, uri) in tables.names.find_prefix(&member_key(class, ""))? {
            if let Some(symbol) = tables.symbols.get(&uri, &name)? {
                found.push(symbol);
            }
        }
        sort_candidates(&mut found);
        Ok(found)
    }

    fn search(
        &self,
        kind: SymbolTableKind,
        scope: &str,
        keyword: &str,
        limit: usize,
    ) -> StorageResult<Vec<Symbol>> {
        let tables = self.tables(kind);
        let mut found = Vec::new();
        let mut seen = HashSet::new();
        for entry in tables.completion.search(scope, keyword, limit)? {
            if !seen.insert((entry.uri.clone(), entry.name.clone())) {
                continue;
            }
            if let Some(symbol) = tables.symbols.get(&entry.uri, &entry.name)? {
                found.push(symbol);
            }
        }
        sort_candidates(&mut found);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{
        ClassLike, Function, ImportTable, Location, Method, Modifiers, Range, Signature,
        TypeComposite, TypeName, Visibility,
    };

    fn record(uri: &str) -> DocumentRecord {
        DocumentRecord {
            uri: uri.to_string(),
            mtime: 1,
            content_hash: "h".to_string(),
            indexed_at: 1,
            imports: ImportTable::new(),
            globals: ScopeVar::new(Location::empty()),
        }
    }

    fn function(uri: &str, name: &str, ret: &str) -> Symbol {
        Symbol::Function(Function {
            name: name.to_string(),
            location: Location::new(uri, Range::new(6, 40)),
            signature: Signature {
                parameters: Vec::new(),
                return_types: TypeComposite::single(TypeName::new(ret)),
            },
            description: None,
        })
    }

    fn method(uri: &str, class: &str, name: &str) -> Symbol {
        Symbol::Method(Method {
            name: name.to_string(),
            scope: class.to_string(),
            location: Location::new(uri, Range::new(20, 30)),
            modifiers: Modifiers::empty(),
            visibility: Visibility::PUBLIC,
            signature: Signature::default(),
            description: None,
        })
    }

    fn call(uri: &str, name: &str) -> Reference {
        Reference::new(
            RefKind::Function,
            TypeComposite::single(TypeName::new(name)),
            Location::new(uri, Range::new(0, 3)),
        )
    }

    #[test]
    fn test_replace_and_lookup() {
        let engine = IndexEngine::in_memory();
        let uri = "file:///a.php";
        let class = Symbol::Class(ClassLike::new("App\\User", Location::new(uri, Range::new(0, 50))));
        engine
            .replace_document(
                &record(uri),
                &[class.clone(), method(uri, "App\\User", "getName")],
                &[call(uri, "foo")],
                &[],
            )
            .unwrap();

        assert_eq!(engine.find(SymbolTableKind::Classes, "App\\User").unwrap(), vec![class]);
        assert_eq!(engine.members_of(SymbolTableKind::Methods, "App\\User").unwrap().len(), 1);
        assert!(engine.members_of(SymbolTableKind::Methods, "App\\Use").unwrap().is_empty());

        let hits = engine.search(SymbolTableKind::Methods, "App\\User", "na", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "getName");

        let hits = engine.search(SymbolTableKind::Classes, "", "us", 10).unwrap();
        assert_eq!(hits.len(), 1);

        assert_eq!(engine.find_at(uri, 2).unwrap().map(|r| r.ref_kind), Some(RefKind::Function));
    }

    #[test]
    fn test_remove_document_clears_every_index() {
        let engine = IndexEngine::in_memory();
        let uri = "file:///a.php";
        engine
            .replace_document(
                &record(uri),
                &[function(uri, "foo", "string"), method(uri, "A", "bar")],
                &[call(uri, "foo")],
                &[],
            )
            .unwrap();

        assert!(engine.remove_document(uri).unwrap());
        assert!(engine.find(SymbolTableKind::Functions, "foo").unwrap().is_empty());
        assert!(engine.search(SymbolTableKind::Functions, "", "f", 10).unwrap().is_empty());
        assert!(engine.members_of(SymbolTableKind::Methods, "A").unwrap().is_empty());
        assert!(engine.find_at(uri, 1).unwrap().is_none());
        assert!(engine.document(uri).unwrap().is_none());
        assert!(!engine.remove_document(uri).unwrap());
    }

    #[test]
    fn test_reindex_converges_to_fresh_state() {
        let uri = "file:///a.php";
        let fresh = IndexEngine::in_memory();
        fresh
            .replace_document(&record(uri), &[function(uri, "bar", "int")], &[], &[])
            .unwrap();

        let store = Arc::new(MemoryStore::new());
        let reused = IndexEngine::new(store.clone());
        reused
            .replace_document(&record(uri), &[function(uri, "foo", "string")], &[call(uri, "foo")], &[])
            .unwrap();
        reused
            .replace_document(&record(uri), &[function(uri, "bar", "int")], &[], &[])
            .unwrap();

        assert_eq!(store.entries(), fresh.store.scan_prefix(b"").unwrap());
    }

    #[test]
    fn test_ties_sorted_by_uri_then_offset() {
        let engine = IndexEngine::in_memory();
        for uri in ["file:///b.php", "file:///a.php"] {
            engine
                .replace_document(&record(uri), &[function(uri, "dup", "int")], &[], &[])
                .unwrap();
        }
        let uris: Vec<String> = engine
            .find(SymbolTableKind::Functions, "dup")
            .unwrap()
            .iter()
            .map(|s| s.location().uri().to_string())
            .collect();
        assert_eq!(uris, vec!["file:///a.php", "file:///b.php"]);
    }
}
