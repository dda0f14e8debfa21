//! Open editor buffers layered over the index engine.
//!
//! Buffers never reach the store. Lookups take the stored rows, hide those
//! of documents that are open, and add the matching symbols of the open
//! buffers instead.

use crate::document::SourceDocument;
use crate::error::StorageResult;
use crate::resolve::SymbolProvider;
use crate::storage::{
    IndexEngine, SymbolTableKind, completion_word, index_name, index_tokens, sort_candidates,
};
use crate::symbol::Symbol;
use dashmap::DashMap;
use std::sync::Arc;

pub type OpenDocuments = DashMap<String, Arc<SourceDocument>>;

pub struct OpenOverlay<'a> {
    engine: &'a IndexEngine,
    open: &'a OpenDocuments,
}

impl<'a> OpenOverlay<'a> {
    pub fn new(engine: &'a IndexEngine, open: &'a OpenDocuments) -> Self {
        Self { engine, open }
    }

    fn open_symbols(&self, kind: SymbolTableKind, keep: impl Fn(&Symbol) -> bool) -> Vec<Symbol> {
        let mut found = Vec::new();
        for doc in self.open.iter() {
            found.extend(
                doc.symbols
                    .iter()
                    .filter(|s| SymbolTableKind::of(s) == Some(kind) && keep(*s))
                    .cloned(),
            );
        }
        found
    }

    /// Stored rows of `kind` that belong to open documents.
    fn shadowed(&self, kind: SymbolTableKind) -> StorageResult<usize> {
        let uris: Vec<String> = self.open.iter().map(|doc| doc.key().clone()).collect();
        let mut count = 0;
        for uri in uris {
            count += self.engine.symbols_of_kind(&uri, kind)?.len();
        }
        Ok(count)
    }

    fn merge(&self, stored: Vec<Symbol>, open: Vec<Symbol>) -> Vec<Symbol> {
        let mut found: Vec<Symbol> = stored
            .into_iter()
            .filter(|s| !self.open.contains_key(s.location().uri()))
            .chain(open)
            .collect();
        sort_candidates(&mut found);
        found
    }
}

impl SymbolProvider for OpenOverlay<'_> {
    fn find(&self, kind: SymbolTableKind, name: &str) -> StorageResult<Vec<Symbol>> {
        if self.open.is_empty() {
            return self.engine.find(kind, name);
        }
        let open = self.open_symbols(kind, |s| index_name(s) == name);
        Ok(self.merge(self.engine.find(kind, name)?, open))
    }

    fn members_of(&self, kind: SymbolTableKind, class: &str) -> StorageResult<Vec<Symbol>> {
        if self.open.is_empty() {
            return self.engine.members_of(kind, class);
        }
        let open = self.open_symbols(kind, |s| s.scope() == Some(class));
        Ok(self.merge(self.engine.members_of(kind, class)?, open))
    }

    fn search(
        &self,
        kind: SymbolTableKind,
        scope: &str,
        keyword: &str,
        limit: usize,
    ) -> StorageResult<Vec<Symbol>> {
        if self.open.is_empty() {
            return self.engine.search(kind, scope, keyword, limit);
        }
        let keyword = keyword.to_lowercase();
        let open = self.open_symbols(kind, |s| {
            s.scope().unwrap_or("") == scope
                && index_tokens(completion_word(s))
                    .iter()
                    .any(|token| token.starts_with(&keyword))
        });
        let fetch = limit.saturating_add(self.shadowed(kind)?);
        let mut found = self.merge(self.engine.search(kind, scope, &keyword, fetch)?, open);
        found.truncate(limit);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(uri: &str, source: &str) -> Arc<SourceDocument> {
        Arc::new(SourceDocument::from_source(uri, source).unwrap())
    }

    fn store(engine: &IndexEngine, doc: &SourceDocument) {
        engine
            .replace_document(&doc.record(), &doc.symbols, &doc.references, &doc.scopes)
            .unwrap();
    }

    fn names(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_open_buffer_replaces_stored_rows() {
        let engine = IndexEngine::in_memory();
        store(&engine, &document("file:///a.php", "<?php\nfunction old_name() {}\n"));
        store(&engine, &document("file:///b.php", "<?php\nfunction other() {}\n"));

        let open = OpenDocuments::new();
        open.insert(
            "file:///a.php".to_string(),
            document("file:///a.php", "<?php\nfunction new_name() {}\n"),
        );
        let overlay = OpenOverlay::new(&engine, &open);

        assert!(overlay.find(SymbolTableKind::Functions, "old_name").unwrap().is_empty());
        assert_eq!(
            names(&overlay.find(SymbolTableKind::Functions, "new_name").unwrap()),
            vec!["new_name"]
        );
        assert_eq!(
            names(&overlay.find(SymbolTableKind::Functions, "other").unwrap()),
            vec!["other"]
        );

        let all = overlay.search(SymbolTableKind::Functions, "", "", 10).unwrap();
        assert_eq!(names(&all), vec!["new_name", "other"]);
        // The stored copy is untouched
        assert_eq!(
            names(&engine.find(SymbolTableKind::Functions, "old_name").unwrap()),
            vec!["old_name"]
        );
    }

    #[test]
    fn test_members_and_word_search_over_open_buffers() {
        let engine = IndexEngine::in_memory();
        let open = OpenDocuments::new();
        open.insert(
            "untitled:1".to_string(),
            document(
                "untitled:1",
                "<?php\nclass Cart {\n    public function addItem() {}\n    public function total() {}\n}\n",
            ),
        );
        let overlay = OpenOverlay::new(&engine, &open);

        let members = overlay.members_of(SymbolTableKind::Methods, "Cart").unwrap();
        assert_eq!(names(&members), vec!["addItem", "total"]);

        let found = overlay.search(SymbolTableKind::Methods, "Cart", "ITE", 10).unwrap();
        assert_eq!(names(&found), vec!["addItem"]);
        assert!(overlay.search(SymbolTableKind::Methods, "Other", "", 10).unwrap().is_empty());
        assert_eq!(overlay.search(SymbolTableKind::Methods, "Cart", "", 1).unwrap().len(), 1);
    }
}
