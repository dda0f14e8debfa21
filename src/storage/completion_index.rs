//! Prefix search over word-separated names.
//!
//! Key layout: `<scope>@<token>\0<uri>\0<name>`, value a
//! [`CompletionEntry`]. `scope` is the owning class for members and empty
//! for top-level symbols; tokens are stored lower-cased.

use super::kv::{KvStore, WriteBatch};
use super::table::{SEP, Table};
use super::word_separator::index_tokens;
use crate::codec::{CompletionEntry, from_bytes, to_bytes};
use crate::error::StorageResult;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CompletionIndex {
    table: Table,
}

fn key(scope: &str, token: &str, uri: &str, name: &str) -> Vec<u8> {
    let mut key = format!("{scope}@{token}").into_bytes();
    key.push(SEP);
    key.extend_from_slice(uri.as_bytes());
    key.push(SEP);
    key.extend_from_slice(name.as_bytes());
    key
}

impl CompletionIndex {
    pub fn new(store: Arc<dyn KvStore>, name: &str, version: u32) -> Self {
        Self {
            table: Table::new(store, name, version),
        }
    }

    /// Indexes `name` under every token of `word` (the part users type).
    pub fn stage_put(&self, batch: &mut WriteBatch, scope: &str, word: &str, uri: &str, name: &str) {
        let entry = to_bytes(&CompletionEntry {
            uri: uri.to_string(),
            name: name.to_string(),
        });
        for token in index_tokens(word) {
            self.table
                .stage_put(batch, &key(scope, &token, uri, name), entry.clone());
        }
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, scope: &str, word: &str, uri: &str, name: &str) {
        for token in index_tokens(word) {
            self.table.stage_delete(batch, &key(scope, &token, uri, name));
        }
    }

    /// At most `limit` distinct entries whose token starts with `keyword`.
    pub fn search(&self, scope: &str, keyword: &str, limit: usize) -> StorageResult<Vec<CompletionEntry>> {
        let prefix = format!("{scope}@{}", keyword.to_lowercase()).into_bytes();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut failure = None;

        if limit == 0 {
            return Ok(out);
        }

        self.table.scan_from(&prefix, &prefix, &mut |_, value| {
            match from_bytes::<CompletionEntry>(value) {
                Ok(entry) => {
                    if seen.insert(entry.clone()) {
                        out.push(entry);
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    return ControlFlow::Break(());
                }
            }
            if out.len() >= limit {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    fn index_with(names: &[(&str, &str, &str)]) -> (Arc<dyn KvStore>, CompletionIndex) {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let index = CompletionIndex::new(store.clone(), "completion", 1);
        let mut batch = WriteBatch::new();
        for (scope, word, uri) in names {
            let name = if scope.is_empty() {
                word.to_string()
            } else {
                format!("{scope}@{word}")
            };
            index.stage_put(&mut batch, scope, word, uri, &name);
        }
        store.apply(batch).unwrap();
        (store, index)
    }

    #[test]
    fn test_matches_inner_words() {
        let (_, index) = index_with(&[
            ("", "getUserName", "file:///a.php"),
            ("", "setUserName", "file:///b.php"),
            ("", "getMail", "file:///a.php"),
        ]);

        let hits = index.search("", "user", 10).unwrap();
        let names: Vec<&str> = hits.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"getUserName"));
        assert!(names.contains(&"setUserName"));

        assert_eq!(index.search("", "GET", 10).unwrap().len(), 2);
    }

    #[test]
    fn test_scopes_are_separate() {
        let (_, index) = index_with(&[
            ("App\\User", "save", "file:///a.php"),
            ("App\\Post", "save", "file:///b.php"),
            ("", "save", "file:///c.php"),
        ]);

        let hits = index.search("App\\User", "sa", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "App\\User@save");
        assert_eq!(index.search("", "sa", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_limit_and_dedup() {
        let (_, index) = index_with(&[
            ("", "aLongCasingFunction", "file:///a.php"),
            ("", "anotherFunction", "file:///a.php"),
        ]);

        // Empty keyword hits every token; each entry is reported once
        assert_eq!(index.search("", "", 10).unwrap().len(), 2);
        assert_eq!(index.search("", "", 1).unwrap().len(), 1);
        assert!(index.search("", "", 0).unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_every_token() {
        let (store, index) = index_with(&[("", "getUserName", "file:///a.php")]);
        let mut batch = WriteBatch::new();
        index.stage_delete(&mut batch, "", "getUserName", "file:///a.php", "getUserName");
        store.apply(batch).unwrap();
        assert!(index.search("", "", 10).unwrap().is_empty());
    }
}
