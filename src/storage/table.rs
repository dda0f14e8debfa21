//! Named, versioned key spaces over one [`KvStore`].

use super::kv::{KvStore, Visitor, WriteBatch};
use crate::error::StorageResult;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Separator between key components.
pub const SEP: u8 = 0x00;

/// Joins key components with [`SEP`].
pub fn join_key(parts: &[&str]) -> Vec<u8> {
    let mut key = Vec::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEP);
        }
        key.extend_from_slice(part.as_bytes());
    }
    key
}

/// Every key of a table is prefixed with `<name>@<version>\0`. Bumping the
/// version orphans the old rows instead of migrating them.
#[derive(Clone)]
pub struct Table {
    store: Arc<dyn KvStore>,
    prefix: Vec<u8>,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("prefix", &String::from_utf8_lossy(&self.prefix))
            .finish()
    }
}

impl Table {
    pub fn new(store: Arc<dyn KvStore>, name: &str, version: u32) -> Self {
        let mut prefix = format!("{name}@{version}").into_bytes();
        prefix.push(SEP);
        Self { store, prefix }
    }

    fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(&self.prefix);
        full.extend_from_slice(key);
        full
    }

    pub fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.store.get(&self.full_key(key))
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.store.put(&self.full_key(key), value)
    }

    pub fn delete(&self, key: &[u8]) -> StorageResult<bool> {
        self.store.delete(&self.full_key(key))
    }

    /// Rows whose table-relative key starts with `prefix`, keys stripped of
    /// the table namespace.
    pub fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut rows = Vec::new();
        self.scan_from(prefix, prefix, &mut |key, value| {
            rows.push((key.to_vec(), value.to_vec()));
            ControlFlow::Continue(())
        })?;
        Ok(rows)
    }

    /// Visits table-relative keys `>= start` that begin with `prefix`.
    pub fn scan_from(&self, start: &[u8], prefix: &[u8], visit: Visitor<'_>) -> StorageResult<()> {
        let ns = self.prefix.len();
        self.store.scan_from(
            &self.full_key(start),
            &self.full_key(prefix),
            &mut |key, value| visit(&key[ns..], value),
        )
    }

    pub fn delete_prefix(&self, prefix: &[u8]) -> StorageResult<usize> {
        self.store.delete_prefix(&self.full_key(prefix))
    }

    pub fn stage_put(&self, batch: &mut WriteBatch, key: &[u8], value: Vec<u8>) {
        batch.put(self.full_key(key), value);
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, key: &[u8]) {
        batch.delete(self.full_key(key));
    }

    pub fn stage_delete_prefix(&self, batch: &mut WriteBatch, prefix: &[u8]) {
        batch.delete_prefix(self.full_key(prefix));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    #[test]
    fn test_tables_do_not_see_each_other() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let classes = Table::new(store.clone(), "class", 1);
        let functions = Table::new(store.clone(), "function", 1);

        classes.put(b"a", b"1").unwrap();
        functions.put(b"a", b"2").unwrap();

        assert_eq!(classes.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(functions.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(classes.scan_prefix(b"").unwrap().len(), 1);
    }

    #[test]
    fn test_version_bump_abandons_rows() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        Table::new(store.clone(), "class", 1).put(b"a", b"1").unwrap();

        let bumped = Table::new(store, "class", 2);
        assert_eq!(bumped.get(b"a").unwrap(), None);
    }

    #[test]
    fn test_scan_strips_namespace() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let table = Table::new(store, "name", 1);
        table.put(&join_key(&["foo", "file:///a.php"]), b"x").unwrap();

        let rows = table.scan_prefix(&join_key(&["foo", ""])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, b"foo\0file:///a.php".to_vec());
    }
}
