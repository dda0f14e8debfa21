//! Exact-name lookup: `<name>\0<uri>` -> uri.

use super::kv::{KvStore, WriteBatch};
use super::table::{SEP, Table, join_key};
use crate::error::{CodecError, StorageResult};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NameIndex {
    table: Table,
}

impl NameIndex {
    pub fn new(store: Arc<dyn KvStore>, name: &str, version: u32) -> Self {
        Self {
            table: Table::new(store, name, version),
        }
    }

    /// Documents declaring exactly `name`.
    pub fn find(&self, name: &str) -> StorageResult<Vec<String>> {
        self.table
            .scan_prefix(&join_key(&[name, ""]))?
            .into_iter()
            .map(|(_, uri)| String::from_utf8(uri).map_err(|_| CodecError::InvalidUtf8.into()))
            .collect()
    }

    /// `(name, uri)` pairs for every name starting with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> StorageResult<Vec<(String, String)>> {
        let mut out = Vec::new();
        for (key, _) in self.table.scan_prefix(prefix.as_bytes())? {
            let split = key
                .iter()
                .position(|b| *b == SEP)
                .ok_or(CodecError::InvalidKey("name index key without separator"))?;
            let name = std::str::from_utf8(&key[..split]).map_err(|_| CodecError::InvalidUtf8)?;
            let uri =
                std::str::from_utf8(&key[split + 1..]).map_err(|_| CodecError::InvalidUtf8)?;
            out.push((name.to_string(), uri.to_string()));
        }
        Ok(out)
    }

    pub fn stage_put(&self, batch: &mut WriteBatch, name: &str, uri: &str) {
        self.table
            .stage_put(batch, &join_key(&[name, uri]), uri.as_bytes().to_vec());
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, name: &str, uri: &str) {
        self.table.stage_delete(batch, &join_key(&[name, uri]));
    }
}
