//! One [`DocumentRecord`] per indexed uri.

use super::kv::{KvStore, WriteBatch};
use super::table::Table;
use crate::codec::{DocumentRecord, from_bytes, to_bytes};
use crate::error::StorageResult;
use std::ops::ControlFlow;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DocumentTable {
    table: Table,
}

impl DocumentTable {
    pub fn new(store: Arc<dyn KvStore>, version: u32) -> Self {
        Self {
            table: Table::new(store, "document", version),
        }
    }

    pub fn get(&self, uri: &str) -> StorageResult<Option<DocumentRecord>> {
        match self.table.get(uri.as_bytes())? {
            Some(bytes) => Ok(Some(from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn stage_put(&self, batch: &mut WriteBatch, record: &DocumentRecord) {
        self.table
            .stage_put(batch, record.uri.as_bytes(), to_bytes(record));
    }

    pub fn stage_delete(&self, batch: &mut WriteBatch, uri: &str) {
        self.table.stage_delete(batch, uri.as_bytes());
    }

    /// All indexed uris in key order.
    pub fn uris(&self) -> StorageResult<Vec<String>> {
        let mut uris = Vec::new();
        self.table.scan_from(b"", b"", &mut |key, _| {
            uris.push(String::from_utf8_lossy(key).into_owned());
            ControlFlow::Continue(())
        })?;
        Ok(uris)
    }
}
