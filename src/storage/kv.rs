//! Ordered key-value store abstraction and its in-memory implementation.

use super::snapshot;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// File name of the snapshot inside the index directory
pub const SNAPSHOT_FILE: &str = "store.snap";

/// One mutation in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
    DeletePrefix(Vec<u8>),
}

/// Mutations applied together; readers never observe half of a batch.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put(key, value));
    }

    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete(key));
    }

    pub fn delete_prefix(&mut self, prefix: Vec<u8>) {
        self.ops.push(BatchOp::DeletePrefix(prefix));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}

pub type Visitor<'a> = &'a mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>;

/// Byte-ordered key-value storage.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    fn delete(&self, key: &[u8]) -> StorageResult<bool>;

    /// Visits keys `>= start` in order while they still begin with `prefix`.
    fn scan_from(&self, start: &[u8], prefix: &[u8], visit: Visitor<'_>) -> StorageResult<()>;

    /// Removes every key beginning with `prefix`, returning how many went.
    fn delete_prefix(&self, prefix: &[u8]) -> StorageResult<usize>;

    fn apply(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Makes everything written so far durable.
    fn flush(&self) -> StorageResult<()>;

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut rows = Vec::new();
        self.scan_from(prefix, prefix, &mut |key, value| {
            rows.push((key.to_vec(), value.to_vec()));
            ControlFlow::Continue(())
        })?;
        Ok(rows)
    }
}

/// `BTreeMap` store, optionally backed by a snapshot file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    snapshot: Option<PathBuf>,
    dirty: AtomicBool,
}

impl MemoryStore {
    /// Volatile store, nothing is written to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store persisted under `dir`, loading the existing snapshot if any.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let path = dir.as_ref().join(SNAPSHOT_FILE);
        let entries = if path.exists() {
            let entries = snapshot::read(&path)?;
            info!(path = %path.display(), entries = entries.len(), "loaded index snapshot");
            entries
        } else {
            debug!(path = %path.display(), "no snapshot yet, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            snapshot: Some(path),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every row, in key order.
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }
}

fn remove_prefix(map: &mut BTreeMap<Vec<u8>, Vec<u8>>, prefix: &[u8]) -> usize {
    let doomed: Vec<Vec<u8>> = map
        .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, _)| key.clone())
        .collect();
    for key in &doomed {
        map.remove(key);
    }
    doomed.len()
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        self.mark_dirty();
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StorageResult<bool> {
        let removed = self.entries.write().remove(key).is_some();
        if removed {
            self.mark_dirty();
        }
        Ok(removed)
    }

    fn scan_from(&self, start: &[u8], prefix: &[u8], visit: Visitor<'_>) -> StorageResult<()> {
        let entries = self.entries.read();
        for (key, value) in entries.range::<[u8], _>((Bound::Included(start), Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                break;
            }
            if visit(key, value).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn delete_prefix(&self, prefix: &[u8]) -> StorageResult<usize> {
        let removed = remove_prefix(&mut self.entries.write(), prefix);
        if removed > 0 {
            self.mark_dirty();
        }
        Ok(removed)
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.write();
        for op in batch.ops {
            match op {
                BatchOp::Put(key, value) => {
                    entries.insert(key, value);
                }
                BatchOp::Delete(key) => {
                    entries.remove(&key);
                }
                BatchOp::DeletePrefix(prefix) => {
                    remove_prefix(&mut entries, &prefix);
                }
            }
        }
        drop(entries);
        self.mark_dirty();
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let entries = self.entries.read();
        if let Err(e) = snapshot::write(path, &entries) {
            self.mark_dirty();
            return Err(e);
        }
        debug!(path = %path.display(), entries = entries.len(), "wrote index snapshot");
        Ok(())
    }
}
