//! Records addressed by their source range.
//!
//! Keys are `(uri, end, -start, seq)` tuples encoded with [`KeyBuilder`].
//! Seeking to `(uri, offset)` lands on the first range ending at or after
//! the offset; among ranges with the same end the one starting later (the
//! inner one) sorts first. The first visited entry that also starts at or
//! before the offset is therefore the innermost range containing it.

use super::kv::{KvStore, WriteBatch};
use super::table::Table;
use crate::codec::{Decode, Encode, KeyBuilder, from_bytes, to_bytes};
use crate::error::{CodecError, StorageResult};
use crate::symbol::{Range, Reference, ScopeVar};
use std::marker::PhantomData;
use std::ops::ControlFlow;
use std::sync::Arc;

/// References of every document, addressable by offset.
pub type PositionIndex = RangeIndex<Reference>;

/// Function-level variable scopes, addressable by offset.
pub type ScopeIndex = RangeIndex<ScopeVar>;

pub struct RangeIndex<T> {
    table: Table,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RangeIndex<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for RangeIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeIndex").field("table", &self.table).finish()
    }
}

fn doc_prefix(uri: &str) -> Vec<u8> {
    KeyBuilder::new().push_str(uri).finish()
}

fn to_key_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

impl<T: Encode + Decode> RangeIndex<T> {
    pub fn new(store: Arc<dyn KvStore>, name: &str, version: u32) -> Self {
        Self {
            table: Table::new(store, name, version),
            _record: PhantomData,
        }
    }

    /// `seq` keeps records sharing one range apart.
    pub fn stage_put(&self, batch: &mut WriteBatch, uri: &str, range: Range, seq: u32, record: &T) {
        let key = KeyBuilder::new()
            .push_str(uri)
            .push_i32(to_key_int(range.end))
            .push_i32(-to_key_int(range.start))
            .push_i32(to_key_int(seq))
            .finish();
        self.table.stage_put(batch, &key, to_bytes(record));
    }

    pub fn stage_remove_doc(&self, batch: &mut WriteBatch, uri: &str) {
        self.table.stage_delete_prefix(batch, &doc_prefix(uri));
    }

    /// Innermost record whose range contains `offset`.
    pub fn find_at(&self, uri: &str, offset: u32) -> StorageResult<Option<T>> {
        self.find_where(uri, offset, |_| true)
    }

    /// Innermost record containing `offset` that satisfies `accept`.
    pub fn find_where(
        &self,
        uri: &str,
        offset: u32,
        mut accept: impl FnMut(&T) -> bool,
    ) -> StorageResult<Option<T>> {
        let prefix = doc_prefix(uri);
        let start = KeyBuilder::new()
            .push_str(uri)
            .push_i32(to_key_int(offset))
            .finish();

        let mut found = None;
        let mut failure = None;
        self.table.scan_from(&start, &prefix, &mut |key, value| {
            let range_start = match decode_start(&key[prefix.len()..]) {
                Ok(range_start) => range_start,
                Err(e) => {
                    failure = Some(e);
                    return ControlFlow::Break(());
                }
            };
            if range_start > offset {
                return ControlFlow::Continue(());
            }
            match from_bytes::<T>(value) {
                Ok(record) if accept(&record) => {
                    found = Some(record);
                    ControlFlow::Break(())
                }
                Ok(_) => ControlFlow::Continue(()),
                Err(e) => {
                    failure = Some(e);
                    ControlFlow::Break(())
                }
            }
        })?;

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(found),
        }
    }

    /// Every record of `uri`, ordered by range end.
    pub fn get_by_doc(&self, uri: &str) -> StorageResult<Vec<T>> {
        self.table
            .scan_prefix(&doc_prefix(uri))?
            .into_iter()
            .map(|(_, bytes)| from_bytes(&bytes).map_err(Into::into))
            .collect()
    }
}

/// Reads the range start out of the `(end, -start, seq)` key tail.
fn decode_start(tail: &[u8]) -> Result<u32, CodecError> {
    let mut reader = crate::codec::KeyReader::new(tail);
    let _end = reader.read_i32()?;
    let negated = reader.read_i32()?;
    Ok(negated.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;
    use crate::symbol::{Location, RefKind, TypeComposite, TypeName};

    const URI: &str = "file:///a.php";

    fn reference(kind: RefKind, name: &str, start: u32, end: u32) -> Reference {
        Reference::new(
            kind,
            TypeComposite::single(TypeName::new(name)),
            Location::new(URI, Range::new(start, end)),
        )
    }

    fn index_with(refs: &[Reference]) -> PositionIndex {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let index = PositionIndex::new(store.clone(), "reference", 1);
        let mut batch = WriteBatch::new();
        for (seq, r) in refs.iter().enumerate() {
            let range = r.range().unwrap();
            index.stage_put(&mut batch, URI, range, seq as u32, r);
        }
        store.apply(batch).unwrap();
        index
    }

    #[test]
    fn test_find_innermost() {
        // `$a->foo($b)`: call 0..11, receiver 0..2, arguments 7..11, $b 8..10
        let call = reference(RefKind::MethodCall, "foo", 0, 11);
        let receiver = reference(RefKind::Variable, "$a", 0, 2);
        let args = reference(RefKind::ArgumentList, "foo", 7, 11);
        let arg = reference(RefKind::Variable, "$b", 8, 10);
        let index = index_with(&[call.clone(), receiver.clone(), args.clone(), arg.clone()]);

        assert_eq!(index.find_at(URI, 1).unwrap(), Some(receiver));
        assert_eq!(index.find_at(URI, 9).unwrap(), Some(arg));
        assert_eq!(index.find_at(URI, 11).unwrap(), Some(args.clone()));
        assert_eq!(index.find_at(URI, 4).unwrap(), Some(call));
        assert_eq!(index.find_at(URI, 12).unwrap(), None);

        let enclosing = index
            .find_where(URI, 9, |r| r.ref_kind == RefKind::ArgumentList)
            .unwrap();
        assert_eq!(enclosing, Some(args));
    }

    #[test]
    fn test_same_end_prefers_inner() {
        let outer = reference(RefKind::PropertyAccess, "b", 0, 5);
        let inner = reference(RefKind::Variable, "$x", 3, 5);
        let index = index_with(&[outer.clone(), inner.clone()]);

        assert_eq!(index.find_at(URI, 4).unwrap(), Some(inner));
        assert_eq!(index.find_at(URI, 1).unwrap(), Some(outer));
    }

    #[test]
    fn test_documents_are_isolated() {
        let index = index_with(&[reference(RefKind::Function, "foo", 0, 3)]);
        assert_eq!(index.find_at("file:///a.php5", 1).unwrap(), None);
        assert_eq!(index.get_by_doc(URI).unwrap().len(), 1);
    }
}
