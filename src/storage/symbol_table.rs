//! Primary per-kind symbol tables keyed `<uri>\0<name>`.

use super::kv::{KvStore, WriteBatch};
use super::table::{SEP, Table, join_key};
use crate::codec::{from_bytes, to_bytes};
use crate::error::StorageResult;
use crate::symbol::Symbol;
use std::sync::Arc;

/// Which primary table a symbol lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolTableKind {
    Classes,
    Functions,
    Constants,
    Methods,
    Properties,
    ClassConstants,
}

impl SymbolTableKind {
    pub const ALL: [SymbolTableKind; 6] = [
        SymbolTableKind::Classes,
        SymbolTableKind::Functions,
        SymbolTableKind::Constants,
        SymbolTableKind::Methods,
        SymbolTableKind::Properties,
        SymbolTableKind::ClassConstants,
    ];

    pub const TOP_LEVEL: [SymbolTableKind; 3] = [
        SymbolTableKind::Classes,
        SymbolTableKind::Functions,
        SymbolTableKind::Constants,
    ];

    pub const MEMBERS: [SymbolTableKind; 3] = [
        SymbolTableKind::Methods,
        SymbolTableKind::Properties,
        SymbolTableKind::ClassConstants,
    ];

    /// `None` for synthetic symbols that are never stored.
    pub fn of(symbol: &Symbol) -> Option<Self> {
        let kind = match symbol {
            Symbol::Class(_) | Symbol::Interface(_) | Symbol::Trait(_) => Self::Classes,
            Symbol::Function(_) => Self::Functions,
            Symbol::Constant(_) | Symbol::DefineConstant(_) => Self::Constants,
            Symbol::Method(_) => Self::Methods,
            Symbol::Property(_) => Self::Properties,
            Symbol::ClassConstant(_) => Self::ClassConstants,
            Symbol::Variable(_) => return None,
        };
        Some(kind)
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Self::Classes => "class",
            Self::Functions => "function",
            Self::Constants => "constant",
            Self::Methods => "method",
            Self::Properties => "property",
            Self::ClassConstants => "class_constant",
        }
    }

    /// Position in [`SymbolTableKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_member(self) -> bool {
        Self::MEMBERS.contains(&self)
    }
}

/// `Class@member`, the key name of a member.
pub fn member_key(class: &str, member: &str) -> String {
    format!("{class}@{member}")
}

/// Name a symbol is stored and indexed under.
pub fn index_name(symbol: &Symbol) -> String {
    match symbol.scope() {
        Some(scope) => member_key(scope, symbol.name()),
        None => symbol.name().to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    table: Table,
}

impl SymbolTable {
    pub fn new(store: Arc<dyn KvStore>, kind: SymbolTableKind, version: u32) -> Self {
        Self {
            table: Table::new(store, kind.table_name(), version),
        }
    }

    fn doc_prefix(uri: &str) -> Vec<u8> {
        let mut prefix = uri.as_bytes().to_vec();
        prefix.push(SEP);
        prefix
    }

    pub fn get(&self, uri: &str, name: &str) -> StorageResult<Option<Symbol>> {
        match self.table.get(&join_key(&[uri, name]))? {
            Some(bytes) => Ok(Some(from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every symbol of this kind declared in `uri`, in key order.
    pub fn get_by_doc(&self, uri: &str) -> StorageResult<Vec<Symbol>> {
        self.table
            .scan_prefix(&Self::doc_prefix(uri))?
            .into_iter()
            .map(|(_, bytes)| from_bytes(&bytes).map_err(Into::into))
            .collect()
    }

    pub fn stage_put(&self, batch: &mut WriteBatch, uri: &str, name: &str, symbol: &Symbol) {
        self.table
            .stage_put(batch, &join_key(&[uri, name]), to_bytes(symbol));
    }

    pub fn stage_remove_doc(&self, batch: &mut WriteBatch, uri: &str) {
        self.table.stage_delete_prefix(batch, &Self::doc_prefix(uri));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;
    use crate::symbol::{ClassLike, Location, Range};

    #[test]
    fn test_put_get_by_doc() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let table = SymbolTable::new(store.clone(), SymbolTableKind::Classes, 1);

        let a = Symbol::Class(ClassLike::new(
            "A",
            Location::new("file:///a.php", Range::new(0, 10)),
        ));
        let b = Symbol::Class(ClassLike::new(
            "B",
            Location::new("file:///a.php", Range::new(11, 20)),
        ));
        let other = Symbol::Class(ClassLike::new(
            "A",
            Location::new("file:///a.php.bak", Range::new(0, 10)),
        ));

        let mut batch = WriteBatch::new();
        table.stage_put(&mut batch, "file:///a.php", "A", &a);
        table.stage_put(&mut batch, "file:///a.php", "B", &b);
        table.stage_put(&mut batch, "file:///a.php.bak", "A", &other);
        store.apply(batch).unwrap();

        assert_eq!(table.get("file:///a.php", "A").unwrap(), Some(a.clone()));
        assert_eq!(table.get_by_doc("file:///a.php").unwrap(), vec![a, b]);

        let mut batch = WriteBatch::new();
        table.stage_remove_doc(&mut batch, "file:///a.php");
        store.apply(batch).unwrap();
        assert!(table.get_by_doc("file:///a.php").unwrap().is_empty());
        assert_eq!(table.get_by_doc("file:///a.php.bak").unwrap(), vec![other]);
    }

    #[test]
    fn test_index_name() {
        let class = Symbol::Class(ClassLike::new("App\\User", Location::empty()));
        assert_eq!(index_name(&class), "App\\User");
        assert_eq!(member_key("App\\User", "save"), "App\\User@save");
        assert_eq!(SymbolTableKind::of(&class), Some(SymbolTableKind::Classes));
    }
}
