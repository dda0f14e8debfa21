//! Turns located references into the symbols they name.
//!
//! Every resolver is a free function over a [`SymbolProvider`] (the index
//! engine in production) and the [`DocumentContext`] of the document the
//! reference was found in. Nothing here fails for a name that does not
//! exist: missing candidates come back as empty vectors.

pub mod exact;
pub mod fuzzy;
pub mod scope;
pub mod signature;

pub use exact::get_symbols_by_reference;
pub use fuzzy::search_symbols_for_reference;
pub use scope::resolve_scope;
pub use signature::get_signature_help;

use crate::codec::DocumentRecord;
use crate::error::StorageResult;
use crate::storage::{SymbolTableKind, sort_candidates};
use crate::symbol::{ImportTable, Range, Reference, ScopeVar, Symbol, TypeComposite};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Read access to indexed symbols.
pub trait SymbolProvider {
    /// Symbols stored under an exact index name (`Foo\bar`, `Foo@bar`).
    fn find(&self, kind: SymbolTableKind, name: &str) -> StorageResult<Vec<Symbol>>;

    /// Every member of `class` in the `kind` table.
    fn members_of(&self, kind: SymbolTableKind, class: &str) -> StorageResult<Vec<Symbol>>;

    /// Completion search. `scope` is the owning class, or `""` for
    /// top-level symbols.
    fn search(
        &self,
        kind: SymbolTableKind,
        scope: &str,
        keyword: &str,
        limit: usize,
    ) -> StorageResult<Vec<Symbol>>;
}

/// What resolution needs to know about the document a reference sits in.
#[derive(Debug, Clone, Default)]
pub struct DocumentContext {
    pub uri: String,
    pub imports: ImportTable,
    pub globals: ScopeVar,
    pub scopes: Vec<ScopeVar>,
}

impl DocumentContext {
    pub fn from_record(record: DocumentRecord, scopes: Vec<ScopeVar>) -> Self {
        Self {
            uri: record.uri,
            imports: record.imports,
            globals: record.globals,
            scopes,
        }
    }

    /// Innermost function scope enclosing the reference's validity window,
    /// or the document globals.
    pub fn scope_for(&self, reference: &Reference) -> &ScopeVar {
        let Some(target) = reference.scope_range.or(reference.range()) else {
            return &self.globals;
        };
        self.scopes
            .iter()
            .filter(|s| s.range().is_some_and(|r| r.encloses(&target)))
            .min_by_key(|s| s.range().map(|r| r.len()).unwrap_or(u32::MAX))
            .unwrap_or(&self.globals)
    }

    /// Types bound to `name` where `reference` appears, falling back to the
    /// globals.
    pub fn variable_types(&self, reference: &Reference, name: &str) -> TypeComposite {
        let scope = self.scope_for(reference);
        match scope.get(name) {
            Some(types) if !types.is_empty() => types.clone(),
            _ => self.globals.get(name).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureInformation {
    pub label: String,
    pub documentation: Option<String>,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureHelp {
    pub signatures: Vec<SignatureInformation>,
    pub active_signature: u32,
    pub active_parameter: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub contents: String,
    pub range: Option<Range>,
}

/// Resolved symbols rendered as signature lines plus their descriptions.
pub fn hover<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
) -> StorageResult<Option<Hover>> {
    let symbols = get_symbols_by_reference(provider, ctx, reference)?;
    if symbols.is_empty() {
        return Ok(None);
    }

    let sections: Vec<String> = symbols
        .iter()
        .map(|symbol| match symbol.description() {
            Some(description) => format!("{}\n\n{description}", symbol.label()),
            None => symbol.label(),
        })
        .collect();

    Ok(Some(Hover {
        contents: sections.join("\n\n---\n\n"),
        range: reference.range(),
    }))
}

/// Top-level declarations whose name has a token starting with `query`.
pub fn workspace_symbols<P: SymbolProvider + ?Sized>(
    provider: &P,
    query: &str,
    limit: usize,
) -> StorageResult<Vec<Symbol>> {
    let mut found = Vec::new();
    for kind in SymbolTableKind::TOP_LEVEL {
        found.extend(provider.search(kind, "", query, limit)?);
    }
    sort_candidates(&mut found);
    found.truncate(limit);
    Ok(found)
}

/// `class` followed by its supertypes, breadth first, each visited once.
pub(crate) fn class_chain<P: SymbolProvider + ?Sized>(
    provider: &P,
    class: &str,
) -> StorageResult<Vec<String>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([class.to_string()]);

    while let Some(name) = queue.pop_front() {
        if !seen.insert(name.clone()) {
            continue;
        }
        for declaration in provider.find(SymbolTableKind::Classes, &name)? {
            if let Some(class_like) = declaration.as_class_like() {
                queue.extend(class_like.supertypes().cloned());
            }
        }
        chain.push(name);
    }
    Ok(chain)
}
