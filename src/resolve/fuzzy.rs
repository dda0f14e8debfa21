//! Completion candidates for a partially typed reference.

use super::{DocumentContext, SymbolProvider, class_chain, resolve_scope};
use crate::error::StorageResult;
use crate::storage::{SymbolTableKind, sort_candidates};
use crate::symbol::{Range, RefKind, Reference, Symbol, Variable};
use std::collections::HashSet;
use tracing::trace;

/// Candidates for the reference the cursor at `offset` sits in.
///
/// The keyword is the part of the name left of the cursor, and only when
/// the cursor is inside the name token; otherwise every candidate for the
/// reference's scope is listed. At most `limit` symbols are returned.
pub fn search_symbols_for_reference<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
    offset: u32,
    limit: usize,
) -> StorageResult<Vec<Symbol>> {
    let mut found = match reference.ref_kind {
        RefKind::ArgumentList => Vec::new(),
        RefKind::Variable => {
            let keyword = typed_keyword(reference.name(), reference.range(), offset);
            complete_variables(ctx, reference, &keyword)
        }
        kind if kind.is_member() => {
            let keyword = typed_keyword(reference.name(), reference.member_location, offset);
            complete_members(provider, ctx, reference, &keyword, limit)?
        }
        _ => {
            let written = reference.ty.first().map(|t| t.short_name()).unwrap_or("");
            let keyword = typed_keyword(written, reference.range(), offset);
            complete_top_level(provider, &keyword, limit)?
        }
    };

    found.truncate(limit);
    trace!(kind = ?reference.ref_kind, found = found.len(), "completion");
    Ok(found)
}

/// The first characters of `name` typed before `offset`. `written` is the
/// source range of the name, which may carry a leading `$` or namespace
/// qualifier that `name` lacks.
fn typed_keyword(name: &str, written: Option<Range>, offset: u32) -> String {
    let Some(written) = written else {
        return String::new();
    };
    if !written.contains(offset) {
        return String::new();
    }

    let typed = (offset - written.start) as usize;
    let lead = (written.len() as usize).saturating_sub(name.len());
    let mut end = typed.saturating_sub(lead).min(name.len());
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// `->` lists instance methods and properties, `::` lists static members
/// and class constants. Members declared closer to the receiver class come
/// first and shadow inherited ones of the same name.
fn complete_members<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
    keyword: &str,
    limit: usize,
) -> StorageResult<Vec<Symbol>> {
    let static_access = reference.ref_kind.is_static_access();
    let kinds: &[SymbolTableKind] = if static_access {
        &SymbolTableKind::MEMBERS
    } else {
        &[SymbolTableKind::Methods, SymbolTableKind::Properties]
    };

    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for class in resolve_scope(ctx, reference) {
        for owner in class_chain(provider, &class)? {
            for &kind in kinds {
                // Unbounded: the access-style filter below runs after the search
                let candidates = if keyword.is_empty() {
                    provider.members_of(kind, &owner)?
                } else {
                    provider.search(kind, &owner, keyword, usize::MAX)?
                };
                for symbol in candidates {
                    if symbol.is_static() != static_access {
                        continue;
                    }
                    if seen.insert((kind, symbol.name().to_string())) {
                        found.push(symbol);
                    }
                }
            }
            if found.len() >= limit {
                return Ok(found);
            }
        }
    }
    Ok(found)
}

fn complete_top_level<P: SymbolProvider + ?Sized>(
    provider: &P,
    keyword: &str,
    limit: usize,
) -> StorageResult<Vec<Symbol>> {
    let mut found = Vec::new();
    for kind in SymbolTableKind::TOP_LEVEL {
        found.extend(provider.search(kind, "", keyword, limit)?);
    }
    sort_candidates(&mut found);
    Ok(found)
}

fn complete_variables(ctx: &DocumentContext, reference: &Reference, keyword: &str) -> Vec<Symbol> {
    let scope = ctx.scope_for(reference);
    scope
        .vars()
        .filter(|(name, _)| name.starts_with(keyword) && name.as_str() != reference.name())
        .map(|(name, types)| {
            Symbol::Variable(Variable {
                name: name.clone(),
                location: scope.location.clone(),
                types: types.clone(),
            })
        })
        .collect()
}
