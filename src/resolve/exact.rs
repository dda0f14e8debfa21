//! Go-to-definition resolution.

use super::{DocumentContext, SymbolProvider, class_chain, resolve_scope};
use crate::error::StorageResult;
use crate::storage::{SymbolTableKind, member_key, sort_candidates};
use crate::symbol::{ImportKind, RefKind, Reference, Symbol, Variable};
use tracing::trace;

/// Every declaration `reference` may refer to. Ambiguous names return all
/// candidates; unknown names return nothing.
pub fn get_symbols_by_reference<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
) -> StorageResult<Vec<Symbol>> {
    use SymbolTableKind::*;

    let symbols = match reference.ref_kind {
        RefKind::Function => find_top_level(provider, ctx, reference, Functions)?,
        RefKind::ConstantAccess => find_top_level(provider, ctx, reference, Constants)?,
        RefKind::Class | RefKind::ClassTypeDesignator => {
            find_top_level(provider, ctx, reference, Classes)?
        }
        RefKind::Method | RefKind::MethodCall => find_members(provider, ctx, reference, &[Methods])?,
        RefKind::Property | RefKind::PropertyAccess => {
            find_members(provider, ctx, reference, &[Properties])?
        }
        RefKind::ClassConst => find_members(provider, ctx, reference, &[ClassConstants])?,
        RefKind::ScopedAccess => find_members(provider, ctx, reference, &SymbolTableKind::MEMBERS)?,
        RefKind::ArgumentList => resolve_callee(provider, ctx, reference)?,
        RefKind::Variable => find_variable(ctx, reference),
    };

    trace!(
        kind = ?reference.ref_kind,
        name = reference.name(),
        found = symbols.len(),
        "resolved reference"
    );
    Ok(symbols)
}

/// The function or method an argument list belongs to. Constructor calls
/// carry `__construct` as their name and the class as their scope.
pub(crate) fn resolve_callee<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    call: &Reference,
) -> StorageResult<Vec<Symbol>> {
    if call.scope.is_some() {
        find_members(provider, ctx, call, &[SymbolTableKind::Methods])
    } else {
        find_top_level(provider, ctx, call, SymbolTableKind::Functions)
    }
}

fn import_kind(kind: SymbolTableKind) -> ImportKind {
    match kind {
        SymbolTableKind::Functions => ImportKind::Function,
        SymbolTableKind::Constants => ImportKind::Constant,
        _ => ImportKind::Class,
    }
}

/// Functions and constants fall back to the global namespace when the
/// namespaced name is not declared anywhere.
fn find_top_level<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
    kind: SymbolTableKind,
) -> StorageResult<Vec<Symbol>> {
    let mut found = Vec::new();
    for name in reference.ty.iter() {
        if name.is_builtin() || name.is_variable() {
            continue;
        }
        let mut name = name.clone();
        name.resolve_with(&ctx.imports, import_kind(kind));

        let mut hits = provider.find(kind, name.name())?;
        if hits.is_empty() && kind != SymbolTableKind::Classes && name.name().contains('\\') {
            hits = provider.find(kind, name.short_name())?;
        }
        found.extend(hits);
    }
    sort_candidates(&mut found);
    Ok(found)
}

/// Looks the member up on every receiver class. Along one class's
/// inheritance chain the nearest declaration shadows the ones above it.
fn find_members<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    reference: &Reference,
    kinds: &[SymbolTableKind],
) -> StorageResult<Vec<Symbol>> {
    let member = reference.name();
    if member.is_empty() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for class in resolve_scope(ctx, reference) {
        for owner in class_chain(provider, &class)? {
            let mut hits = Vec::new();
            for kind in kinds {
                hits.extend(provider.find(*kind, &member_key(&owner, member))?);
            }
            if !hits.is_empty() {
                found.extend(hits);
                break;
            }
        }
    }
    sort_candidates(&mut found);
    Ok(found)
}

fn find_variable(ctx: &DocumentContext, reference: &Reference) -> Vec<Symbol> {
    let name = reference.name();
    let bound = ctx
        .scope_for(reference)
        .get(name)
        .or_else(|| ctx.globals.get(name));

    match bound {
        Some(types) => vec![Symbol::Variable(Variable {
            name: name.to_string(),
            location: reference.location.clone(),
            types: types.clone(),
        })],
        None => Vec::new(),
    }
}
