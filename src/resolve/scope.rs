//! Receiver resolution for member references.

use super::DocumentContext;
use crate::symbol::{Reference, TypeName};

/// Concrete class names a member reference may be looked up on.
///
/// Variable-shaped scope names (`$repo`) are replaced by the types bound to
/// that variable where the reference appears. Built-in types are dropped and
/// the result keeps first-seen order without duplicates.
pub fn resolve_scope(ctx: &DocumentContext, reference: &Reference) -> Vec<String> {
    let Some(scope) = &reference.scope else {
        return Vec::new();
    };

    let mut classes: Vec<String> = Vec::new();
    let mut push = |name: &TypeName| {
        if name.is_builtin() || name.is_variable() || name.name().is_empty() {
            return;
        }
        let mut name = name.clone();
        name.resolve_to_fully_qualified(&ctx.imports);
        if !classes.iter().any(|c| c == name.name()) {
            classes.push(name.name().to_string());
        }
    };

    for name in scope.iter() {
        if name.is_variable() {
            for bound in ctx.variable_types(reference, name.name()).iter() {
                push(bound);
            }
        } else {
            push(name);
        }
    }
    classes
}
