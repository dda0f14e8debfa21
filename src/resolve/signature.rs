//! Signature help for the call surrounding the cursor.

use super::exact::resolve_callee;
use super::{DocumentContext, SignatureHelp, SignatureInformation, SymbolProvider};
use crate::error::StorageResult;
use crate::symbol::{Parameter, Range, Reference, Symbol};

/// Signatures of every declaration the call may target, with the argument
/// under `offset` highlighted. `call` is the argument-list reference.
pub fn get_signature_help<P: SymbolProvider + ?Sized>(
    provider: &P,
    ctx: &DocumentContext,
    call: &Reference,
    offset: u32,
) -> StorageResult<Option<SignatureHelp>> {
    let callees = resolve_callee(provider, ctx, call)?;
    let signatures: Vec<SignatureInformation> =
        callees.iter().filter_map(signature_information).collect();

    let Some(first) = signatures.first() else {
        return Ok(None);
    };

    Ok(Some(SignatureHelp {
        active_parameter: active_parameter(&call.ranges, offset, first.parameters.len()),
        active_signature: 0,
        signatures,
    }))
}

fn signature_information(symbol: &Symbol) -> Option<SignatureInformation> {
    let signature = symbol.signature()?;
    Some(SignatureInformation {
        label: symbol.label(),
        documentation: symbol.description().map(str::to_string),
        parameters: signature.parameters.iter().map(Parameter::label).collect(),
    })
}

/// Index of the argument under the cursor. A cursor between two arguments
/// belongs to the next one; past the last argument it sits on the last
/// parameter.
fn active_parameter(arguments: &[Range], offset: u32, parameters: usize) -> u32 {
    let last = parameters.saturating_sub(1);
    let index = arguments
        .iter()
        .position(|range| offset <= range.end)
        .unwrap_or(last);
    index.min(last) as u32
}
