//! Record layouts for everything the index stores.

use super::{Decode, Encode, Reader, Writer};
use crate::error::{CodecError, CodecResult};
use crate::symbol::{
    ClassConstant, ClassLike, Constant, Function, ImportTable, Method, Modifiers, Parameter,
    Property, RefKind, Reference, ScopeVar, Signature, Symbol, Variable, Visibility,
};
use std::collections::BTreeMap;

pub const TAG_CLASS: u32 = 1;
pub const TAG_INTERFACE: u32 = 2;
pub const TAG_TRAIT: u32 = 3;
pub const TAG_FUNCTION: u32 = 4;
pub const TAG_METHOD: u32 = 5;
pub const TAG_PROPERTY: u32 = 6;
pub const TAG_CONSTANT: u32 = 7;
pub const TAG_CLASS_CONSTANT: u32 = 8;
pub const TAG_DEFINE_CONSTANT: u32 = 9;
pub const TAG_VARIABLE: u32 = 10;
pub const TAG_REFERENCE: u32 = 20;
pub const TAG_SCOPE_VAR: u32 = 21;
pub const TAG_IMPORT_TABLE: u32 = 22;
pub const TAG_DOCUMENT: u32 = 23;
pub const TAG_COMPLETION_ENTRY: u32 = 24;

fn expect_tag(r: &mut Reader<'_>, expected: u32) -> CodecResult<()> {
    let found = r.read_u32()?;
    if found == expected {
        Ok(())
    } else {
        Err(CodecError::TagMismatch { expected, found })
    }
}

fn write_modifiers(w: &mut Writer, modifiers: Modifiers, visibility: Visibility) {
    w.write_u32(modifiers.bits());
    w.write_u32(visibility.bits());
}

fn read_modifiers(r: &mut Reader<'_>) -> CodecResult<(Modifiers, Visibility)> {
    let bits = r.read_u32()?;
    let modifiers = Modifiers::from_bits(bits).ok_or(CodecError::UnknownFlags {
        set: "modifier",
        bits,
    })?;
    let bits = r.read_u32()?;
    let visibility = Visibility::from_bits(bits).ok_or(CodecError::UnknownFlags {
        set: "visibility",
        bits,
    })?;
    Ok((modifiers, visibility))
}

impl Encode for Parameter {
    fn encode(&self, w: &mut Writer) {
        w.write_str(&self.name);
        w.write_types(&self.types);
        w.write_opt_str(self.default.as_deref());
        w.write_bool(self.by_ref);
        w.write_bool(self.variadic);
        w.write_location(&self.location);
    }
}

impl Decode for Parameter {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        Ok(Self {
            name: r.read_str()?,
            types: r.read_types()?,
            default: r.read_opt_str()?,
            by_ref: r.read_bool()?,
            variadic: r.read_bool()?,
            location: r.read_location()?,
        })
    }
}

impl Encode for Signature {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(self.parameters.len() as u32);
        for param in &self.parameters {
            param.encode(w);
        }
        w.write_types(&self.return_types);
    }
}

impl Decode for Signature {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let count = r.read_count(4)?;
        let parameters = (0..count)
            .map(|_| Parameter::decode(r))
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self {
            parameters,
            return_types: r.read_types()?,
        })
    }
}

fn encode_class_like(class: &ClassLike, w: &mut Writer) {
    w.write_str(&class.name);
    w.write_location(&class.location);
    write_modifiers(w, class.modifiers, Visibility::empty());
    w.write_str_list(&class.extends);
    w.write_str_list(&class.implements);
    w.write_str_list(&class.traits);
    w.write_opt_str(class.description.as_deref());
}

fn decode_class_like(r: &mut Reader<'_>) -> CodecResult<ClassLike> {
    let name = r.read_str()?;
    let location = r.read_location()?;
    let (modifiers, _) = read_modifiers(r)?;
    Ok(ClassLike {
        name,
        location,
        modifiers,
        extends: r.read_str_list()?,
        implements: r.read_str_list()?,
        traits: r.read_str_list()?,
        description: r.read_opt_str()?,
    })
}

fn encode_constant(constant: &Constant, w: &mut Writer) {
    w.write_str(&constant.name);
    w.write_location(&constant.location);
    w.write_opt_str(constant.value.as_deref());
    w.write_types(&constant.types);
    w.write_opt_str(constant.description.as_deref());
}

fn decode_constant(r: &mut Reader<'_>) -> CodecResult<Constant> {
    Ok(Constant {
        name: r.read_str()?,
        location: r.read_location()?,
        value: r.read_opt_str()?,
        types: r.read_types()?,
        description: r.read_opt_str()?,
    })
}

impl Encode for Symbol {
    fn encode(&self, w: &mut Writer) {
        match self {
            Symbol::Class(c) => {
                w.write_u32(TAG_CLASS);
                encode_class_like(c, w);
            }
            Symbol::Interface(c) => {
                w.write_u32(TAG_INTERFACE);
                encode_class_like(c, w);
            }
            Symbol::Trait(c) => {
                w.write_u32(TAG_TRAIT);
                encode_class_like(c, w);
            }
            Symbol::Function(f) => {
                w.write_u32(TAG_FUNCTION);
                w.write_str(&f.name);
                w.write_location(&f.location);
                f.signature.encode(w);
                w.write_opt_str(f.description.as_deref());
            }
            Symbol::Method(m) => {
                w.write_u32(TAG_METHOD);
                w.write_str(&m.name);
                w.write_str(&m.scope);
                w.write_location(&m.location);
                write_modifiers(w, m.modifiers, m.visibility);
                m.signature.encode(w);
                w.write_opt_str(m.description.as_deref());
            }
            Symbol::Property(p) => {
                w.write_u32(TAG_PROPERTY);
                w.write_str(&p.name);
                w.write_str(&p.scope);
                w.write_location(&p.location);
                write_modifiers(w, p.modifiers, p.visibility);
                w.write_types(&p.types);
                w.write_opt_str(p.description.as_deref());
            }
            Symbol::Constant(c) => {
                w.write_u32(TAG_CONSTANT);
                encode_constant(c, w);
            }
            Symbol::DefineConstant(c) => {
                w.write_u32(TAG_DEFINE_CONSTANT);
                encode_constant(c, w);
            }
            Symbol::ClassConstant(c) => {
                w.write_u32(TAG_CLASS_CONSTANT);
                w.write_str(&c.name);
                w.write_str(&c.scope);
                w.write_location(&c.location);
                write_modifiers(w, Modifiers::empty(), c.visibility);
                w.write_opt_str(c.value.as_deref());
                w.write_types(&c.types);
                w.write_opt_str(c.description.as_deref());
            }
            Symbol::Variable(v) => {
                w.write_u32(TAG_VARIABLE);
                w.write_str(&v.name);
                w.write_location(&v.location);
                w.write_types(&v.types);
            }
        }
    }
}

impl Decode for Symbol {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        let tag = r.read_u32()?;
        let symbol = match tag {
            TAG_CLASS => Symbol::Class(decode_class_like(r)?),
            TAG_INTERFACE => Symbol::Interface(decode_class_like(r)?),
            TAG_TRAIT => Symbol::Trait(decode_class_like(r)?),
            TAG_FUNCTION => Symbol::Function(Function {
                name: r.read_str()?,
                location: r.read_location()?,
                signature: Signature::decode(r)?,
                description: r.read_opt_str()?,
            }),
            TAG_METHOD => {
                let name = r.read_str()?;
                let scope = r.read_str()?;
                let location = r.read_location()?;
                let (modifiers, visibility) = read_modifiers(r)?;
                Symbol::Method(Method {
                    name,
                    scope,
                    location,
                    modifiers,
                    visibility,
                    signature: Signature::decode(r)?,
                    description: r.read_opt_str()?,
                })
            }
            TAG_PROPERTY => {
                let name = r.read_str()?;
                let scope = r.read_str()?;
                let location = r.read_location()?;
                let (modifiers, visibility) = read_modifiers(r)?;
                Symbol::Property(Property {
                    name,
                    scope,
                    location,
                    modifiers,
                    visibility,
                    types: r.read_types()?,
                    description: r.read_opt_str()?,
                })
            }
            TAG_CONSTANT => Symbol::Constant(decode_constant(r)?),
            TAG_DEFINE_CONSTANT => Symbol::DefineConstant(decode_constant(r)?),
            TAG_CLASS_CONSTANT => {
                let name = r.read_str()?;
                let scope = r.read_str()?;
                let location = r.read_location()?;
                let (_, visibility) = read_modifiers(r)?;
                Symbol::ClassConstant(ClassConstant {
                    name,
                    scope,
                    location,
                    visibility,
                    value: r.read_opt_str()?,
                    types: r.read_types()?,
                    description: r.read_opt_str()?,
                })
            }
            TAG_VARIABLE => Symbol::Variable(Variable {
                name: r.read_str()?,
                location: r.read_location()?,
                types: r.read_types()?,
            }),
            other => return Err(CodecError::UnknownTag(other)),
        };
        Ok(symbol)
    }
}

impl Encode for Reference {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(TAG_REFERENCE);
        w.write_u32(self.ref_kind.code());
        w.write_types(&self.ty);
        w.write_location(&self.location);
        w.write_bool(self.scope.is_some());
        if let Some(scope) = &self.scope {
            w.write_types(scope);
        }
        w.write_opt_range(self.scope_range);
        w.write_opt_range(self.member_location);
        w.write_u32(self.ranges.len() as u32);
        for range in &self.ranges {
            w.write_range(*range);
        }
    }
}

impl Decode for Reference {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        expect_tag(r, TAG_REFERENCE)?;
        let code = r.read_u32()?;
        let ref_kind = RefKind::from_code(code).ok_or(CodecError::UnknownRefKind(code))?;
        let ty = r.read_types()?;
        let location = r.read_location()?;
        let scope = if r.read_bool()? {
            Some(r.read_types()?)
        } else {
            None
        };
        let scope_range = r.read_opt_range()?;
        let member_location = r.read_opt_range()?;
        let count = r.read_count(8)?;
        let ranges = (0..count)
            .map(|_| r.read_range())
            .collect::<CodecResult<Vec<_>>>()?;
        Ok(Self {
            ref_kind,
            ty,
            location,
            scope,
            scope_range,
            member_location,
            ranges,
        })
    }
}

impl Encode for ScopeVar {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(TAG_SCOPE_VAR);
        w.write_location(&self.location);
        w.write_u32(self.len() as u32);
        for (name, types) in self.vars() {
            w.write_str(name);
            w.write_types(types);
        }
    }
}

impl Decode for ScopeVar {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        expect_tag(r, TAG_SCOPE_VAR)?;
        let location = r.read_location()?;
        let count = r.read_count(8)?;
        let mut vars = BTreeMap::new();
        for _ in 0..count {
            let name = r.read_str()?;
            let types = r.read_types()?;
            vars.insert(name, types);
        }
        Ok(ScopeVar::from_parts(location, vars))
    }
}

fn write_alias_map(w: &mut Writer, map: &BTreeMap<String, String>) {
    w.write_u32(map.len() as u32);
    for (alias, fqn) in map {
        w.write_str(alias);
        w.write_str(fqn);
    }
}

fn read_alias_map(r: &mut Reader<'_>) -> CodecResult<BTreeMap<String, String>> {
    let count = r.read_count(8)?;
    let mut map = BTreeMap::new();
    for _ in 0..count {
        let alias = r.read_str()?;
        let fqn = r.read_str()?;
        map.insert(alias, fqn);
    }
    Ok(map)
}

impl Encode for ImportTable {
    fn encode(&self, w: &mut Writer) {
        use crate::symbol::ImportKind;

        w.write_u32(TAG_IMPORT_TABLE);
        w.write_str_list(self.namespace_parts());
        write_alias_map(w, self.aliases(ImportKind::Class));
        write_alias_map(w, self.aliases(ImportKind::Function));
        write_alias_map(w, self.aliases(ImportKind::Constant));
    }
}

impl Decode for ImportTable {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        expect_tag(r, TAG_IMPORT_TABLE)?;
        let namespace = r.read_str_list()?;
        let classes = read_alias_map(r)?;
        let functions = read_alias_map(r)?;
        let constants = read_alias_map(r)?;
        Ok(ImportTable::from_parts(
            namespace, classes, functions, constants,
        ))
    }
}

/// Per-document bookkeeping row: freshness data plus the state the resolver
/// needs for a document that is not open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub uri: String,
    pub mtime: i64,
    pub content_hash: String,
    pub indexed_at: i64,
    pub imports: ImportTable,
    pub globals: ScopeVar,
}

impl Encode for DocumentRecord {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(TAG_DOCUMENT);
        w.write_str(&self.uri);
        w.write_i64(self.mtime);
        w.write_str(&self.content_hash);
        w.write_i64(self.indexed_at);
        self.imports.encode(w);
        self.globals.encode(w);
    }
}

impl Decode for DocumentRecord {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        expect_tag(r, TAG_DOCUMENT)?;
        Ok(Self {
            uri: r.read_str()?,
            mtime: r.read_i64()?,
            content_hash: r.read_str()?,
            indexed_at: r.read_i64()?,
            imports: ImportTable::decode(r)?,
            globals: ScopeVar::decode(r)?,
        })
    }
}

/// Value of a completion index row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompletionEntry {
    pub uri: String,
    pub name: String,
}

impl Encode for CompletionEntry {
    fn encode(&self, w: &mut Writer) {
        w.write_u32(TAG_COMPLETION_ENTRY);
        w.write_str(&self.uri);
        w.write_str(&self.name);
    }
}

impl Decode for CompletionEntry {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self> {
        expect_tag(r, TAG_COMPLETION_ENTRY)?;
        Ok(Self {
            uri: r.read_str()?,
            name: r.read_str()?,
        })
    }
}
