//! Type names and type unions.

use super::import_table::{ImportKind, ImportTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar and pseudo types that never live in a namespace.
const BUILTIN_TYPES: &[&str] = &[
    "int", "float", "string", "bool", "array", "callable", "iterable", "object", "mixed", "void",
    "null", "never", "false", "true", "self", "static", "parent", "resource",
];

/// A possibly relative PHP type name.
///
/// Fully-qualified names are kept without the leading backslash and carry
/// `fully_qualified = true`. Built-ins are always considered qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeName {
    name: String,
    fully_qualified: bool,
}

impl TypeName {
    /// Build from source spelling. A leading `\` marks the name absolute and
    /// aliases such as `boolean` collapse to their canonical spelling.
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(absolute) = raw.strip_prefix('\\') {
            return Self::qualified(absolute);
        }

        if let Some(builtin) = canonical_builtin(raw) {
            return Self {
                name: builtin.to_string(),
                fully_qualified: true,
            };
        }

        Self {
            name: raw.to_string(),
            fully_qualified: false,
        }
    }

    /// Build from a name that is already absolute.
    pub fn qualified(fqn: &str) -> Self {
        let fqn = fqn.trim_start_matches('\\');
        let name = canonical_builtin(fqn).unwrap_or(fqn).to_string();
        Self {
            name,
            fully_qualified: true,
        }
    }

    /// Inverse of [`Self::to_stored`]. Stored names are already canonical,
    /// so nothing is rewritten here.
    pub fn from_stored(stored: &str) -> Self {
        if let Some(absolute) = stored.strip_prefix('\\') {
            return Self::verbatim_qualified(absolute);
        }
        Self {
            name: stored.to_string(),
            fully_qualified: BUILTIN_TYPES.contains(&stored),
        }
    }

    fn verbatim_qualified(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fully_qualified: true,
        }
    }

    /// Member and variable names: kept exactly as written.
    pub fn verbatim(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fully_qualified: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.fully_qualified
    }

    pub fn is_variable(&self) -> bool {
        self.name.starts_with('$')
    }

    pub fn is_builtin(&self) -> bool {
        canonical_builtin(&self.name).is_some()
    }

    /// Last namespace segment, the name as written in most code.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('\\').next().unwrap_or(&self.name)
    }

    /// Rewrite the name to its absolute form. Resolving twice is a no-op.
    pub fn resolve_to_fully_qualified(&mut self, imports: &ImportTable) {
        self.resolve_with(imports, ImportKind::Class);
    }

    pub fn resolve_with(&mut self, imports: &ImportTable, kind: ImportKind) {
        if self.fully_qualified || self.is_variable() {
            return;
        }
        self.name = imports.get_fqn(&self.name, kind);
        self.fully_qualified = true;
    }

    /// Text form used by the record codec: absolute user names keep a
    /// leading backslash so the qualification survives a round trip.
    pub fn to_stored(&self) -> String {
        if self.fully_qualified && !self.is_builtin() {
            format!("\\{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn canonical_builtin(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "boolean" => "bool",
        "integer" => "int",
        "double" | "real" => "float",
        other => other,
    };
    BUILTIN_TYPES.iter().copied().find(|b| *b == canonical)
}

/// Ordered, de-duplicated union of type names.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeComposite {
    types: Vec<TypeName>,
}

impl TypeComposite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(name: TypeName) -> Self {
        Self { types: vec![name] }
    }

    /// Adds a name unless an equal name is already present.
    pub fn push(&mut self, name: TypeName) {
        if !self.types.iter().any(|t| t.name == name.name) {
            self.types.push(name);
        }
    }

    pub fn merge(&mut self, other: &TypeComposite) {
        for name in &other.types {
            self.push(name.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.types.iter()
    }

    pub fn first(&self) -> Option<&TypeName> {
        self.types.first()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    pub fn resolve_to_fully_qualified(&mut self, imports: &ImportTable) {
        let mut resolved = TypeComposite::new();
        for mut name in self.types.drain(..) {
            name.resolve_to_fully_qualified(imports);
            resolved.push(name);
        }
        *self = resolved;
    }
}

impl FromIterator<TypeName> for TypeComposite {
    fn from_iter<I: IntoIterator<Item = TypeName>>(iter: I) -> Self {
        let mut composite = TypeComposite::new();
        for name in iter {
            composite.push(name);
        }
        composite
    }
}

impl fmt::Display for TypeComposite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.types.iter().map(|t| t.name()).collect();
        f.write_str(&names.join("|"))
    }
}
