//! Semantic symbols extracted from PHP source.
//!
//! A [`Symbol`] is a closed set of declaration kinds. Every kind exposes its
//! name and location; members additionally know their owning class
//! (`scope`). The synthetic [`Symbol::Variable`] is never stored, it is
//! produced when a variable reference is resolved against a [`ScopeVar`].

pub mod import_table;
pub mod location;
pub mod modifiers;
pub mod reference;
pub mod scope_var;
pub mod type_name;

pub use import_table::{ImportKind, ImportTable};
pub use location::{Location, Position, Range};
pub use modifiers::{ModifierWord, Modifiers, Visibility};
pub use reference::{RefKind, Reference};
pub use scope_var::ScopeVar;
pub use type_name::{TypeComposite, TypeName};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Interface,
    Trait,
    Function,
    Method,
    Property,
    Constant,
    ClassConstant,
    DefineConstant,
    Variable,
}

impl FromStr for SymbolKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Class" => Ok(SymbolKind::Class),
            "Interface" => Ok(SymbolKind::Interface),
            "Trait" => Ok(SymbolKind::Trait),
            "Function" => Ok(SymbolKind::Function),
            "Method" => Ok(SymbolKind::Method),
            "Property" => Ok(SymbolKind::Property),
            "Constant" => Ok(SymbolKind::Constant),
            "ClassConstant" => Ok(SymbolKind::ClassConstant),
            "DefineConstant" => Ok(SymbolKind::DefineConstant),
            "Variable" => Ok(SymbolKind::Variable),
            _ => Err("Unknown symbol kind"),
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Class, interface or trait declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassLike {
    pub name: String,
    pub location: Location,
    pub modifiers: Modifiers,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub traits: Vec<String>,
    pub description: Option<String>,
}

impl ClassLike {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            modifiers: Modifiers::empty(),
            extends: Vec::new(),
            implements: Vec::new(),
            traits: Vec::new(),
            description: None,
        }
    }

    /// Supertypes in lookup order: used traits, parents, then interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &String> {
        self.traits
            .iter()
            .chain(self.extends.iter())
            .chain(self.implements.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name without the leading `$`
    pub name: String,
    pub types: TypeComposite,
    pub default: Option<String>,
    pub by_ref: bool,
    pub variadic: bool,
    pub location: Location,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            types: TypeComposite::new(),
            default: None,
            by_ref: false,
            variadic: false,
            location,
        }
    }

    pub fn label(&self) -> String {
        let mut label = String::new();
        if !self.types.is_empty() {
            label.push_str(&self.types.to_string());
            label.push(' ');
        }
        if self.by_ref {
            label.push('&');
        }
        if self.variadic {
            label.push_str("...");
        }
        label.push('$');
        label.push_str(&self.name);
        if let Some(default) = &self.default {
            label.push_str(" = ");
            label.push_str(default);
        }
        label
    }
}

/// Parameters and return types shared by functions and methods.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub parameters: Vec<Parameter>,
    pub return_types: TypeComposite,
}

impl Signature {
    pub fn label(&self, name: &str) -> String {
        let params: Vec<String> = self.parameters.iter().map(Parameter::label).collect();
        let mut label = format!("{name}({})", params.join(", "));
        if !self.return_types.is_empty() {
            label.push_str(": ");
            label.push_str(&self.return_types.to_string());
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub location: Location,
    pub signature: Signature,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub scope: String,
    pub location: Location,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    pub signature: Signature,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Name without the leading `$`
    pub name: String,
    pub scope: String,
    pub location: Location,
    pub modifiers: Modifiers,
    pub visibility: Visibility,
    pub types: TypeComposite,
    pub description: Option<String>,
}

/// `const X = ...` at namespace level, or `define('X', ...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub name: String,
    pub location: Location,
    pub value: Option<String>,
    pub types: TypeComposite,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConstant {
    pub name: String,
    pub scope: String,
    pub location: Location,
    pub visibility: Visibility,
    pub value: Option<String>,
    pub types: TypeComposite,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub location: Location,
    pub types: TypeComposite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbol {
    Class(ClassLike),
    Interface(ClassLike),
    Trait(ClassLike),
    Function(Function),
    Method(Method),
    Property(Property),
    Constant(Constant),
    ClassConstant(ClassConstant),
    DefineConstant(Constant),
    Variable(Variable),
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Class(_) => SymbolKind::Class,
            Symbol::Interface(_) => SymbolKind::Interface,
            Symbol::Trait(_) => SymbolKind::Trait,
            Symbol::Function(_) => SymbolKind::Function,
            Symbol::Method(_) => SymbolKind::Method,
            Symbol::Property(_) => SymbolKind::Property,
            Symbol::Constant(_) => SymbolKind::Constant,
            Symbol::ClassConstant(_) => SymbolKind::ClassConstant,
            Symbol::DefineConstant(_) => SymbolKind::DefineConstant,
            Symbol::Variable(_) => SymbolKind::Variable,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Class(c) | Symbol::Interface(c) | Symbol::Trait(c) => &c.name,
            Symbol::Function(f) => &f.name,
            Symbol::Method(m) => &m.name,
            Symbol::Property(p) => &p.name,
            Symbol::Constant(c) | Symbol::DefineConstant(c) => &c.name,
            Symbol::ClassConstant(c) => &c.name,
            Symbol::Variable(v) => &v.name,
        }
    }

    /// Last namespace segment of the name.
    pub fn short_name(&self) -> &str {
        let name = self.name();
        name.rsplit('\\').next().unwrap_or(name)
    }

    pub fn location(&self) -> &Location {
        match self {
            Symbol::Class(c) | Symbol::Interface(c) | Symbol::Trait(c) => &c.location,
            Symbol::Function(f) => &f.location,
            Symbol::Method(m) => &m.location,
            Symbol::Property(p) => &p.location,
            Symbol::Constant(c) | Symbol::DefineConstant(c) => &c.location,
            Symbol::ClassConstant(c) => &c.location,
            Symbol::Variable(v) => &v.location,
        }
    }

    /// Owning class for members, `None` for free symbols.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Symbol::Method(m) => Some(&m.scope),
            Symbol::Property(p) => Some(&p.scope),
            Symbol::ClassConstant(c) => Some(&c.scope),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Symbol::Class(c) | Symbol::Interface(c) | Symbol::Trait(c) => c.description.as_deref(),
            Symbol::Function(f) => f.description.as_deref(),
            Symbol::Method(m) => m.description.as_deref(),
            Symbol::Property(p) => p.description.as_deref(),
            Symbol::Constant(c) | Symbol::DefineConstant(c) => c.description.as_deref(),
            Symbol::ClassConstant(c) => c.description.as_deref(),
            Symbol::Variable(_) => None,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Symbol::Function(f) => Some(&f.signature),
            Symbol::Method(m) => Some(&m.signature),
            _ => None,
        }
    }

    pub fn as_class_like(&self) -> Option<&ClassLike> {
        match self {
            Symbol::Class(c) | Symbol::Interface(c) | Symbol::Trait(c) => Some(c),
            _ => None,
        }
    }

    /// Static members are reachable through `::`; class constants always are.
    pub fn is_static(&self) -> bool {
        match self {
            Symbol::Method(m) => m.modifiers.contains(Modifiers::STATIC),
            Symbol::Property(p) => p.modifiers.contains(Modifiers::STATIC),
            Symbol::ClassConstant(_) => true,
            _ => false,
        }
    }

    /// Types a value of this symbol evaluates to.
    pub fn value_types(&self) -> Option<&TypeComposite> {
        match self {
            Symbol::Function(f) => Some(&f.signature.return_types),
            Symbol::Method(m) => Some(&m.signature.return_types),
            Symbol::Property(p) => Some(&p.types),
            Symbol::Constant(c) | Symbol::DefineConstant(c) => Some(&c.types),
            Symbol::ClassConstant(c) => Some(&c.types),
            Symbol::Variable(v) => Some(&v.types),
            _ => None,
        }
    }

    /// One-line rendering used for hovers and CLI output.
    pub fn label(&self) -> String {
        match self {
            Symbol::Class(c) => format!("class {}", c.name),
            Symbol::Interface(c) => format!("interface {}", c.name),
            Symbol::Trait(c) => format!("trait {}", c.name),
            Symbol::Function(f) => format!("function {}", f.signature.label(&f.name)),
            Symbol::Method(m) => {
                let mut label = format!("{} ", m.visibility.keyword());
                if m.modifiers.contains(Modifiers::STATIC) {
                    label.push_str("static ");
                }
                label.push_str(&format!(
                    "function {}::{}",
                    m.scope,
                    m.signature.label(&m.name)
                ));
                label
            }
            Symbol::Property(p) => {
                let static_kw = if p.modifiers.contains(Modifiers::STATIC) {
                    "static "
                } else {
                    ""
                };
                let types = if p.types.is_empty() {
                    String::new()
                } else {
                    format!("{} ", p.types)
                };
                format!(
                    "{} {static_kw}{types}{}::${}",
                    p.visibility.keyword(),
                    p.scope,
                    p.name
                )
            }
            Symbol::Constant(c) | Symbol::DefineConstant(c) => match &c.value {
                Some(value) => format!("const {} = {value}", c.name),
                None => format!("const {}", c.name),
            },
            Symbol::ClassConstant(c) => match &c.value {
                Some(value) => format!("const {}::{} = {value}", c.scope, c.name),
                None => format!("const {}::{}", c.scope, c.name),
            },
            Symbol::Variable(v) if v.types.is_empty() => v.name.clone(),
            Symbol::Variable(v) => format!("{} {}", v.types, v.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function_foo() -> Symbol {
        let location = Location::new("file:///a.php", Range::new(6, 50));
        let mut param = Parameter::new("a", location.clone());
        param.types.push(TypeName::new("int"));
        Symbol::Function(Function {
            name: "foo".to_string(),
            location,
            signature: Signature {
                parameters: vec![param],
                return_types: TypeComposite::single(TypeName::new("string")),
            },
            description: None,
        })
    }

    #[test]
    fn test_function_label() {
        assert_eq!(function_foo().label(), "function foo(int $a): string");
        assert_eq!(function_foo().kind(), SymbolKind::Function);
        assert_eq!(function_foo().scope(), None);
    }

    #[test]
    fn test_member_accessors() {
        let method = Symbol::Method(Method {
            name: "make".to_string(),
            scope: "App\\Factory".to_string(),
            location: Location::empty(),
            modifiers: Modifiers::STATIC,
            visibility: Visibility::PUBLIC,
            signature: Signature::default(),
            description: Some("Builds things".to_string()),
        });

        assert_eq!(method.scope(), Some("App\\Factory"));
        assert!(method.is_static());
        assert_eq!(method.label(), "public static function App\\Factory::make()");
        assert_eq!(method.description(), Some("Builds things"));
    }

    #[test]
    fn test_symbol_kind_from_str() {
        assert_eq!("Trait".parse::<SymbolKind>(), Ok(SymbolKind::Trait));
        assert!("Struct".parse::<SymbolKind>().is_err());
    }

    #[test]
    fn test_short_name() {
        let class = Symbol::Class(ClassLike::new("App\\Models\\User", Location::empty()));
        assert_eq!(class.short_name(), "User");
    }
}
