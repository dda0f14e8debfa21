//! Located uses of a name in source.

use super::location::{Location, Range};
use super::type_name::TypeComposite;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefKind {
    /// `foo()`
    Function,
    /// `$foo`
    Variable,
    /// A class name in a type hint, `extends`, or in front of `::`
    Class,
    /// `new Foo`
    ClassTypeDesignator,
    /// `Foo::bar()`
    Method,
    /// `$foo->bar()`
    MethodCall,
    /// `Foo::$bar`
    Property,
    /// `$foo->bar`
    PropertyAccess,
    /// `Foo::BAR`
    ClassConst,
    /// `Foo::` with nothing after it yet
    ScopedAccess,
    /// `FOO`
    ConstantAccess,
    /// The parenthesised argument list of a call
    ArgumentList,
}

impl RefKind {
    pub const ALL: [RefKind; 12] = [
        RefKind::Function,
        RefKind::Variable,
        RefKind::Class,
        RefKind::ClassTypeDesignator,
        RefKind::Method,
        RefKind::MethodCall,
        RefKind::Property,
        RefKind::PropertyAccess,
        RefKind::ClassConst,
        RefKind::ScopedAccess,
        RefKind::ConstantAccess,
        RefKind::ArgumentList,
    ];

    pub fn code(self) -> u32 {
        match self {
            RefKind::Function => 1,
            RefKind::Variable => 2,
            RefKind::Class => 3,
            RefKind::ClassTypeDesignator => 4,
            RefKind::Method => 5,
            RefKind::MethodCall => 6,
            RefKind::Property => 7,
            RefKind::PropertyAccess => 8,
            RefKind::ClassConst => 9,
            RefKind::ScopedAccess => 10,
            RefKind::ConstantAccess => 11,
            RefKind::ArgumentList => 12,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Member accessed through `::`.
    pub fn is_static_access(self) -> bool {
        matches!(
            self,
            RefKind::Method | RefKind::Property | RefKind::ClassConst | RefKind::ScopedAccess
        )
    }

    /// Member accessed through `->`.
    pub fn is_instance_access(self) -> bool {
        matches!(self, RefKind::MethodCall | RefKind::PropertyAccess)
    }

    pub fn is_member(self) -> bool {
        self.is_static_access() || self.is_instance_access()
    }
}

/// A use of a name at a source position.
///
/// `location` covers the whole construct (for `$a->b()` the entire call),
/// `member_location` only the member name token. `ranges` lists argument
/// sub-ranges for `ArgumentList` references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub ref_kind: RefKind,
    pub ty: TypeComposite,
    pub location: Location,
    pub scope: Option<TypeComposite>,
    pub scope_range: Option<Range>,
    pub member_location: Option<Range>,
    pub ranges: Vec<Range>,
}

impl Reference {
    pub fn new(ref_kind: RefKind, ty: TypeComposite, location: Location) -> Self {
        Self {
            ref_kind,
            ty,
            location,
            scope: None,
            scope_range: None,
            member_location: None,
            ranges: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: TypeComposite) -> Self {
        if !scope.is_empty() {
            self.scope = Some(scope);
        }
        self
    }

    pub fn with_member_location(mut self, range: Range) -> Self {
        self.member_location = Some(range);
        self
    }

    pub fn with_scope_range(mut self, range: Range) -> Self {
        self.scope_range = Some(range);
        self
    }

    /// The referenced name as written, or the empty string.
    pub fn name(&self) -> &str {
        self.ty.first().map(|t| t.name()).unwrap_or("")
    }

    pub fn range(&self) -> Option<Range> {
        self.location.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_kind_codes_are_unique() {
        for kind in RefKind::ALL {
            assert_eq!(RefKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(RefKind::from_code(0), None);
        assert_eq!(RefKind::from_code(99), None);
    }

    #[test]
    fn test_access_style() {
        assert!(RefKind::ClassConst.is_static_access());
        assert!(RefKind::MethodCall.is_instance_access());
        assert!(!RefKind::Function.is_member());
    }
}
