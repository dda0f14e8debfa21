use super::location::{Location, Range};
use super::type_name::TypeComposite;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable bindings valid inside one function body, or the top level of a
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeVar {
    pub location: Location,
    vars: BTreeMap<String, TypeComposite>,
}

impl ScopeVar {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            vars: BTreeMap::new(),
        }
    }

    pub fn from_parts(location: Location, vars: BTreeMap<String, TypeComposite>) -> Self {
        Self { location, vars }
    }

    /// Adds `types` to the union already bound to `name`. Binding an empty
    /// union still records that the variable exists.
    pub fn bind(&mut self, name: &str, types: &TypeComposite) {
        self.vars
            .entry(normalise(name))
            .or_default()
            .merge(types);
    }

    pub fn get(&self, name: &str) -> Option<&TypeComposite> {
        self.vars.get(&normalise(name))
    }

    pub fn vars(&self) -> impl Iterator<Item = (&String, &TypeComposite)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn range(&self) -> Option<Range> {
        self.location.range
    }
}

fn normalise(name: &str) -> String {
    if name.starts_with('$') {
        name.to_string()
    } else {
        format!("${name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::TypeName;

    #[test]
    fn test_bind_unions_types() {
        let mut scope = ScopeVar::new(Location::new("file:///a.php", Range::new(0, 50)));
        scope.bind("$a", &TypeComposite::single(TypeName::new("int")));
        scope.bind("a", &TypeComposite::single(TypeName::new("string")));

        let types = scope.get("$a").unwrap();
        assert_eq!(types.to_string(), "int|string");
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_empty_binding_declares_variable() {
        let mut scope = ScopeVar::default();
        scope.bind("$x", &TypeComposite::new());
        assert!(scope.get("$x").is_some_and(|t| t.is_empty()));
    }
}
