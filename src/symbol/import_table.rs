//! Namespace and `use` import bookkeeping for one document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which alias map a name is looked up in. PHP keeps class, function and
/// constant imports apart (`use`, `use function`, `use const`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportKind {
    Class,
    Function,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportTable {
    namespace: Vec<String>,
    classes: BTreeMap<String, String>,
    functions: BTreeMap<String, String>,
    constants: BTreeMap<String, String>,
}

impl ImportTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        namespace: Vec<String>,
        classes: BTreeMap<String, String>,
        functions: BTreeMap<String, String>,
        constants: BTreeMap<String, String>,
    ) -> Self {
        Self {
            namespace,
            classes,
            functions,
            constants,
        }
    }

    /// Replaces the current namespace. An empty string means the global one.
    pub fn set_namespace(&mut self, namespace: &str) {
        self.namespace = namespace
            .trim_matches('\\')
            .split('\\')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
    }

    pub fn namespace(&self) -> String {
        self.namespace.join("\\")
    }

    pub fn namespace_parts(&self) -> &[String] {
        &self.namespace
    }

    pub fn aliases(&self, kind: ImportKind) -> &BTreeMap<String, String> {
        match kind {
            ImportKind::Class => &self.classes,
            ImportKind::Function => &self.functions,
            ImportKind::Constant => &self.constants,
        }
    }

    /// Registers `use <fqn> [as <alias>]`. Without an alias the last segment
    /// of the imported name is used.
    pub fn add_import(&mut self, kind: ImportKind, fqn: &str, alias: Option<&str>) {
        let fqn = fqn.trim_start_matches('\\').to_string();
        let alias = alias
            .map(str::to_string)
            .unwrap_or_else(|| fqn.rsplit('\\').next().unwrap_or(&fqn).to_string());
        if alias.is_empty() || fqn.is_empty() {
            return;
        }
        let map = match kind {
            ImportKind::Class => &mut self.classes,
            ImportKind::Function => &mut self.functions,
            ImportKind::Constant => &mut self.constants,
        };
        map.insert(alias, fqn);
    }

    /// Prefixes a declared name with the current namespace.
    pub fn namespaced(&self, name: &str) -> String {
        let name = name.trim_start_matches('\\');
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{name}", self.namespace())
        }
    }

    /// PHP name resolution for a name as written in source.
    pub fn get_fqn(&self, name: &str, kind: ImportKind) -> String {
        if let Some(absolute) = name.strip_prefix('\\') {
            return absolute.to_string();
        }
        if let Some(rest) = name.strip_prefix("namespace\\") {
            return self.namespaced(rest);
        }

        match name.split_once('\\') {
            Some((first, rest)) => match self.classes.get(first) {
                Some(target) => format!("{target}\\{rest}"),
                None => self.namespaced(name),
            },
            None => match self.aliases(kind).get(name) {
                Some(target) => target.clone(),
                None => self.namespaced(name),
            },
        }
    }

    /// Shortest spelling of `fqn` that resolves back to it from this document.
    pub fn get_qualified(&self, fqn: &str, kind: ImportKind) -> String {
        let fqn = fqn.trim_start_matches('\\');

        if let Some((alias, _)) = self.aliases(kind).iter().find(|(_, target)| *target == fqn) {
            return alias.clone();
        }

        let aliased_prefix = self.classes.iter().find_map(|(alias, target)| {
            fqn.strip_prefix(target.as_str())
                .and_then(|rest| rest.strip_prefix('\\'))
                .map(|rest| format!("{alias}\\{rest}"))
        });
        if let Some(short) = aliased_prefix {
            return short;
        }

        if self.namespace.is_empty() {
            return fqn.to_string();
        }

        let prefix = format!("{}\\", self.namespace());
        match fqn.strip_prefix(&prefix) {
            Some(relative) => relative.to_string(),
            None => format!("\\{fqn}"),
        }
    }
}
