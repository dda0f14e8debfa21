//! Folds a tree-sitter parse tree into symbols, references and scopes.
//!
//! The tree is walked once with a [`tree_sitter::TreeCursor`]. Entering a
//! node pushes a [`Frame`] holding the node's [`Pending`] value (or `None`
//! for nodes that carry no meaning); leaving it pops the frame and finishes
//! the pending value into zero or more [`Finished`] items. Each item is
//! recorded when it is a symbol or reference, then offered to the frames
//! below, innermost first, until one of them consumes it.
//!
//! Only the frame of the direct parent sees an item as a
//! [`Edge::Child`] (together with the tree-sitter field name); frames
//! further down see it as an [`Edge::Descendant`]. Leaf tokens are only
//! offered to their direct parent.

pub mod consume;
pub mod doc;
pub mod expr;
pub mod node;

pub use consume::Pending;
pub use doc::DocBlock;

use crate::symbol::{
    ImportKind, ImportTable, Location, ModifierWord, Range, RefKind, Reference, ScopeVar, Symbol,
    TypeComposite, TypeName,
};
use tracing::trace;
use tree_sitter::{Node, Tree};

/// Everything extracted from one document.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub imports: ImportTable,
    /// Top-level variables of the document
    pub globals: ScopeVar,
    /// Function, method and closure scopes
    pub scopes: Vec<ScopeVar>,
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
}

/// How the frame being offered an item relates to the item's node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Direct child, hanging under the given field
    Child(Option<&'static str>),
    Descendant,
}

impl Edge {
    pub fn is_child(self) -> bool {
        matches!(self, Edge::Child(_))
    }

    pub fn field(self) -> Option<&'static str> {
        match self {
            Edge::Child(field) => field,
            Edge::Descendant => None,
        }
    }

    pub fn is_field(self, name: &str) -> bool {
        self.field() == Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: &'static str,
    pub text: String,
    pub range: Range,
}

/// One argument of a call: its range and the types of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentItem {
    pub range: Range,
    pub value_range: Range,
    pub value: TypeComposite,
}

/// A `property_element` or `const_element`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub range: Range,
    pub value_range: Option<Range>,
    pub value: TypeComposite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseClause {
    pub name: String,
    pub range: Range,
    pub alias: Option<String>,
    pub kind: Option<ImportKind>,
}

/// Which list of a class declaration a [`Finished::Names`] fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRole {
    Extends,
    Implements,
    Traits,
}

/// Result of finishing a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Finished {
    Token(Token),
    /// A name as written: `Foo`, `App\Foo`, or `$prop` in declarations
    Name { text: String, range: Range },
    Type { types: TypeComposite, range: Range },
    Modifier(ModifierWord),
    /// An expression whose value types are known
    Value { types: TypeComposite, range: Range },
    Reference { reference: Reference, value: TypeComposite },
    Symbol(Symbol),
    Parameter(crate::symbol::Parameter),
    Argument(ArgumentItem),
    Arguments { range: Range, args: Vec<ArgumentItem> },
    Names { role: NameRole, names: Vec<String> },
    UseClause(UseClause),
    Alias(String),
    Element(Element),
    Return(TypeComposite),
    CapturedVars(Vec<String>),
}

impl Finished {
    /// Source range and types of a value-bearing item.
    pub fn as_value(&self) -> Option<(Range, TypeComposite)> {
        match self {
            Finished::Value { types, range } => Some((*range, types.clone())),
            Finished::Reference { reference, value } => {
                reference.range().map(|range| (range, value.clone()))
            }
            Finished::Name { range, .. } => Some((*range, TypeComposite::new())),
            _ => None,
        }
    }

    /// Name of a variable reference, `$` included.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Finished::Reference { reference, .. } if reference.ref_kind == RefKind::Variable => {
                Some(reference.name())
            }
            _ => None,
        }
    }

    pub fn modifier(&self) -> Option<ModifierWord> {
        match self {
            Finished::Modifier(word) => Some(*word),
            Finished::Token(token) => ModifierWord::parse(&token.text),
            _ => None,
        }
    }
}

/// Enclosing class, interface or trait.
#[derive(Debug, Clone, Default)]
pub struct ClassContext {
    pub fqn: String,
    pub parent: Option<String>,
    pub anonymous: bool,
}

/// Mutable state shared by every pending value while a document is built.
#[derive(Debug)]
pub struct BuildContext<'s> {
    pub uri: String,
    pub source: &'s str,
    pub imports: ImportTable,
    /// Innermost last; the first entry holds the document's globals
    pub scopes: Vec<ScopeVar>,
    pub finished_scopes: Vec<ScopeVar>,
    pub classes: Vec<ClassContext>,
    pub doc: Option<DocBlock>,
    pub symbols: Vec<Symbol>,
    pub references: Vec<Reference>,
}

impl<'s> BuildContext<'s> {
    pub fn new(uri: &str, source: &'s str) -> Self {
        let globals = ScopeVar::new(Location::new(uri, Range::new(0, source.len() as u32)));
        Self {
            uri: uri.to_string(),
            source,
            imports: ImportTable::new(),
            scopes: vec![globals],
            finished_scopes: Vec::new(),
            classes: Vec::new(),
            doc: None,
            symbols: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn text(&self, range: Range) -> &'s str {
        self.source
            .get(range.start as usize..range.end as usize)
            .unwrap_or("")
    }

    pub fn location(&self, range: Range) -> Location {
        Location::new(self.uri.clone(), range)
    }

    pub fn class(&self) -> Option<&ClassContext> {
        self.classes.last()
    }

    pub fn class_fqn(&self) -> Option<&str> {
        self.class()
            .map(|c| c.fqn.as_str())
            .filter(|fqn| !fqn.is_empty())
    }

    /// Resolves a class name as written, mapping `self`, `static` and
    /// `parent` onto the enclosing class.
    pub fn resolve_class_name(&self, raw: &str) -> TypeName {
        let raw = raw.trim();
        match raw.to_ascii_lowercase().as_str() {
            "self" | "static" => match self.class_fqn() {
                Some(fqn) => TypeName::qualified(fqn),
                None => TypeName::new(raw),
            },
            "parent" => match self.class().and_then(|c| c.parent.as_deref()) {
                Some(parent) => TypeName::qualified(parent),
                None => TypeName::new(raw),
            },
            _ => {
                let mut name = TypeName::new(raw);
                name.resolve_to_fully_qualified(&self.imports);
                name
            }
        }
    }

    /// Resolves every name of `types` the way [`Self::resolve_class_name`]
    /// does.
    pub fn resolve_types(&self, types: &TypeComposite) -> TypeComposite {
        types
            .iter()
            .map(|t| {
                if t.is_variable() || (t.is_fully_qualified() && !is_relative_scope(t.name())) {
                    t.clone()
                } else {
                    self.resolve_class_name(t.name())
                }
            })
            .collect()
    }

    pub fn scope(&mut self) -> &mut ScopeVar {
        if self.scopes.is_empty() {
            self.scopes.push(ScopeVar::new(Location::empty()));
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn bind(&mut self, name: &str, types: &TypeComposite) {
        trace!(name, types = %types, "bind variable");
        self.scope().bind(name, types);
    }

    pub fn lookup_var(&self, name: &str) -> TypeComposite {
        self.scopes
            .last()
            .and_then(|scope| scope.get(name))
            .cloned()
            .unwrap_or_default()
    }

    pub fn globals(&self) -> Option<&ScopeVar> {
        self.scopes.first()
    }

    /// Variable reference at `range`, with the currently bound types as
    /// its value.
    pub fn variable_reference(&self, name: &str, range: Range) -> Finished {
        let mut reference = Reference::new(
            RefKind::Variable,
            TypeComposite::single(TypeName::new(name)),
            self.location(range),
        );
        if let Some(window) = self.scopes.last().and_then(ScopeVar::range) {
            reference = reference.with_scope_range(window);
        }
        Finished::Reference {
            reference,
            value: self.lookup_var(name),
        }
    }

    /// Reference to a class name, used for type hints and scopes.
    pub fn class_reference(&self, name: TypeName, range: Range) -> Finished {
        Finished::Reference {
            reference: Reference::new(RefKind::Class, TypeComposite::single(name), self.location(range)),
            value: TypeComposite::new(),
        }
    }

    /// Return types of a function declared earlier in this document.
    pub fn function_types(&self, fqn: &str) -> TypeComposite {
        let short = fqn.rsplit('\\').next().unwrap_or(fqn);
        let mut types = TypeComposite::new();
        for symbol in &self.symbols {
            if let Symbol::Function(f) = symbol
                && (f.name == fqn || f.name == short)
            {
                types.merge(&f.signature.return_types);
            }
        }
        types
    }

    /// Value types of `name` declared earlier in this document on any of
    /// the `scope` classes.
    pub fn member_types(&self, scope: &TypeComposite, name: &str, kind: RefKind) -> TypeComposite {
        let mut types = TypeComposite::new();
        for symbol in &self.symbols {
            let Some(owner) = symbol.scope() else {
                continue;
            };
            if symbol.name() != name || !scope.contains(owner) {
                continue;
            }
            let matches = match (kind, symbol) {
                (RefKind::MethodCall | RefKind::Method, Symbol::Method(_)) => true,
                (RefKind::PropertyAccess | RefKind::Property, Symbol::Property(_)) => true,
                (RefKind::ClassConst, Symbol::ClassConstant(_)) => true,
                _ => false,
            };
            if matches && let Some(value) = symbol.value_types() {
                types.merge(value);
            }
        }
        types
    }

    /// Types of a namespace-level constant declared earlier in this document.
    pub fn constant_types(&self, fqn: &str) -> TypeComposite {
        let mut types = TypeComposite::new();
        for symbol in &self.symbols {
            if let Symbol::Constant(c) | Symbol::DefineConstant(c) = symbol
                && c.name == fqn
            {
                types.merge(&c.types);
            }
        }
        types
    }
}

fn is_relative_scope(name: &str) -> bool {
    matches!(name, "self" | "static" | "parent")
}

/// One entry of the traversal stack.
#[derive(Debug)]
struct Frame {
    kind: &'static str,
    field: Option<&'static str>,
    range: Range,
    pending: Option<Pending>,
    /// Set on the frame that silenced its subtree
    opaque: bool,
}

struct Builder<'s> {
    ctx: BuildContext<'s>,
    stack: Vec<Frame>,
    /// Number of open opaque frames; nodes below them stay inert
    muted: usize,
}

impl<'s> Builder<'s> {
    fn new(uri: &str, source: &'s str) -> Self {
        Self {
            ctx: BuildContext::new(uri, source),
            stack: Vec::new(),
            muted: 0,
        }
    }

    fn enter(&mut self, node: Node<'_>, field: Option<&'static str>) {
        let kind = node.kind();
        let range = Range::from_node(&node);

        if self.muted > 0 {
            self.stack.push(Frame {
                kind,
                field,
                range,
                pending: None,
                opaque: false,
            });
            return;
        }

        let is_phrase = node.child_count() > 0;
        if kind == "comment" {
            let text = self.ctx.text(range);
            if DocBlock::is_doc_comment(text) {
                self.ctx.doc = Some(DocBlock::parse(text));
            }
        }

        let parent = self.stack.last().map(|f| f.kind);
        let mut pending = node::construct(&node, field, parent, &mut self.ctx);

        if is_phrase {
            match pending.as_mut() {
                Some(p) if p.accepts_doc() => {
                    if let Some(doc) = self.ctx.doc.take() {
                        p.set_doc(doc);
                    }
                }
                _ if node::keeps_doc(kind) => {}
                _ => self.ctx.doc = None,
            }
        }

        let opaque = is_phrase && pending.as_ref().is_some_and(Pending::is_opaque);
        if opaque {
            self.muted += 1;
        }
        self.stack.push(Frame {
            kind,
            field,
            range,
            pending,
            opaque,
        });
    }

    fn leave(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.opaque {
            self.muted -= 1;
        }
        let Some(pending) = frame.pending else {
            return;
        };
        for item in pending.finish(frame.range, &mut self.ctx) {
            self.dispatch(item, frame.field);
        }
    }

    /// Records `item` and offers it to the frames below, innermost first.
    fn dispatch(&mut self, item: Finished, field: Option<&'static str>) {
        match &item {
            Finished::Symbol(symbol) => self.ctx.symbols.push(symbol.clone()),
            Finished::Reference { reference, .. } => {
                if !reference.location.is_empty() {
                    self.ctx.references.push(reference.clone());
                }
            }
            _ => {}
        }

        let token = matches!(item, Finished::Token(_));
        for (depth, frame) in self.stack.iter_mut().rev().enumerate() {
            if token && depth > 0 {
                break;
            }
            let edge = if depth == 0 {
                Edge::Child(field)
            } else {
                Edge::Descendant
            };
            let Some(pending) = frame.pending.as_mut() else {
                continue;
            };
            if pending.consume(&item, edge, &mut self.ctx) {
                break;
            }
        }
    }

    fn finish(mut self) -> BuildOutput {
        while !self.stack.is_empty() {
            self.leave();
        }
        let mut scopes = std::mem::take(&mut self.ctx.scopes).into_iter();
        let globals = scopes.next().unwrap_or_default();
        // Unbalanced scopes only happen on broken trees; keep what was seen
        let mut finished = self.ctx.finished_scopes;
        finished.extend(scopes);

        BuildOutput {
            imports: self.ctx.imports,
            globals,
            scopes: finished,
            symbols: self.ctx.symbols,
            references: self.ctx.references,
        }
    }
}

/// Builds the symbols of `source` from its parse tree.
pub fn build(uri: &str, source: &str, tree: &Tree) -> BuildOutput {
    let mut builder = Builder::new(uri, source);
    let mut cursor = tree.walk();

    loop {
        builder.enter(cursor.node(), cursor.field_name());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            builder.leave();
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
        }
    }
}
