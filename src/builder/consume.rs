//! Pending values for declarations, and the [`Pending`] dispatch itself.
//!
//! A pending value lives on the builder stack while its node is open. It
//! absorbs finished children through `consume` and turns into finished
//! items when the node is left.

use super::expr::{
    ArgumentExpr, ArgumentsExpr, Assignment, Binary, Call, Cast, Catch, Conditional, Foreach,
    Group, Literal, Member, New, ReturnStmt, Unary,
};
use super::{BuildContext, ClassContext, DocBlock, Edge, Element, Finished, NameRole, UseClause};
use crate::symbol::{
    ClassConstant, ClassLike, Constant, Function, ImportKind, Method, ModifierWord,
    Modifiers, Parameter, Property, Range, RefKind, Reference, ScopeVar, Signature, Symbol,
    TypeComposite, TypeName, Visibility,
};

/// What a node turns into once it is left.
#[derive(Debug)]
pub enum Outcome {
    Nothing,
    Done(Finished),
    /// The node decided it is a different construct than its kind says
    Transform(Vec<Finished>),
    /// One node standing for several independent items
    Collection(Vec<Finished>),
}

impl IntoIterator for Outcome {
    type Item = Finished;
    type IntoIter = std::vec::IntoIter<Finished>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Outcome::Nothing => Vec::new().into_iter(),
            Outcome::Done(item) => vec![item].into_iter(),
            Outcome::Transform(items) | Outcome::Collection(items) => items.into_iter(),
        }
    }
}

#[derive(Debug)]
pub enum Pending {
    /// A node whose result is known on entry; its subtree is not visited
    Atom(Finished),
    Namespace(NamespaceDecl),
    UseDeclaration(UseDeclaration),
    UseClause(UseClauseDecl),
    Alias(Option<String>),
    ClassLike(ClassDecl),
    NameList(NameList),
    EnumCase(EnumCaseDecl),
    Function(FunctionDecl),
    CapturedVars(Vec<String>),
    Parameter(ParameterDecl),
    Type(TypeExpr),
    Property(PropertyDecl),
    Const(ConstDecl),
    Element(ElementDecl),
    Call(Call),
    New(New),
    Member(Member),
    Arguments(ArgumentsExpr),
    Argument(ArgumentExpr),
    Assignment(Assignment),
    Return(ReturnStmt),
    Group(Group),
    Literal(Literal),
    Binary(Binary),
    Unary(Unary),
    Cast(Cast),
    Conditional(Conditional),
    Foreach(Foreach),
    Catch(Catch),
    Global,
}

impl Pending {
    pub fn is_opaque(&self) -> bool {
        matches!(self, Pending::Atom(_))
    }

    pub fn accepts_doc(&self) -> bool {
        matches!(
            self,
            Pending::Function(_)
                | Pending::ClassLike(_)
                | Pending::Property(_)
                | Pending::Const(_)
                | Pending::Assignment(_)
                | Pending::Call(_)
        )
    }

    pub fn set_doc(&mut self, doc: DocBlock) {
        match self {
            Pending::Function(p) => p.doc = Some(doc),
            Pending::ClassLike(p) => p.doc = Some(doc),
            Pending::Property(p) => p.doc = Some(doc),
            Pending::Const(p) => p.doc = Some(doc),
            Pending::Assignment(p) => p.doc = Some(doc),
            Pending::Call(p) => p.doc = Some(doc),
            _ => {}
        }
    }

    /// Offers a finished item; returns whether it was absorbed.
    pub fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match self {
            Pending::Atom(_) => false,
            Pending::Namespace(p) => p.consume(item, edge, ctx),
            Pending::UseDeclaration(p) => p.consume(item, edge),
            Pending::UseClause(p) => p.consume(item, edge),
            Pending::Alias(alias) => match item {
                Finished::Name { text, .. } => {
                    *alias = Some(text.clone());
                    true
                }
                _ => false,
            },
            Pending::ClassLike(p) => p.consume(item, edge, ctx),
            Pending::NameList(p) => p.consume(item, edge, ctx),
            Pending::EnumCase(p) => p.consume(item, edge, ctx),
            Pending::Function(p) => p.consume(item, edge, ctx),
            Pending::CapturedVars(names) => match item.as_variable() {
                Some(name) if edge.is_child() => {
                    names.push(name.to_string());
                    true
                }
                _ => false,
            },
            Pending::Parameter(p) => p.consume(item, edge, ctx),
            Pending::Type(p) => p.consume(item, edge, ctx),
            Pending::Property(p) => p.consume(item, edge),
            Pending::Const(p) => p.consume(item, edge),
            Pending::Element(p) => p.consume(item, ctx),
            Pending::Call(p) => p.consume(item, edge),
            Pending::New(p) => p.consume(item, edge, ctx),
            Pending::Member(p) => p.consume(item, edge, ctx),
            Pending::Arguments(p) => p.consume(item, edge),
            Pending::Argument(p) => p.consume(item, edge),
            Pending::Assignment(p) => p.consume(item, edge),
            Pending::Return(p) => p.consume(item),
            Pending::Group(p) => p.consume(item),
            Pending::Literal(_) => swallows(item),
            Pending::Binary(p) => p.consume(item, edge),
            Pending::Unary(p) => p.consume(item, edge),
            Pending::Cast(p) => p.consume(item, edge),
            Pending::Conditional(p) => p.consume(item, edge),
            Pending::Foreach(p) => p.consume(item, ctx),
            Pending::Catch(p) => p.consume(item, edge, ctx),
            Pending::Global => match item.as_variable() {
                Some(name) => {
                    let types = ctx
                        .globals()
                        .and_then(|g| g.get(name))
                        .cloned()
                        .unwrap_or_default();
                    ctx.bind(name, &types);
                    true
                }
                None => false,
            },
        }
    }

    pub fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        match self {
            Pending::Atom(item) => Outcome::Done(item),
            Pending::Namespace(p) => p.finish(ctx),
            Pending::UseDeclaration(p) => p.finish(ctx),
            Pending::UseClause(p) => p.finish(range),
            Pending::Alias(alias) => alias.map_or(Outcome::Nothing, |a| {
                Outcome::Done(Finished::Alias(a))
            }),
            Pending::ClassLike(p) => p.finish(range, ctx),
            Pending::NameList(p) => p.finish(ctx),
            Pending::EnumCase(p) => p.finish(range, ctx),
            Pending::Function(p) => p.finish(range, ctx),
            Pending::CapturedVars(names) => captured_vars(names, ctx),
            Pending::Parameter(p) => p.finish(ctx),
            Pending::Type(p) => p.finish(range),
            Pending::Property(p) => p.finish(ctx),
            Pending::Const(p) => p.finish(ctx),
            Pending::Element(p) => p.finish(range),
            Pending::Call(p) => p.finish(range, ctx),
            Pending::New(p) => p.finish(range, ctx),
            Pending::Member(p) => p.finish(range, ctx),
            Pending::Arguments(p) => p.finish(range),
            Pending::Argument(p) => p.finish(range),
            Pending::Assignment(p) => p.finish(range, ctx),
            Pending::Return(p) => p.finish(),
            Pending::Group(p) => p.finish(range),
            Pending::Literal(p) => p.finish(range),
            Pending::Binary(p) => p.finish(range),
            Pending::Unary(p) => p.finish(range),
            Pending::Cast(p) => p.finish(range),
            Pending::Conditional(p) => p.finish(range),
            Pending::Foreach(_) | Pending::Catch(_) | Pending::Global => Outcome::Nothing,
        }
    }
}

/// Expression fragments that a construct absorbs so they do not leak into
/// unrelated ancestors.
pub(super) fn swallows(item: &Finished) -> bool {
    matches!(
        item,
        Finished::Value { .. }
            | Finished::Reference { .. }
            | Finished::Name { .. }
            | Finished::Type { .. }
            | Finished::Argument(_)
            | Finished::Arguments { .. }
    )
}

fn apply_modifier(item: &Finished, modifiers: &mut Modifiers, visibility: &mut Visibility) -> bool {
    match item.modifier() {
        Some(ModifierWord::Modifier(m)) => {
            *modifiers |= m;
            true
        }
        Some(ModifierWord::Visibility(v)) => {
            *visibility |= v;
            true
        }
        None => false,
    }
}

fn or_public(visibility: Visibility) -> Visibility {
    if visibility.is_empty() {
        Visibility::PUBLIC
    } else {
        visibility
    }
}

/// Class context a member declaration belongs to, if it should be recorded.
fn member_scope(ctx: &BuildContext<'_>) -> Option<String> {
    match ctx.class() {
        Some(class) if !class.anonymous && !class.fqn.is_empty() => Some(class.fqn.clone()),
        _ => None,
    }
}

#[derive(Debug)]
pub struct NamespaceDecl {
    braced: bool,
}

impl NamespaceDecl {
    pub fn new(braced: bool, ctx: &mut BuildContext<'_>) -> Self {
        ctx.imports = crate::symbol::ImportTable::new();
        Self { braced }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, .. } if edge.is_child() => {
                ctx.imports.set_namespace(text);
                true
            }
            _ => false,
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        if self.braced {
            ctx.imports = crate::symbol::ImportTable::new();
        }
        Outcome::Nothing
    }
}

#[derive(Debug, Default)]
pub struct UseDeclaration {
    kind: Option<ImportKind>,
    prefix: Option<String>,
    clauses: Vec<UseClause>,
}

impl UseDeclaration {
    fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        match item {
            Finished::Token(token) if edge.is_child() => match import_kind(&token.text) {
                Some(kind) => {
                    self.kind = Some(kind);
                    true
                }
                None => false,
            },
            Finished::Name { text, .. } => {
                self.prefix = Some(text.clone());
                true
            }
            Finished::UseClause(clause) => {
                self.clauses.push(clause.clone());
                true
            }
            _ => false,
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        let mut refs = Vec::with_capacity(self.clauses.len());
        for clause in self.clauses {
            let kind = clause.kind.or(self.kind).unwrap_or(ImportKind::Class);
            let fqn = match &self.prefix {
                Some(prefix) => format!(
                    "{}\\{}",
                    prefix.trim_matches('\\'),
                    clause.name.trim_start_matches('\\')
                ),
                None => clause.name.trim_start_matches('\\').to_string(),
            };
            ctx.imports.add_import(kind, &fqn, clause.alias.as_deref());

            let ref_kind = match kind {
                ImportKind::Class => RefKind::Class,
                ImportKind::Function => RefKind::Function,
                ImportKind::Constant => RefKind::ConstantAccess,
            };
            refs.push(Finished::Reference {
                reference: Reference::new(
                    ref_kind,
                    TypeComposite::single(TypeName::qualified(&fqn)),
                    ctx.location(clause.range),
                ),
                value: TypeComposite::new(),
            });
        }
        Outcome::Collection(refs)
    }
}

fn import_kind(keyword: &str) -> Option<ImportKind> {
    match keyword.to_ascii_lowercase().as_str() {
        "function" => Some(ImportKind::Function),
        "const" => Some(ImportKind::Constant),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct UseClauseDecl {
    name: Option<(String, Range)>,
    alias: Option<String>,
    kind: Option<ImportKind>,
    after_as: bool,
}

impl UseClauseDecl {
    fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        match item {
            Finished::Token(token) if token.text.eq_ignore_ascii_case("as") => {
                self.after_as = true;
                true
            }
            Finished::Token(token) => match import_kind(&token.text) {
                Some(kind) => {
                    self.kind = Some(kind);
                    true
                }
                None => false,
            },
            Finished::Name { text, .. } if edge.is_field("alias") || self.after_as => {
                self.alias = Some(text.clone());
                true
            }
            Finished::Name { text, range } if self.name.is_none() => {
                self.name = Some((text.clone(), *range));
                true
            }
            Finished::Alias(alias) => {
                self.alias = Some(alias.clone());
                true
            }
            _ => false,
        }
    }

    fn finish(self, range: Range) -> Outcome {
        match self.name {
            Some((name, name_range)) => Outcome::Done(Finished::UseClause(UseClause {
                name,
                range: if name_range.is_empty() { range } else { name_range },
                alias: self.alias,
                kind: self.kind,
            })),
            None => Outcome::Nothing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
    Anonymous,
}

#[derive(Debug)]
pub struct ClassDecl {
    kind: ClassKind,
    name: Option<String>,
    modifiers: Modifiers,
    extends: Vec<String>,
    implements: Vec<String>,
    traits: Vec<String>,
    doc: Option<DocBlock>,
}

impl ClassDecl {
    pub fn new(kind: ClassKind, ctx: &mut BuildContext<'_>) -> Self {
        ctx.classes.push(ClassContext {
            fqn: String::new(),
            parent: None,
            anonymous: kind == ClassKind::Anonymous,
        });
        Self {
            kind,
            name: None,
            modifiers: Modifiers::empty(),
            extends: Vec::new(),
            implements: Vec::new(),
            traits: Vec::new(),
            doc: None,
        }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, .. }
                if edge.is_field("name") && self.kind != ClassKind::Anonymous =>
            {
                let fqn = ctx.imports.namespaced(text);
                if let Some(class) = ctx.classes.last_mut() {
                    class.fqn = fqn.clone();
                }
                self.name = Some(fqn);
                true
            }
            Finished::Names { role, names } => {
                match role {
                    NameRole::Extends => {
                        if let Some(class) = ctx.classes.last_mut() {
                            class.parent = names.first().cloned();
                        }
                        self.extends.extend(names.iter().cloned());
                    }
                    NameRole::Implements => self.implements.extend(names.iter().cloned()),
                    NameRole::Traits => self.traits.extend(names.iter().cloned()),
                }
                true
            }
            // Arguments of `new class(...)` belong to the creation expression
            Finished::Arguments { .. } if edge.is_child() => false,
            Finished::Modifier(_) if edge.is_child() => {
                let mut visibility = Visibility::empty();
                apply_modifier(item, &mut self.modifiers, &mut visibility)
            }
            other => swallows(other),
        }
    }

    fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let context = ctx.classes.pop().unwrap_or_default();
        if self.kind == ClassKind::Anonymous {
            let types: TypeComposite = context
                .parent
                .iter()
                .map(|p| TypeName::qualified(p))
                .collect();
            return Outcome::Done(Finished::Value { types, range });
        }
        let Some(name) = self.name else {
            return Outcome::Nothing;
        };

        let mut class = ClassLike::new(name, ctx.location(range));
        class.modifiers = self.modifiers;
        class.extends = self.extends;
        class.implements = self.implements;
        class.traits = self.traits;
        class.description = self.doc.and_then(|d| d.description);

        let symbol = match self.kind {
            ClassKind::Interface => Symbol::Interface(class),
            ClassKind::Trait => Symbol::Trait(class),
            _ => Symbol::Class(class),
        };
        Outcome::Done(Finished::Symbol(symbol))
    }
}

/// `extends`, `implements` and trait `use` lists.
#[derive(Debug)]
pub struct NameList {
    role: NameRole,
    names: Vec<(String, Range)>,
}

impl NameList {
    pub fn new(role: NameRole) -> Self {
        Self {
            role,
            names: Vec::new(),
        }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, range } if edge.is_child() => {
                let name = ctx.resolve_class_name(text);
                self.names.push((name.name().to_string(), *range));
                true
            }
            _ => false,
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        let mut items: Vec<Finished> = self
            .names
            .iter()
            .map(|(name, range)| ctx.class_reference(TypeName::qualified(name), *range))
            .collect();
        items.push(Finished::Names {
            role: self.role,
            names: self.names.into_iter().map(|(name, _)| name).collect(),
        });
        Outcome::Collection(items)
    }
}

/// `case Foo = 'foo';` inside an enum, recorded as a class constant typed
/// as the enum itself.
#[derive(Debug, Default)]
pub struct EnumCaseDecl {
    name: Option<String>,
    value: Option<(Range, TypeComposite)>,
}

impl EnumCaseDecl {
    fn consume(&mut self, item: &Finished, edge: Edge, _ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, .. } if self.name.is_none() && !edge.is_field("value") => {
                self.name = Some(text.clone());
                true
            }
            other => match other.as_value() {
                Some(value) => {
                    self.value = Some(value);
                    true
                }
                None => false,
            },
        }
    }

    fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let (Some(name), Some(scope)) = (self.name, member_scope(ctx)) else {
            return Outcome::Nothing;
        };
        let value = self.value.map(|(r, _)| ctx.text(r).to_string());
        Outcome::Done(Finished::Symbol(Symbol::ClassConstant(ClassConstant {
            name,
            types: TypeComposite::single(TypeName::qualified(&scope)),
            scope,
            location: ctx.location(range),
            visibility: Visibility::PUBLIC,
            value,
            description: None,
        })))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Method,
    Closure,
    Arrow,
}

#[derive(Debug)]
pub struct FunctionDecl {
    kind: FunctionKind,
    name: Option<String>,
    modifiers: Modifiers,
    visibility: Visibility,
    parameters: Vec<Parameter>,
    declared: TypeComposite,
    inferred: TypeComposite,
    doc: Option<DocBlock>,
}

impl FunctionDecl {
    /// Opens the function's variable scope.
    pub fn new(kind: FunctionKind, range: Range, ctx: &mut BuildContext<'_>) -> Self {
        let mut scope = ScopeVar::new(ctx.location(range));
        match kind {
            FunctionKind::Method => {
                if let Some(fqn) = member_scope(ctx) {
                    scope.bind("$this", &TypeComposite::single(TypeName::qualified(&fqn)));
                }
            }
            FunctionKind::Closure => {
                if let Some(this) = ctx.scopes.last().and_then(|s| s.get("$this")) {
                    scope.bind("$this", &this.clone());
                }
            }
            FunctionKind::Arrow => {
                if let Some(parent) = ctx.scopes.last() {
                    scope = ScopeVar::from_parts(
                        ctx.location(range),
                        parent.vars().map(|(k, v)| (k.clone(), v.clone())).collect(),
                    );
                }
            }
            FunctionKind::Function => {}
        }
        ctx.scopes.push(scope);

        Self {
            kind,
            name: None,
            modifiers: Modifiers::empty(),
            visibility: Visibility::empty(),
            parameters: Vec::new(),
            declared: TypeComposite::new(),
            inferred: TypeComposite::new(),
            doc: None,
        }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, .. } if edge.is_field("name") => {
                self.name = Some(text.clone());
                true
            }
            Finished::Modifier(_) if edge.is_child() => {
                apply_modifier(item, &mut self.modifiers, &mut self.visibility)
            }
            Finished::Parameter(param) => {
                let mut param = param.clone();
                if param.types.is_empty()
                    && let Some(types) = self.doc.as_ref().and_then(|d| d.param_types(&param.name))
                {
                    param.types = ctx.resolve_types(types);
                    ctx.bind(&param.name, &param.types);
                }
                self.parameters.push(param);
                true
            }
            Finished::Type { types, .. } if edge.is_field("return_type") => {
                self.declared.merge(types);
                true
            }
            Finished::Return(types) => {
                self.inferred.merge(types);
                true
            }
            Finished::CapturedVars(_) => true,
            other if self.kind == FunctionKind::Arrow && edge.is_field("body") => {
                if let Some((_, types)) = other.as_value() {
                    self.inferred.merge(&types);
                }
                swallows(other)
            }
            other => swallows(other),
        }
    }

    fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        if ctx.scopes.len() > 1
            && let Some(scope) = ctx.scopes.pop()
        {
            ctx.finished_scopes.push(scope);
        }

        let mut return_types = self.declared;
        if let Some(doc) = &self.doc {
            return_types.merge(&ctx.resolve_types(&doc.returns));
        }
        return_types.merge(&self.inferred);

        let signature = Signature {
            parameters: self.parameters,
            return_types,
        };
        let description = self.doc.and_then(|d| d.description);
        let location = ctx.location(range);

        let symbol = match (self.kind, self.name) {
            (FunctionKind::Closure | FunctionKind::Arrow, _) => {
                return Outcome::Done(Finished::Value {
                    types: TypeComposite::single(TypeName::qualified("Closure")),
                    range,
                });
            }
            (_, None) => return Outcome::Nothing,
            (FunctionKind::Function, Some(name)) => Symbol::Function(Function {
                name: ctx.imports.namespaced(&name),
                location,
                signature,
                description,
            }),
            (FunctionKind::Method, Some(name)) => {
                let Some(scope) = member_scope(ctx) else {
                    return Outcome::Nothing;
                };
                Symbol::Method(Method {
                    name,
                    scope,
                    location,
                    modifiers: self.modifiers,
                    visibility: or_public(self.visibility),
                    signature,
                    description,
                })
            }
        };
        Outcome::Done(Finished::Symbol(symbol))
    }
}

/// Binds closure `use (...)` variables from the enclosing scope.
fn captured_vars(names: Vec<String>, ctx: &mut BuildContext<'_>) -> Outcome {
    let depth = ctx.scopes.len();
    if depth >= 2 {
        for name in &names {
            let types = ctx.scopes[depth - 2]
                .get(name)
                .cloned()
                .unwrap_or_default();
            ctx.bind(name, &types);
        }
    }
    Outcome::Done(Finished::CapturedVars(names))
}

#[derive(Debug)]
pub struct ParameterDecl {
    promoted: bool,
    name: Option<(String, Range)>,
    types: TypeComposite,
    default: Option<String>,
    by_ref: bool,
    variadic: bool,
    modifiers: Modifiers,
    visibility: Visibility,
}

impl ParameterDecl {
    pub fn new(promoted: bool, variadic: bool) -> Self {
        Self {
            promoted,
            name: None,
            types: TypeComposite::new(),
            default: None,
            by_ref: false,
            variadic,
            modifiers: Modifiers::empty(),
            visibility: Visibility::empty(),
        }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Type { types, .. } if edge.is_field("type") || self.name.is_none() => {
                self.types.merge(types);
                true
            }
            Finished::Token(token) => match token.text.as_str() {
                "&" => {
                    self.by_ref = true;
                    true
                }
                "..." => {
                    self.variadic = true;
                    true
                }
                _ => false,
            },
            Finished::Modifier(_) => {
                apply_modifier(item, &mut self.modifiers, &mut self.visibility)
            }
            Finished::Name { text, range } if text.starts_with('$') && self.name.is_none() => {
                ctx.bind(text, &self.types);
                self.name = Some((text.trim_start_matches('$').to_string(), *range));
                true
            }
            other if edge.is_field("default_value") => {
                if let Some((range, _)) = other.as_value() {
                    self.default = Some(ctx.text(range).to_string());
                }
                swallows(other)
            }
            other => swallows(other),
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        let Some((name, range)) = self.name else {
            return Outcome::Nothing;
        };
        let parameter = Parameter {
            name,
            types: self.types,
            default: self.default,
            by_ref: self.by_ref,
            variadic: self.variadic,
            location: ctx.location(range),
        };

        match member_scope(ctx) {
            Some(scope) if self.promoted => {
                let property = Property {
                    name: parameter.name.clone(),
                    scope,
                    location: parameter.location.clone(),
                    modifiers: self.modifiers,
                    visibility: or_public(self.visibility),
                    types: parameter.types.clone(),
                    description: None,
                };
                Outcome::Collection(vec![
                    Finished::Symbol(Symbol::Property(property)),
                    Finished::Parameter(parameter),
                ])
            }
            _ => Outcome::Done(Finished::Parameter(parameter)),
        }
    }
}

/// Type hints: `Foo`, `?Foo`, `A|B`, `A&B`, `(A&B)|null`.
#[derive(Debug, Default)]
pub struct TypeExpr {
    nullable: bool,
    types: TypeComposite,
    refs: Vec<Finished>,
}

impl TypeExpr {
    pub fn new(nullable: bool) -> Self {
        Self {
            nullable,
            ..Self::default()
        }
    }

    fn consume(&mut self, item: &Finished, edge: Edge, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, range } if edge.is_child() => {
                let name = ctx.resolve_class_name(text);
                self.refs.push(ctx.class_reference(name.clone(), *range));
                self.types.push(name);
                true
            }
            Finished::Type { types, .. } => {
                self.types.merge(types);
                true
            }
            Finished::Token(token) if token.text == "?" => {
                self.nullable = true;
                true
            }
            _ => false,
        }
    }

    fn finish(mut self, range: Range) -> Outcome {
        if self.nullable {
            self.types.push(TypeName::new("null"));
        }
        let mut items = self.refs;
        items.push(Finished::Type {
            types: self.types,
            range,
        });
        Outcome::Collection(items)
    }
}

#[derive(Debug, Default)]
pub struct PropertyDecl {
    modifiers: Modifiers,
    visibility: Visibility,
    types: TypeComposite,
    elements: Vec<Element>,
    doc: Option<DocBlock>,
}

impl PropertyDecl {
    fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        match item {
            Finished::Modifier(_) => {
                apply_modifier(item, &mut self.modifiers, &mut self.visibility)
            }
            Finished::Token(token) if edge.is_child() => {
                apply_modifier(item, &mut self.modifiers, &mut self.visibility)
                    || token.text == ","
            }
            Finished::Type { types, .. } if edge.is_child() => {
                self.types.merge(types);
                true
            }
            Finished::Element(element) => {
                self.elements.push(element.clone());
                true
            }
            other => swallows(other),
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        let Some(scope) = member_scope(ctx) else {
            return Outcome::Nothing;
        };
        let mut declared = self.types;
        if let Some((_, var_types)) = self.doc.as_ref().and_then(|d| d.var.as_ref()) {
            declared.merge(&ctx.resolve_types(var_types));
        }
        let description = self.doc.and_then(|d| d.description);

        let items = self
            .elements
            .into_iter()
            .map(|element| {
                let mut types = declared.clone();
                types.merge(&element.value);
                Finished::Symbol(Symbol::Property(Property {
                    name: element.name.trim_start_matches('$').to_string(),
                    scope: scope.clone(),
                    location: ctx.location(element.range),
                    modifiers: self.modifiers,
                    visibility: or_public(self.visibility),
                    types,
                    description: description.clone(),
                }))
            })
            .collect();
        Outcome::Collection(items)
    }
}

#[derive(Debug, Default)]
pub struct ConstDecl {
    visibility: Visibility,
    elements: Vec<Element>,
    doc: Option<DocBlock>,
}

impl ConstDecl {
    fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        let mut modifiers = Modifiers::empty();
        match item {
            Finished::Modifier(_) => apply_modifier(item, &mut modifiers, &mut self.visibility),
            Finished::Element(element) => {
                self.elements.push(element.clone());
                true
            }
            Finished::Token(_) if edge.is_child() => {
                apply_modifier(item, &mut modifiers, &mut self.visibility)
            }
            other => swallows(other),
        }
    }

    fn finish(self, ctx: &mut BuildContext<'_>) -> Outcome {
        let class_scope = match ctx.class() {
            Some(class) if class.anonymous => return Outcome::Nothing,
            Some(_) => member_scope(ctx),
            None => None,
        };
        let description = self.doc.and_then(|d| d.description);

        let items = self
            .elements
            .into_iter()
            .map(|element| {
                let value = element.value_range.map(|r| ctx.text(r).to_string());
                let location = ctx.location(element.range);
                let symbol = match &class_scope {
                    Some(scope) => Symbol::ClassConstant(ClassConstant {
                        name: element.name,
                        scope: scope.clone(),
                        location,
                        visibility: or_public(self.visibility),
                        value,
                        types: element.value,
                        description: description.clone(),
                    }),
                    None => Symbol::Constant(Constant {
                        name: ctx.imports.namespaced(&element.name),
                        location,
                        value,
                        types: element.value,
                        description: description.clone(),
                    }),
                };
                Finished::Symbol(symbol)
            })
            .collect();
        Outcome::Collection(items)
    }
}

/// `property_element` and `const_element`: a name with an optional value.
#[derive(Debug, Default)]
pub struct ElementDecl {
    name: Option<String>,
    value: Option<(Range, TypeComposite)>,
}

impl ElementDecl {
    fn consume(&mut self, item: &Finished, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Name { text, .. } if self.name.is_none() => {
                self.name = Some(text.clone());
                true
            }
            Finished::Token(token) => token.text == "=",
            other if self.name.is_some() => match other.as_value() {
                Some((range, types)) => {
                    self.value = Some((range, ctx.resolve_types(&types)));
                    true
                }
                None => swallows(other),
            },
            other => swallows(other),
        }
    }

    fn finish(self, range: Range) -> Outcome {
        let Some(name) = self.name else {
            return Outcome::Nothing;
        };
        let (value_range, value) = match self.value {
            Some((r, types)) => (Some(r), types),
            None => (None, TypeComposite::new()),
        };
        Outcome::Done(Finished::Element(Element {
            name,
            range,
            value_range,
            value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{build_source, symbol};
    use crate::symbol::{Modifiers, Symbol, Visibility};

    #[test]
    fn test_namespaced_function_with_params_and_doc() {
        let source = "<?php\nnamespace App\\Util;\n\n/**\n * Adds numbers.\n * @param int $b\n */\nfunction add(int $a, $b = 2, ...$rest): int { return $a + $b; }\n";
        let output = build_source(source);

        let Symbol::Function(add) = symbol(&output, "App\\Util\\add") else {
            panic!("not a function");
        };
        assert_eq!(add.description.as_deref(), Some("Adds numbers."));
        let params = &add.signature.parameters;
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].label(), "int $a");
        assert_eq!(params[1].label(), "int $b = 2");
        assert!(params[2].variadic);
        assert!(add.signature.return_types.contains("int"));
    }

    #[test]
    fn test_class_members_and_inheritance_lists() {
        let source = r#"<?php
namespace Shop;

use Shop\Contracts\Priced;

abstract class Item extends Base implements Priced, \Countable {
    use Timestamps;

    const TAX = 0.2;
    protected static ?string $label = null;
    private int $count = 0, $total;

    public function __construct(private readonly Money $price) {}

    abstract public static function make(): static;
}
"#;
        let output = build_source(source);

        let item = symbol(&output, "Shop\\Item").as_class_like().unwrap().clone();
        assert!(item.modifiers.contains(Modifiers::ABSTRACT));
        assert_eq!(item.extends, vec!["Shop\\Base"]);
        assert_eq!(item.implements, vec!["Shop\\Contracts\\Priced", "Countable"]);
        assert_eq!(item.traits, vec!["Shop\\Timestamps"]);

        let Symbol::ClassConstant(tax) = symbol(&output, "TAX") else {
            panic!("not a class constant");
        };
        assert_eq!(tax.scope, "Shop\\Item");
        assert_eq!(tax.value.as_deref(), Some("0.2"));
        assert!(tax.types.contains("float"));

        let Symbol::Property(label) = symbol(&output, "label") else {
            panic!("not a property");
        };
        assert_eq!(label.visibility, Visibility::PROTECTED);
        assert!(label.modifiers.contains(Modifiers::STATIC));
        assert_eq!(label.types.to_string(), "string|null");

        assert!(matches!(symbol(&output, "count"), Symbol::Property(_)));
        assert!(matches!(symbol(&output, "total"), Symbol::Property(_)));

        let Symbol::Property(price) = symbol(&output, "price") else {
            panic!("promoted parameter is not a property");
        };
        assert!(price.modifiers.contains(Modifiers::READONLY));
        assert_eq!(price.visibility, Visibility::PRIVATE);
        assert!(price.types.contains("Shop\\Money"));

        let Symbol::Method(make) = symbol(&output, "make") else {
            panic!("not a method");
        };
        assert!(make.modifiers.contains(Modifiers::STATIC | Modifiers::ABSTRACT));
    }

    #[test]
    fn test_interface_trait_and_enum() {
        let source = "<?php\ninterface Shape extends Drawable {}\ntrait Named {}\nenum Suit: string { case Hearts = 'H'; }\n";
        let output = build_source(source);

        assert!(matches!(symbol(&output, "Shape"), Symbol::Interface(c) if c.extends == ["Drawable"]));
        assert!(matches!(symbol(&output, "Named"), Symbol::Trait(_)));
        let Symbol::ClassConstant(hearts) = symbol(&output, "Hearts") else {
            panic!("enum case missing");
        };
        assert_eq!(hearts.scope, "Suit");
        assert!(hearts.types.contains("Suit"));
    }

    #[test]
    fn test_anonymous_class_members_are_not_recorded() {
        let source = "<?php\n$x = new class extends Base { public function hidden() {} };\n";
        let output = build_source(source);

        assert!(output.symbols.iter().all(|s| s.name() != "hidden"));
        assert!(output.globals.get("$x").unwrap().contains("Base"));
    }

    #[test]
    fn test_constants_and_define() {
        let source = "<?php\nnamespace Cfg;\nconst LIMIT = 10;\n/** Debug switch */\ndefine('DEBUG', true);\n";
        let output = build_source(source);

        assert!(matches!(symbol(&output, "Cfg\\LIMIT"), Symbol::Constant(c) if c.types.contains("int")));
        let Symbol::DefineConstant(debug) = symbol(&output, "DEBUG") else {
            panic!("define not transformed");
        };
        assert_eq!(debug.value.as_deref(), Some("true"));
        assert!(debug.types.contains("bool"));
        assert_eq!(debug.description.as_deref(), Some("Debug switch"));
    }

    #[test]
    fn test_use_declarations_feed_imports() {
        let source = "<?php\nnamespace App;\nuse Lib\\{Mailer, Queue as Q};\nuse function Lib\\helper;\nuse const Lib\\VERSION;\n";
        let output = build_source(source);

        use crate::symbol::ImportKind;
        assert_eq!(output.imports.get_fqn("Mailer", ImportKind::Class), "Lib\\Mailer");
        assert_eq!(output.imports.get_fqn("Q", ImportKind::Class), "Lib\\Queue");
        assert_eq!(output.imports.get_fqn("helper", ImportKind::Function), "Lib\\helper");
        assert_eq!(output.imports.get_fqn("VERSION", ImportKind::Constant), "Lib\\VERSION");
    }
}
