//! Pending values for expressions and the statements that bind variables.

use super::consume::{Outcome, swallows};
use super::{ArgumentItem, BuildContext, DocBlock, Edge, Finished, NameRole};
use crate::symbol::{
    Constant, ImportKind, Range, RefKind, Reference, ScopeVar, Symbol, TypeComposite, TypeName,
};

fn scalar(name: &str) -> TypeComposite {
    TypeComposite::single(TypeName::new(name))
}

fn argument_list(
    ty: TypeComposite,
    scope: Option<TypeComposite>,
    range: Range,
    args: &[ArgumentItem],
    ctx: &BuildContext<'_>,
) -> Finished {
    let mut reference = Reference::new(RefKind::ArgumentList, ty, ctx.location(range));
    reference.ranges = args.iter().map(|a| a.range).collect();
    // Member calls keep a scope even when it is unknown
    reference.scope = scope;
    if let Some(window) = ctx.scopes.last().and_then(ScopeVar::range) {
        reference.scope_range = Some(window);
    }
    Finished::Reference {
        reference,
        value: TypeComposite::new(),
    }
}

/// `foo(...)`, or `define('NAME', value)`.
#[derive(Debug, Default)]
pub struct Call {
    callee: Option<(String, Range)>,
    arguments: Option<(Range, Vec<ArgumentItem>)>,
    pub(super) doc: Option<DocBlock>,
}

impl Call {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        match item {
            Finished::Name { text, range } if edge.is_field("function") => {
                self.callee = Some((text.clone(), *range));
                true
            }
            Finished::Arguments { range, args } => {
                self.arguments = Some((*range, args.clone()));
                true
            }
            other => swallows(other),
        }
    }

    pub(super) fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let Some((name, callee_range)) = self.callee else {
            return Outcome::Done(Finished::Value {
                types: TypeComposite::new(),
                range,
            });
        };
        let args = self.arguments.unwrap_or_default();

        if name.trim_start_matches('\\').eq_ignore_ascii_case("define")
            && let Some(constant) = define_constant(&args.1, range, self.doc, ctx)
        {
            return Outcome::Transform(vec![
                Finished::Symbol(Symbol::DefineConstant(constant)),
                Finished::Value {
                    types: scalar("bool"),
                    range,
                },
            ]);
        }

        let fqn = ctx.imports.get_fqn(&name, ImportKind::Function);
        let ty = TypeComposite::single(TypeName::qualified(&fqn));
        let value = ctx.function_types(&fqn);

        let mut items = Vec::with_capacity(2);
        if !args.0.is_empty() {
            items.push(argument_list(ty.clone(), None, args.0, &args.1, ctx));
        }
        items.push(Finished::Reference {
            reference: Reference::new(RefKind::Function, ty, ctx.location(callee_range)),
            value,
        });
        Outcome::Collection(items)
    }
}

fn define_constant(
    args: &[ArgumentItem],
    range: Range,
    doc: Option<DocBlock>,
    ctx: &BuildContext<'_>,
) -> Option<Constant> {
    let first = args.first()?;
    let quoted = ctx.text(first.value_range).trim();
    let name = quoted
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| quoted.strip_prefix('"').and_then(|s| s.strip_suffix('"')))?
        .trim_start_matches('\\');
    if name.is_empty() {
        return None;
    }

    let (value, types) = match args.get(1) {
        Some(arg) => (
            Some(ctx.text(arg.value_range).to_string()),
            ctx.resolve_types(&arg.value),
        ),
        None => (None, TypeComposite::new()),
    };
    Some(Constant {
        name: name.to_string(),
        location: ctx.location(range),
        value,
        types,
        description: doc.and_then(|d| d.description),
    })
}

/// `new Foo(...)`, `new static`, `new class {...}`.
#[derive(Debug, Default)]
pub struct New {
    class: Option<(TypeName, Range)>,
    types: TypeComposite,
    anonymous: bool,
    arguments: Option<(Range, Vec<ArgumentItem>)>,
}

impl New {
    pub(super) fn consume(
        &mut self,
        item: &Finished,
        edge: Edge,
        ctx: &mut BuildContext<'_>,
    ) -> bool {
        match item {
            Finished::Arguments { range, args } => {
                self.arguments = Some((*range, args.clone()));
                true
            }
            Finished::Name { text, range } if edge.is_child() && self.class.is_none() => {
                let name = ctx.resolve_class_name(text);
                self.types.push(name.clone());
                self.class = Some((name, *range));
                true
            }
            Finished::Type { types, range } if edge.is_child() && self.class.is_none() => {
                if let Some(first) = types.first() {
                    self.class = Some((first.clone(), *range));
                }
                self.types.merge(types);
                true
            }
            // Anonymous class body, either as its own node or inline
            Finished::Value { types, .. } if edge.is_child() => {
                self.anonymous = true;
                self.types.merge(types);
                true
            }
            Finished::Names { role, names } => {
                self.anonymous = true;
                if *role == NameRole::Extends {
                    for name in names {
                        self.types.push(TypeName::qualified(name));
                    }
                }
                true
            }
            other => swallows(other),
        }
    }

    pub(super) fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let (class, class_range) = match self.class {
            Some(class) if !self.anonymous => class,
            _ => {
                return Outcome::Done(Finished::Value {
                    types: self.types,
                    range,
                });
            }
        };

        let mut items = Vec::with_capacity(2);
        if let Some((args_range, args)) = &self.arguments {
            items.push(argument_list(
                TypeComposite::single(TypeName::verbatim("__construct")),
                Some(self.types.clone()),
                *args_range,
                args,
                ctx,
            ));
        }
        items.push(Finished::Reference {
            reference: Reference::new(
                RefKind::ClassTypeDesignator,
                TypeComposite::single(class),
                ctx.location(class_range),
            ),
            value: self.types,
        });
        Outcome::Collection(items)
    }
}

/// Member access through `->`, `?->` or `::`.
#[derive(Debug)]
pub struct Member {
    kind: RefKind,
    /// `Foo::BAR` has no field names: scope first, then the member
    positional: bool,
    scope: Option<TypeComposite>,
    scope_ref: Option<Finished>,
    name: Option<(String, Range)>,
    dynamic_name: bool,
    arguments: Option<(Range, Vec<ArgumentItem>)>,
}

impl Member {
    pub fn new(kind: RefKind) -> Self {
        Self {
            kind,
            positional: kind == RefKind::ClassConst,
            scope: None,
            scope_ref: None,
            name: None,
            dynamic_name: false,
            arguments: None,
        }
    }

    pub(super) fn consume(
        &mut self,
        item: &Finished,
        edge: Edge,
        ctx: &mut BuildContext<'_>,
    ) -> bool {
        let scope_edge = edge.is_field("object")
            || edge.is_field("scope")
            || (self.positional && edge.is_child() && self.scope.is_none());
        let name_edge = edge.is_field("name")
            || (self.positional && edge.is_child() && self.scope.is_some());

        match item {
            Finished::Arguments { range, args } => {
                self.arguments = Some((*range, args.clone()));
                true
            }
            Finished::Name { text, range } if name_edge => {
                self.name = Some((text.clone(), *range));
                true
            }
            other if name_edge && other.as_value().is_some() => {
                self.dynamic_name = true;
                true
            }
            other if scope_edge => {
                self.scope = Some(self.scope_types(other, ctx));
                true
            }
            other => swallows(other),
        }
    }

    fn scope_types(&mut self, item: &Finished, ctx: &BuildContext<'_>) -> TypeComposite {
        match item {
            Finished::Name { text, range } => {
                let name = ctx.resolve_class_name(text);
                self.scope_ref = Some(ctx.class_reference(name.clone(), *range));
                TypeComposite::single(name)
            }
            Finished::Reference { reference, value }
                if reference.ref_kind == RefKind::Variable && value.is_empty() =>
            {
                // Resolved later against the scope active at the reference
                TypeComposite::single(TypeName::verbatim(reference.name()))
            }
            Finished::Reference { value, .. } => value.clone(),
            Finished::Value { types, .. } | Finished::Type { types, .. } => types.clone(),
            _ => TypeComposite::new(),
        }
    }

    pub(super) fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let scope = self.scope.unwrap_or_default();
        let window = ctx.scopes.last().and_then(ScopeVar::range);
        let mut items = Vec::with_capacity(3);
        if let Some(scope_ref) = self.scope_ref {
            items.push(scope_ref);
        }

        let Some((raw, name_range)) = self.name else {
            if self.kind.is_static_access() && !self.dynamic_name {
                let mut reference =
                    Reference::new(RefKind::ScopedAccess, TypeComposite::new(), ctx.location(range))
                        .with_scope(scope);
                reference.scope_range = window;
                items.push(Finished::Reference {
                    reference,
                    value: TypeComposite::new(),
                });
            } else {
                items.push(Finished::Value {
                    types: TypeComposite::new(),
                    range,
                });
            }
            return Outcome::Collection(items);
        };

        let name = match self.kind {
            RefKind::Property => raw.trim_start_matches('$').to_string(),
            _ => raw,
        };
        let ty = TypeComposite::single(TypeName::verbatim(&name));

        if let Some((args_range, args)) = &self.arguments {
            items.push(argument_list(
                ty.clone(),
                Some(scope.clone()),
                *args_range,
                args,
                ctx,
            ));
        }

        let value = if self.kind == RefKind::ClassConst && name.eq_ignore_ascii_case("class") {
            scalar("string")
        } else {
            ctx.member_types(&scope, &name, self.kind)
        };
        let mut reference = Reference::new(
            self.kind,
            ty,
            ctx.location(Range::new(range.start, name_range.end)),
        )
        .with_scope(scope)
        .with_member_location(name_range);
        reference.scope_range = window;

        items.push(Finished::Reference { reference, value });
        Outcome::Collection(items)
    }
}

#[derive(Debug, Default)]
pub struct ArgumentsExpr {
    args: Vec<ArgumentItem>,
}

impl ArgumentsExpr {
    pub(super) fn consume(&mut self, item: &Finished, _edge: Edge) -> bool {
        match item {
            Finished::Argument(arg) => {
                self.args.push(arg.clone());
                true
            }
            other => swallows(other),
        }
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        Outcome::Done(Finished::Arguments {
            range,
            args: self.args,
        })
    }
}

/// One argument, possibly named or spread.
#[derive(Debug, Default)]
pub struct ArgumentExpr {
    value: Option<(Range, TypeComposite)>,
}

impl ArgumentExpr {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        if edge.is_field("name") {
            return matches!(item, Finished::Name { .. });
        }
        if let Some(value) = item.as_value() {
            self.value = Some(value);
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        let (value_range, value) = self.value.unwrap_or((range, TypeComposite::new()));
        Outcome::Done(Finished::Argument(ArgumentItem {
            range,
            value_range,
            value,
        }))
    }
}

/// `$a = ...`, `$a =& ...`, `$a .= ...` and `static $a = ...`.
#[derive(Debug, Default)]
pub struct Assignment {
    left: Option<String>,
    right: TypeComposite,
    pub(super) doc: Option<DocBlock>,
}

impl Assignment {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        if edge.is_field("left") || edge.is_field("name") {
            self.left = match item {
                Finished::Name { text, .. } if text.starts_with('$') => Some(text.clone()),
                other => other.as_variable().map(str::to_string),
            };
            return swallows(item);
        }
        if let Some((_, types)) = item.as_value() {
            self.right = types;
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range, ctx: &mut BuildContext<'_>) -> Outcome {
        let mut types = ctx.resolve_types(&self.right);
        if let Some(left) = &self.left {
            if let Some((name, var_types)) = self.doc.as_ref().and_then(|d| d.var.as_ref())
                && name.as_deref().is_none_or(|n| n == left)
            {
                types.merge(&ctx.resolve_types(var_types));
            }
            ctx.bind(left, &types);
        }
        Outcome::Done(Finished::Value { types, range })
    }
}

#[derive(Debug, Default)]
pub struct ReturnStmt {
    types: TypeComposite,
}

impl ReturnStmt {
    pub(super) fn consume(&mut self, item: &Finished) -> bool {
        if let Some((_, types)) = item.as_value() {
            self.types = types;
        }
        swallows(item)
    }

    pub(super) fn finish(self) -> Outcome {
        Outcome::Done(Finished::Return(self.types))
    }
}

/// Expressions that evaluate to their last operand: `( ... )`, `clone`, `@`.
#[derive(Debug, Default)]
pub struct Group {
    types: TypeComposite,
}

impl Group {
    pub(super) fn consume(&mut self, item: &Finished) -> bool {
        if let Some((_, types)) = item.as_value() {
            self.types = types;
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        Outcome::Done(Finished::Value {
            types: self.types,
            range,
        })
    }
}

/// Array literals and interpolated strings: fixed type, parts absorbed.
#[derive(Debug)]
pub struct Literal {
    ty: &'static str,
}

impl Literal {
    pub fn new(ty: &'static str) -> Self {
        Self { ty }
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        Outcome::Done(Finished::Value {
            types: scalar(self.ty),
            range,
        })
    }
}

#[derive(Debug, Default)]
pub struct Binary {
    operator: Option<String>,
    left: TypeComposite,
    right: TypeComposite,
}

impl Binary {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        if let Finished::Token(token) = item {
            if self.operator.is_none() || edge.is_field("operator") {
                self.operator = Some(token.text.to_ascii_lowercase());
                return true;
            }
            return false;
        }
        if let Some((_, types)) = item.as_value() {
            if edge.is_field("right") || (!edge.is_field("left") && self.operator.is_some()) {
                self.right = types;
            } else {
                self.left = types;
            }
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        let types = match self.operator.as_deref().unwrap_or("") {
            "." => scalar("string"),
            "==" | "!=" | "<>" | "===" | "!==" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "and"
            | "or" | "xor" | "instanceof" => scalar("bool"),
            "??" => {
                let mut types = self.left;
                types.merge(&self.right);
                types
            }
            "<=>" | "%" | "&" | "|" | "^" | "<<" | ">>" => scalar("int"),
            "+" | "-" | "*" | "/" | "**" => numeric(&self.left, &self.right),
            _ => TypeComposite::new(),
        };
        Outcome::Done(Finished::Value { types, range })
    }
}

fn numeric(left: &TypeComposite, right: &TypeComposite) -> TypeComposite {
    if left.contains("float") || right.contains("float") {
        scalar("float")
    } else if left.contains("int") && right.contains("int") {
        scalar("int")
    } else {
        let mut types = scalar("int");
        types.push(TypeName::new("float"));
        types
    }
}

#[derive(Debug, Default)]
pub struct Unary {
    operator: Option<String>,
    operand: TypeComposite,
}

impl Unary {
    pub(super) fn consume(&mut self, item: &Finished, _edge: Edge) -> bool {
        if let Finished::Token(token) = item {
            self.operator = Some(token.text.clone());
            return true;
        }
        if let Some((_, types)) = item.as_value() {
            self.operand = types;
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        let types = match self.operator.as_deref() {
            Some("!") => scalar("bool"),
            Some("~") => scalar("int"),
            _ => self.operand,
        };
        Outcome::Done(Finished::Value { types, range })
    }
}

/// `(int) $x`
#[derive(Debug, Default)]
pub struct Cast {
    types: TypeComposite,
}

impl Cast {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        match item {
            Finished::Type { types, .. } if edge.is_child() && self.types.is_empty() => {
                self.types = types.clone();
                true
            }
            other => swallows(other),
        }
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        Outcome::Done(Finished::Value {
            types: self.types,
            range,
        })
    }
}

/// `a ? b : c` and `a ?: c`
#[derive(Debug, Default)]
pub struct Conditional {
    condition: TypeComposite,
    body: Option<TypeComposite>,
    alternative: TypeComposite,
}

impl Conditional {
    pub(super) fn consume(&mut self, item: &Finished, edge: Edge) -> bool {
        if let Some((_, types)) = item.as_value() {
            match edge.field() {
                Some("condition") => self.condition = types,
                Some("body") => self.body = Some(types),
                Some("alternative") => self.alternative = types,
                _ => {}
            }
        }
        swallows(item)
    }

    pub(super) fn finish(self, range: Range) -> Outcome {
        let mut types = self.body.unwrap_or(self.condition);
        types.merge(&self.alternative);
        Outcome::Done(Finished::Value { types, range })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ForeachPart {
    #[default]
    Subject,
    Bindings,
    Body,
}

/// Declares the loop variables between `as` and `)`.
#[derive(Debug, Default)]
pub struct Foreach {
    part: ForeachPart,
}

impl Foreach {
    pub(super) fn consume(&mut self, item: &Finished, ctx: &mut BuildContext<'_>) -> bool {
        match item {
            Finished::Token(token) => {
                match token.text.to_ascii_lowercase().as_str() {
                    "as" if self.part == ForeachPart::Subject => self.part = ForeachPart::Bindings,
                    ")" | ":" if self.part == ForeachPart::Bindings => {
                        self.part = ForeachPart::Body
                    }
                    _ => return false,
                }
                true
            }
            other if self.part == ForeachPart::Bindings => {
                if let Some(name) = other.as_variable() {
                    ctx.bind(name, &TypeComposite::new());
                }
                swallows(other)
            }
            other => swallows(other),
        }
    }
}

/// `catch (A | B $e)` binds `$e`.
#[derive(Debug, Default)]
pub struct Catch {
    types: TypeComposite,
}

impl Catch {
    pub(super) fn consume(
        &mut self,
        item: &Finished,
        edge: Edge,
        ctx: &mut BuildContext<'_>,
    ) -> bool {
        match item {
            Finished::Type { types, .. } if edge.is_child() => {
                self.types.merge(types);
                true
            }
            other if edge.is_child() && other.as_variable().is_some() => {
                if let Some(name) = other.as_variable() {
                    ctx.bind(name, &self.types);
                }
                true
            }
            other => swallows(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{build_source, reference_at};
    use crate::symbol::RefKind;

    #[test]
    fn test_assignment_inference() {
        let source = r#"<?php
function make(): Widget { return new Widget(); }
$a = new Widget();
$b = 'text';
$c = 1.5;
$d = [1, 2];
$e = make();
$f = $a;
$g = null;
$h = $b . 'x';
$i = 2 > 1;
/** @var Gadget $j */
$j = load();
"#;
        let output = build_source(source);
        let var = |name: &str| output.globals.get(name).unwrap().to_string();

        assert_eq!(var("$a"), "Widget");
        assert_eq!(var("$b"), "string");
        assert_eq!(var("$c"), "float");
        assert_eq!(var("$d"), "array");
        assert_eq!(var("$e"), "Widget");
        assert_eq!(var("$f"), "Widget");
        assert_eq!(var("$g"), "null");
        assert_eq!(var("$h"), "string");
        assert_eq!(var("$i"), "bool");
        assert_eq!(var("$j"), "Gadget");
    }

    #[test]
    fn test_function_call_reference() {
        let source = "<?php\nfoo(1, $x);\n";
        let output = build_source(source);

        let refs = reference_at(&output, source, "foo");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_kind, RefKind::Function);
        assert_eq!(refs[0].name(), "foo");

        let args = reference_at(&output, source, "(1, $x)");
        assert_eq!(args[0].ref_kind, RefKind::ArgumentList);
        assert_eq!(args[0].ranges.len(), 2);
        assert!(args[0].scope.is_none());
    }

    #[test]
    fn test_member_references_carry_scope() {
        let source = r#"<?php
class Repo {
    public function find(): Repo { return $this; }
    public function all() {
        $this->find()->all();
        self::boot();
        static::$cache;
        Repo::LIMIT;
    }
}
"#;
        let output = build_source(source);
        let find_at = |needle: &str, kind: RefKind| {
            let offset = source.find(needle).unwrap() as u32;
            output
                .references
                .iter()
                .find(|r| r.ref_kind == kind && r.member_location.is_some_and(|m| m.start == offset))
                .cloned()
                .unwrap_or_else(|| panic!("no {kind:?} at {needle}"))
        };

        let find = find_at("find()->all", RefKind::MethodCall);
        assert_eq!(find.name(), "find");
        assert_eq!(find.scope.unwrap().to_string(), "Repo");

        // Chained call scope comes from the declared return type
        let all = find_at("all();", RefKind::MethodCall);
        assert_eq!(all.scope.unwrap().to_string(), "Repo");

        let boot = find_at("boot", RefKind::Method);
        assert_eq!(boot.scope.unwrap().to_string(), "Repo");

        let cache = find_at("$cache", RefKind::Property);
        assert_eq!(cache.name(), "cache");

        let limit = find_at("LIMIT", RefKind::ClassConst);
        assert_eq!(limit.scope.unwrap().to_string(), "Repo");
    }

    #[test]
    fn test_unknown_variable_scope_is_kept_by_name() {
        let source = "<?php\nfunction run($svc) { $svc->start(); }\n";
        let output = build_source(source);

        let offset = source.find("start").unwrap() as u32;
        let start = output
            .references
            .iter()
            .find(|r| r.member_location.is_some_and(|m| m.start == offset))
            .unwrap();
        assert_eq!(start.scope.as_ref().unwrap().to_string(), "$svc");
        assert!(start.scope_range.is_some());
        assert_eq!(output.scopes.len(), 1);
    }

    #[test]
    fn test_closures_and_loops_bind_variables() {
        let source = r#"<?php
class Box {
    public function each(array $items) {
        foreach ($items as $key => $item) {}
        $limit = 3;
        $fn = function ($x) use ($limit) { return $this; };
        try {} catch (\RuntimeException | \LogicException $e) {}
    }
}
"#;
        let output = build_source(source);
        let method_scope = output
            .scopes
            .iter()
            .find(|s| s.get("$items").is_some())
            .unwrap();
        assert!(method_scope.get("$key").is_some());
        assert!(method_scope.get("$item").is_some());
        assert_eq!(method_scope.get("$fn").unwrap().to_string(), "Closure");
        assert_eq!(
            method_scope.get("$e").unwrap().to_string(),
            "RuntimeException|LogicException"
        );

        let closure_scope = output.scopes.iter().find(|s| s.get("$x").is_some()).unwrap();
        assert_eq!(closure_scope.get("$limit").unwrap().to_string(), "int");
        assert_eq!(closure_scope.get("$this").unwrap().to_string(), "Box");
    }

    #[test]
    fn test_broken_source_does_not_panic() {
        let source = "<?php\nclass { function ( { $x-> ; new ; Foo:: \n";
        let output = build_source(source);
        assert!(output.symbols.iter().all(|s| !s.name().is_empty()));
    }
}
