//! Node kind -> pending value table.
//!
//! Leaves and a few small phrases (names, literals, modifiers) become
//! [`Pending::Atom`]s whose result is known on entry. Everything not listed
//! here is inert.

use super::consume::{
    ClassDecl, ClassKind, ConstDecl, ElementDecl, EnumCaseDecl, FunctionDecl, FunctionKind,
    NameList, NamespaceDecl, ParameterDecl, PropertyDecl, TypeExpr, UseClauseDecl,
    UseDeclaration,
};
use super::expr::{
    ArgumentExpr, ArgumentsExpr, Assignment, Binary, Call, Cast, Catch, Conditional, Foreach,
    Group, Literal, Member, New, ReturnStmt, Unary,
};
use super::{BuildContext, Finished, NameRole, Pending, Token};
use crate::symbol::{
    ImportKind, ModifierWord, Range, RefKind, Reference, TypeComposite, TypeName,
};
use tree_sitter::Node;

/// Parents under which a bare name is read as a constant.
const VALUE_PARENTS: &[&str] = &[
    "expression_statement",
    "binary_expression",
    "unary_op_expression",
    "assignment_expression",
    "augmented_assignment_expression",
    "return_statement",
    "parenthesized_expression",
    "array_element_initializer",
    "conditional_expression",
    "echo_statement",
    "subscript_expression",
    "sequence_expression",
    "match_condition_list",
    "match_conditional_expression",
    "match_default_expression",
    "property_initializer",
    "print_intrinsic",
    "case_statement",
    "cast_expression",
    "yield_expression",
    "arrow_function",
    "arguments",
    "throw_expression",
    "clone_expression",
];

/// Phrases that keep a pending doc comment for their first child.
pub fn keeps_doc(kind: &str) -> bool {
    matches!(kind, "expression_statement" | "attribute_list")
}

pub fn construct(
    node: &Node<'_>,
    field: Option<&'static str>,
    parent: Option<&'static str>,
    ctx: &mut BuildContext<'_>,
) -> Option<Pending> {
    let kind = node.kind();
    let range = Range::from_node(node);

    if let Some(atom) = atom(node, kind, range, field, parent, ctx) {
        return Some(Pending::Atom(atom));
    }
    if node.child_count() == 0 {
        if kind == "comment" {
            return None;
        }
        return Some(Pending::Atom(Finished::Token(Token {
            kind,
            text: ctx.text(range).to_string(),
            range,
        })));
    }

    let pending = match kind {
        "namespace_definition" => Pending::Namespace(NamespaceDecl::new(
            node.child_by_field_name("body").is_some(),
            ctx,
        )),
        "namespace_use_declaration" => Pending::UseDeclaration(UseDeclaration::default()),
        "namespace_use_clause" | "namespace_use_group_clause" => {
            Pending::UseClause(UseClauseDecl::default())
        }
        "namespace_aliasing_clause" => Pending::Alias(None),

        "class_declaration" | "enum_declaration" => {
            Pending::ClassLike(ClassDecl::new(ClassKind::Class, ctx))
        }
        "interface_declaration" => Pending::ClassLike(ClassDecl::new(ClassKind::Interface, ctx)),
        "trait_declaration" => Pending::ClassLike(ClassDecl::new(ClassKind::Trait, ctx)),
        "anonymous_class" => Pending::ClassLike(ClassDecl::new(ClassKind::Anonymous, ctx)),
        "base_clause" => Pending::NameList(NameList::new(NameRole::Extends)),
        "class_interface_clause" => Pending::NameList(NameList::new(NameRole::Implements)),
        "use_declaration" => Pending::NameList(NameList::new(NameRole::Traits)),
        "enum_case" => Pending::EnumCase(EnumCaseDecl::default()),

        "function_definition" => {
            Pending::Function(FunctionDecl::new(FunctionKind::Function, range, ctx))
        }
        "method_declaration" => {
            Pending::Function(FunctionDecl::new(FunctionKind::Method, range, ctx))
        }
        "anonymous_function" | "anonymous_function_creation_expression" => {
            Pending::Function(FunctionDecl::new(FunctionKind::Closure, range, ctx))
        }
        "arrow_function" => Pending::Function(FunctionDecl::new(FunctionKind::Arrow, range, ctx)),
        "anonymous_function_use_clause" => Pending::CapturedVars(Vec::new()),
        "simple_parameter" => Pending::Parameter(ParameterDecl::new(false, false)),
        "variadic_parameter" => Pending::Parameter(ParameterDecl::new(false, true)),
        "property_promotion_parameter" => Pending::Parameter(ParameterDecl::new(true, false)),

        "named_type" | "union_type" | "intersection_type" | "disjunctive_normal_form_type"
        | "type_list" => Pending::Type(TypeExpr::new(false)),
        "optional_type" => Pending::Type(TypeExpr::new(true)),

        "property_declaration" => Pending::Property(PropertyDecl::default()),
        "const_declaration" | "class_const_declaration" => Pending::Const(ConstDecl::default()),
        "property_element" | "const_element" => Pending::Element(ElementDecl::default()),

        "function_call_expression" => Pending::Call(Call::default()),
        "object_creation_expression" => Pending::New(New::default()),
        "member_call_expression" | "nullsafe_member_call_expression" => {
            Pending::Member(Member::new(RefKind::MethodCall))
        }
        "member_access_expression" | "nullsafe_member_access_expression" => {
            Pending::Member(Member::new(RefKind::PropertyAccess))
        }
        "scoped_call_expression" => Pending::Member(Member::new(RefKind::Method)),
        "scoped_property_access_expression" => Pending::Member(Member::new(RefKind::Property)),
        "class_constant_access_expression" => Pending::Member(Member::new(RefKind::ClassConst)),
        "arguments" => Pending::Arguments(ArgumentsExpr::default()),
        "argument" => Pending::Argument(ArgumentExpr::default()),

        "assignment_expression"
        | "reference_assignment_expression"
        | "augmented_assignment_expression"
        | "static_variable_declaration" => Pending::Assignment(Assignment::default()),
        "return_statement" => Pending::Return(ReturnStmt::default()),
        "parenthesized_expression" | "clone_expression" => Pending::Group(Group::default()),
        "array_creation_expression" | "list_literal" => Pending::Literal(Literal::new("array")),
        "encapsed_string" | "heredoc" | "shell_command_expression" => {
            Pending::Literal(Literal::new("string"))
        }
        "binary_expression" => Pending::Binary(Binary::default()),
        "unary_op_expression" => Pending::Unary(Unary::default()),
        "cast_expression" => Pending::Cast(Cast::default()),
        "conditional_expression" => Pending::Conditional(Conditional::default()),
        "foreach_statement" => Pending::Foreach(Foreach::default()),
        "catch_clause" => Pending::Catch(Catch::default()),
        "global_declaration" => Pending::Global,
        _ => return None,
    };
    Some(pending)
}

/// Nodes whose meaning is fixed by their text alone.
fn atom(
    node: &Node<'_>,
    kind: &str,
    range: Range,
    field: Option<&'static str>,
    parent: Option<&'static str>,
    ctx: &BuildContext<'_>,
) -> Option<Finished> {
    let text = ctx.text(range);
    let value = |ty: &str| Finished::Value {
        types: TypeComposite::single(TypeName::new(ty)),
        range,
    };

    let item = match kind {
        "name" | "qualified_name" | "namespace_name" => {
            if follows(node, "instanceof") {
                ctx.class_reference(ctx.resolve_class_name(text), range)
            } else if is_value_position(node, parent, field) {
                constant_access(text, range, ctx)
            } else {
                Finished::Name {
                    text: text.to_string(),
                    range,
                }
            }
        }
        "variable_name" => {
            if declares_variable(parent, field) {
                Finished::Name {
                    text: text.to_string(),
                    range,
                }
            } else {
                ctx.variable_reference(text, range)
            }
        }
        "primitive_type" | "bottom_type" => Finished::Type {
            types: TypeComposite::single(TypeName::new(text)),
            range,
        },
        "cast_type" => Finished::Type {
            types: TypeComposite::single(TypeName::new(cast_target(text))),
            range,
        },
        "relative_scope" => Finished::Type {
            types: TypeComposite::single(ctx.resolve_class_name(text)),
            range,
        },
        "visibility_modifier" | "static_modifier" | "abstract_modifier" | "final_modifier"
        | "readonly_modifier" | "var_modifier" => Finished::Modifier(ModifierWord::parse(text)?),
        "reference_modifier" => Finished::Token(Token {
            kind: "&",
            text: "&".to_string(),
            range,
        }),
        "integer" => value("int"),
        "float" => value("float"),
        "string" | "nowdoc" => value("string"),
        "boolean" => value("bool"),
        "null" => value("null"),
        _ => return None,
    };
    Some(item)
}

fn constant_access(text: &str, range: Range, ctx: &BuildContext<'_>) -> Finished {
    let fqn = ctx.imports.get_fqn(text, ImportKind::Constant);
    let value = ctx.constant_types(&fqn);
    Finished::Reference {
        reference: Reference::new(
            RefKind::ConstantAccess,
            TypeComposite::single(TypeName::qualified(&fqn)),
            ctx.location(range),
        ),
        value,
    }
}

fn cast_target(text: &str) -> &str {
    let inner = text.trim_matches(|c: char| c == '(' || c == ')' || c.is_whitespace());
    match inner.to_ascii_lowercase().as_str() {
        "binary" => "string",
        "unset" => "null",
        _ => inner,
    }
}

fn follows(node: &Node<'_>, keyword: &str) -> bool {
    node.prev_sibling()
        .is_some_and(|prev| prev.kind().eq_ignore_ascii_case(keyword))
}

fn is_value_position(node: &Node<'_>, parent: Option<&str>, field: Option<&str>) -> bool {
    match parent {
        Some("argument") => field != Some("name"),
        Some(
            "simple_parameter"
            | "property_promotion_parameter"
            | "property_element"
            | "static_variable_declaration",
        ) => matches!(field, Some("default_value" | "value")),
        Some("const_element" | "enum_case") => follows(node, "="),
        Some(parent) => VALUE_PARENTS.contains(&parent),
        None => false,
    }
}

/// `$name` spelled where a variable or property is declared rather than read.
fn declares_variable(parent: Option<&str>, field: Option<&str>) -> bool {
    match parent {
        Some(
            "simple_parameter"
            | "variadic_parameter"
            | "property_promotion_parameter"
            | "property_element",
        ) => !matches!(field, Some("default_value" | "value")),
        Some("scoped_property_access_expression" | "static_variable_declaration") => {
            field == Some("name")
        }
        _ => false,
    }
}
