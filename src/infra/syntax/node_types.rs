//! Tree-sitter Node Type Mappings
//!
//! Node types from the tree-sitter-javascript and tree-sitter-typescript
//! grammars (`src/node-types.json`), mapped onto [`NodeKind`]. The TypeScript
//! grammar extends the JavaScript one, so a single table serves both.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{BlockKind, IdentifierKind, NodeKind, PatternKind};
use crate::models::symbol::DeclKind;

/// Node type mapping entry
#[derive(Debug, Clone, Copy)]
pub struct NodeType {
    /// Actual tree-sitter node type
    pub node_type: &'static str,
    pub kind: NodeKind,
    /// Example syntax
    pub example: &'static str,
}

impl NodeType {
    const fn new(node_type: &'static str, kind: NodeKind, example: &'static str) -> Self {
        Self {
            node_type,
            kind,
            example,
        }
    }
}

const fn decl(kind: DeclKind) -> NodeKind {
    NodeKind::Declaration(kind)
}

// =============================================================================
// Declarations
// =============================================================================
const DECLARATIONS: &[NodeType] = &[
    NodeType::new("function_declaration", decl(DeclKind::Function), "function f() {}"),
    NodeType::new(
        "generator_function_declaration",
        decl(DeclKind::Function),
        "function* g() {}",
    ),
    NodeType::new("function_signature", decl(DeclKind::Function), "function f(): void;"),
    NodeType::new("class_declaration", decl(DeclKind::Class), "class C {}"),
    NodeType::new("abstract_class_declaration", decl(DeclKind::Class), "abstract class C {}"),
    NodeType::new("interface_declaration", decl(DeclKind::Interface), "interface I {}"),
    NodeType::new("type_alias_declaration", decl(DeclKind::TypeAlias), "type T = ..."),
    NodeType::new("enum_declaration", decl(DeclKind::Enum), "enum E {}"),
    NodeType::new("internal_module", decl(DeclKind::Namespace), "namespace N {}"),
    NodeType::new("module", decl(DeclKind::Namespace), "module N {}"),
    NodeType::new("method_definition", decl(DeclKind::Method), "m() {}"),
    NodeType::new("method_signature", decl(DeclKind::Method), "m(): void;"),
    NodeType::new("abstract_method_signature", decl(DeclKind::Method), "abstract m(): void;"),
    NodeType::new("field_definition", decl(DeclKind::Property), "x = 1;"),
    NodeType::new("public_field_definition", decl(DeclKind::Property), "private x = 1;"),
    NodeType::new("property_signature", decl(DeclKind::Property), "x: number;"),
    NodeType::new("enum_assignment", decl(DeclKind::EnumMember), "A = 1"),
];

// =============================================================================
// Scopes and bindings
// =============================================================================
const STRUCTURE: &[NodeType] = &[
    NodeType::new("program", NodeKind::Program, "<file>"),
    NodeType::new("function_expression", NodeKind::Function, "function () {}"),
    NodeType::new("function", NodeKind::Function, "function () {}"),
    NodeType::new("generator_function", NodeKind::Function, "function* () {}"),
    NodeType::new("arrow_function", NodeKind::Function, "(x) => x"),
    NodeType::new("class", NodeKind::Class, "const C = class {}"),
    NodeType::new("statement_block", NodeKind::Block(BlockKind::Statements), "{ ... }"),
    NodeType::new("for_statement", NodeKind::Block(BlockKind::Loop), "for (;;) {}"),
    NodeType::new("for_in_statement", NodeKind::Block(BlockKind::Loop), "for (x of y) {}"),
    NodeType::new("catch_clause", NodeKind::Block(BlockKind::Catch), "catch (e) {}"),
    NodeType::new("switch_body", NodeKind::Block(BlockKind::Switch), "{ case 1: }"),
    NodeType::new("class_body", NodeKind::Block(BlockKind::Members), "{ m() {} }"),
    NodeType::new("interface_body", NodeKind::Block(BlockKind::Members), "{ x: number }"),
    NodeType::new("enum_body", NodeKind::Block(BlockKind::EnumMembers), "{ A, B }"),
    NodeType::new("formal_parameters", NodeKind::Parameters, "(a, b)"),
    NodeType::new("object_pattern", NodeKind::Pattern(PatternKind::Object), "{ a, b }"),
    NodeType::new("array_pattern", NodeKind::Pattern(PatternKind::Array), "[a, b]"),
    NodeType::new("pair_pattern", NodeKind::Pattern(PatternKind::Pair), "{ a: b }"),
    NodeType::new("assignment_pattern", NodeKind::Pattern(PatternKind::Assignment), "a = 1"),
    NodeType::new(
        "object_assignment_pattern",
        NodeKind::Pattern(PatternKind::Assignment),
        "{ a = 1 }",
    ),
    NodeType::new("rest_pattern", NodeKind::Pattern(PatternKind::Rest), "...rest"),
    NodeType::new("required_parameter", NodeKind::Pattern(PatternKind::Parameter), "a: T"),
    NodeType::new("optional_parameter", NodeKind::Pattern(PatternKind::Parameter), "a?: T"),
];

// =============================================================================
// Identifiers
// =============================================================================
const IDENTIFIERS: &[NodeType] = &[
    NodeType::new("identifier", NodeKind::Identifier(IdentifierKind::Value), "foo"),
    NodeType::new("type_identifier", NodeKind::Identifier(IdentifierKind::Type), "Foo"),
    NodeType::new(
        "property_identifier",
        NodeKind::Identifier(IdentifierKind::Property),
        "obj.foo",
    ),
    NodeType::new(
        "private_property_identifier",
        NodeKind::Identifier(IdentifierKind::PrivateProperty),
        "this.#foo",
    ),
    NodeType::new(
        "shorthand_property_identifier",
        NodeKind::Identifier(IdentifierKind::ShorthandProperty),
        "{ foo }",
    ),
    NodeType::new(
        "shorthand_property_identifier_pattern",
        NodeKind::Identifier(IdentifierKind::ShorthandPattern),
        "const { foo } = x",
    ),
];

// =============================================================================
// Modules
// =============================================================================
const MODULES: &[NodeType] = &[
    NodeType::new("import_statement", NodeKind::Import, "import x from 'y'"),
    NodeType::new("import_clause", NodeKind::ImportClause, "x, { y }"),
    NodeType::new("named_imports", NodeKind::ImportClause, "{ y as z }"),
    NodeType::new("namespace_import", NodeKind::NamespaceImport, "* as ns"),
    NodeType::new("import_specifier", NodeKind::ImportSpecifier, "y as z"),
    NodeType::new("export_statement", NodeKind::Export, "export { x }"),
    NodeType::new("export_clause", NodeKind::ExportClause, "{ x as y }"),
    NodeType::new("export_specifier", NodeKind::ExportSpecifier, "x as y"),
];

// =============================================================================
// Expressions, literals, types
// =============================================================================
const LEAVES: &[NodeType] = &[
    NodeType::new("member_expression", NodeKind::MemberAccess, "a.b"),
    NodeType::new("call_expression", NodeKind::Call, "f()"),
    NodeType::new("new_expression", NodeKind::Call, "new C()"),
    NodeType::new("string", NodeKind::Literal, "'s'"),
    NodeType::new("string_fragment", NodeKind::Literal, "s"),
    NodeType::new("template_string", NodeKind::Literal, "`s`"),
    NodeType::new("number", NodeKind::Literal, "1"),
    NodeType::new("regex", NodeKind::Literal, "/x/"),
    NodeType::new("true", NodeKind::Literal, "true"),
    NodeType::new("false", NodeKind::Literal, "false"),
    NodeType::new("null", NodeKind::Literal, "null"),
    NodeType::new("this", NodeKind::Expression, "this"),
    NodeType::new("type_annotation", NodeKind::TypeAnnotation, ": T"),
    NodeType::new("comment", NodeKind::Comment, "/** doc */"),
];

/// All mapping tables, for listings
pub fn all_node_types() -> impl Iterator<Item = &'static NodeType> {
    DECLARATIONS
        .iter()
        .chain(STRUCTURE)
        .chain(IDENTIFIERS)
        .chain(MODULES)
        .chain(LEAVES)
}

fn table() -> &'static HashMap<&'static str, NodeKind> {
    static TABLE: OnceLock<HashMap<&'static str, NodeKind>> = OnceLock::new();
    TABLE.get_or_init(|| all_node_types().map(|t| (t.node_type, t.kind)).collect())
}

/// Classify a named grammar node. Anonymous tokens, errors and missing nodes
/// are recognised by the lowering before this is consulted.
///
/// `declarator_kind` carries the `var`/`let`/`const` keyword of the enclosing
/// declaration list for `variable_declarator` nodes.
pub fn classify(raw: &str, declarator_kind: Option<DeclKind>) -> NodeKind {
    if raw == "variable_declarator" {
        return NodeKind::Declaration(declarator_kind.unwrap_or(DeclKind::Var));
    }

    if let Some(kind) = table().get(raw) {
        return *kind;
    }

    if raw.ends_with("_expression") {
        NodeKind::Expression
    } else if raw.ends_with("_statement") || raw.ends_with("_declaration") {
        NodeKind::Statement
    } else if raw.ends_with("_type") || raw.starts_with("type_") {
        NodeKind::TypeAnnotation
    } else {
        NodeKind::Other
    }
}

/// Declaration kind for the keyword of a `lexical_declaration` /
/// `variable_declaration`
pub fn declarator_kind(keyword: &str) -> Option<DeclKind> {
    match keyword {
        "var" => Some(DeclKind::Var),
        "let" => Some(DeclKind::Let),
        "const" => Some(DeclKind::Const),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for t in all_node_types() {
            assert!(seen.insert(t.node_type), "duplicate {}", t.node_type);
        }
    }

    #[test]
    fn test_classify_known_types() {
        assert_eq!(
            classify("function_declaration", None),
            NodeKind::Declaration(DeclKind::Function)
        );
        assert_eq!(
            classify("variable_declarator", Some(DeclKind::Const)),
            NodeKind::Declaration(DeclKind::Const)
        );
        assert_eq!(
            classify("variable_declarator", None),
            NodeKind::Declaration(DeclKind::Var)
        );
        assert_eq!(
            classify("identifier", None),
            NodeKind::Identifier(IdentifierKind::Value)
        );
    }

    #[test]
    fn test_classify_fallbacks() {
        assert_eq!(classify("binary_expression", None), NodeKind::Expression);
        assert_eq!(classify("return_statement", None), NodeKind::Statement);
        assert_eq!(classify("lexical_declaration", None), NodeKind::Statement);
        assert_eq!(classify("union_type", None), NodeKind::TypeAnnotation);
        assert_eq!(classify("arguments", None), NodeKind::Other);
    }

    #[test]
    fn test_declarator_keywords() {
        assert_eq!(declarator_kind("let"), Some(DeclKind::Let));
        assert_eq!(declarator_kind("await"), None);
    }
}
