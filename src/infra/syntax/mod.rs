//! Syntax trees for Sightline
//!
//! Tree-sitter parse trees are lowered into an owned, per-file arena of
//! [`SyntaxNode`]s addressed by [`NodeId`]. Every consumer matches on the
//! closed [`NodeKind`] union instead of raw grammar strings.

pub mod node_types;
pub mod parser;

use std::sync::Arc;

use crate::models::symbol::DeclKind;

pub use node_types::{NodeType, classify};
pub use parser::{ModuleRequest, ParseOutput, RequestKind, SourceParser};

/// Index of a node inside its [`SyntaxTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `{ ... }` statement blocks and namespace bodies
    Statements,
    /// `for`/`for-in`/`for-of` headers
    Loop,
    Catch,
    Switch,
    /// Class and interface bodies: their declarations are members
    Members,
    /// Enum bodies: bare names are members
    EnumMembers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Object,
    Array,
    /// `key: value` inside an object pattern
    Pair,
    /// `left = default`
    Assignment,
    Rest,
    /// TypeScript `required_parameter` / `optional_parameter` wrappers
    Parameter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Value,
    Type,
    Property,
    PrivateProperty,
    /// `{ foo }` in an object literal, a reference to `foo`
    ShorthandProperty,
    /// `{ foo }` in a destructuring pattern, a binding of `foo`
    ShorthandPattern,
}

/// Closed classification of syntax nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    Declaration(DeclKind),
    /// Function and arrow expressions
    Function,
    /// Class expressions
    Class,
    Block(BlockKind),
    Parameters,
    Pattern(PatternKind),
    Identifier(IdentifierKind),
    Import,
    ImportClause,
    NamespaceImport,
    ImportSpecifier,
    Export,
    ExportClause,
    ExportSpecifier,
    MemberAccess,
    Call,
    Expression,
    Statement,
    Literal,
    TypeAnnotation,
    Comment,
    /// Anonymous tokens: punctuation and keywords
    Token,
    Error,
    /// Zero-width node inserted by error recovery
    Missing,
    Other,
}

impl NodeKind {
    pub fn is_identifier(self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    pub fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Missing)
    }

    /// Nodes whose body introduces a function scope
    pub fn is_function_like(self) -> bool {
        matches!(
            self,
            Self::Function
                | Self::Declaration(DeclKind::Function)
                | Self::Declaration(DeclKind::Method)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Grammar node type, kept for diagnostics
    pub raw: &'static str,
    pub start: usize,
    pub end: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Grammar field name this node occupies in its parent
    pub field: Option<&'static str>,
}

impl SyntaxNode {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open containment: `start <= offset < end`
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Owned syntax tree of one file. Node 0 is the root.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    text: Arc<str>,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub(crate) fn from_nodes(text: Arc<str>, nodes: Vec<SyntaxNode>) -> Self {
        Self { text, nodes }
    }

    /// Tree with a single root node spanning the text, used when the parser
    /// produced nothing at all
    pub fn fallback(text: Arc<str>) -> Self {
        let end = text.len();
        let root = SyntaxNode {
            kind: NodeKind::Program,
            raw: "program",
            start: 0,
            end,
            parent: None,
            children: vec![NodeId(1)],
            field: None,
        };
        let error = SyntaxNode {
            kind: NodeKind::Error,
            raw: "ERROR",
            start: 0,
            end,
            parent: Some(NodeId(0)),
            children: Vec::new(),
            field: None,
        };
        Self {
            text,
            nodes: vec![root, error],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.text
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn text(&self, id: NodeId) -> &str {
        let node = self.node(id);
        self.text.get(node.start..node.end).unwrap_or("")
    }

    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.node(*c).field == Some(field))
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.kind(*c) == kind)
    }

    /// Strict ancestors, innermost first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|c| *c == id)?;
        idx.checked_sub(1).map(|i| siblings[i])
    }

    /// Source-order traversal of `id` and its descendants, driven by an
    /// explicit stack
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Number of error and missing nodes in the tree
    pub fn error_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind.is_error()).count()
    }
}

pub struct Preorder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symbol::Language;

    fn parse(text: &str) -> SyntaxTree {
        let parser = SourceParser::new().unwrap();
        parser.parse(Language::TypeScript, Arc::from(text)).tree
    }

    #[test]
    fn test_root_spans_text() {
        let tree = parse("let a = 1;\n");
        let root = tree.node(tree.root());
        assert_eq!(root.kind, NodeKind::Program);
        assert_eq!(root.start, 0);
        assert_eq!(root.end, 11);
        assert_eq!(tree.error_count(), 0);
    }

    #[test]
    fn test_preorder_is_source_order() {
        let tree = parse("function foo(a) { return a; }");
        let idents: Vec<&str> = tree
            .preorder(tree.root())
            .filter(|id| tree.kind(*id).is_identifier())
            .map(|id| tree.text(id))
            .collect();
        assert_eq!(idents, vec!["foo", "a", "a"]);
    }

    #[test]
    fn test_parent_links_and_fields() {
        let tree = parse("function foo() {}");
        let decl = tree
            .preorder(tree.root())
            .find(|id| tree.kind(*id) == NodeKind::Declaration(DeclKind::Function))
            .unwrap();
        let name = tree.child_by_field(decl, "name").unwrap();
        assert_eq!(tree.text(name), "foo");
        assert_eq!(tree.parent(name), Some(decl));
        assert_eq!(tree.ancestors(name).last(), Some(tree.root()));
    }

    #[test]
    fn test_broken_source_has_error_nodes() {
        let tree = parse("function (");
        assert!(tree.error_count() > 0);
        assert_eq!(tree.node(tree.root()).kind, NodeKind::Program);
    }

    #[test]
    fn test_fallback_tree() {
        let tree = SyntaxTree::fallback(Arc::from("???"));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.error_count(), 1);
    }
}
