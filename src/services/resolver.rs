//! Position Resolver
//!
//! Maps a `(uri, position)` pair to the innermost syntax node whose
//! half-open span contains the position's byte offset.

use crate::error::QueryError;
use crate::infra::syntax::{NodeId, SyntaxTree};
use crate::models::position::Position;
use crate::services::program::{FileInfo, Program};

/// A resolved cursor inside one file of a program
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'p> {
    pub file: &'p FileInfo,
    pub node: NodeId,
    pub offset: usize,
}

/// Innermost node containing `position` in `uri`
pub fn resolve(program: &Program, uri: &str, position: Position) -> Result<NodeId, QueryError> {
    locate(program, uri, position).map(|cursor| cursor.node)
}

pub fn locate<'p>(
    program: &'p Program,
    uri: &str,
    position: Position,
) -> Result<Cursor<'p>, QueryError> {
    let file = program
        .file(uri)
        .ok_or_else(|| QueryError::FileNotFound(uri.to_string()))?;
    let offset = file
        .parsed
        .lines
        .offset(position)
        .ok_or_else(|| QueryError::PositionOutOfRange {
            uri: uri.to_string(),
            line: position.line,
            column: position.column,
        })?;

    Ok(Cursor {
        file,
        node: descend(file.tree(), offset),
        offset,
    })
}

/// Walk down from the root, always taking the first non-empty child that
/// contains `offset`. On a shared boundary the right-hand node wins because
/// spans are half-open.
pub fn descend(tree: &SyntaxTree, offset: usize) -> NodeId {
    let mut current = tree.root();
    while let Some(child) = tree
        .children(current)
        .iter()
        .copied()
        .find(|c| tree.node(*c).contains(offset))
    {
        current = child;
    }
    current
}

/// Identifier node ending exactly at `offset`, if any
pub fn identifier_ending_at(tree: &SyntaxTree, offset: usize) -> Option<NodeId> {
    let node = descend(tree, offset.checked_sub(1)?);
    (tree.kind(node).is_identifier() && tree.node(node).end == offset).then_some(node)
}

/// `this` keyword ending exactly at `offset`, if any
pub fn this_ending_at(tree: &SyntaxTree, offset: usize) -> Option<NodeId> {
    let node = descend(tree, offset.checked_sub(1)?);
    let span = tree.node(node);
    (span.raw == "this" && span.end == offset).then_some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::syntax::{IdentifierKind, NodeKind};
    use crate::services::facts::EcmaPolicy;
    use crate::services::program::ProgramBuilder;
    use crate::services::registry::SourceRegistry;

    fn program(uri: &str, text: &str) -> Program {
        let mut registry = SourceRegistry::new();
        registry.add_file(uri, text).unwrap();
        ProgramBuilder::new()
            .unwrap()
            .build(&registry.snapshot(), None, &EcmaPolicy)
    }

    #[test]
    fn test_resolves_identifier() {
        let program = program("a.js", "let total = 1;\ntotal + 2;");
        let file = program.file("a.js").unwrap();

        let node = resolve(&program, "a.js", Position::new(1, 2)).unwrap();
        assert_eq!(file.tree().text(node), "total");
        assert_eq!(
            file.tree().kind(node),
            NodeKind::Identifier(IdentifierKind::Value)
        );
    }

    #[test]
    fn test_shared_boundary_picks_right_node() {
        let program = program("a.js", "a+b;");
        let tree = program.file("a.js").unwrap().tree();

        // Offset 1 is the end of `a` and the start of `+`
        let node = resolve(&program, "a.js", Position::new(0, 1)).unwrap();
        assert_eq!(tree.text(node), "+");
        let node = resolve(&program, "a.js", Position::new(0, 2)).unwrap();
        assert_eq!(tree.text(node), "b");
    }

    #[test]
    fn test_end_of_text_resolves_to_root() {
        let program = program("a.js", "x;");
        let tree = program.file("a.js").unwrap().tree();
        let node = resolve(&program, "a.js", Position::new(0, 2)).unwrap();
        assert_eq!(node, tree.root());
    }

    #[test]
    fn test_out_of_range_and_unknown_file() {
        let program = program("a.js", "x;\ny;");

        assert!(matches!(
            resolve(&program, "a.js", Position::new(0, 3)),
            Err(QueryError::PositionOutOfRange { line: 0, column: 3, .. })
        ));
        assert!(matches!(
            resolve(&program, "a.js", Position::new(5, 0)),
            Err(QueryError::PositionOutOfRange { .. })
        ));
        assert_eq!(
            resolve(&program, "missing.js", Position::new(0, 0)),
            Err(QueryError::FileNotFound("missing.js".to_string()))
        );
    }

    #[test]
    fn test_every_position_resolves() {
        let text = "function f(a) {\n  return a.b + 'é';\n}\n";
        let program = program("a.js", text);
        let lines = &program.file("a.js").unwrap().parsed.lines;

        for line in 0..lines.line_count() {
            for column in 0..=lines.line_len(line).unwrap() {
                let position = Position::new(line as u32, column as u32);
                let first = resolve(&program, "a.js", position).unwrap();
                let second = resolve(&program, "a.js", position).unwrap();
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_zero_width_nodes_are_skipped() {
        let mut missing = 0;
        for text in ["foo(1;\nbar();", "function f() {\n  let x = 1;\n"] {
            let program = program("a.js", text);
            let file = program.file("a.js").unwrap();
            let tree = file.tree();
            missing += tree
                .preorder(tree.root())
                .filter(|id| tree.kind(*id) == NodeKind::Missing)
                .count();

            let lines = &file.parsed.lines;
            for line in 0..lines.line_count() {
                for column in 0..=lines.line_len(line).unwrap() {
                    let position = Position::new(line as u32, column as u32);
                    let node = resolve(&program, "a.js", position).unwrap();
                    let span = tree.node(node);
                    assert!(
                        node == tree.root() || span.start < span.end,
                        "empty node {:?} at {:?}",
                        span.raw,
                        position
                    );
                }
            }
        }
        assert!(missing > 0);
    }

    #[test]
    fn test_this_ending_at() {
        let program = program("a.js", "class A { m() { return this.x; } }");
        let tree = program.file("a.js").unwrap().tree();

        let node = this_ending_at(tree, 27).unwrap();
        assert_eq!(tree.text(node), "this");
        assert!(this_ending_at(tree, 29).is_none());
    }

    #[test]
    fn test_identifier_ending_at() {
        let program = program("a.js", "obj.pro");
        let tree = program.file("a.js").unwrap().tree();

        let node = identifier_ending_at(tree, 3).unwrap();
        assert_eq!(tree.text(node), "obj");
        let node = identifier_ending_at(tree, 7).unwrap();
        assert_eq!(tree.text(node), "pro");
        assert!(identifier_ending_at(tree, 4).is_none());
        assert!(identifier_ending_at(tree, 0).is_none());
    }
}
