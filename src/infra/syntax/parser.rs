//! Tree-sitter front end
//!
//! Parses JavaScript and TypeScript sources and lowers the concrete syntax
//! tree into a [`SyntaxTree`] arena. Module specifiers (`import`, `export ...
//! from`, `require(...)`) are collected with a tree-sitter query.

use std::sync::{Arc, Mutex};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language as Grammar, Node, Parser, Query, QueryCursor};

use super::node_types::{classify, declarator_kind};
use super::{NodeId, NodeKind, SyntaxNode, SyntaxTree};
use crate::error::{SightlineError, SightlineResult};
use crate::models::symbol::{DeclKind, Language};

const MODULE_REQUESTS: &str = r#"
(import_statement source: (string (string_fragment) @import))
(export_statement source: (string (string_fragment) @export))
(call_expression
  function: (identifier) @_fn
  arguments: (arguments . (string (string_fragment) @require))
  (#eq? @_fn "require"))
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Import,
    /// `export ... from "x"`
    Export,
    Require,
}

/// A module specifier string found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    pub specifier: String,
    pub kind: RequestKind,
}

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub tree: SyntaxTree,
    pub requests: Vec<ModuleRequest>,
}

pub struct SourceParser {
    javascript: Mutex<Parser>,
    typescript: Mutex<Parser>,
    tsx: Mutex<Parser>,
    js_requests: Query,
    ts_requests: Query,
    tsx_requests: Query,
}

impl SourceParser {
    pub fn new() -> SightlineResult<Self> {
        let javascript: Grammar = tree_sitter_javascript::LANGUAGE.into();
        let typescript: Grammar = tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let tsx: Grammar = tree_sitter_typescript::LANGUAGE_TSX.into();

        Ok(Self {
            javascript: Mutex::new(Self::create_parser(&javascript)?),
            typescript: Mutex::new(Self::create_parser(&typescript)?),
            tsx: Mutex::new(Self::create_parser(&tsx)?),
            js_requests: Self::create_query(&javascript)?,
            ts_requests: Self::create_query(&typescript)?,
            tsx_requests: Self::create_query(&tsx)?,
        })
    }

    fn create_parser(language: &Grammar) -> SightlineResult<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(language)
            .map_err(|e| SightlineError::ParserSetup(e.to_string()))?;
        Ok(parser)
    }

    fn create_query(language: &Grammar) -> SightlineResult<Query> {
        Query::new(language, MODULE_REQUESTS)
            .map_err(|e| SightlineError::ParserSetup(e.to_string()))
    }

    fn parser_and_query(&self, language: Language) -> (&Mutex<Parser>, &Query) {
        match language {
            Language::TypeScript => (&self.typescript, &self.ts_requests),
            Language::Tsx => (&self.tsx, &self.tsx_requests),
            Language::JavaScript | Language::Unknown => (&self.javascript, &self.js_requests),
        }
    }

    /// Parse `text`. Always yields a tree; syntax errors become
    /// [`NodeKind::Error`] and [`NodeKind::Missing`] nodes.
    pub fn parse(&self, language: Language, text: Arc<str>) -> ParseOutput {
        let (parser_mutex, query) = self.parser_and_query(language);

        let parsed = {
            let mut parser = parser_mutex.lock().unwrap_or_else(|e| e.into_inner());
            parser.parse(text.as_bytes(), None)
        };

        let Some(parsed) = parsed else {
            tracing::warn!("Parser produced no tree, using fallback");
            return ParseOutput {
                tree: SyntaxTree::fallback(text),
                requests: Vec::new(),
            };
        };

        let requests = collect_requests(query, parsed.root_node(), &text);
        let tree = lower(parsed.root_node(), text);

        ParseOutput { tree, requests }
    }
}

fn collect_requests(query: &Query, root: Node<'_>, text: &str) -> Vec<ModuleRequest> {
    let capture_names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, text.as_bytes());
    let mut requests: Vec<(usize, ModuleRequest)> = Vec::new();

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let kind = match capture_names.get(capture.index as usize).copied() {
                Some("import") => RequestKind::Import,
                Some("export") => RequestKind::Export,
                Some("require") => RequestKind::Require,
                _ => continue,
            };
            let (start, end) = (capture.node.start_byte(), capture.node.end_byte());
            if let Some(specifier) = text.get(start..end) {
                let specifier = specifier.to_string();
                requests.push((start, ModuleRequest { specifier, kind }));
            }
        }
    }

    requests.sort_by_key(|(start, _)| *start);
    requests.into_iter().map(|(_, request)| request).collect()
}

struct Frame {
    id: NodeId,
    raw: &'static str,
    /// `var`/`let`/`const` keyword seen among the children so far
    keyword: Option<DeclKind>,
}

/// Lower the concrete tree with an explicit cursor walk
fn lower(root: Node<'_>, text: Arc<str>) -> SyntaxTree {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut cursor = root.walk();

    // Error recovery can hand back an ERROR root; keep a program node on top
    if root.is_error() {
        nodes.push(SyntaxNode {
            kind: NodeKind::Program,
            raw: "program",
            start: 0,
            end: text.len(),
            parent: None,
            children: Vec::new(),
            field: None,
        });
        stack.push(Frame {
            id: NodeId(0),
            raw: "program",
            keyword: None,
        });
    }

    loop {
        let node = cursor.node();
        let id = NodeId(nodes.len() as u32);

        let kind = if node.is_missing() {
            NodeKind::Missing
        } else if node.is_error() {
            NodeKind::Error
        } else if !node.is_named() {
            if let Some(frame) = stack.last_mut()
                && matches!(frame.raw, "lexical_declaration" | "variable_declaration")
                && frame.keyword.is_none()
            {
                frame.keyword = declarator_kind(node.kind());
            }
            NodeKind::Token
        } else {
            let keyword = stack.last().and_then(|f| f.keyword);
            classify(node.kind(), keyword)
        };

        let parent_id = stack.last().map(|f| f.id);
        if let Some(p) = parent_id {
            nodes[p.index()].children.push(id);
        }

        let (start, end) = if parent_id.is_none() {
            // The root always spans the whole text, leading and trailing trivia included
            (0, text.len())
        } else {
            (node.start_byte(), node.end_byte())
        };

        nodes.push(SyntaxNode {
            kind,
            raw: node.kind(),
            start,
            end,
            parent: parent_id,
            children: Vec::new(),
            field: cursor.field_name(),
        });

        if cursor.goto_first_child() {
            stack.push(Frame {
                id,
                raw: node.kind(),
                keyword: None,
            });
            continue;
        }

        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return SyntaxTree::from_nodes(text, nodes);
            }
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SourceParser {
        SourceParser::new().unwrap()
    }

    fn declarations(tree: &SyntaxTree) -> Vec<(DeclKind, String)> {
        tree.preorder(tree.root())
            .filter_map(|id| match tree.kind(id) {
                NodeKind::Declaration(kind) => {
                    let name = tree.child_by_field(id, "name")?;
                    Some((kind, tree.text(name).to_string()))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_variable_declarator_keywords() {
        let output = parser().parse(
            Language::JavaScript,
            Arc::from("var a = 1; let b = 2; const c = 3;"),
        );
        assert_eq!(
            declarations(&output.tree),
            vec![
                (DeclKind::Var, "a".to_string()),
                (DeclKind::Let, "b".to_string()),
                (DeclKind::Const, "c".to_string()),
            ]
        );
    }

    #[test]
    fn test_typescript_declarations() {
        let source = "interface Shape { area(): number }\n\
                      enum Color { Red }\n\
                      type Id = string;\n\
                      class Box { size = 1; grow() {} }";
        let output = parser().parse(Language::TypeScript, Arc::from(source));
        let decls = declarations(&output.tree);

        assert!(decls.contains(&(DeclKind::Interface, "Shape".to_string())));
        assert!(decls.contains(&(DeclKind::Method, "area".to_string())));
        assert!(decls.contains(&(DeclKind::Enum, "Color".to_string())));
        assert!(decls.contains(&(DeclKind::TypeAlias, "Id".to_string())));
        assert!(decls.contains(&(DeclKind::Class, "Box".to_string())));
        assert!(decls.contains(&(DeclKind::Method, "grow".to_string())));
        assert_eq!(output.tree.error_count(), 0);
    }

    #[test]
    fn test_typescript_angle_bracket_cast() {
        let source = "let y: any = 1;\nconst x = <number>y;\nconst id = <T>(v: T) => v;";
        let output = parser().parse(Language::TypeScript, Arc::from(source));
        assert_eq!(output.tree.error_count(), 0);
        assert!(declarations(&output.tree).contains(&(DeclKind::Const, "x".to_string())));
    }

    #[test]
    fn test_tsx_elements() {
        let source = "const view = <div className=\"a\">{label}</div>;";
        let output = parser().parse(Language::Tsx, Arc::from(source));
        assert_eq!(output.tree.error_count(), 0);
        assert!(declarations(&output.tree).contains(&(DeclKind::Const, "view".to_string())));
    }

    #[test]
    fn test_module_requests() {
        let source = "import { a } from './a';\n\
                      export * from \"./b\";\n\
                      const c = require('./c');\n\
                      const d = load('./d');";
        let output = parser().parse(Language::JavaScript, Arc::from(source));
        let found: Vec<(&str, RequestKind)> = output
            .requests
            .iter()
            .map(|r| (r.specifier.as_str(), r.kind))
            .collect();

        assert_eq!(
            found,
            vec![
                ("./a", RequestKind::Import),
                ("./b", RequestKind::Export),
                ("./c", RequestKind::Require),
            ]
        );
    }

    #[test]
    fn test_missing_and_error_nodes_are_kept() {
        let output = parser().parse(Language::TypeScript, Arc::from("let x = ;\nlet y = 2;"));
        assert!(output.tree.error_count() > 0);
        assert!(
            declarations(&output.tree).contains(&(DeclKind::Let, "y".to_string()))
        );
    }

    #[test]
    fn test_empty_source() {
        let output = parser().parse(Language::JavaScript, Arc::from(""));
        let root = output.tree.node(output.tree.root());
        assert_eq!(root.kind, NodeKind::Program);
        assert_eq!((root.start, root.end), (0, 0));
        assert!(output.requests.is_empty());
    }
}
