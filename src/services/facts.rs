//! Type Facts Provider
//!
//! Everything the query engines know about a symbol beyond its name comes
//! through [`TypeFacts`]. The default [`SyntacticFacts`] reads the Program's
//! binding tables and derives type strings from the source text only:
//! annotations, literal initializers and function signatures. No code is
//! ever evaluated.

use serde::Serialize;

use crate::error::FactsError;
use crate::infra::syntax::{NodeId, NodeKind, SyntaxTree};
use crate::models::symbol::{DeclKind, SymbolId, SymbolKind};
use crate::services::program::{AliasTarget, Program};

/// When a declaration becomes visible inside its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hoisting {
    /// Visible everywhere in the scope
    Hoisted,
    /// Visible only after the declaration starts
    Ordered,
}

/// Declaration merging and scoping rules of the host language
pub trait DeclarationPolicy: Send + Sync {
    /// Whether `incoming` extends an `existing` declaration of the same name
    /// in the same scope instead of shadowing it
    fn merges(&self, existing: DeclKind, incoming: DeclKind) -> bool;

    fn hoisting(&self, kind: DeclKind) -> Hoisting;

    /// Whether the declaration skips blocks and binds to the nearest
    /// function or module scope
    fn binds_to_function_scope(&self, kind: DeclKind) -> bool;
}

/// ECMAScript and TypeScript declaration rules
#[derive(Debug, Clone, Copy, Default)]
pub struct EcmaPolicy;

impl DeclarationPolicy for EcmaPolicy {
    fn merges(&self, existing: DeclKind, incoming: DeclKind) -> bool {
        use DeclKind::*;

        matches!(
            (existing, incoming),
            (Var, Var)
                | (Parameter, Var | Function)
                | (Function, Function | Var)
                | (Var, Function)
                | (Interface, Interface)
                | (Enum, Enum)
                | (Namespace, Namespace)
                | (Namespace, Class | Function | Enum)
                | (Class | Function | Enum, Namespace)
                | (Class, Interface)
                | (Interface, Class)
                // overloads and get/set pairs
                | (Method, Method)
        )
    }

    fn hoisting(&self, kind: DeclKind) -> Hoisting {
        match kind {
            DeclKind::Let | DeclKind::Const | DeclKind::Class | DeclKind::Enum => Hoisting::Ordered,
            _ => Hoisting::Hoisted,
        }
    }

    fn binds_to_function_scope(&self, kind: DeclKind) -> bool {
        kind == DeclKind::Var
    }
}

/// One entry of a module's export table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedName {
    pub name: String,
    pub kind: SymbolKind,
    #[serde(skip)]
    pub symbol: SymbolId,
}

pub trait TypeFacts: Send + Sync {
    /// Symbol an identifier node is bound to
    fn symbol_at(&self, program: &Program, uri: &str, node: NodeId) -> Option<SymbolId>;

    fn type_of(&self, program: &Program, symbol: SymbolId) -> Result<String, FactsError>;

    fn doc_comment(&self, program: &Program, symbol: SymbolId)
    -> Result<Option<String>, FactsError>;

    /// Exported names of a module, ordered by name
    fn exports_of(&self, program: &Program, uri: &str) -> Vec<ExportedName>;

    /// Whether two symbols denote the same entity once aliases are followed
    fn same_symbol(&self, program: &Program, a: SymbolId, b: SymbolId) -> bool {
        self.canonical(program, a) == self.canonical(program, b)
    }

    fn canonical(&self, program: &Program, symbol: SymbolId) -> SymbolId;

    fn policy(&self) -> &dyn DeclarationPolicy;
}

/// Facts derived from the syntax and binding tables of a Program
#[derive(Debug, Clone, Default)]
pub struct SyntacticFacts {
    policy: EcmaPolicy,
}

impl SyntacticFacts {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TypeFacts for SyntacticFacts {
    fn symbol_at(&self, program: &Program, uri: &str, node: NodeId) -> Option<SymbolId> {
        program.symbol_at(uri, node)
    }

    fn type_of(&self, program: &Program, symbol: SymbolId) -> Result<String, FactsError> {
        let canonical = program.canonical(symbol);
        let sym = program
            .symbol(canonical)
            .ok_or(FactsError::UnknownSymbol(canonical))?;

        if let Some(AliasTarget::Module(uri)) = program.alias_target(canonical) {
            return Ok(format!("typeof import(\"{}\")", uri));
        }

        match sym.decl_kind {
            DeclKind::Class | DeclKind::Enum | DeclKind::Namespace => {
                return Ok(format!("typeof {}", sym.name));
            }
            DeclKind::Interface => return Ok(sym.name.clone()),
            // Unresolved import
            DeclKind::Import | DeclKind::NamespaceImport => return Ok("any".to_string()),
            DeclKind::EnumMember => {
                let owner = program
                    .scope(sym.scope)
                    .map(|s| owner_name(&s.path).to_string())
                    .unwrap_or_default();
                return Ok(if owner.is_empty() { "number".to_string() } else { owner });
            }
            _ => {}
        }

        let (file, site) = program.sites(canonical).next().ok_or_else(|| {
            FactsError::Unavailable(format!("no declaration recorded for {}", sym.name))
        })?;
        let tree = file.tree();

        let text = match sym.decl_kind {
            DeclKind::Function | DeclKind::Method => signature(tree, site.node),
            DeclKind::TypeAlias => tree
                .child_by_field(site.node, "value")
                .map(|v| collapse(tree.text(v)))
                .unwrap_or_else(|| "any".to_string()),
            _ => value_type(tree, site.node),
        };
        Ok(text)
    }

    fn doc_comment(
        &self,
        program: &Program,
        symbol: SymbolId,
    ) -> Result<Option<String>, FactsError> {
        let canonical = program.canonical(symbol);
        if program.symbol(canonical).is_none() {
            return Err(FactsError::UnknownSymbol(canonical));
        }

        Ok(program
            .sites(canonical)
            .find_map(|(file, site)| leading_doc(file.tree(), site.node)))
    }

    fn exports_of(&self, program: &Program, uri: &str) -> Vec<ExportedName> {
        program
            .exports_of(uri)
            .into_iter()
            .flatten()
            .filter_map(|(name, symbol)| {
                let kind = program.symbol(*symbol)?.kind;
                Some(ExportedName {
                    name: name.clone(),
                    kind,
                    symbol: *symbol,
                })
            })
            .collect()
    }

    fn canonical(&self, program: &Program, symbol: SymbolId) -> SymbolId {
        program.canonical(symbol)
    }

    fn policy(&self) -> &dyn DeclarationPolicy {
        &self.policy
    }
}

/// Last segment of a scope path: `a.ts::Color` -> `Color`
fn owner_name(path: &str) -> &str {
    let tail = path.rsplit("::").next().unwrap_or(path);
    tail.rsplit('.').next().unwrap_or(tail)
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of a type annotation without its leading `:` or `=>`
fn annotation(tree: &SyntaxTree, node: NodeId, field: &str) -> Option<String> {
    let text = tree.text(tree.child_by_field(node, field)?);
    let text = text.trim_start();
    let text = text
        .strip_prefix(':')
        .or_else(|| text.strip_prefix("=>"))
        .unwrap_or(text);
    Some(collapse(text))
}

/// `(a: number, b) => string` for anything with parameters
fn signature(tree: &SyntaxTree, function: NodeId) -> String {
    let params = match (
        tree.child_by_field(function, "parameters"),
        tree.child_by_field(function, "parameter"),
    ) {
        (Some(params), _) => collapse(tree.text(params)),
        (None, Some(param)) => format!("({})", tree.text(param)),
        (None, None) => "()".to_string(),
    };
    let returns = annotation(tree, function, "return_type").unwrap_or_else(|| "any".to_string());
    format!("{} => {}", params, returns)
}

/// Type of a variable, parameter or property from its annotation or initializer
fn value_type(tree: &SyntaxTree, node: NodeId) -> String {
    if let Some(annotated) = annotation(tree, node, "type") {
        return annotated;
    }

    let initializer = match tree.node(node).raw {
        "assignment_pattern" | "assignment_expression" => tree.child_by_field(node, "right"),
        _ => tree.child_by_field(node, "value"),
    };
    initializer
        .map(|value| literal_type(tree, value))
        .unwrap_or_else(|| "any".to_string())
}

fn literal_type(tree: &SyntaxTree, value: NodeId) -> String {
    let raw = tree.node(value).raw;
    match raw {
        "number" => "number".to_string(),
        "string" | "template_string" => "string".to_string(),
        "true" | "false" => "boolean".to_string(),
        "null" => "null".to_string(),
        "undefined" => "undefined".to_string(),
        "regex" => "RegExp".to_string(),
        "array" => "any[]".to_string(),
        "object" => "object".to_string(),
        "arrow_function" | "function_expression" | "function" | "generator_function" => {
            signature(tree, value)
        }
        "new_expression" => tree
            .child_by_field(value, "constructor")
            .map(|c| collapse(tree.text(c)))
            .unwrap_or_else(|| "any".to_string()),
        // `<T>value`
        "type_assertion" => tree
            .children(value)
            .first()
            .map(|t| collapse(tree.text(*t).trim_start_matches('<').trim_end_matches('>')))
            .unwrap_or_else(|| "any".to_string()),
        "as_expression" | "satisfies_expression" => tree
            .children(value)
            .last()
            .map(|t| collapse(tree.text(*t)))
            .unwrap_or_else(|| "any".to_string()),
        _ if tree.kind(value) == NodeKind::Class => "class".to_string(),
        _ => "any".to_string(),
    }
}

/// Statement wrappers a doc comment may precede instead of the declaration
const DOC_WRAPPERS: &[&str] = &[
    "lexical_declaration",
    "variable_declaration",
    "export_statement",
    "ambient_declaration",
];

/// `/** ... */` comment directly preceding a declaration or its wrappers
fn leading_doc(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    let mut current = Some(node);

    while let Some(id) = current {
        if let Some(prev) = tree.prev_sibling(id)
            && tree.kind(prev) == NodeKind::Comment
        {
            return clean_doc(tree.text(prev));
        }
        current = tree
            .parent(id)
            .filter(|p| DOC_WRAPPERS.contains(&tree.node(*p).raw));
    }
    None
}

fn clean_doc(comment: &str) -> Option<String> {
    let body = comment.strip_prefix("/**")?.strip_suffix("*/")?;
    let lines: Vec<&str> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map(str::trim_start).unwrap_or(line)
        })
        .collect();

    let text = lines.join("\n").trim().to_string();
    (!text.is_empty()).then_some(text)
}
