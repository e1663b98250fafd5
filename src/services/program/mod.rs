//! Program snapshots
//!
//! A [`Program`] is the immutable, fully bound state of every tracked file at
//! one registry version. Symbols and scopes live in per-program arenas
//! addressed by [`SymbolId`] and [`ScopeId`]; syntax nodes live in per-file
//! arenas addressed by [`NodeId`].

mod binder;
pub mod builder;
pub mod module_graph;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::infra::line_index::LineIndex;
use crate::infra::syntax::{ModuleRequest, NodeId, SyntaxTree};
use crate::models::position::{Location, Range};
use crate::models::symbol::{Language, ScopeId, Symbol, SymbolId};

pub use builder::ProgramBuilder;
pub use module_graph::{ExportTable, ModuleEdge, ModuleGraph};

/// Longest alias chain followed before giving up
const MAX_ALIAS_HOPS: usize = 64;

/// Parse result of one file version, shared between consecutive programs
#[derive(Debug)]
pub struct ParsedFile {
    pub uri: String,
    pub version: u64,
    pub language: Language,
    pub tree: SyntaxTree,
    pub lines: LineIndex,
    pub requests: Vec<ModuleRequest>,
}

impl ParsedFile {
    pub fn text(&self) -> &str {
        self.tree.source()
    }

    pub fn range_of(&self, node: NodeId) -> Range {
        let n = self.tree.node(node);
        self.lines.range(n.start, n.end)
    }

    pub fn location_of(&self, node: NodeId) -> Location {
        Location::new(self.uri.clone(), self.range_of(node))
    }

    /// Files with `import` or `export` statements are modules
    pub fn is_module(&self) -> bool {
        use crate::infra::syntax::NodeKind;

        let tree = &self.tree;
        tree.children(tree.root())
            .iter()
            .any(|c| matches!(tree.kind(*c), NodeKind::Import | NodeKind::Export))
    }

    pub fn error_count(&self) -> usize {
        self.tree.error_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
    /// Class, interface and enum members
    Members,
    Namespace,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// Lexically enclosing scope. Member scopes point at the scope holding
    /// their owner but are never part of a lexical chain.
    pub parent: Option<ScopeId>,
    pub uri: Option<String>,
    /// Prefix used for qualified names of symbols declared here
    pub path: String,
    pub bindings: HashMap<String, SymbolId>,
    /// Every symbol declared here, in declaration order
    pub symbols: Vec<SymbolId>,
}

impl Scope {
    pub fn qualify(&self, name: &str) -> String {
        qualify(&self.path, name)
    }
}

pub(crate) fn qualify(path: &str, name: &str) -> String {
    if path.is_empty() || path.ends_with("::") {
        format!("{}{}", path, name)
    } else {
        format!("{}.{}", path, name)
    }
}

/// Syntax behind one declaration of a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclSite {
    /// Index into [`Program::file_uris`]
    pub file: usize,
    /// Declaring node: declarator, function, class, parameter, specifier
    pub node: NodeId,
    /// Identifier carrying the name
    pub name: NodeId,
}

/// What an import binding stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasTarget {
    Symbol(SymbolId),
    /// Namespace import of a whole module
    Module(String),
}

/// Bound state of one file inside a program
#[derive(Debug)]
pub struct FileInfo {
    pub parsed: Arc<ParsedFile>,
    /// Module scope, or the global scope for scripts
    pub scope: ScopeId,
    /// Symbols this file declares at its top level
    pub top_level: Vec<SymbolId>,
    /// Lexical scopes introduced by nodes of this file
    pub node_scopes: HashMap<NodeId, ScopeId>,
    /// Member scope of each class node, for `this.x`
    pub class_members: HashMap<NodeId, ScopeId>,
    /// Identifier resolution table
    pub resolutions: HashMap<NodeId, SymbolId>,
}

impl FileInfo {
    pub fn uri(&self) -> &str {
        &self.parsed.uri
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.parsed.tree
    }

    /// Innermost lexical scope enclosing `node`
    pub fn scope_at(&self, node: NodeId) -> ScopeId {
        std::iter::once(node)
            .chain(self.tree().ancestors(node))
            .find_map(|n| self.node_scopes.get(&n).copied())
            .unwrap_or(self.scope)
    }
}

#[derive(Debug)]
pub struct Program {
    version: u64,
    files: BTreeMap<String, FileInfo>,
    file_uris: Vec<String>,
    symbols: Vec<Symbol>,
    sites: Vec<Vec<DeclSite>>,
    scopes: Vec<Scope>,
    symbol_index: BTreeMap<String, SymbolId>,
    aliases: HashMap<SymbolId, AliasTarget>,
    graph: ModuleGraph,
}

impl Program {
    /// Program with no files, holding only the global scope
    pub fn empty() -> Self {
        Self {
            version: 0,
            files: BTreeMap::new(),
            file_uris: Vec::new(),
            symbols: Vec::new(),
            sites: Vec::new(),
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                uri: None,
                path: String::new(),
                bindings: HashMap::new(),
                symbols: Vec::new(),
            }],
            symbol_index: BTreeMap::new(),
            aliases: HashMap::new(),
            graph: ModuleGraph::default(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn file(&self, uri: &str) -> Option<&FileInfo> {
        self.files.get(uri)
    }

    /// Files ordered by uri
    pub fn files(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Declaration syntax of `id`, resolved to the declaring file
    pub fn sites(&self, id: SymbolId) -> impl Iterator<Item = (&FileInfo, DeclSite)> {
        self.sites
            .get(id.index())
            .into_iter()
            .flatten()
            .filter_map(|site| {
                let uri = self.file_uris.get(site.file)?;
                Some((self.files.get(uri)?, *site))
            })
    }

    pub fn lookup_qualified(&self, qualified_name: &str) -> Option<SymbolId> {
        self.symbol_index.get(qualified_name).copied()
    }

    /// Whole-program symbol index by value, for comparisons across versions
    pub fn symbol_index(&self) -> BTreeMap<String, Symbol> {
        self.symbol_index
            .iter()
            .filter_map(|(name, id)| Some((name.clone(), self.symbol(*id)?.clone())))
            .collect()
    }

    /// Resolve `name` through the lexical chain starting at `scope`
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope_chain(scope)
            .find_map(|(_, s)| s.bindings.get(name).copied())
    }

    /// `scope` and its lexical ancestors, innermost first
    pub fn scope_chain(&self, scope: ScopeId) -> impl Iterator<Item = (ScopeId, &Scope)> {
        std::iter::successors(
            self.scope(scope).map(|s| (scope, s)),
            move |(_, s)| s.parent.and_then(|p| Some((p, self.scope(p)?))),
        )
    }

    pub fn alias_target(&self, id: SymbolId) -> Option<&AliasTarget> {
        self.aliases.get(&id)
    }

    /// Follow import aliases to the symbol they finally denote. Namespace
    /// imports and unresolved imports are their own canonical symbol.
    pub fn canonical(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.aliases.get(&current) {
                Some(AliasTarget::Symbol(next)) if *next != current => current = *next,
                _ => return current,
            }
        }
        current
    }

    /// Member `name` of the entity `id` denotes: class, interface, enum and
    /// namespace members, or the exports of a namespace-imported module
    pub fn member(&self, id: SymbolId, name: &str) -> Option<SymbolId> {
        let canonical = self.canonical(id);
        if let Some(AliasTarget::Module(uri)) = self.aliases.get(&canonical) {
            return self.exports_of(uri)?.get(name).copied();
        }
        let members = self.symbol(canonical)?.members?;
        self.scope(members)?.bindings.get(name).copied()
    }

    /// Every member of `id`, in declaration order
    pub fn members_of(&self, id: SymbolId) -> Vec<(String, SymbolId)> {
        let canonical = self.canonical(id);
        if let Some(AliasTarget::Module(uri)) = self.aliases.get(&canonical) {
            return self
                .exports_of(uri)
                .map(|table| table.iter().map(|(n, s)| (n.clone(), *s)).collect())
                .unwrap_or_default();
        }
        self.symbol(canonical)
            .and_then(|s| s.members)
            .and_then(|m| self.scope(m))
            .map(|scope| {
                scope
                    .symbols
                    .iter()
                    .filter_map(|id| {
                        let name = &self.symbol(*id)?.name;
                        (scope.bindings.get(name) == Some(id)).then(|| (name.clone(), *id))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn exports_of(&self, uri: &str) -> Option<&ExportTable> {
        self.graph.exports_of(uri)
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Bound symbol of an identifier node
    pub fn symbol_at(&self, uri: &str, node: NodeId) -> Option<SymbolId> {
        self.file(uri)?.resolutions.get(&node).copied()
    }

    /// Number of error and missing nodes per file, only for files that have any
    pub fn degraded_files(&self) -> impl Iterator<Item = (&str, usize)> {
        self.files.values().filter_map(|f| {
            let errors = f.parsed.error_count();
            (errors > 0).then_some((f.uri(), errors))
        })
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::empty()
    }
}
