//! Declaration and resolution passes
//!
//! The declaration pass walks each file once, creating scopes and symbols.
//! After every file is declared and the module graph is known, the resolution
//! pass binds the remaining identifiers through the scope chain and member
//! scopes. Both passes use an explicit stack.

use std::collections::{BTreeMap, HashMap};

use super::{DeclSite, FileInfo, ParsedFile, Program, Scope, ScopeKind, qualify};
use crate::infra::syntax::node_types::declarator_kind;
use crate::infra::syntax::{BlockKind, IdentifierKind, NodeId, NodeKind, PatternKind, SyntaxTree};
use crate::models::symbol::{DeclKind, ScopeId, Symbol, SymbolId};
use crate::services::facts::DeclarationPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportMode {
    Named,
    Default,
}

/// Traversal context of the declaration pass
#[derive(Debug, Clone, Copy)]
struct Ctx {
    lexical: ScopeId,
    /// Target of `var` declarations
    var_scope: ScopeId,
    /// Member scope receiving method/property/enum member declarations
    members: Option<ScopeId>,
    /// Member scope `this` refers to
    this_members: Option<ScopeId>,
    export: Option<ExportMode>,
}

impl Ctx {
    fn plain(self) -> Self {
        Self {
            export: None,
            ..self
        }
    }

    fn without_members(self) -> Self {
        Self {
            members: None,
            export: None,
            ..self
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct ImportBinding {
    pub symbol: SymbolId,
    pub specifier: String,
    /// Imported export name, `None` for namespace imports
    pub imported: Option<String>,
    /// `a` in `import { a as b }`, bound to the exported symbol
    pub name_node: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub(super) enum ExportEntry {
    Local {
        exported: String,
        symbol: SymbolId,
    },
    /// `export { local as exported }`, looked up once the file is declared
    LocalName {
        exported: String,
        local: String,
    },
    ReExport {
        exported: String,
        imported: String,
        specifier: String,
        nodes: Vec<NodeId>,
    },
    Star {
        specifier: String,
    },
}

#[derive(Debug)]
pub(super) struct FileBindings {
    pub file: usize,
    pub scope: ScopeId,
    pub top_level: Vec<SymbolId>,
    pub node_scopes: HashMap<NodeId, ScopeId>,
    pub class_members: HashMap<NodeId, ScopeId>,
    pub resolutions: HashMap<NodeId, SymbolId>,
    pub imports: Vec<ImportBinding>,
    pub exports: Vec<ExportEntry>,
}

impl FileBindings {
    fn new(file: usize, scope: ScopeId) -> Self {
        Self {
            file,
            scope,
            top_level: Vec::new(),
            node_scopes: HashMap::new(),
            class_members: HashMap::new(),
            resolutions: HashMap::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }
}

/// Strip the quotes of a string literal specifier or member name
pub(super) fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Declared name carried by `node`, if it is a plain name
fn name_text(tree: &SyntaxTree, node: NodeId) -> Option<&str> {
    let text = match tree.kind(node) {
        NodeKind::Identifier(_) => tree.text(node),
        NodeKind::Literal if tree.node(node).raw == "string" => unquote(tree.text(node)),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn push_children(
    stack: &mut Vec<(NodeId, Ctx)>,
    tree: &SyntaxTree,
    id: NodeId,
    ctx_for: impl Fn(NodeId) -> Ctx,
) {
    stack.extend(tree.children(id).iter().rev().map(|c| (*c, ctx_for(*c))));
}

pub(super) struct Binder<'p> {
    policy: &'p dyn DeclarationPolicy,
    pub symbols: Vec<Symbol>,
    pub sites: Vec<Vec<DeclSite>>,
    pub scopes: Vec<Scope>,
    pub symbol_index: BTreeMap<String, SymbolId>,
}

impl<'p> Binder<'p> {
    pub fn new(policy: &'p dyn DeclarationPolicy) -> Self {
        let mut binder = Self {
            policy,
            symbols: Vec::new(),
            sites: Vec::new(),
            scopes: Vec::new(),
            symbol_index: BTreeMap::new(),
        };
        binder.new_scope(ScopeKind::Global, None, None, String::new());
        binder
    }

    fn new_scope(
        &mut self,
        kind: ScopeKind,
        parent: Option<ScopeId>,
        uri: Option<&str>,
        path: String,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent,
            uri: uri.map(str::to_string),
            path,
            bindings: HashMap::new(),
            symbols: Vec::new(),
        });
        id
    }

    pub fn module_scope(&mut self, uri: &str) -> ScopeId {
        self.new_scope(
            ScopeKind::Module,
            Some(ScopeId::GLOBAL),
            Some(uri),
            format!("{}::", uri),
        )
    }

    fn path_of(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.index()].path
    }

    /// Declare `name` in `scope`, merging with an existing declaration when
    /// the policy allows it
    #[allow(clippy::too_many_arguments)]
    fn declare(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        scope: ScopeId,
        name: &str,
        kind: DeclKind,
        node: NodeId,
        name_node: NodeId,
    ) -> SymbolId {
        let location = file.location_of(name_node);
        let site = DeclSite {
            file: out.file,
            node,
            name: name_node,
        };

        let existing = self.scopes[scope.index()].bindings.get(name).copied();
        let id = match existing {
            Some(existing)
                if self
                    .policy
                    .merges(self.symbols[existing.index()].decl_kind, kind) =>
            {
                self.symbols[existing.index()].declarations.push(location);
                self.sites[existing.index()].push(site);
                existing
            }
            _ => {
                let id = SymbolId(self.symbols.len() as u32);
                let qualified = qualify(self.path_of(scope), name);
                self.symbols.push(Symbol::new(
                    name.to_string(),
                    kind,
                    location,
                    scope,
                    qualified.clone(),
                ));
                self.sites.push(vec![site]);

                let target = &mut self.scopes[scope.index()];
                target.symbols.push(id);
                // A non-mergeable redeclaration is its own symbol, the first keeps the name
                target.bindings.entry(name.to_string()).or_insert(id);
                self.symbol_index.entry(qualified).or_insert(id);
                id
            }
        };

        out.resolutions.insert(name_node, id);
        if scope == out.scope && !out.top_level.contains(&id) {
            out.top_level.push(id);
        }
        id
    }

    /// Member scope of `owner`, created on first use and shared by merged
    /// declarations
    fn member_scope(
        &mut self,
        owner: SymbolId,
        kind: ScopeKind,
        parent: ScopeId,
        uri: &str,
    ) -> ScopeId {
        if let Some(members) = self.symbols[owner.index()].members {
            return members;
        }
        let path = self.symbols[owner.index()].qualified_name.clone();
        let members = self.new_scope(kind, Some(parent), Some(uri), path);
        self.symbols[owner.index()].members = Some(members);
        members
    }

    fn anonymous_path(&self, parent: ScopeId, label: &str, start: usize) -> String {
        qualify(self.path_of(parent), &format!("<{}@{}>", label, start))
    }

    /// Declare every binding identifier of a pattern
    fn bind_pattern(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        pattern: NodeId,
        owner: NodeId,
        kind: DeclKind,
        scope: ScopeId,
    ) -> Vec<SymbolId> {
        let tree = &file.tree;
        let mut declared = Vec::new();
        let mut stack = vec![pattern];

        while let Some(id) = stack.pop() {
            match tree.kind(id) {
                NodeKind::Identifier(IdentifierKind::Value | IdentifierKind::ShorthandPattern) => {
                    let name = tree.text(id);
                    declared.push(self.declare(out, file, scope, name, kind, owner, id));
                }
                NodeKind::Pattern(PatternKind::Pair) => {
                    stack.extend(tree.child_by_field(id, "value"));
                }
                NodeKind::Pattern(PatternKind::Assignment) => {
                    stack.extend(tree.child_by_field(id, "left"));
                }
                NodeKind::Pattern(PatternKind::Parameter) => {
                    stack.extend(tree.child_by_field(id, "pattern"));
                }
                NodeKind::Pattern(PatternKind::Object | PatternKind::Array | PatternKind::Rest) => {
                    stack.extend(tree.children(id).iter().rev().copied());
                }
                _ => {}
            }
        }

        declared
    }

    fn declare_parameters(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        function: NodeId,
        scope: ScopeId,
    ) {
        let tree = &file.tree;
        if let Some(params) = tree.child_by_field(function, "parameters") {
            for &param in tree.children(params) {
                self.bind_pattern(out, file, param, param, DeclKind::Parameter, scope);
            }
        }
        // `x => x`
        if let Some(param) = tree.child_by_field(function, "parameter") {
            self.bind_pattern(out, file, param, param, DeclKind::Parameter, scope);
        }
    }

    fn function_scope(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        function: NodeId,
        parent: ScopeId,
        path: String,
    ) -> ScopeId {
        let scope = self.new_scope(ScopeKind::Function, Some(parent), Some(&file.uri), path);
        out.node_scopes.insert(function, scope);
        self.declare_parameters(out, file, function, scope);
        scope
    }

    fn block_scope(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        block: NodeId,
        parent: ScopeId,
    ) -> ScopeId {
        let path = self.anonymous_path(parent, "block", file.tree.node(block).start);
        let scope = self.new_scope(ScopeKind::Block, Some(parent), Some(&file.uri), path);
        out.node_scopes.insert(block, scope);
        scope
    }

    fn record_export(
        out: &mut FileBindings,
        symbol: Option<SymbolId>,
        name: Option<&str>,
        mode: Option<ExportMode>,
    ) {
        let (Some(symbol), Some(name), Some(mode)) = (symbol, name, mode) else {
            return;
        };
        let exported = match mode {
            ExportMode::Named => name.to_string(),
            ExportMode::Default => "default".to_string(),
        };
        out.exports.push(ExportEntry::Local { exported, symbol });
    }

    /// Declaration pass over one file
    pub fn declare_file(&mut self, index: usize, file: &ParsedFile, scope: ScopeId) -> FileBindings {
        let tree = &file.tree;
        let mut out = FileBindings::new(index, scope);
        let root_ctx = Ctx {
            lexical: scope,
            var_scope: scope,
            members: None,
            this_members: None,
            export: None,
        };

        let mut stack = vec![(tree.root(), root_ctx)];
        while let Some((id, ctx)) = stack.pop() {
            self.visit(&mut out, file, id, ctx, &mut stack);
        }

        out
    }

    fn visit(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        id: NodeId,
        ctx: Ctx,
        stack: &mut Vec<(NodeId, Ctx)>,
    ) {
        let tree = &file.tree;
        let raw = tree.node(id).raw;

        match tree.kind(id) {
            NodeKind::Declaration(kind) => self.visit_declaration(out, file, id, kind, ctx, stack),
            NodeKind::Function => {
                let path = self.anonymous_path(ctx.lexical, "fn", tree.node(id).start);
                let scope = self.function_scope(out, file, id, ctx.lexical, path);
                // A named function expression sees its own name
                if let Some(name) = tree.child_by_field(id, "name")
                    && let Some(text) = name_text(tree, name)
                {
                    self.declare(out, file, scope, text, DeclKind::Function, id, name);
                }
                let this_members = (raw == "arrow_function")
                    .then_some(ctx.this_members)
                    .flatten();
                let inner = Ctx {
                    lexical: scope,
                    var_scope: scope,
                    members: None,
                    this_members,
                    export: None,
                };
                push_children(stack, tree, id, |_| inner);
            }
            NodeKind::Class => {
                let path = self.anonymous_path(ctx.lexical, "class", tree.node(id).start);
                let members = self.new_scope(
                    ScopeKind::Members,
                    Some(ctx.lexical),
                    Some(&file.uri),
                    path,
                );
                out.class_members.insert(id, members);
                push_body_children(stack, tree, id, ctx, members, true);
            }
            NodeKind::Block(kind) => self.visit_block(out, file, id, kind, ctx, stack),
            NodeKind::Import => self.visit_import(out, file, id, ctx),
            NodeKind::Export => self.visit_export(out, file, id, ctx, stack),
            NodeKind::Expression if raw == "assignment_expression" => {
                self.declare_this_assignment(out, file, id, ctx);
                push_children(stack, tree, id, |_| ctx.plain());
            }
            // Carry the export flag down to the declarators and wrapped declarations
            NodeKind::Statement
                if matches!(
                    raw,
                    "lexical_declaration"
                        | "variable_declaration"
                        | "expression_statement"
                        | "ambient_declaration"
                ) =>
            {
                push_children(stack, tree, id, |_| ctx);
            }
            NodeKind::Program
            | NodeKind::Parameters
            | NodeKind::Pattern(_)
            | NodeKind::Identifier(_)
            | NodeKind::ImportClause
            | NodeKind::NamespaceImport
            | NodeKind::ImportSpecifier
            | NodeKind::ExportClause
            | NodeKind::ExportSpecifier
            | NodeKind::MemberAccess
            | NodeKind::Call
            | NodeKind::Expression
            | NodeKind::Statement
            | NodeKind::Literal
            | NodeKind::TypeAnnotation
            | NodeKind::Comment
            | NodeKind::Token
            | NodeKind::Error
            | NodeKind::Missing
            | NodeKind::Other => push_children(stack, tree, id, |_| ctx.plain()),
        }
    }

    fn visit_declaration(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        id: NodeId,
        kind: DeclKind,
        ctx: Ctx,
        stack: &mut Vec<(NodeId, Ctx)>,
    ) {
        let tree = &file.tree;
        let uri = file.uri.as_str();
        let name_node = tree
            .child_by_field(id, "name")
            .or_else(|| tree.child_by_field(id, "property"));
        let name = name_node.and_then(|n| Some((n, name_text(tree, n)?)));

        match kind {
            DeclKind::Var | DeclKind::Let | DeclKind::Const => {
                let scope = if self.policy.binds_to_function_scope(kind) {
                    ctx.var_scope
                } else {
                    ctx.lexical
                };
                if let Some(pattern) = name_node {
                    let declared = self.bind_pattern(out, file, pattern, id, kind, scope);
                    for symbol in declared {
                        let name = self.symbols[symbol.index()].name.clone();
                        Self::record_export(out, Some(symbol), Some(&name), ctx.export);
                    }
                }
                push_children(stack, tree, id, |_| ctx.plain());
            }
            DeclKind::Function => {
                let symbol = name.map(|(n, text)| {
                    self.declare(out, file, ctx.lexical, text, kind, id, n)
                });
                Self::record_export(out, symbol, name.map(|(_, t)| t), ctx.export);

                let path = match name {
                    Some((_, text)) => qualify(self.path_of(ctx.lexical), text),
                    None => self.anonymous_path(ctx.lexical, "fn", tree.node(id).start),
                };
                let scope = self.function_scope(out, file, id, ctx.lexical, path);
                let inner = Ctx {
                    lexical: scope,
                    var_scope: scope,
                    members: None,
                    this_members: None,
                    export: None,
                };
                push_children(stack, tree, id, |_| inner);
            }
            DeclKind::Method => {
                let path = match (ctx.members, name) {
                    (Some(members), Some((n, text))) => {
                        self.declare(out, file, members, text, kind, id, n);
                        qualify(self.path_of(members), text)
                    }
                    _ => self.anonymous_path(ctx.lexical, "fn", tree.node(id).start),
                };
                // Method bodies see the enclosing lexical scope, not the members
                let scope = self.function_scope(out, file, id, ctx.lexical, path);
                let inner = Ctx {
                    lexical: scope,
                    var_scope: scope,
                    members: None,
                    this_members: ctx.this_members,
                    export: None,
                };
                push_children(stack, tree, id, |_| inner);
            }
            DeclKind::Property | DeclKind::EnumMember => {
                if let (Some(members), Some((n, text))) = (ctx.members, name) {
                    self.declare(out, file, members, text, kind, id, n);
                }
                push_children(stack, tree, id, |_| ctx.without_members());
            }
            DeclKind::Class => {
                let symbol = name.map(|(n, text)| {
                    self.declare(out, file, ctx.lexical, text, kind, id, n)
                });
                Self::record_export(out, symbol, name.map(|(_, t)| t), ctx.export);

                let members = match symbol {
                    Some(symbol) => self.member_scope(symbol, ScopeKind::Members, ctx.lexical, uri),
                    None => {
                        let path = self.anonymous_path(ctx.lexical, "class", tree.node(id).start);
                        self.new_scope(ScopeKind::Members, Some(ctx.lexical), Some(uri), path)
                    }
                };
                out.class_members.insert(id, members);
                push_body_children(stack, tree, id, ctx, members, true);
            }
            DeclKind::Interface | DeclKind::Enum => {
                let symbol = name.map(|(n, text)| {
                    self.declare(out, file, ctx.lexical, text, kind, id, n)
                });
                Self::record_export(out, symbol, name.map(|(_, t)| t), ctx.export);

                match symbol {
                    Some(symbol) => {
                        let members =
                            self.member_scope(symbol, ScopeKind::Members, ctx.lexical, uri);
                        push_body_children(stack, tree, id, ctx, members, false);
                    }
                    None => push_children(stack, tree, id, |_| ctx.without_members()),
                }
            }
            DeclKind::Namespace => {
                let symbol = name.map(|(n, text)| {
                    self.declare(out, file, ctx.lexical, text, kind, id, n)
                });
                Self::record_export(out, symbol, name.map(|(_, t)| t), ctx.export);

                if let (Some(symbol), Some(body)) = (symbol, tree.child_by_field(id, "body")) {
                    let scope = self.member_scope(symbol, ScopeKind::Namespace, ctx.lexical, uri);
                    out.node_scopes.insert(body, scope);
                }
                push_children(stack, tree, id, |_| ctx.without_members());
            }
            DeclKind::TypeAlias => {
                let symbol = name.map(|(n, text)| {
                    self.declare(out, file, ctx.lexical, text, kind, id, n)
                });
                Self::record_export(out, symbol, name.map(|(_, t)| t), ctx.export);
                push_children(stack, tree, id, |_| ctx.without_members());
            }
            // Declared by their owners, never classified on their own
            DeclKind::Parameter | DeclKind::Import | DeclKind::NamespaceImport => {
                push_children(stack, tree, id, |_| ctx.plain());
            }
        }
    }

    fn visit_block(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        id: NodeId,
        kind: BlockKind,
        ctx: Ctx,
        stack: &mut Vec<(NodeId, Ctx)>,
    ) {
        let tree = &file.tree;

        match kind {
            BlockKind::Members => push_children(stack, tree, id, |_| ctx.plain()),
            BlockKind::EnumMembers => {
                if let Some(members) = ctx.members {
                    for &child in tree.children(id) {
                        // Bare `A` members; `A = 1` arrives as a declaration node
                        let bare = matches!(
                            tree.kind(child),
                            NodeKind::Identifier(IdentifierKind::Property)
                        ) || tree.node(child).raw == "string";
                        if bare && let Some(text) = name_text(tree, child) {
                            self.declare(out, file, members, text, DeclKind::EnumMember, child, child);
                        }
                    }
                }
                push_children(stack, tree, id, |_| ctx.plain());
            }
            BlockKind::Statements => {
                if let Some(&scope) = out.node_scopes.get(&id) {
                    // Namespace body, scope assigned by the declaration
                    let inner = Ctx {
                        lexical: scope,
                        var_scope: scope,
                        members: None,
                        this_members: None,
                        export: None,
                    };
                    push_children(stack, tree, id, |_| inner);
                } else if tree
                    .parent(id)
                    .is_some_and(|p| tree.kind(p).is_function_like())
                {
                    // Function bodies share the function scope
                    push_children(stack, tree, id, |_| ctx.plain());
                } else {
                    let scope = self.block_scope(out, file, id, ctx.lexical);
                    let inner = Ctx {
                        lexical: scope,
                        ..ctx.without_members()
                    };
                    push_children(stack, tree, id, |_| inner);
                }
            }
            BlockKind::Loop => {
                let scope = self.block_scope(out, file, id, ctx.lexical);
                // for (const x of xs)
                let keyword = tree
                    .child_by_field(id, "kind")
                    .and_then(|k| declarator_kind(tree.text(k)));
                if let (Some(left), Some(keyword)) = (tree.child_by_field(id, "left"), keyword) {
                    let target = if self.policy.binds_to_function_scope(keyword) {
                        ctx.var_scope
                    } else {
                        scope
                    };
                    self.bind_pattern(out, file, left, id, keyword, target);
                }
                let inner = Ctx {
                    lexical: scope,
                    ..ctx.without_members()
                };
                push_children(stack, tree, id, |_| inner);
            }
            BlockKind::Catch | BlockKind::Switch => {
                let scope = self.block_scope(out, file, id, ctx.lexical);
                if let Some(param) = tree.child_by_field(id, "parameter") {
                    self.bind_pattern(out, file, param, id, DeclKind::Parameter, scope);
                }
                let inner = Ctx {
                    lexical: scope,
                    ..ctx.without_members()
                };
                push_children(stack, tree, id, |_| inner);
            }
        }
    }

    fn visit_import(&mut self, out: &mut FileBindings, file: &ParsedFile, id: NodeId, ctx: Ctx) {
        let tree = &file.tree;
        let Some(source) = tree.child_by_field(id, "source") else {
            return;
        };
        let specifier = unquote(tree.text(source)).to_string();

        let mut stack: Vec<NodeId> = tree
            .children(id)
            .iter()
            .rev()
            .copied()
            .filter(|c| tree.kind(*c) == NodeKind::ImportClause)
            .collect();

        while let Some(node) = stack.pop() {
            match tree.kind(node) {
                NodeKind::ImportClause => stack.extend(tree.children(node).iter().rev()),
                // import foo from "x"
                NodeKind::Identifier(IdentifierKind::Value) => {
                    let symbol = self.declare(
                        out,
                        file,
                        ctx.lexical,
                        tree.text(node),
                        DeclKind::Import,
                        node,
                        node,
                    );
                    out.imports.push(ImportBinding {
                        symbol,
                        specifier: specifier.clone(),
                        imported: Some("default".to_string()),
                        name_node: None,
                    });
                }
                // import * as ns from "x"
                NodeKind::NamespaceImport => {
                    let Some(local) = tree
                        .children(node)
                        .iter()
                        .copied()
                        .find(|c| tree.kind(*c).is_identifier())
                    else {
                        continue;
                    };
                    let symbol = self.declare(
                        out,
                        file,
                        ctx.lexical,
                        tree.text(local),
                        DeclKind::NamespaceImport,
                        node,
                        local,
                    );
                    out.imports.push(ImportBinding {
                        symbol,
                        specifier: specifier.clone(),
                        imported: None,
                        name_node: None,
                    });
                }
                // import { a } / { a as b } from "x"
                NodeKind::ImportSpecifier => {
                    let Some(name) = tree.child_by_field(node, "name") else {
                        continue;
                    };
                    let alias = tree.child_by_field(node, "alias");
                    let local = alias.unwrap_or(name);
                    let symbol = self.declare(
                        out,
                        file,
                        ctx.lexical,
                        unquote(tree.text(local)),
                        DeclKind::Import,
                        node,
                        local,
                    );
                    out.imports.push(ImportBinding {
                        symbol,
                        specifier: specifier.clone(),
                        imported: Some(unquote(tree.text(name)).to_string()),
                        name_node: alias.map(|_| name),
                    });
                }
                _ => {}
            }
        }
    }

    fn visit_export(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        id: NodeId,
        ctx: Ctx,
        stack: &mut Vec<(NodeId, Ctx)>,
    ) {
        let tree = &file.tree;
        // `export` inside a namespace body only marks a namespace member
        if ctx.lexical != out.scope {
            push_children(stack, tree, id, |_| ctx.plain());
            return;
        }

        let is_default = tree
            .children(id)
            .iter()
            .any(|c| tree.kind(*c) == NodeKind::Token && tree.node(*c).raw == "default");
        let clause = tree.first_child_of_kind(id, NodeKind::ExportClause);

        // export { a as b } from "x" / export * from "x"
        if let Some(source) = tree.child_by_field(id, "source") {
            let specifier = unquote(tree.text(source)).to_string();
            match clause {
                Some(clause) => {
                    for &spec in tree.children(clause) {
                        if tree.kind(spec) != NodeKind::ExportSpecifier {
                            continue;
                        }
                        let Some(name) = tree.child_by_field(spec, "name") else {
                            continue;
                        };
                        let alias = tree.child_by_field(spec, "alias");
                        let imported = unquote(tree.text(name)).to_string();
                        let exported = alias
                            .map(|a| unquote(tree.text(a)).to_string())
                            .unwrap_or_else(|| imported.clone());
                        out.exports.push(ExportEntry::ReExport {
                            exported,
                            imported,
                            specifier: specifier.clone(),
                            nodes: std::iter::once(name).chain(alias).collect(),
                        });
                    }
                }
                None if !tree
                    .children(id)
                    .iter()
                    .any(|c| tree.node(*c).raw == "namespace_export") =>
                {
                    out.exports.push(ExportEntry::Star { specifier });
                }
                None => {}
            }
            return;
        }

        if let Some(declaration) = tree.child_by_field(id, "declaration") {
            let mode = if is_default {
                ExportMode::Default
            } else {
                ExportMode::Named
            };
            stack.push((
                declaration,
                Ctx {
                    export: Some(mode),
                    ..ctx
                },
            ));
            return;
        }

        // export { a, b as c }
        if let Some(clause) = clause {
            for &spec in tree.children(clause) {
                if tree.kind(spec) != NodeKind::ExportSpecifier {
                    continue;
                }
                let Some(name) = tree.child_by_field(spec, "name") else {
                    continue;
                };
                let local = unquote(tree.text(name)).to_string();
                let exported = tree
                    .child_by_field(spec, "alias")
                    .map(|a| unquote(tree.text(a)).to_string())
                    .unwrap_or_else(|| local.clone());
                out.exports.push(ExportEntry::LocalName { exported, local });
            }
            return;
        }

        // export default foo
        if is_default
            && let Some(value) = tree.child_by_field(id, "value")
            && tree.kind(value) == NodeKind::Identifier(IdentifierKind::Value)
        {
            out.exports.push(ExportEntry::LocalName {
                exported: "default".to_string(),
                local: tree.text(value).to_string(),
            });
        }
        push_children(stack, tree, id, |_| ctx.plain());
    }

    /// `this.x = ...` inside a class declares `x` when no member of that name exists
    fn declare_this_assignment(
        &mut self,
        out: &mut FileBindings,
        file: &ParsedFile,
        id: NodeId,
        ctx: Ctx,
    ) {
        let tree = &file.tree;
        let Some(members) = ctx.this_members else {
            return;
        };
        let Some(left) = tree.child_by_field(id, "left") else {
            return;
        };
        if tree.kind(left) != NodeKind::MemberAccess {
            return;
        }
        let is_this = tree
            .child_by_field(left, "object")
            .is_some_and(|o| tree.node(o).raw == "this");
        let Some(property) = tree.child_by_field(left, "property") else {
            return;
        };
        if !is_this || !tree.kind(property).is_identifier() {
            return;
        }

        let name = tree.text(property);
        if !self.scopes[members.index()].bindings.contains_key(name) {
            self.declare(out, file, members, name, DeclKind::Property, id, property);
        }
    }
}

/// Push the children of a class, interface or enum. The `body` child sees
/// the member scope.
fn push_body_children(
    stack: &mut Vec<(NodeId, Ctx)>,
    tree: &SyntaxTree,
    id: NodeId,
    ctx: Ctx,
    members: ScopeId,
    binds_this: bool,
) {
    let body_ctx = Ctx {
        members: Some(members),
        this_members: if binds_this {
            Some(members)
        } else {
            ctx.this_members
        },
        export: None,
        ..ctx
    };
    let other_ctx = ctx.without_members();
    push_children(stack, tree, id, |child| {
        if tree.node(child).field == Some("body") {
            body_ctx
        } else {
            other_ctx
        }
    });
}

/// Resolution pass over one file of an assembled program. Returns bindings
/// for identifiers the declaration pass left unbound.
pub(super) fn resolve_references(program: &Program, info: &FileInfo) -> Vec<(NodeId, SymbolId)> {
    let tree = info.tree();
    let mut found: HashMap<NodeId, SymbolId> = HashMap::new();
    let mut stack = vec![(tree.root(), info.scope)];

    while let Some((id, scope)) = stack.pop() {
        let scope = info.node_scopes.get(&id).copied().unwrap_or(scope);

        match tree.kind(id) {
            NodeKind::Import => continue,
            NodeKind::Export if tree.child_by_field(id, "source").is_some() => continue,
            NodeKind::ExportSpecifier => {
                if let Some(name) = tree.child_by_field(id, "name")
                    && let Some(symbol) = program.lookup(scope, unquote(tree.text(name)))
                {
                    found.insert(name, symbol);
                    if let Some(alias) = tree.child_by_field(id, "alias") {
                        found.insert(alias, symbol);
                    }
                }
                continue;
            }
            NodeKind::Identifier(kind) if !info.resolutions.contains_key(&id) => {
                if let Some(symbol) = resolve_identifier(program, info, &found, id, kind, scope) {
                    found.insert(id, symbol);
                }
            }
            _ => {}
        }

        stack.extend(tree.children(id).iter().rev().map(|c| (*c, scope)));
    }

    found.into_iter().collect()
}

fn resolve_identifier(
    program: &Program,
    info: &FileInfo,
    found: &HashMap<NodeId, SymbolId>,
    id: NodeId,
    kind: IdentifierKind,
    scope: ScopeId,
) -> Option<SymbolId> {
    let tree = info.tree();
    let bound = |node: NodeId| {
        info.resolutions
            .get(&node)
            .or_else(|| found.get(&node))
            .copied()
    };
    let name = tree.text(id);
    let field = tree.node(id).field;

    match kind {
        IdentifierKind::Value
        | IdentifierKind::Type
        | IdentifierKind::ShorthandProperty
        | IdentifierKind::ShorthandPattern => {
            let parent = tree.parent(id)?;
            // Ns.T in type positions
            if tree.node(parent).raw == "nested_type_identifier" && field == Some("name") {
                let module = tree.child_by_field(parent, "module")?;
                return program.member(bound(module)?, name);
            }
            program.lookup(scope, name)
        }
        IdentifierKind::Property | IdentifierKind::PrivateProperty => {
            let parent = tree.parent(id)?;
            if tree.kind(parent) != NodeKind::MemberAccess || field != Some("property") {
                return None;
            }
            let object = tree.child_by_field(parent, "object")?;

            if tree.node(object).raw == "this" {
                let members = tree
                    .ancestors(id)
                    .find_map(|n| info.class_members.get(&n).copied())?;
                return program.scope(members)?.bindings.get(name).copied();
            }

            let owner = match tree.kind(object) {
                NodeKind::Identifier(_) => bound(object)?,
                NodeKind::MemberAccess => bound(tree.child_by_field(object, "property")?)?,
                _ => return None,
            };
            program.member(owner, name)
        }
    }
}
