//! Program Builder
//!
//! Turns a registry snapshot into a fully bound [`Program`]. Parse results
//! are reused from the previous program for files whose version did not
//! change; binding always runs over the whole snapshot.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use super::binder::{self, Binder, ExportEntry, FileBindings};
use super::module_graph::{self, ModuleEdge, ModuleGraph, RawExports};
use super::{AliasTarget, FileInfo, ParsedFile, Program};
use crate::error::SightlineResult;
use crate::infra::line_index::LineIndex;
use crate::infra::syntax::{RequestKind, SourceParser};
use crate::models::source::SourceFile;
use crate::models::symbol::{ScopeId, SymbolId, SymbolKind};
use crate::services::facts::DeclarationPolicy;
use crate::services::registry::RegistrySnapshot;

pub struct ProgramBuilder {
    parser: SourceParser,
}

impl ProgramBuilder {
    pub fn new() -> SightlineResult<Self> {
        Ok(Self {
            parser: SourceParser::new()?,
        })
    }

    pub fn parse_file(&self, file: &SourceFile) -> Arc<ParsedFile> {
        let language = file.language();
        let output = self.parser.parse(language, Arc::clone(&file.text));
        let parsed = ParsedFile {
            uri: file.uri.clone(),
            version: file.version,
            language,
            lines: LineIndex::new(Arc::clone(&file.text)),
            tree: output.tree,
            requests: output.requests,
        };

        let errors = parsed.error_count();
        if errors > 0 {
            warn!("{} parsed with {} error nodes", file.uri, errors);
        }
        Arc::new(parsed)
    }

    /// Build the program for `snapshot`
    pub fn build(
        &self,
        snapshot: &RegistrySnapshot,
        previous: Option<&Program>,
        policy: &dyn DeclarationPolicy,
    ) -> Program {
        let mut reused = 0usize;
        let parsed: Vec<Arc<ParsedFile>> = snapshot
            .files
            .iter()
            .map(|file| {
                let cached = previous
                    .and_then(|p| p.file(&file.uri))
                    .filter(|info| info.parsed.version == file.version);
                match cached {
                    Some(info) => {
                        trace!("Reusing parse of {} at version {}", file.uri, file.version);
                        reused += 1;
                        Arc::clone(&info.parsed)
                    }
                    None => self.parse_file(file),
                }
            })
            .collect();

        // Declaration pass, files in uri order
        let mut binder = Binder::new(policy);
        let mut bindings: Vec<FileBindings> = parsed
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let scope = if file.is_module() {
                    binder.module_scope(&file.uri)
                } else {
                    ScopeId::GLOBAL
                };
                binder.declare_file(index, file, scope)
            })
            .collect();

        let tracked: HashSet<&str> = parsed.iter().map(|f| f.uri.as_str()).collect();
        let resolved: Vec<HashMap<String, Option<String>>> = parsed
            .iter()
            .map(|file| {
                file.requests
                    .iter()
                    .map(|request| {
                        let target = module_graph::resolve_specifier(
                            &file.uri,
                            &request.specifier,
                            |uri| tracked.contains(uri),
                        );
                        (request.specifier.clone(), target)
                    })
                    .collect()
            })
            .collect();

        let graph = build_graph(&parsed, &bindings, &resolved, &binder);
        let aliases = bind_aliases(&mut bindings, &resolved, &graph);

        let file_uris: Vec<String> = parsed.iter().map(|f| f.uri.clone()).collect();
        let files: BTreeMap<String, FileInfo> = parsed
            .into_iter()
            .zip(bindings)
            .map(|(parsed, b)| {
                (
                    parsed.uri.clone(),
                    FileInfo {
                        parsed,
                        scope: b.scope,
                        top_level: b.top_level,
                        node_scopes: b.node_scopes,
                        class_members: b.class_members,
                        resolutions: b.resolutions,
                    },
                )
            })
            .collect();

        let mut program = Program {
            version: snapshot.version,
            files,
            file_uris,
            symbols: binder.symbols,
            sites: binder.sites,
            scopes: binder.scopes,
            symbol_index: binder.symbol_index,
            aliases,
            graph,
        };

        adopt_alias_kinds(&mut program);

        // Resolution pass
        let extra: Vec<(String, Vec<_>)> = program
            .files
            .values()
            .map(|info| {
                (
                    info.uri().to_string(),
                    binder::resolve_references(&program, info),
                )
            })
            .collect();
        for (uri, found) in extra {
            if let Some(info) = program.files.get_mut(&uri) {
                info.resolutions.extend(found);
            }
        }

        debug!(
            "Built program v{}: {} files ({} reused), {} symbols, {} scopes, {} import edges",
            program.version,
            program.file_count(),
            reused,
            program.symbol_count(),
            program.scope_count(),
            program.graph.edge_count()
        );
        program
    }
}

fn build_graph(
    parsed: &[Arc<ParsedFile>],
    bindings: &[FileBindings],
    resolved: &[HashMap<String, Option<String>>],
    binder: &Binder<'_>,
) -> ModuleGraph {
    let mut edges: BTreeMap<String, Vec<ModuleEdge>> = BTreeMap::new();
    let mut raw: HashMap<String, RawExports> = HashMap::new();

    for ((file, b), targets) in parsed.iter().zip(bindings).zip(resolved) {
        let mut requested: Vec<ModuleEdge> = Vec::new();
        for request in &file.requests {
            let Some(Some(target)) = targets.get(&request.specifier) else {
                continue;
            };
            match requested.iter_mut().find(|e| &e.target == target) {
                // A static import wins over an earlier `require`
                Some(edge) if request.kind != RequestKind::Require => edge.kind = request.kind,
                Some(_) => {}
                None => requested.push(ModuleEdge::new(target.clone(), request.kind)),
            }
        }
        if !requested.is_empty() {
            edges.insert(file.uri.clone(), requested);
        }

        if b.scope == ScopeId::GLOBAL {
            continue;
        }

        let mut exports = RawExports::default();
        let locals = &binder.scopes[b.scope.index()].bindings;
        for entry in &b.exports {
            match entry {
                ExportEntry::Local { exported, symbol } => {
                    exports.local.push((exported.clone(), *symbol));
                }
                ExportEntry::LocalName { exported, local } => {
                    if let Some(symbol) = locals.get(local) {
                        exports.local.push((exported.clone(), *symbol));
                    }
                }
                ExportEntry::ReExport {
                    exported,
                    imported,
                    specifier,
                    ..
                } => {
                    let target = targets.get(specifier).cloned().flatten();
                    exports
                        .named
                        .push((exported.clone(), imported.clone(), target));
                }
                ExportEntry::Star { specifier } => {
                    if let Some(Some(target)) = targets.get(specifier) {
                        exports.star.push(target.clone());
                    }
                }
            }
        }
        raw.insert(file.uri.clone(), exports);
    }

    ModuleGraph::build(edges, &raw)
}

/// Point import bindings at the exported symbols, and bind the imported
/// names of `import { a as b }` and re-exports
fn bind_aliases(
    bindings: &mut [FileBindings],
    resolved: &[HashMap<String, Option<String>>],
    graph: &ModuleGraph,
) -> HashMap<SymbolId, AliasTarget> {
    let mut aliases = HashMap::new();

    for (b, targets) in bindings.iter_mut().zip(resolved) {
        let target_of = |specifier: &str| targets.get(specifier).cloned().flatten();

        for import in &b.imports {
            let Some(uri) = target_of(&import.specifier) else {
                continue;
            };
            match &import.imported {
                None => {
                    aliases.insert(import.symbol, AliasTarget::Module(uri));
                }
                Some(name) => {
                    let Some(target) = graph.exports_of(&uri).and_then(|t| t.get(name)) else {
                        continue;
                    };
                    aliases.insert(import.symbol, AliasTarget::Symbol(*target));
                    if let Some(node) = import.name_node {
                        b.resolutions.insert(node, *target);
                    }
                }
            }
        }

        for entry in &b.exports {
            if let ExportEntry::ReExport {
                imported,
                specifier,
                nodes,
                ..
            } = entry
                && let Some(target) = target_of(specifier)
                    .and_then(|uri| graph.exports_of(&uri)?.get(imported).copied())
            {
                for node in nodes {
                    b.resolutions.insert(*node, target);
                }
            }
        }
    }

    aliases
}

/// Import bindings take the kind of the entity they denote
fn adopt_alias_kinds(program: &mut Program) {
    let updates: Vec<(SymbolId, SymbolKind)> = program
        .aliases
        .keys()
        .filter_map(|id| {
            let canonical = program.canonical(*id);
            let kind = match program.aliases.get(&canonical) {
                Some(AliasTarget::Module(_)) => SymbolKind::Module,
                _ => program.symbol(canonical)?.kind,
            };
            Some((*id, kind))
        })
        .collect();

    for (id, kind) in updates {
        if let Some(symbol) = program.symbols.get_mut(id.index()) {
            symbol.kind = kind;
        }
    }
}
