//! Completion Engine
//!
//! Candidates come from four pools: members of the object before a `.`, or
//! else the scope chain at the cursor, the exports of imported modules and
//! the configured builtin globals. Candidates are deduplicated by
//! `(label, kind)` keeping the most local one, then ranked.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::QueryError;
use crate::infra::syntax::NodeId;
use crate::models::completion::{CompletionItem, CompletionKind};
use crate::models::config::{CompletionConfig, GlobalName};
use crate::models::position::Position;
use crate::models::symbol::SymbolId;
use crate::services::facts::{Hoisting, TypeFacts};
use crate::services::program::Program;
use crate::services::resolver::{self, Cursor};

#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub max_items: usize,
    pub globals: Vec<GlobalName>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::from(&CompletionConfig::default())
    }
}

impl From<&CompletionConfig> for CompletionOptions {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            max_items: config.max_items,
            globals: config.globals.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    /// Lower is more local
    locality: usize,
    symbol: Option<SymbolId>,
}

/// Candidate pool keyed by `(label, kind)`
#[derive(Default)]
struct Pool {
    entries: BTreeMap<(String, CompletionKind), Candidate>,
}

impl Pool {
    fn offer(&mut self, label: &str, kind: CompletionKind, locality: usize, symbol: Option<SymbolId>) {
        let candidate = Candidate { locality, symbol };
        self.entries
            .entry((label.to_string(), kind))
            .and_modify(|existing| {
                if locality < existing.locality {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Start offset of the partial identifier ending at `offset`
fn prefix_start(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_identifier_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset)
}

pub fn complete(
    program: &Program,
    facts: &dyn TypeFacts,
    uri: &str,
    position: Position,
    options: &CompletionOptions,
) -> Result<Vec<CompletionItem>, QueryError> {
    let cursor = resolver::locate(program, uri, position)?;
    let text = cursor.file.parsed.text();
    let start = prefix_start(text, cursor.offset);
    let prefix = &text[start..cursor.offset];

    let mut pool = Pool::default();
    match text[..start].strip_suffix('.') {
        Some(before_dot) => member_pool(program, facts, &cursor, before_dot.len(), &mut pool),
        None => {
            let depth = scope_pool(program, facts, &cursor, position, &mut pool);
            import_pool(program, facts, uri, depth, &mut pool);
            for global in &options.globals {
                pool.offer(&global.name, global.kind.into(), usize::MAX, None);
            }
        }
    }

    let items = rank(program, facts, pool, prefix, options.max_items);
    debug!(
        "Completion at {}:{} prefix '{}': {} items",
        uri,
        position.line,
        prefix,
        items.len()
    );
    Ok(items)
}

/// Members of the object ending at `dot`. Nothing is offered when the
/// object does not resolve to something with members.
fn member_pool(
    program: &Program,
    facts: &dyn TypeFacts,
    cursor: &Cursor<'_>,
    dot: usize,
    pool: &mut Pool,
) {
    let text = cursor.file.parsed.text();
    // `a?.b`
    let object_end = if text[..dot].ends_with('?') { dot - 1 } else { dot };
    let tree = cursor.file.tree();

    if let Some(this) = resolver::this_ending_at(tree, object_end) {
        this_member_pool(program, cursor, this, pool);
        return;
    }

    let Some(object) = resolver::identifier_ending_at(tree, object_end) else {
        return;
    };
    let Some(symbol) = facts.symbol_at(program, cursor.file.uri(), object) else {
        return;
    };

    for (name, member) in program.members_of(symbol) {
        if let Some(s) = program.symbol(member) {
            pool.offer(&name, s.kind.into(), 0, Some(member));
        }
    }
}

/// Members of the class enclosing a `this` expression
fn this_member_pool(program: &Program, cursor: &Cursor<'_>, this: NodeId, pool: &mut Pool) {
    let tree = cursor.file.tree();
    let Some(scope) = tree
        .ancestors(this)
        .find_map(|n| cursor.file.class_members.get(&n))
        .and_then(|members| program.scope(*members))
    else {
        return;
    };

    for id in &scope.symbols {
        if let Some(s) = program.symbol(*id)
            && scope.bindings.get(&s.name) == Some(id)
        {
            pool.offer(&s.name, s.kind.into(), 0, Some(*id));
        }
    }
}

/// Symbols visible from the cursor, innermost scope first. Returns the
/// length of the scope chain.
fn scope_pool(
    program: &Program,
    facts: &dyn TypeFacts,
    cursor: &Cursor<'_>,
    position: Position,
    pool: &mut Pool,
) -> usize {
    let uri = cursor.file.uri();
    let policy = facts.policy();
    let scope = cursor.file.scope_at(cursor.node);
    let mut depth = 0;

    for (level, (_, scope)) in program.scope_chain(scope).enumerate() {
        depth = level + 1;
        for id in &scope.symbols {
            let Some(symbol) = program.symbol(*id) else {
                continue;
            };
            // Shadowed redeclarations are not offered
            if scope.bindings.get(&symbol.name) != Some(id) {
                continue;
            }
            let visible = policy.hoisting(symbol.decl_kind) == Hoisting::Hoisted
                || symbol
                    .declarations
                    .iter()
                    .any(|d| d.uri != uri || d.range.start <= position);
            if visible {
                pool.offer(&symbol.name, symbol.kind.into(), level, Some(*id));
            }
        }
    }

    depth
}

fn import_pool(program: &Program, facts: &dyn TypeFacts, uri: &str, depth: usize, pool: &mut Pool) {
    // `require` results are untyped values, their exports are not in scope
    for edge in program.graph().imports_of(uri).iter().filter(|e| e.is_static()) {
        for export in facts.exports_of(program, &edge.target) {
            if export.name != "default" {
                pool.offer(&export.name, export.kind.into(), depth, Some(export.symbol));
            }
        }
    }
}

fn bucket(label: &str, prefix: &str) -> u8 {
    if label.starts_with(prefix) {
        0
    } else if label.to_lowercase().starts_with(&prefix.to_lowercase()) {
        1
    } else {
        2
    }
}

fn rank(
    program: &Program,
    facts: &dyn TypeFacts,
    pool: Pool,
    prefix: &str,
    max_items: usize,
) -> Vec<CompletionItem> {
    let mut ranked: Vec<((String, CompletionKind), Candidate)> = pool.entries.into_iter().collect();
    ranked.sort_by(|((a, ka), _), ((b, kb), _)| {
        (bucket(a, prefix), ka.priority(), a, ka).cmp(&(bucket(b, prefix), kb.priority(), b, kb))
    });
    ranked.truncate(max_items);

    ranked
        .into_iter()
        .enumerate()
        .map(|(index, ((label, kind), candidate))| {
            let documentation = candidate.symbol.and_then(|symbol| {
                facts
                    .doc_comment(program, symbol)
                    .unwrap_or_else(|e| {
                        debug!("No documentation for {}: {}", label, e);
                        None
                    })
            });
            CompletionItem {
                insert_text: label.clone(),
                label,
                kind,
                sort_key: format!("{:04}", index),
                documentation,
            }
        })
        .collect()
}
