//! Import graph and export tables
//!
//! Module specifiers are resolved against the importing file's uri. Only
//! relative and absolute specifiers resolve; bare package names stay
//! unresolved. Export tables include named and star re-exports; import
//! cycles are tolerated.

use std::collections::{BTreeMap, HashMap};

use crate::infra::syntax::RequestKind;
use crate::models::symbol::SymbolId;

/// Exported name to the symbol it denotes. The symbol may itself be an alias.
pub type ExportTable = BTreeMap<String, SymbolId>;

/// Extensions probed when a specifier omits one, in priority order
pub const PROBE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs", "cjs",
];

const SCHEME: &str = "file://";

fn split_scheme(uri: &str) -> (&str, &str) {
    match uri.strip_prefix(SCHEME) {
        Some(path) => (SCHEME, path),
        None => ("", uri),
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
}

/// Collapse `.` and `..` segments. Leading `..` segments of a relative path
/// are kept.
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Candidate uris for `specifier` imported from `importer`, most specific first
pub fn candidates(importer: &str, specifier: &str) -> Vec<String> {
    if !is_relative(specifier) {
        return Vec::new();
    }

    let (scheme, importer_path) = split_scheme(importer);
    let joined = if specifier.starts_with('/') {
        specifier.to_string()
    } else {
        match importer_path.rsplit_once('/') {
            Some((dir, _)) => format!("{}/{}", dir, specifier),
            None => specifier.to_string(),
        }
    };
    let base = normalize_path(&joined);

    let mut out = vec![format!("{}{}", scheme, base)];

    // `./a.js` written in TypeScript sources refers to `a.ts`
    if let Some(stem) = [".js", ".jsx", ".mjs", ".cjs"]
        .iter()
        .find_map(|ext| base.strip_suffix(ext))
    {
        out.extend(
            ["ts", "tsx", "mts", "cts"]
                .iter()
                .map(|ext| format!("{}{}.{}", scheme, stem, ext)),
        );
    }

    out.extend(
        PROBE_EXTENSIONS
            .iter()
            .map(|ext| format!("{}{}.{}", scheme, base, ext)),
    );
    out.extend(
        PROBE_EXTENSIONS
            .iter()
            .map(|ext| format!("{}{}/index.{}", scheme, base, ext)),
    );
    out
}

/// Resolve `specifier` to a tracked uri
pub fn resolve_specifier(
    importer: &str,
    specifier: &str,
    is_tracked: impl Fn(&str) -> bool,
) -> Option<String> {
    candidates(importer, specifier)
        .into_iter()
        .find(|candidate| is_tracked(candidate))
}

/// Export declarations of one module before re-exports are followed
#[derive(Debug, Clone, Default)]
pub struct RawExports {
    /// Declared in this module: `export function f`, `export { a as b }`
    pub local: Vec<(String, SymbolId)>,
    /// `export { a as b } from "./x"`: (exported, imported, resolved target)
    pub named: Vec<(String, String, Option<String>)>,
    /// `export * from "./x"`, resolved targets
    pub star: Vec<String>,
}

/// A resolved dependency of one file on another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEdge {
    pub target: String,
    /// `Require` only when the file never imports the target statically
    pub kind: RequestKind,
}

impl ModuleEdge {
    pub fn new(target: impl Into<String>, kind: RequestKind) -> Self {
        Self {
            target: target.into(),
            kind,
        }
    }

    /// Brought in by `import` or `export ... from`
    pub fn is_static(&self) -> bool {
        self.kind != RequestKind::Require
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    imports: BTreeMap<String, Vec<ModuleEdge>>,
    exports: HashMap<String, ExportTable>,
}

impl ModuleGraph {
    /// Build export tables for every module in `raw`. `edges` lists the
    /// resolved modules each file requests, in source order.
    pub fn build(
        edges: BTreeMap<String, Vec<ModuleEdge>>,
        raw: &HashMap<String, RawExports>,
    ) -> Self {
        Self {
            imports: edges,
            exports: compute_exports(raw),
        }
    }

    /// Modules requested by `uri`
    pub fn imports_of(&self, uri: &str) -> &[ModuleEdge] {
        self.imports.get(uri).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn exports_of(&self, uri: &str) -> Option<&ExportTable> {
        self.exports.get(uri)
    }

    pub fn edge_count(&self) -> usize {
        self.imports.values().map(Vec::len).sum()
    }
}

/// Follow re-exports until no table grows. Tables only grow and are bounded
/// by the names declared in the program, so cycles terminate.
fn compute_exports(raw: &HashMap<String, RawExports>) -> HashMap<String, ExportTable> {
    let mut uris: Vec<&String> = raw.keys().collect();
    uris.sort();

    let mut tables: HashMap<String, ExportTable> = uris
        .iter()
        .map(|uri| {
            let mut table = ExportTable::new();
            for (name, symbol) in &raw[*uri].local {
                table.entry(name.clone()).or_insert(*symbol);
            }
            ((*uri).clone(), table)
        })
        .collect();

    loop {
        let mut changed = false;

        for uri in &uris {
            let module = &raw[*uri];
            let mut additions: Vec<(String, SymbolId)> = Vec::new();

            for (exported, imported, target) in &module.named {
                if let Some(symbol) = target
                    .as_ref()
                    .and_then(|t| tables.get(t))
                    .and_then(|table| table.get(imported))
                {
                    additions.push((exported.clone(), *symbol));
                }
            }

            for target in &module.star {
                if let Some(table) = tables.get(target) {
                    additions.extend(
                        table
                            .iter()
                            .filter(|(name, _)| name.as_str() != "default")
                            .map(|(name, symbol)| (name.clone(), *symbol)),
                    );
                }
            }

            if let Some(table) = tables.get_mut(*uri) {
                for (name, symbol) in additions {
                    if !table.contains_key(&name) {
                        table.insert(name, symbol);
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return tables;
        }
    }
}
