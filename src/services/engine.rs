//! Engine facade
//!
//! Owns the Source Registry and the current [`Program`]. Mutations are
//! serialized on the registry lock and publish a freshly built program by
//! swapping an `Arc`; queries clone the current `Arc` and never wait for a
//! rebuild.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use tracing::debug;

use crate::error::SightlineResult;
use crate::models::completion::{CompletionItem, HoverResult};
use crate::models::config::SightlineConfig;
use crate::models::position::{Location, Position};
use crate::models::query::{QueryOutcome, QueryWarning, ReferenceResult};
use crate::models::source::ContentChange;
use crate::models::symbol::{Symbol, SymbolKind};
use crate::services::completion::{self, CompletionOptions};
use crate::services::definition;
use crate::services::facts::{SyntacticFacts, TypeFacts};
use crate::services::hover;
use crate::services::program::{Program, ProgramBuilder};
use crate::services::references::{self, ReferenceLimits};
use crate::services::registry::SourceRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedFile {
    pub uri: String,
    pub error_nodes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub version: u64,
    pub files: usize,
    pub symbols: usize,
    pub scopes: usize,
    pub import_edges: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_files: Vec<DegradedFile>,
}

pub struct Engine {
    registry: Mutex<SourceRegistry>,
    program: RwLock<Arc<Program>>,
    builder: ProgramBuilder,
    facts: Arc<dyn TypeFacts>,
    completion: CompletionOptions,
    limits: ReferenceLimits,
}

impl Engine {
    pub fn new() -> SightlineResult<Self> {
        Self::with_facts(Arc::new(SyntacticFacts::new()))
    }

    pub fn with_facts(facts: Arc<dyn TypeFacts>) -> SightlineResult<Self> {
        Ok(Self {
            registry: Mutex::new(SourceRegistry::new()),
            program: RwLock::new(Arc::new(Program::empty())),
            builder: ProgramBuilder::new()?,
            facts,
            completion: CompletionOptions::default(),
            limits: ReferenceLimits::default(),
        })
    }

    pub fn with_config(config: &SightlineConfig) -> SightlineResult<Self> {
        Self::with_facts_and_config(Arc::new(SyntacticFacts::new()), config)
    }

    /// Custom facts with completion and reference limits from `config`
    pub fn with_facts_and_config(
        facts: Arc<dyn TypeFacts>,
        config: &SightlineConfig,
    ) -> SightlineResult<Self> {
        let mut engine = Self::with_facts(facts)?;
        engine.completion = CompletionOptions::from(&config.completion);
        engine.limits = ReferenceLimits::from(&config.references);
        Ok(engine)
    }

    fn lock_registry(&self) -> MutexGuard<'_, SourceRegistry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current program snapshot
    pub fn program(&self) -> Arc<Program> {
        let guard = self.program.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Build from the registry and publish. Called with the registry lock
    /// held so programs publish in version order.
    fn rebuild(&self, registry: &SourceRegistry) {
        let previous = self.program();
        let snapshot = registry.snapshot();
        let next = self
            .builder
            .build(&snapshot, Some(&previous), self.facts.policy());

        debug!(
            "Publishing program v{} ({} files)",
            next.version(),
            next.file_count()
        );
        let mut slot = self.program.write().unwrap_or_else(|e| e.into_inner());
        *slot = Arc::new(next);
    }

    pub fn add_file(&self, uri: &str, text: &str) -> SightlineResult<u64> {
        let mut registry = self.lock_registry();
        let version = registry.add_file(uri, text)?;
        self.rebuild(&registry);
        Ok(version)
    }

    pub fn update_file(&self, uri: &str, text: &str) -> SightlineResult<u64> {
        let mut registry = self.lock_registry();
        let version = registry.update_file(uri, text)?;
        self.rebuild(&registry);
        Ok(version)
    }

    pub fn remove_file(&self, uri: &str) -> SightlineResult<u64> {
        let mut registry = self.lock_registry();
        let version = registry.remove_file(uri)?;
        self.rebuild(&registry);
        Ok(version)
    }

    pub fn apply_change(&self, change: &ContentChange) -> SightlineResult<u64> {
        self.apply_changes(std::slice::from_ref(change))
    }

    /// Apply a batch of provider changes with a single rebuild. Changes
    /// before a failing one stay applied and are published.
    pub fn apply_changes(&self, changes: &[ContentChange]) -> SightlineResult<u64> {
        let mut registry = self.lock_registry();
        let before = registry.version();

        let mut failure = None;
        for change in changes {
            if let Err(e) = registry.apply(change) {
                failure = Some(e);
                break;
            }
        }

        if registry.version() != before {
            self.rebuild(&registry);
        }
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(registry.version()),
        }
    }

    /// Parse warnings for the queried file
    fn degradation(program: &Program, uri: &str) -> Vec<QueryWarning> {
        program
            .file(uri)
            .map(|f| f.parsed.error_count())
            .filter(|errors| *errors > 0)
            .map(|error_nodes| QueryWarning::ParseDegraded {
                uri: uri.to_string(),
                error_nodes,
            })
            .into_iter()
            .collect()
    }

    pub fn get_completions(
        &self,
        uri: &str,
        position: Position,
    ) -> SightlineResult<QueryOutcome<Vec<CompletionItem>>> {
        let program = self.program();
        let items = completion::complete(
            &program,
            self.facts.as_ref(),
            uri,
            position,
            &self.completion,
        )?;
        Ok(QueryOutcome::with_warnings(
            items,
            Self::degradation(&program, uri),
        ))
    }

    pub fn get_hover(
        &self,
        uri: &str,
        position: Position,
    ) -> SightlineResult<QueryOutcome<Option<HoverResult>>> {
        let program = self.program();
        let result = hover::hover(&program, self.facts.as_ref(), uri, position)?;
        Ok(QueryOutcome::with_warnings(
            result,
            Self::degradation(&program, uri),
        ))
    }

    pub fn get_definition(
        &self,
        uri: &str,
        position: Position,
    ) -> SightlineResult<QueryOutcome<Vec<Location>>> {
        let program = self.program();
        let locations = definition::definition(&program, self.facts.as_ref(), uri, position)?;
        Ok(QueryOutcome::with_warnings(
            locations,
            Self::degradation(&program, uri),
        ))
    }

    pub fn get_references(
        &self,
        uri: &str,
        position: Position,
    ) -> SightlineResult<QueryOutcome<ReferenceResult>> {
        let program = self.program();
        let mut outcome =
            references::references(&program, self.facts.as_ref(), uri, position, self.limits)?;
        outcome.warnings.extend(Self::degradation(&program, uri));
        Ok(outcome)
    }

    /// Symbols whose name or qualified name matches `pattern` (`*` wildcards),
    /// ordered by qualified name
    pub fn find_symbols(&self, pattern: &str, kind: Option<SymbolKind>) -> Vec<Symbol> {
        let program = self.program();
        let mut found: Vec<Symbol> = program
            .symbols()
            .map(|(_, s)| s)
            .filter(|s| kind.is_none_or(|k| s.kind == k))
            .filter(|s| s.matches_pattern(pattern))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.qualified_name
                .cmp(&b.qualified_name)
                .then_with(|| a.location().cmp(b.location()))
        });
        found
    }

    pub fn status(&self) -> EngineStatus {
        let program = self.program();
        EngineStatus {
            version: program.version(),
            files: program.file_count(),
            symbols: program.symbol_count(),
            scopes: program.scope_count(),
            import_edges: program.graph().edge_count(),
            degraded_files: program
                .degraded_files()
                .map(|(uri, error_nodes)| DegradedFile {
                    uri: uri.to_string(),
                    error_nodes,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RegistryError, SightlineError};
    use crate::models::completion::CompletionKind;

    fn engine(files: &[(&str, &str)]) -> Engine {
        let engine = Engine::new().unwrap();
        for (uri, text) in files {
            engine.add_file(uri, text).unwrap();
        }
        engine
    }

    /// Every position of every line in `uri`
    fn positions(engine: &Engine, uri: &str) -> Vec<Position> {
        let program = engine.program();
        let lines = &program.file(uri).unwrap().parsed.lines;
        (0..lines.line_count())
            .flat_map(|line| {
                (0..=lines.line_len(line).unwrap())
                    .map(move |column| Position::new(line as u32, column as u32))
            })
            .collect()
    }

    const SAMPLE: &[(&str, &str)] = &[
        (
            "src/shapes.ts",
            "/** A 2D point */\nexport interface Point { x: number; y: number }\n\nexport class Circle {\n  radius = 1;\n  area(): number { return Math.PI * this.radius * this.radius; }\n}\n\nexport function unit(): Circle { return new Circle(); }\n",
        ),
        (
            "src/main.ts",
            "import { Circle, unit } from './shapes';\nimport * as shapes from './shapes';\n\nconst c: Circle = unit();\nconst d = new shapes.Circle();\nc.area();\nlet p: shapes.Point;\n",
        ),
        ("src/legacy.js", "var counter = 0;\nfunction tick() { counter++; }\ntick();\n"),
    ];

    #[test]
    fn test_scenario_function_call() {
        let engine = engine(&[("a.js", "function foo() { return 1; } foo();")]);

        let found = engine.get_definition("a.js", Position::new(0, 30)).unwrap();
        assert_eq!(found.value.len(), 1);
        assert_eq!(found.value[0].range.start, Position::new(0, 9));

        let refs = engine.get_references("a.js", Position::new(0, 10)).unwrap();
        let columns: Vec<u32> = refs
            .value
            .locations
            .iter()
            .map(|l| l.range.start.column)
            .collect();
        assert_eq!(columns, vec![9, 29]);
    }

    #[test]
    fn test_scenario_import_driven_completion() {
        let engine = engine(&[
            ("util.ts", "export function formatDate() {}\nexport const formatter = 1;"),
            ("app.ts", "import { formatDate } from './util';\nform"),
        ]);

        let outcome = engine.get_completions("app.ts", Position::new(1, 4)).unwrap();
        let labels: Vec<&str> = outcome.value.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"formatDate"));
        assert!(labels.contains(&"formatter"));
        let format_date = outcome.value.iter().find(|i| i.label == "formatDate").unwrap();
        assert_eq!(format_date.kind, CompletionKind::Function);
    }

    #[test]
    fn test_scenario_broken_update_isolated() {
        let engine = engine(&[
            ("good.js", "const value = 1;\nvalue;"),
            ("bad.js", "let ok = 1;"),
        ]);
        engine.update_file("bad.js", "function ( {{{ ").unwrap();

        let hover = engine.get_hover("good.js", Position::new(1, 1)).unwrap();
        assert_eq!(hover.value.unwrap().display_text, "value: number");
        assert!(hover.warnings.is_empty());

        let definition = engine.get_definition("good.js", Position::new(1, 1)).unwrap();
        assert_eq!(definition.value.len(), 1);

        let degraded = engine.get_hover("bad.js", Position::new(0, 0)).unwrap();
        assert!(degraded.is_degraded());
        assert_eq!(engine.status().degraded_files.len(), 1);
    }

    #[test]
    fn test_typescript_cast_is_not_degraded() {
        let engine = engine(&[("a.ts", "let y: any = 1;\nconst x = <number>y;\nx;")]);

        let hover = engine.get_hover("a.ts", Position::new(2, 0)).unwrap();
        assert!(hover.warnings.is_empty());
        assert_eq!(hover.value.unwrap().display_text, "x: number");
        assert!(engine.status().degraded_files.is_empty());
    }

    #[test]
    fn test_function_and_var_references() {
        let engine = engine(&[("a.js", "function f() {}\nvar f = 1;\nf;")]);

        let found = engine.get_definition("a.js", Position::new(2, 0)).unwrap();
        assert_eq!(found.value.len(), 2);

        let refs = engine.get_references("a.js", Position::new(1, 4)).unwrap();
        let lines: Vec<u32> = refs
            .value
            .locations
            .iter()
            .map(|l| l.range.start.line)
            .collect();
        assert_eq!(lines, vec![0, 1, 2]);
    }

    struct LabelledFacts(SyntacticFacts);

    impl TypeFacts for LabelledFacts {
        fn symbol_at(
            &self,
            program: &Program,
            uri: &str,
            node: crate::infra::syntax::NodeId,
        ) -> Option<crate::models::symbol::SymbolId> {
            self.0.symbol_at(program, uri, node)
        }

        fn type_of(
            &self,
            _program: &Program,
            _symbol: crate::models::symbol::SymbolId,
        ) -> Result<String, crate::error::FactsError> {
            Ok("Labelled".to_string())
        }

        fn doc_comment(
            &self,
            program: &Program,
            symbol: crate::models::symbol::SymbolId,
        ) -> Result<Option<String>, crate::error::FactsError> {
            self.0.doc_comment(program, symbol)
        }

        fn exports_of(
            &self,
            program: &Program,
            uri: &str,
        ) -> Vec<crate::services::facts::ExportedName> {
            self.0.exports_of(program, uri)
        }

        fn canonical(
            &self,
            program: &Program,
            symbol: crate::models::symbol::SymbolId,
        ) -> crate::models::symbol::SymbolId {
            self.0.canonical(program, symbol)
        }

        fn policy(&self) -> &dyn crate::services::facts::DeclarationPolicy {
            self.0.policy()
        }
    }

    #[test]
    fn test_custom_facts_with_config_limits() {
        let mut config = SightlineConfig::default();
        config.references.limit = 1;
        let engine =
            Engine::with_facts_and_config(Arc::new(LabelledFacts(SyntacticFacts::new())), &config)
                .unwrap();
        engine.add_file("a.js", "var v = 1;\nv;\nv;").unwrap();

        let hover = engine.get_hover("a.js", Position::new(1, 0)).unwrap();
        assert_eq!(hover.value.unwrap().display_text, "v: Labelled");

        let refs = engine.get_references("a.js", Position::new(1, 0)).unwrap();
        assert_eq!(refs.value.locations.len(), 1);
        assert!(refs.value.truncated);
    }

    #[test]
    fn test_definition_round_trip_property() {
        let engine = engine(SAMPLE);
        for (uri, _) in SAMPLE {
            for position in positions(&engine, uri) {
                for location in engine.get_definition(uri, position).unwrap().value {
                    // The declaration's own name resolves back to a set containing itself
                    let back = engine
                        .get_definition(&location.uri, location.range.start)
                        .unwrap()
                        .value;
                    assert!(back.contains(&location), "{} at {:?}", uri, position);
                }
            }
        }
    }

    #[test]
    fn test_reference_completeness_property() {
        let engine = engine(SAMPLE);
        let program = engine.program();

        for file in program.files() {
            let tree = file.tree();
            for (node, _) in file.resolutions.iter() {
                let location = file.parsed.location_of(*node);
                let refs = engine
                    .get_references(file.uri(), location.range.start)
                    .unwrap();
                assert!(
                    refs.value.locations.contains(&location),
                    "{} missing from references of '{}'",
                    location,
                    tree.text(*node)
                );
            }
        }
    }

    #[test]
    fn test_add_remove_idempotence() {
        let engine = engine(SAMPLE);
        let before = engine.program().symbol_index();

        engine
            .add_file("src/extra.ts", "export const extra = 1;\nexport class Widget {}")
            .unwrap();
        assert!(engine.program().symbol_index().contains_key("src/extra.ts::Widget"));
        engine.remove_file("src/extra.ts").unwrap();

        assert_eq!(engine.program().symbol_index(), before);
    }

    #[test]
    fn test_completion_determinism_property() {
        let engine = engine(SAMPLE);
        for position in positions(&engine, "src/main.ts") {
            let first = engine.get_completions("src/main.ts", position).unwrap();
            let second = engine.get_completions("src/main.ts", position).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_resolver_totality_property() {
        let engine = engine(SAMPLE);
        let program = engine.program();
        for (uri, _) in SAMPLE {
            let tree = program.file(uri).unwrap().tree();
            for position in positions(&engine, uri) {
                let node = crate::services::resolver::resolve(&program, uri, position).unwrap();
                assert!(node.index() < tree.len());
            }
        }
    }

    #[test]
    fn test_namespace_import_member_queries() {
        let engine = engine(SAMPLE);
        // `shapes.Circle` on line 4 of main.ts
        let found = engine.get_definition("src/main.ts", Position::new(4, 22)).unwrap();
        assert_eq!(found.value.len(), 1);
        assert_eq!(found.value[0].uri, "src/shapes.ts");
        assert_eq!(found.value[0].range.start, Position::new(3, 13));

        let hover = engine.get_hover("src/shapes.ts", Position::new(5, 3)).unwrap();
        assert_eq!(hover.value.unwrap().display_text, "area: () => number");
    }

    #[test]
    fn test_versions_and_errors() {
        let engine = Engine::new().unwrap();
        let v1 = engine.add_file("a.js", "1").unwrap();
        let v2 = engine.update_file("a.js", "2").unwrap();
        assert!(v2 > v1);
        assert_eq!(engine.program().version(), v2);

        let err = engine.add_file("a.js", "3").unwrap_err();
        assert!(matches!(
            err,
            SightlineError::Registry(RegistryError::DuplicateFile(_))
        ));
        assert_eq!(engine.program().version(), v2);

        let err = engine.get_hover("missing.js", Position::new(0, 0)).unwrap_err();
        assert!(err.is_not_found());
        assert!(engine.remove_file("missing.js").unwrap_err().is_not_found());
    }

    #[test]
    fn test_apply_changes_single_rebuild() {
        let engine = Engine::new().unwrap();
        let version = engine
            .apply_changes(&[
                ContentChange::Added {
                    uri: "a.js".to_string(),
                    text: "var a;".to_string(),
                },
                ContentChange::Added {
                    uri: "b.js".to_string(),
                    text: "var b;".to_string(),
                },
            ])
            .unwrap();
        assert_eq!(version, 2);
        assert_eq!(engine.status().files, 2);

        let err = engine
            .apply_changes(&[
                ContentChange::Removed {
                    uri: "a.js".to_string(),
                },
                ContentChange::Removed {
                    uri: "zzz.js".to_string(),
                },
            ])
            .unwrap_err();
        assert!(err.is_not_found());
        // The successful removal before the failure is published
        assert!(!engine.program().contains("a.js"));
    }

    #[test]
    fn test_find_symbols() {
        let engine = engine(SAMPLE);
        let found = engine.find_symbols("Circle", None);
        assert!(found.iter().any(|s| s.qualified_name == "src/shapes.ts::Circle"));

        let classes = engine.find_symbols("*", Some(SymbolKind::Class));
        assert!(classes.iter().all(|s| s.kind == SymbolKind::Class));
        assert!(!classes.is_empty());
    }

    #[test]
    fn test_concurrent_readers_see_consistent_snapshots() {
        let engine = Arc::new(engine(&[("a.js", "var value = 1;\nvalue;")]));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let engine = Arc::clone(&engine);
                scope.spawn(move || {
                    for _ in 0..50 {
                        let program = engine.program();
                        let outcome = engine.get_definition("a.js", Position::new(1, 0)).unwrap();
                        assert!(outcome.value.len() <= 1);
                        assert!(program.version() >= 1);
                    }
                });
            }

            for i in 0..20 {
                let text = format!("var value = {};\nvalue;", i);
                engine.update_file("a.js", &text).unwrap();
            }
        });

        assert_eq!(engine.program().version(), 21);
    }
}
