//! Reference Engine
//!
//! Whole-program scan for identifiers bound to the same entity as the one
//! at the cursor. The scan is capped by a result count and a time budget;
//! either cap ends the scan early and marks the result truncated.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::QueryError;
use crate::models::config::ReferencesConfig;
use crate::models::position::Position;
use crate::models::query::{QueryOutcome, QueryWarning, ReferenceResult, TruncationReason};
use crate::services::facts::TypeFacts;
use crate::services::program::Program;
use crate::services::resolver;

/// Nodes visited between deadline checks
const DEADLINE_STRIDE: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct ReferenceLimits {
    pub max_results: usize,
    pub time_budget: Duration,
}

impl Default for ReferenceLimits {
    fn default() -> Self {
        Self {
            max_results: crate::config::reference_limit(),
            time_budget: crate::config::reference_budget(),
        }
    }
}

impl From<&ReferencesConfig> for ReferenceLimits {
    fn from(config: &ReferencesConfig) -> Self {
        Self {
            max_results: config.limit,
            time_budget: config.time_budget(),
        }
    }
}

pub fn references(
    program: &Program,
    facts: &dyn TypeFacts,
    uri: &str,
    position: Position,
    limits: ReferenceLimits,
) -> Result<QueryOutcome<ReferenceResult>, QueryError> {
    let cursor = resolver::locate(program, uri, position)?;
    let Some(target) = facts.symbol_at(program, uri, cursor.node) else {
        return Ok(QueryOutcome::new(ReferenceResult::default()));
    };

    let started = Instant::now();
    let deadline = started + limits.time_budget;
    let mut result = ReferenceResult::default();
    let mut visited = 0usize;
    let mut stopped: Option<TruncationReason> = None;

    'files: for file in program.files() {
        let tree = file.tree();
        for node in tree.preorder(tree.root()) {
            visited += 1;
            if visited % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
                stopped = Some(TruncationReason::TimeBudget);
                break 'files;
            }

            if !tree.kind(node).is_identifier() {
                continue;
            }
            let Some(symbol) = file.resolutions.get(&node) else {
                continue;
            };
            if !facts.same_symbol(program, target, *symbol) {
                continue;
            }

            if result.locations.len() >= limits.max_results {
                stopped = Some(TruncationReason::ResultLimit);
                break 'files;
            }
            result.locations.push(file.parsed.location_of(node));
        }
    }

    let mut warnings = Vec::new();
    if let Some(reason) = stopped {
        result.truncated = true;
        warnings.push(QueryWarning::ResultTruncated {
            limit: limits.max_results,
            reason,
        });
    }

    debug!(
        "References for {}:{}:{}: {} found, {} nodes scanned in {:?}{}",
        uri,
        position.line,
        position.column,
        result.locations.len(),
        visited,
        started.elapsed(),
        if result.truncated { " (truncated)" } else { "" }
    );
    Ok(QueryOutcome::with_warnings(result, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::facts::{EcmaPolicy, SyntacticFacts};
    use crate::services::program::ProgramBuilder;
    use crate::services::registry::SourceRegistry;

    fn build(files: &[(&str, &str)]) -> Program {
        let mut registry = SourceRegistry::new();
        for (uri, text) in files {
            registry.add_file(uri, text).unwrap();
        }
        ProgramBuilder::new()
            .unwrap()
            .build(&registry.snapshot(), None, &EcmaPolicy)
    }

    #[test]
    fn test_finds_all_uses_across_files() {
        let program = build(&[
            ("lib.ts", "export function greet() {}\ngreet();"),
            ("main.ts", "import { greet as hi } from './lib';\nhi();\nhi();"),
        ]);
        let facts = SyntacticFacts::new();

        let outcome = references(
            &program,
            &facts,
            "lib.ts",
            Position::new(0, 17),
            ReferenceLimits::default(),
        )
        .unwrap();
        let found: Vec<String> = outcome
            .value
            .locations
            .iter()
            .map(|l| l.to_string())
            .collect();

        assert_eq!(
            found,
            vec![
                "lib.ts:1:17",
                "lib.ts:2:1",
                "main.ts:1:10",
                "main.ts:1:19",
                "main.ts:2:1",
                "main.ts:3:1",
            ]
        );
        assert!(!outcome.value.truncated);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_scope_respected() {
        let program = build(&[(
            "a.js",
            "let x = 1;\nfunction f() { let x = 2; return x; }\nx;",
        )]);
        let facts = SyntacticFacts::new();

        let outcome =
            references(&program, &facts, "a.js", Position::new(2, 0), ReferenceLimits::default())
                .unwrap();
        let lines: Vec<u32> = outcome
            .value
            .locations
            .iter()
            .map(|l| l.range.start.line)
            .collect();
        assert_eq!(lines, vec![0, 2]);
    }

    #[test]
    fn test_result_limit_truncates() {
        let text = format!("var n = 0;\n{}", "n;\n".repeat(20));
        let program = build(&[("a.js", &text)]);
        let facts = SyntacticFacts::new();
        let limits = ReferenceLimits {
            max_results: 5,
            time_budget: Duration::from_secs(60),
        };

        let outcome = references(&program, &facts, "a.js", Position::new(0, 4), limits).unwrap();
        assert_eq!(outcome.value.locations.len(), 5);
        assert!(outcome.value.truncated);
        assert_eq!(
            outcome.warnings,
            vec![QueryWarning::ResultTruncated {
                limit: 5,
                reason: TruncationReason::ResultLimit
            }]
        );
    }

    #[test]
    fn test_time_budget_truncates() {
        let text = format!("var n = 0;\n{}", "n;\n".repeat(500));
        let program = build(&[("a.js", &text)]);
        let facts = SyntacticFacts::new();
        let limits = ReferenceLimits {
            max_results: 10_000,
            time_budget: Duration::ZERO,
        };

        let outcome = references(&program, &facts, "a.js", Position::new(0, 4), limits).unwrap();
        assert!(outcome.value.truncated);
        assert!(matches!(
            outcome.warnings[0],
            QueryWarning::ResultTruncated {
                reason: TruncationReason::TimeBudget,
                ..
            }
        ));
    }

    #[test]
    fn test_unresolved_position_is_empty() {
        let program = build(&[("a.js", "1 + 2;")]);
        let facts = SyntacticFacts::new();
        let outcome =
            references(&program, &facts, "a.js", Position::new(0, 2), ReferenceLimits::default())
                .unwrap();
        assert!(outcome.value.locations.is_empty());
        assert!(!outcome.value.truncated);
    }
}
