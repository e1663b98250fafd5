//! Definition Engine

use crate::error::QueryError;
use crate::models::position::{Location, Position};
use crate::services::facts::TypeFacts;
use crate::services::program::Program;
use crate::services::resolver;

/// Declaration locations of the symbol at `position`, aliases followed,
/// ordered by `(uri, line, column)`. Empty when nothing resolves.
pub fn definition(
    program: &Program,
    facts: &dyn TypeFacts,
    uri: &str,
    position: Position,
) -> Result<Vec<Location>, QueryError> {
    let cursor = resolver::locate(program, uri, position)?;
    let Some(symbol) = facts.symbol_at(program, uri, cursor.node) else {
        return Ok(Vec::new());
    };

    let canonical = facts.canonical(program, symbol);
    let mut locations = program
        .symbol(canonical)
        .map(|s| s.declarations.clone())
        .unwrap_or_default();
    locations.sort();
    locations.dedup();
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::position::Range;
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

    fn location(uri: &str, line: u32, start: u32, end: u32) -> Location {
        Location::new(
            uri.to_string(),
            Range::new(Position::new(line, start), Position::new(line, end)),
        )
    }

    #[test]
    fn test_call_resolves_to_function() {
        let program = build(&[("a.js", "function foo() { return 1; }\nfoo();")]);
        let facts = SyntacticFacts::new();

        let found = definition(&program, &facts, "a.js", Position::new(1, 1)).unwrap();
        assert_eq!(found, vec![location("a.js", 0, 9, 12)]);
    }

    #[test]
    fn test_definition_round_trip() {
        let program = build(&[("a.js", "let total = 0;\ntotal += 1;")]);
        let facts = SyntacticFacts::new();

        let found = definition(&program, &facts, "a.js", Position::new(1, 0)).unwrap();
        assert_eq!(found.len(), 1);
        // Querying the declaration itself yields the same location
        let again = definition(&program, &facts, "a.js", found[0].range.start).unwrap();
        assert_eq!(again, found);
    }

    #[test]
    fn test_merged_declarations_sorted() {
        let program = build(&[
            ("b.ts", "interface Options { b: number }"),
            ("a.ts", "interface Options { a: number }\nlet o: Options;"),
        ]);
        let facts = SyntacticFacts::new();

        let found = definition(&program, &facts, "a.ts", Position::new(1, 8)).unwrap();
        assert_eq!(
            found,
            vec![location("a.ts", 0, 10, 17), location("b.ts", 0, 10, 17)]
        );
    }

    #[test]
    fn test_import_follows_alias() {
        let program = build(&[
            ("lib.ts", "export class Parser {}"),
            ("main.ts", "import { Parser as P } from './lib';\nnew P();"),
        ]);
        let facts = SyntacticFacts::new();

        let found = definition(&program, &facts, "main.ts", Position::new(1, 4)).unwrap();
        assert_eq!(found, vec![location("lib.ts", 0, 13, 19)]);
    }

    #[test]
    fn test_punctuation_yields_nothing() {
        let program = build(&[("a.js", "foo();")]);
        let facts = SyntacticFacts::new();
        assert!(definition(&program, &facts, "a.js", Position::new(0, 3)).unwrap().is_empty());
        assert!(definition(&program, &facts, "a.js", Position::new(0, 0)).unwrap().is_empty());
    }
}
