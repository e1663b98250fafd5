//! Find command implementation
//!
//! Symbol discovery and navigation over the loaded program.

use std::path::Path;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::{
    DefinitionResponse, LocationOutput, ReferencesResponse, SymbolOutput, SymbolsResponse,
};
use crate::models::symbol::SymbolKind;
use crate::services::engine::Engine;

#[derive(Args, Debug)]
pub struct FindArgs {
    #[command(subcommand)]
    pub command: FindCommand,
}

#[derive(Subcommand, Debug)]
pub enum FindCommand {
    /// Find symbols by name across the program
    Symbol {
        /// Name or qualified name, `*` as wildcard (e.g. "Shape.*", "*Handler")
        pattern: String,

        /// Filter by symbol kind (function, class, method, ...)
        #[arg(long)]
        kind: Option<String>,

        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Find all references to the symbol at position
    Refs {
        /// File path with position (file:line:column)
        location: String,

        /// Maximum results (default from config: references.limit)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Go to the declarations of the symbol at position
    Def {
        /// File path with position (file:line:column)
        location: String,
    },
}

fn parse_kind(kind: Option<&str>) -> Result<Option<SymbolKind>> {
    match kind {
        None => Ok(None),
        Some(k) => match k.parse::<SymbolKind>() {
            Ok(kind) => Ok(Some(kind)),
            Err(e) => bail!(
                "{}. Valid kinds: {}",
                e,
                SymbolKind::all_kind_names().join(", ")
            ),
        },
    }
}

pub fn symbols(
    engine: &Engine,
    pattern: &str,
    kind: Option<&str>,
    limit: usize,
) -> Result<SymbolsResponse> {
    let kind = parse_kind(kind)?;
    let symbols: Vec<SymbolOutput> = engine
        .find_symbols(pattern, kind)
        .iter()
        .take(limit)
        .map(SymbolOutput::from_symbol)
        .collect();

    Ok(SymbolsResponse {
        count: symbols.len(),
        symbols,
    })
}

pub fn references(
    engine: &Engine,
    root: &Path,
    location: &str,
    limit: Option<usize>,
) -> Result<ReferencesResponse> {
    let loc = ParsedLocation::parse(location)?;
    let outcome = engine.get_references(&loc.uri(root)?, loc.position())?;

    let mut truncated = outcome.value.truncated;
    let mut locations = outcome.value.locations;
    if let Some(limit) = limit
        && locations.len() > limit
    {
        locations.truncate(limit);
        truncated = true;
    }

    Ok(ReferencesResponse {
        count: locations.len(),
        truncated,
        references: locations.iter().map(LocationOutput::from_location).collect(),
        warnings: outcome.warnings,
    })
}

pub fn definition(engine: &Engine, root: &Path, location: &str) -> Result<DefinitionResponse> {
    let loc = ParsedLocation::parse(location)?;
    let outcome = engine.get_definition(&loc.uri(root)?, loc.position())?;

    let definitions: Vec<LocationOutput> = outcome
        .value
        .iter()
        .map(LocationOutput::from_location)
        .collect();
    Ok(DefinitionResponse {
        count: definitions.len(),
        message: definitions
            .is_empty()
            .then(|| "No definition found".to_string()),
        definitions,
        warnings: outcome.warnings,
    })
}

pub async fn execute(args: FindArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let engine = app.engine().await?;

    let result = match args.command {
        FindCommand::Symbol {
            pattern,
            kind,
            limit,
        } => symbols(&engine, &pattern, kind.as_deref(), limit).map(|r| ctx.print_success_flat(r)),
        FindCommand::Refs { location, limit } => {
            let limit = limit.or(Some(app.config().references.limit));
            references(&engine, app.root(), &location, limit).map(|r| ctx.print_success_flat(r))
        }
        FindCommand::Def { location } => {
            definition(&engine, app.root(), &location).map(|r| ctx.print_success_flat(r))
        }
    };

    if let Err(e) = result {
        ctx.print_error(&e.to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let engine = Engine::new().unwrap();
        engine
            .add_file("lib.ts", "export function greet() {}\nexport class Greeter {}")
            .unwrap();
        engine
            .add_file("main.ts", "import { greet } from './lib';\ngreet();\ngreet();")
            .unwrap();
        engine
    }

    #[test]
    fn test_definition_is_one_indexed() {
        let response = definition(&engine(), Path::new("/p"), "main.ts:2:1").unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.definitions[0].file, "lib.ts");
        assert_eq!(response.definitions[0].line, 1);
        assert_eq!(response.definitions[0].column, 17);
        assert!(response.message.is_none());
    }

    #[test]
    fn test_references_limit_marks_truncated() {
        let response = references(&engine(), Path::new("/p"), "main.ts:2:1", Some(2)).unwrap();
        assert_eq!(response.count, 2);
        assert!(response.truncated);
    }

    #[test]
    fn test_symbols_by_kind() {
        let response = symbols(&engine(), "Gree*", Some("class"), 10).unwrap();
        assert_eq!(response.count, 1);
        assert_eq!(response.symbols[0].name, "Greeter");

        assert!(symbols(&engine(), "*", Some("widget"), 10).is_err());
    }
}
