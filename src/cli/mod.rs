//! CLI module for Sightline
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod location;
pub mod output;
pub mod response;

pub use location::ParsedLocation;
pub use output::OutputContext;

use clap::{Parser, Subcommand};

use commands::{
    batch::BatchArgs, complete::CompleteArgs, config::ConfigArgs, find::FindArgs,
    hover::HoverArgs, status::StatusArgs,
};

const LONG_ABOUT: &str = r#"
Sightline - code intelligence for JavaScript and TypeScript projects

Sightline loads every JS/TS file under the current directory, binds names
across modules and answers completion, hover, definition and reference
queries. Locations are file:line[:column], 1-indexed.

QUICK START:
  sightline status                          # Files, symbols, degraded parses
  sightline complete src/app.ts:12:9        # Completion candidates
  sightline hover src/app.ts:12:5           # Type and documentation
  sightline find def src/app.ts:12:5        # Declarations
  sightline find refs src/app.ts:12:5       # All references
  sightline find symbol "Shape.*" --kind method

BATCH MODE:
  echo '{"command": "hover", "location": "src/app.ts:3:7"}' | sightline batch --parallel
"#;

/// Sightline - code intelligence for JavaScript and TypeScript
#[derive(Parser, Debug)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'sightline <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json)
    #[arg(long, global = true, env = "SIGHTLINE_OUTPUT_FORMAT", default_value = "json")]
    pub format: String,

    /// Verbose output (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show project and program status
    Status(StatusArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Completion candidates at a position
    Complete(CompleteArgs),

    /// Type and documentation at a position
    Hover(HoverArgs),

    /// Find symbols, references, definitions
    Find(FindArgs),

    /// Execute multiple queries in batch
    Batch(BatchArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_find_refs() {
        let cli = Cli::try_parse_from(["sightline", "find", "refs", "src/a.ts:3:5", "--limit", "10"])
            .unwrap();
        match cli.command {
            Commands::Find(FindArgs {
                command: commands::find::FindCommand::Refs { location, limit },
            }) => {
                assert_eq!(location, "src/a.ts:3:5");
                assert_eq!(limit, Some(10));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
