//! Complete command implementation
//!
//! List completion candidates at a position.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::CompletionResponse;
use crate::services::engine::Engine;

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// File path with position (file:line:column)
    pub location: String,

    /// Maximum items (default from config: completion.max_items)
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run(
    engine: &Engine,
    root: &Path,
    location: &str,
    limit: Option<usize>,
) -> Result<CompletionResponse> {
    let loc = ParsedLocation::parse(location)?;
    let uri = loc.uri(root)?;
    let outcome = engine.get_completions(&uri, loc.position())?;

    let mut items = outcome.value;
    if let Some(limit) = limit {
        items.truncate(limit);
    }

    Ok(CompletionResponse {
        count: items.len(),
        items,
        warnings: outcome.warnings,
    })
}

pub async fn execute(args: CompleteArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let engine = app.engine().await?;

    match run(&engine, app.root(), &args.location, args.limit) {
        Ok(response) => ctx.print_success_flat(response),
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
