//! Hover command implementation
//!
//! Get type and documentation for the identifier at a position.

use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::app::App;
use crate::cli::ParsedLocation;
use crate::cli::response::HoverResponse;
use crate::services::engine::Engine;

#[derive(Args, Debug)]
pub struct HoverArgs {
    /// File path with position (file:line:column)
    pub location: String,
}

pub fn run(engine: &Engine, root: &Path, location: &str) -> Result<HoverResponse> {
    let loc = ParsedLocation::parse(location)?;
    let uri = loc.uri(root)?;
    let outcome = engine.get_hover(&uri, loc.position())?;
    Ok(HoverResponse::new(&uri, outcome.value, outcome.warnings))
}

pub async fn execute(args: HoverArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let engine = app.engine().await?;

    match run(&engine, app.root(), &args.location) {
        Ok(response) => ctx.print_success_flat(response),
        Err(e) => ctx.print_error(&e.to_string()),
    }

    Ok(())
}
