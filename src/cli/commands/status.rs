//! Status command implementation
//!
//! Show project status and the state of the loaded program.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::services::engine::EngineStatus;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show detailed status including configuration locations
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Serialize)]
struct StatusResponse {
    initialized: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    program: EngineStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_path: Option<String>,
}

pub async fn execute(args: StatusArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let engine = app.engine().await?;

    let response = StatusResponse {
        initialized: app.is_initialized(),
        path: app.root().display().to_string(),
        name: app.config().project.name.clone(),
        program: engine.status(),
        config_path: args
            .detailed
            .then(|| ctx.relative_path(&app.config_service.config_path(false))),
    };

    ctx.print_success_flat(response);
    Ok(())
}
