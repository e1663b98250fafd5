//! Config command implementation

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::models::config::SightlineConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Initialize configuration file
    Init {
        /// Initialize global config (~/.config/sightline)
        #[arg(long)]
        global: bool,

        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration
    Show {
        /// Show global config only
        #[arg(long)]
        global: bool,
    },

    /// Show config file path
    Path {
        /// Show global config path
        #[arg(long)]
        global: bool,
    },

    /// Edit configuration with default editor
    Edit {
        /// Edit global config
        #[arg(long)]
        global: bool,
    },
}

/// One response shape for every config subcommand
#[derive(Serialize)]
struct ConfigResponse {
    level: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<serde_json::Value>,
}

impl ConfigResponse {
    fn new(level: &'static str) -> Self {
        Self {
            level,
            status: None,
            path: None,
            exists: None,
            config: None,
        }
    }
}

fn level(global: bool) -> &'static str {
    if global { "global" } else { "project" }
}

/// Project paths are shown relative to the root, global ones in full
fn display_path(app: &App, path: &Path, global: bool) -> String {
    if global {
        path.display().to_string()
    } else {
        app.output.relative_path(path)
    }
}

fn config_to_json(config: &SightlineConfig) -> serde_json::Value {
    serde_json::json!({
        "project": {
            "name": config.project.name,
            "ignored_paths": config.project.ignored_paths,
        },
        "completion": {
            "max_items": config.completion.max_items,
            "globals": config.completion.globals.len(),
        },
        "references": {
            "limit": config.references.limit,
            "time_budget_ms": config.references.time_budget_ms,
        },
        "search": {
            "max_file_size_mb": config.search.max_file_size_mb,
        },
        "output": {
            "format": config.output.format,
            "color": config.output.color,
        },
    })
}

pub async fn execute(args: ConfigArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let service = &app.config_service;

    let response = match args.command {
        ConfigCommand::Init { global, force } => service.init(global, force).await.map(|path| {
            ConfigResponse {
                status: Some("created"),
                path: Some(display_path(app, &path, global)),
                ..ConfigResponse::new(level(global))
            }
        }),
        ConfigCommand::Show { global } => service.load(global).await.map(|config| ConfigResponse {
            config: Some(config_to_json(&config)),
            ..ConfigResponse::new(if global { "global" } else { "merged" })
        }),
        ConfigCommand::Path { global } => {
            let path = service.config_path(global);
            Ok(ConfigResponse {
                exists: Some(path.exists()),
                path: Some(display_path(app, &path, global)),
                ..ConfigResponse::new(level(global))
            })
        }
        ConfigCommand::Edit { global } => service.edit(global).await.map(|path| ConfigResponse {
            status: Some("opened"),
            path: Some(display_path(app, &path, global)),
            ..ConfigResponse::new(level(global))
        }),
    };

    match response {
        Ok(response) => ctx.print_success_flat(response),
        Err(e) => ctx.print_error(&e.to_string()),
    }
    Ok(())
}
