//! CLI command definitions and dispatch.

pub mod config;
pub mod count;
pub mod folder;
pub mod snippet;

use clap::{Parser, Subcommand};
use serde_json::Value;

use snipstore_core::config::AppConfig;
use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_entity::{Actor, StoreContext};
use snipstore_service::SnippetFacade;

use crate::output::OutputFormat;

/// Snipstore: saved SQL snippets and their folders
#[derive(Debug, Parser)]
#[command(name = "snipstore", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Project id for writes (defaults to `project.default_project_id`)
    #[arg(long)]
    pub project: Option<i64>,

    /// Id of the acting user
    #[arg(long, default_value_t = 1)]
    pub actor_id: i64,

    /// Name of the acting user
    #[arg(long, default_value = "system")]
    pub actor_name: String,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Snippet management
    Snippet(snippet::SnippetArgs),
    /// Folder management
    Folder(folder::FolderArgs),
    /// Show snippet counts
    Count,
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        if let Commands::Config(args) = &self.command {
            return config::execute(args, config, &self.config, self.format);
        }

        let facade = SnippetFacade::from_config(&config.store).await?;
        let ctx = self.context(config);
        match &self.command {
            Commands::Snippet(args) => snippet::execute(args, &facade, &ctx, self.format).await,
            Commands::Folder(args) => folder::execute(args, &facade, &ctx, self.format).await,
            Commands::Count => count::execute(&facade, &ctx, self.format).await,
            Commands::Config(_) => Ok(()),
        }
    }

    fn context(&self, config: &AppConfig) -> StoreContext {
        let project = self.project.unwrap_or(config.project.default_project_id);
        StoreContext::new(project, Actor::new(self.actor_id, self.actor_name.clone()))
    }
}

/// Read a JSON payload given inline (`--data`) or as a file path (`--file`).
pub async fn read_payload(data: Option<&str>, file: Option<&str>) -> AppResult<Value> {
    let raw = match (data, file) {
        (Some(inline), None) => inline.to_string(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Validation, format!("Cannot read '{path}'"), e)
        })?,
        _ => return Err(AppError::validation("Provide exactly one of --data or --file")),
    };
    serde_json::from_str(&raw).map_err(|e| {
        AppError::with_source(ErrorKind::Validation, format!("Payload is not valid JSON: {e}"), e)
    })
}
