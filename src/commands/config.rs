//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use snipstore_core::config::AppConfig;
use snipstore_core::config::storage::{GatewayKind, StoreBackend};
use snipstore_core::error::AppResult;
use snipstore_database::connection::mask_password;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (passwords masked)
    Show,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.store.gateway.database.url = mask_password(&shown.store.gateway.database.url);

            match format {
                OutputFormat::Json => output::print_item(&shown, format),
                OutputFormat::Table => print_summary(&shown, config_path),
            }
        }
    }
    Ok(())
}

fn print_summary(config: &AppConfig, config_path: &str) {
    output::print_kv("Config file", config_path);
    match config.store.backend {
        StoreBackend::Filesystem => {
            output::print_kv("Backend", "filesystem");
            output::print_kv("Root path", &config.store.filesystem.root_path);
        }
        StoreBackend::Gateway => {
            output::print_kv("Backend", "gateway");
            match config.store.gateway.kind {
                GatewayKind::Postgres => {
                    output::print_kv("Gateway", "postgres");
                    output::print_kv("Database", &config.store.gateway.database.url);
                }
                GatewayKind::Http => {
                    output::print_kv("Gateway", "http");
                    output::print_kv("Endpoint", &config.store.gateway.http.url);
                }
            }
        }
    }
    output::print_kv(
        "Default project",
        &config.project.default_project_id.to_string(),
    );
    output::print_kv(
        "Logging",
        &format!("{} ({})", config.logging.level, config.logging.format),
    );
}
