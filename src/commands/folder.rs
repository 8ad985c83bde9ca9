//! Folder management CLI commands.

use clap::{Args, Subcommand};
use serde_json::json;
use tabled::Tabled;

use snipstore_core::error::AppResult;
use snipstore_entity::{Folder, FolderFilter, FolderRef, StoreContext};
use snipstore_service::SnippetFacade;

use super::snippet::SnippetRow;
use crate::output::{self, OutputFormat};

/// Arguments for folder commands
#[derive(Debug, Args)]
pub struct FolderArgs {
    /// Folder subcommand
    #[command(subcommand)]
    pub command: FolderCommand,
}

/// Folder subcommands
#[derive(Debug, Subcommand)]
pub enum FolderCommand {
    /// List folders
    List {
        /// Only direct children of this folder id
        #[arg(short, long, conflicts_with = "root")]
        parent: Option<String>,
        /// Only top-level folders
        #[arg(long)]
        root: bool,
    },
    /// Create a new folder
    Create {
        /// Folder name
        #[arg(short, long)]
        name: String,
        /// Parent folder ID (omit for root)
        #[arg(short, long)]
        parent: Option<String>,
        /// Owner id (defaults to the acting user)
        #[arg(long)]
        owner_id: Option<i64>,
    },
    /// Delete a folder
    Delete {
        /// Folder id
        id: String,
    },
    /// Show child folders and snippets of a folder (root when omitted)
    Contents {
        /// Folder id
        id: Option<String>,
    },
}

/// Folder display row
#[derive(Debug, Tabled)]
struct FolderRow {
    /// Folder ID
    id: String,
    /// Name
    name: String,
    /// Parent folder
    parent: String,
    /// Owner
    owner_id: i64,
}

impl From<&Folder> for FolderRow {
    fn from(f: &Folder) -> Self {
        Self {
            id: f.id.clone(),
            name: f.name.clone(),
            parent: f.parent_id.clone().unwrap_or_else(|| "-".into()),
            owner_id: f.owner_id,
        }
    }
}

fn folder_rows(folders: &[Folder]) -> Vec<FolderRow> {
    folders.iter().map(FolderRow::from).collect()
}

/// Execute folder commands
pub async fn execute(
    args: &FolderArgs,
    facade: &SnippetFacade,
    ctx: &StoreContext,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        FolderCommand::List { parent, root } => {
            let filter = match (parent, root) {
                (Some(id), _) => FolderFilter::children_of(FolderRef::Folder(id.clone())),
                (None, true) => FolderFilter::children_of(FolderRef::Root),
                (None, false) => FolderFilter::all(),
            };
            let folders = facade.list_folders(ctx, &filter).await?;
            output::print_list(&folders, folder_rows, format);
        }
        FolderCommand::Create {
            name,
            parent,
            owner_id,
        } => {
            let payload = json!({
                "name": name,
                "parent_id": parent,
                "owner_id": owner_id.unwrap_or(ctx.actor.id),
                "project_id": ctx.project_id,
            });
            let folder = facade.create_folder(ctx, &payload).await?;
            match format {
                OutputFormat::Json => output::print_item(&folder, format),
                OutputFormat::Table => output::print_success(&format!(
                    "Folder '{}' created with id {}",
                    folder.name, folder.id
                )),
            }
        }
        FolderCommand::Delete { id } => {
            facade.delete_folder(ctx, id).await?;
            output::print_success(&format!("Folder '{id}' deleted"));
        }
        FolderCommand::Contents { id } => {
            let contents = facade.folder_contents(ctx, id.as_deref()).await?;
            match format {
                OutputFormat::Json => output::print_item(&contents, format),
                OutputFormat::Table => {
                    println!("Folders:");
                    output::print_list(&contents.folders, folder_rows, format);
                    println!("Snippets:");
                    output::print_list(
                        &contents.contents,
                        |items| items.iter().map(SnippetRow::from).collect(),
                        format,
                    );
                }
            }
        }
    }

    Ok(())
}
