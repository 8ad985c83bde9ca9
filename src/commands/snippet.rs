//! Snippet CLI commands.

use clap::{Args, Subcommand};
use tabled::Tabled;

use snipstore_core::error::AppResult;
use snipstore_entity::{FolderRef, Snippet, SnippetFilter, StoreContext, Visibility};
use snipstore_service::SnippetFacade;

use crate::output::{self, OutputFormat};

/// Arguments for snippet commands
#[derive(Debug, Args)]
pub struct SnippetArgs {
    /// Snippet subcommand
    #[command(subcommand)]
    pub command: SnippetCommand,
}

/// Snippet subcommands
#[derive(Debug, Subcommand)]
pub enum SnippetCommand {
    /// List snippets
    List {
        /// Only favorites (true) or non-favorites (false)
        #[arg(long)]
        favorite: Option<bool>,
        /// Only this visibility (user, project, org, public)
        #[arg(long)]
        visibility: Option<Visibility>,
        /// Only snippets directly in this folder id
        #[arg(long, conflicts_with = "root")]
        folder: Option<String>,
        /// Only root-level snippets
        #[arg(long)]
        root: bool,
    },
    /// Show one snippet
    Get {
        /// Snippet id
        id: String,
    },
    /// Create or replace a snippet from a JSON document
    Save {
        /// Inline JSON document
        #[arg(long)]
        data: Option<String>,
        /// Path to a JSON document
        #[arg(long)]
        file: Option<String>,
    },
    /// Apply a partial JSON update to a snippet
    Update {
        /// Snippet id
        id: String,
        /// Inline JSON patch
        #[arg(long)]
        data: Option<String>,
        /// Path to a JSON patch
        #[arg(long)]
        file: Option<String>,
    },
    /// Delete a snippet
    Delete {
        /// Snippet id
        id: String,
    },
}

/// Snippet display row
#[derive(Debug, Tabled)]
pub(crate) struct SnippetRow {
    /// Snippet id
    id: String,
    /// Name
    name: String,
    /// Visibility
    visibility: String,
    /// Favorite flag
    favorite: bool,
    /// Containing folder
    folder: String,
    /// Last update
    updated_at: String,
}

impl From<&Snippet> for SnippetRow {
    fn from(s: &Snippet) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            visibility: s.visibility.to_string(),
            favorite: s.content.favorite,
            folder: s.folder_id.clone().unwrap_or_else(|| "-".into()),
            updated_at: s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute snippet commands
pub async fn execute(
    args: &SnippetArgs,
    facade: &SnippetFacade,
    ctx: &StoreContext,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        SnippetCommand::List {
            favorite,
            visibility,
            folder,
            root,
        } => {
            let folder = match (folder, root) {
                (Some(id), _) => Some(FolderRef::Folder(id.clone())),
                (None, true) => Some(FolderRef::Root),
                (None, false) => None,
            };
            let filter = SnippetFilter {
                favorite: *favorite,
                visibility: *visibility,
                folder,
            };
            let snippets = facade.list_snippets(ctx, &filter).await?;
            output::print_list(
                &snippets,
                |items| items.iter().map(SnippetRow::from).collect(),
                format,
            );
        }
        SnippetCommand::Get { id } => {
            let snippet = facade.get_snippet(ctx, id).await?;
            output::print_item(&snippet, format);
        }
        SnippetCommand::Save { data, file } => {
            let payload = super::read_payload(data.as_deref(), file.as_deref()).await?;
            let snippet = facade.save_snippet(ctx, &payload).await?;
            match format {
                OutputFormat::Json => output::print_item(&snippet, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Snippet '{}' saved", snippet.id))
                }
            }
        }
        SnippetCommand::Update { id, data, file } => {
            let patch = super::read_payload(data.as_deref(), file.as_deref()).await?;
            let snippet = facade.update_snippet(ctx, id, &patch).await?;
            match format {
                OutputFormat::Json => output::print_item(&snippet, format),
                OutputFormat::Table => {
                    output::print_success(&format!("Snippet '{}' updated", snippet.id))
                }
            }
        }
        SnippetCommand::Delete { id } => {
            facade.delete_snippet(ctx, id).await?;
            output::print_success(&format!("Snippet '{id}' deleted"));
        }
    }

    Ok(())
}
