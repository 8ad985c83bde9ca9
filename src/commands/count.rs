//! Snippet count command.

use tabled::Tabled;

use snipstore_core::error::AppResult;
use snipstore_entity::{SnippetCounts, StoreContext};
use snipstore_service::SnippetFacade;

use crate::output::{self, OutputFormat};

#[derive(Debug, Tabled)]
struct CountRow {
    total: u64,
    favorites: u64,
    private: u64,
    shared: u64,
}

/// Print aggregate snippet counts.
pub async fn execute(
    facade: &SnippetFacade,
    ctx: &StoreContext,
    format: OutputFormat,
) -> AppResult<()> {
    let counts = facade.count_snippets(ctx).await?;
    match format {
        OutputFormat::Json => output::print_item(&counts, format),
        OutputFormat::Table => output::print_list(
            &[counts],
            |items: &[SnippetCounts]| {
                items
                    .iter()
                    .map(|c| CountRow {
                        total: c.total,
                        favorites: c.favorites,
                        private: c.private,
                        shared: c.shared,
                    })
                    .collect()
            },
            format,
        ),
    }
    Ok(())
}
