//! Snippet listing filters and aggregate counts.

use serde::{Deserialize, Serialize};

use crate::folder::FolderRef;

use super::model::Snippet;
use super::visibility::Visibility;

/// Keep only snippets whose `content.favorite` equals `favorite`.
///
/// With no flag the input is returned unchanged, in the same order.
pub fn filter_by_favorite(snippets: Vec<Snippet>, favorite: Option<bool>) -> Vec<Snippet> {
    match favorite {
        None => snippets,
        Some(flag) => snippets
            .into_iter()
            .filter(|s| s.content.favorite == flag)
            .collect(),
    }
}

/// Criteria for listing snippets. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetFilter {
    /// Match on `content.favorite`.
    pub favorite: Option<bool>,
    /// Match on `visibility`.
    pub visibility: Option<Visibility>,
    /// Match on the containing folder.
    pub folder: Option<FolderRef>,
}

impl SnippetFilter {
    /// Filter on the favorite flag only.
    pub fn favorite(flag: bool) -> Self {
        Self {
            favorite: Some(flag),
            ..Self::default()
        }
    }

    /// Filter on the containing folder only.
    pub fn in_folder(folder: FolderRef) -> Self {
        Self {
            folder: Some(folder),
            ..Self::default()
        }
    }

    /// Whether `snippet` satisfies every set criterion.
    pub fn matches(&self, snippet: &Snippet) -> bool {
        self.favorite.is_none_or(|f| snippet.content.favorite == f)
            && self.visibility.is_none_or(|v| snippet.visibility == v)
            && self
                .folder
                .as_ref()
                .is_none_or(|folder| folder.contains(snippet.folder_id.as_deref()))
    }
}

/// Aggregate snippet counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetCounts {
    /// All snippets.
    pub total: u64,
    /// Snippets with `content.favorite == true`.
    pub favorites: u64,
    /// Snippets visible only to their owner.
    pub private: u64,
    /// Snippets shared beyond their owner.
    pub shared: u64,
}

impl SnippetCounts {
    /// Count in process.
    pub fn tally<'a>(snippets: impl IntoIterator<Item = &'a Snippet>) -> Self {
        snippets.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total += 1;
            if s.content.favorite {
                acc.favorites += 1;
            }
            if s.visibility.is_private() {
                acc.private += 1;
            } else {
                acc.shared += 1;
            }
            acc
        })
    }
}
