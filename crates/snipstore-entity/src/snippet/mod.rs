//! Snippet domain entities.

pub mod filter;
pub mod model;
pub mod visibility;

pub use filter::{SnippetCounts, SnippetFilter, filter_by_favorite};
pub use model::{NewSnippet, OwnerSnapshot, SchemaVersion, Snippet, SnippetContent, SnippetType};
pub use visibility::Visibility;
