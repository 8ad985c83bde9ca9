//! # snipstore-entity
//!
//! Domain models for Snipstore: snippets (saved SQL queries), the folders
//! that organize them, the schema validator that gates every write, and
//! the [`SnippetStore`] contract both backends implement.

pub mod context;
pub mod folder;
pub mod schema;
pub mod snippet;
pub mod store;

pub use context::{Actor, StoreContext};
pub use folder::{Folder, FolderContents, FolderFilter, FolderRef, NewFolder};
pub use snippet::{
    NewSnippet, OwnerSnapshot, SchemaVersion, Snippet, SnippetContent, SnippetCounts,
    SnippetFilter, SnippetType, Visibility,
};
pub use store::SnippetStore;
