//! Repositories issuing parameterized statements through a query gateway.

pub mod folder;
pub mod snippet;

pub use folder::FolderRepository;
pub use snippet::SnippetRepository;
