//! # snipstore-storage
//!
//! Filesystem backend for Snipstore. Each snippet is one `<id>.json` file
//! in the store directory; folders share a single `folders.json` document.
//! Files are always published through a temp file, so readers never see
//! partial content.

mod atomic;
pub mod document;
pub mod record;
pub mod snippets;

pub use document::JsonDocument;
pub use record::LocalRecordStore;
pub use snippets::FilesystemSnippetStore;
