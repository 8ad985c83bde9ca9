//! # snipstore-service
//!
//! The store facade used by callers of Snipstore. It validates untyped
//! payloads, selects the backend once from configuration, and forwards
//! every operation to it.

pub mod facade;

pub use facade::SnippetFacade;
