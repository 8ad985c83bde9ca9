//! # snipstore-database
//!
//! Relational backend for Snipstore. Snippets and folders are rows reached
//! through a [`QueryGateway`](snipstore_core::traits::QueryGateway): either
//! a direct PostgreSQL pool or a remote HTTP query endpoint. Every statement
//! carries its values as bound parameters.

pub mod connection;
pub mod gateway;
pub mod query;
pub mod repositories;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::{HttpQueryGateway, PgQueryGateway};
pub use store::GatewaySnippetStore;
