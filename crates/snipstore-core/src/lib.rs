//! # snipstore-core
//!
//! Core crate for Snipstore. Contains the unified error system, the
//! configuration schema, the query-gateway contract, and the key-value
//! record contract implemented by the storage backends.
//!
//! This crate has **no** internal dependencies on other Snipstore crates.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use error::AppResult;
