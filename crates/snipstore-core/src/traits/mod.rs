//! Core traits defined in `snipstore-core` and implemented by other crates.

pub mod gateway;
pub mod record;

pub use gateway::QueryGateway;
pub use record::RecordStore;
