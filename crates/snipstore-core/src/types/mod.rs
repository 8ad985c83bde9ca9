//! Core type definitions used across the Snipstore workspace.

pub mod statement;

pub use statement::{Headers, Row, SqlParam, Statement};
