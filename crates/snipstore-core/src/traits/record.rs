//! Key-value record store trait.
//!
//! The filesystem backend treats its directory as a database: each key is
//! a record id and each value one serialized record.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppResult;

/// Durable key-value storage for serialized records.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g., "local").
    fn store_type(&self) -> &str;

    /// Idempotently prepare the underlying storage.
    async fn ensure_ready(&self) -> AppResult<()>;

    /// Read a record, or `None` when the key is absent.
    async fn get(&self, key: &str) -> AppResult<Option<Bytes>>;

    /// Create or replace a record. Readers never observe a partial value.
    async fn put(&self, key: &str, value: Bytes) -> AppResult<()>;

    /// Remove a record. Returns `false` when the key was already absent.
    async fn remove(&self, key: &str) -> AppResult<bool>;

    /// List every key currently stored, sorted ascending.
    async fn keys(&self) -> AppResult<Vec<String>>;
}
