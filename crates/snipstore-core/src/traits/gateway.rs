//! Query gateway trait: "execute SQL, get back rows".

use async_trait::async_trait;

use crate::error::AppResult;
use crate::types::statement::{Headers, Row, Statement};

/// An external SQL executor.
///
/// Implementations live in `snipstore-database` (PostgreSQL pool, HTTP
/// endpoint). Any gateway-side failure must surface as an
/// [`ErrorKind::Storage`](crate::error::ErrorKind::Storage) error carrying
/// the gateway's message. Implementations never retry.
#[async_trait]
pub trait QueryGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Return the gateway type name (e.g., "postgres", "http").
    fn gateway_type(&self) -> &str;

    /// Execute one statement and return every row it produced.
    async fn execute(&self, statement: &Statement, headers: &Headers) -> AppResult<Vec<Row>>;
}
