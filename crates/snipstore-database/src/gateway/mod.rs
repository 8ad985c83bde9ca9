//! [`QueryGateway`](snipstore_core::traits::QueryGateway) implementations.

pub mod http;
pub mod postgres;

use std::sync::Arc;

use snipstore_core::config::storage::{GatewayConfig, GatewayKind};
use snipstore_core::error::AppResult;
use snipstore_core::traits::gateway::QueryGateway;

pub use http::HttpQueryGateway;
pub use postgres::PgQueryGateway;

/// Build the gateway selected by `config.kind`.
pub async fn from_config(config: &GatewayConfig) -> AppResult<Arc<dyn QueryGateway>> {
    let gateway: Arc<dyn QueryGateway> = match config.kind {
        GatewayKind::Postgres => Arc::new(PgQueryGateway::connect(&config.database).await?),
        GatewayKind::Http => Arc::new(HttpQueryGateway::new(&config.http)?),
    };
    Ok(gateway)
}
