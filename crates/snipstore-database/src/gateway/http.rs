//! Remote gateway reached over HTTP.
//!
//! Protocol: `POST {url}/query` with `{"query": sql, "parameters": [...]}`;
//! the response body is a JSON array of row objects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use snipstore_core::config::storage::HttpGatewayConfig;
use snipstore_core::error::{AppError, AppResult, ErrorKind};
use snipstore_core::traits::gateway::QueryGateway;
use snipstore_core::types::{Headers, Row, Statement};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    parameters: Vec<Value>,
}

/// HTTP query gateway client.
#[derive(Clone)]
pub struct HttpQueryGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpQueryGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQueryGateway")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpQueryGateway {
    /// Build a client for the gateway described by `config`.
    pub fn new(config: &HttpGatewayConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build gateway HTTP client",
                    e,
                )
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/query", config.url.trim_end_matches('/')),
        })
    }
}

/// Convert forwarded headers, dropping any that are not valid HTTP.
fn header_map(headers: &Headers) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "Skipping invalid forwarded header"),
        }
    }
    map
}

/// Error for a non-2xx reply, keeping a failed body read as the source.
fn status_error<E>(status: StatusCode, body: Result<String, E>) -> AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match body {
        Ok(body) => AppError::storage(format!(
            "Gateway returned {status}: {}",
            error_message(&body)
        )),
        Err(e) => AppError::with_source(
            ErrorKind::Storage,
            format!("Gateway returned {status}; failed to read error body: {e}"),
            e,
        ),
    }
}

/// Pull a readable message out of a gateway error body.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error").and_then(|e| e.get("message")))
                .or_else(|| v.get("error"))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

fn parse_rows(body: Value) -> AppResult<Vec<Row>> {
    let Value::Array(items) = body else {
        return Err(AppError::storage("Gateway response is not an array of rows"));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(row) => Ok(row),
            other => Err(AppError::storage(format!(
                "Gateway returned a non-object row: {other}"
            ))),
        })
        .collect()
}

#[async_trait]
impl QueryGateway for HttpQueryGateway {
    fn gateway_type(&self) -> &str {
        "http"
    }

    async fn execute(&self, statement: &Statement, headers: &Headers) -> AppResult<Vec<Row>> {
        let request = QueryRequest {
            query: &statement.sql,
            parameters: statement.params.iter().map(|p| p.to_json()).collect(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .headers(header_map(headers))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("Gateway request failed: {e}"), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response.text().await));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Gateway response is not JSON", e)
        })?;
        let rows = parse_rows(body)?;
        debug!(rows = rows.len(), "Executed statement over HTTP");
        Ok(rows)
    }
}
