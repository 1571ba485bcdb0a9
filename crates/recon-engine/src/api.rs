//! Read-only HTTP client for the bot's row endpoints.
//!
//! The bot exposes six polled endpoints returning `{rows: [...]}`:
//! `decisions`, `trades`, `fills` scoped to one symbol pair, plus
//! `decisions_all`, `trades_all`, `fills_all` aggregates with their own
//! limits. All of them take `mode` (live/test) and `limit` query
//! parameters. Rows come back untyped; normalization happens in
//! [`crate::normalize`], not here.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use recon_common::DataMode;

/// Request timeout for row fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching rows from the bot API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error status.
    #[error("API error: status {status}, body: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    Json(String),
}

/// Response envelope shared by all row endpoints.
#[derive(Debug, Deserialize)]
struct RowsResponse {
    #[serde(default)]
    rows: Vec<Value>,
}

/// Scope for the pair endpoints.
#[derive(Debug, Clone)]
pub struct PairScope {
    /// Symbol on the L venue.
    pub symbol_l: String,
    /// Symbol on the E venue.
    pub symbol_e: String,
    /// Data partition (live or test).
    pub mode: DataMode,
}

/// Client for the bot's row endpoints.
pub struct BotApiClient {
    http: Client,
    base_url: String,
}

impl BotApiClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the bot API, without a trailing slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch decision rows for a symbol pair.
    pub async fn decisions(&self, scope: &PairScope, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_pair_rows("decisions", scope, limit).await
    }

    /// Fetch order-attempt rows for a symbol pair.
    pub async fn trades(&self, scope: &PairScope, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_pair_rows("trades", scope, limit).await
    }

    /// Fetch fill rows for a symbol pair.
    pub async fn fills(&self, scope: &PairScope, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_pair_rows("fills", scope, limit).await
    }

    /// Fetch decision rows across all symbol pairs.
    pub async fn decisions_all(&self, mode: DataMode, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_all_rows("decisions_all", mode, limit).await
    }

    /// Fetch order-attempt rows across all symbol pairs.
    pub async fn trades_all(&self, mode: DataMode, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_all_rows("trades_all", mode, limit).await
    }

    /// Fetch fill rows across all symbol pairs.
    pub async fn fills_all(&self, mode: DataMode, limit: u32) -> Result<Vec<Value>, ApiError> {
        self.fetch_all_rows("fills_all", mode, limit).await
    }

    async fn fetch_pair_rows(
        &self,
        endpoint: &str,
        scope: &PairScope,
        limit: u32,
    ) -> Result<Vec<Value>, ApiError> {
        let query = [
            ("symbol_l", scope.symbol_l.clone()),
            ("symbol_e", scope.symbol_e.clone()),
            ("mode", scope.mode.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        self.fetch_rows(endpoint, &query).await
    }

    async fn fetch_all_rows(
        &self,
        endpoint: &str,
        mode: DataMode,
        limit: u32,
    ) -> Result<Vec<Value>, ApiError> {
        let query = [
            ("mode", mode.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        self.fetch_rows(endpoint, &query).await
    }

    async fn fetch_rows(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>, ApiError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(url = %url, "Fetching rows");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint = %endpoint,
                status = status.as_u16(),
                body = %body,
                "Row endpoint returned an error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: RowsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Json(format!("Failed to parse rows response: {}", e)))?;

        Ok(rows.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = BotApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_rows_response_defaults_to_empty() {
        let parsed: RowsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.rows.is_empty());

        let parsed: RowsResponse = serde_json::from_str(r#"{"rows": [{"trace": "t1"}]}"#).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: 503,
            body: "maintenance".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("maintenance"));
    }
}
