//! HTTP client for the hosted record store (PostgREST-style REST surface).
//!
//! The store is the only wire-level boundary of the pipeline: reads, inserts
//! and delete-by-filter, all authenticated with an API key sent both as an
//! `apikey` header and a bearer token. `StoreRead`/`StoreWrite` are the seams
//! the pipeline stages depend on, so tests can substitute in-memory fakes.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};

pub const CRATE_NAME: &str = "cfod-store";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: usize = 1000;

/// Connection settings, built once at process start. Credentials come from
/// the environment; a missing credential is a configuration error surfaced
/// before any network call.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Page size used when looping reads until exhaustion.
    pub page_size: usize,
}

impl StoreConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("CFOD_SUPABASE_URL")
            .context("CFOD_SUPABASE_URL is not set (store base URL)")?;
        let api_key = std::env::var("CFOD_SUPABASE_KEY")
            .context("CFOD_SUPABASE_KEY is not set (store API key)")?;
        let timeout_secs = std::env::var("CFOD_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }
}

/// Whether an insert call asks the store to echo the written rows back.
/// Minimal mode skips the response body for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Minimal,
    Representation,
}

impl ResponseMode {
    fn prefer_value(self) -> &'static str {
        match self {
            ResponseMode::Minimal => "return=minimal",
            ResponseMode::Representation => "return=representation",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("store returned {status} for {url}: {body}")]
    HttpStatus {
        status: u16,
        url: String,
        body: String,
    },
    #[error("store response had malformed Content-Range: {0:?}")]
    ContentRange(Option<String>),
}

/// Read capability the deduplicator and reporter depend on.
#[async_trait]
pub trait StoreRead: Send + Sync {
    /// Every value of one column across the whole table, paging until
    /// exhausted. Rows where the column is null are skipped.
    async fn all_column_values(&self, table: &str, column: &str)
        -> Result<Vec<String>, StoreError>;

    /// Exact row count, optionally filtered by column equality.
    async fn count(&self, table: &str, filter: Option<(&str, &str)>) -> Result<u64, StoreError>;
}

/// Write capability the batch writer depends on.
#[async_trait]
pub trait StoreWrite: Send + Sync {
    /// One insert call with a JSON array body. The whole call either
    /// succeeds or fails; partial inserts within a call are not a thing
    /// the store reports.
    async fn insert_rows(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        mode: ResponseMode,
    ) -> Result<(), StoreError>;

    /// Delete every row matching `column=neq.""`, the full-wipe idiom
    /// used by table resets.
    async fn delete_all(&self, table: &str, key_column: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone)]
pub struct StoreClient {
    client: reqwest::Client,
    config: StoreConfig,
}

impl StoreClient {
    pub fn new(config: StoreConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout)
            .build()
            .context("building reqwest client")?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn error_from_response(
        url: &str,
        status: StatusCode,
        response: reqwest::Response,
    ) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        StoreError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body,
        }
    }
}

/// Total row count out of a `Content-Range` value like `0-24/3573` or `*/0`.
fn parse_content_range_total(header: Option<&str>) -> Result<u64, StoreError> {
    let raw = header.ok_or(StoreError::ContentRange(None))?;
    let total = raw
        .rsplit('/')
        .next()
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or_else(|| StoreError::ContentRange(Some(raw.to_string())))?;
    Ok(total)
}

#[async_trait]
impl StoreRead for StoreClient {
    async fn all_column_values(
        &self,
        table: &str,
        column: &str,
    ) -> Result<Vec<String>, StoreError> {
        let url = self.table_url(table);
        let mut values = Vec::new();
        let mut offset = 0usize;

        loop {
            let range = format!("{}-{}", offset, offset + self.config.page_size - 1);
            let request = self
                .authed(self.client.get(&url))
                .query(&[("select", column)])
                .header("Range-Unit", "items")
                .header("Range", &range);

            let response = request
                .send()
                .instrument(info_span!("store_read", table, column, range = %range))
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Self::error_from_response(&url, status, response).await);
            }

            let rows: Vec<serde_json::Map<String, JsonValue>> = response.json().await?;
            let page_len = rows.len();
            for row in rows {
                match row.get(column) {
                    Some(JsonValue::String(value)) => values.push(value.clone()),
                    Some(JsonValue::Null) | None => {}
                    Some(other) => values.push(other.to_string()),
                }
            }

            if page_len < self.config.page_size {
                break;
            }
            offset += self.config.page_size;
        }

        debug!(table, column, total = values.len(), "read full column");
        Ok(values)
    }

    async fn count(&self, table: &str, filter: Option<(&str, &str)>) -> Result<u64, StoreError> {
        let url = self.table_url(table);
        let mut request = self
            .authed(self.client.get(&url))
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0");
        if let Some((column, value)) = filter {
            request = request.query(&[(column, format!("eq.{value}"))]);
        }

        let response = request
            .send()
            .instrument(info_span!("store_count", table))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(&url, status, response).await);
        }

        let header = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        parse_content_range_total(header.as_deref())
    }
}

#[async_trait]
impl StoreWrite for StoreClient {
    async fn insert_rows(
        &self,
        table: &str,
        rows: Vec<JsonValue>,
        mode: ResponseMode,
    ) -> Result<(), StoreError> {
        let url = self.table_url(table);
        let response = self
            .authed(self.client.post(&url))
            .header("Prefer", mode.prefer_value())
            .json(&rows)
            .send()
            .instrument(info_span!("store_insert", table, rows = rows.len()))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(&url, status, response).await);
        }
        Ok(())
    }

    async fn delete_all(&self, table: &str, key_column: &str) -> Result<(), StoreError> {
        let url = self.table_url(table);
        let response = self
            .authed(self.client.delete(&url))
            .query(&[(key_column, "neq.")])
            .header("Prefer", "return=minimal")
            .send()
            .instrument(info_span!("store_delete_all", table))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(&url, status, response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> StoreClient {
        StoreClient::new(StoreConfig {
            base_url: "https://example.supabase.co/".to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
            page_size: 10,
        })
        .expect("client")
    }

    #[test]
    fn table_url_strips_trailing_slash() {
        assert_eq!(
            client().table_url("funding_opportunities"),
            "https://example.supabase.co/rest/v1/funding_opportunities"
        );
    }

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(parse_content_range_total(Some("0-24/3573")).unwrap(), 3573);
        assert_eq!(parse_content_range_total(Some("*/0")).unwrap(), 0);
    }

    #[test]
    fn content_range_rejects_garbage() {
        assert!(matches!(
            parse_content_range_total(Some("nonsense")),
            Err(StoreError::ContentRange(Some(_)))
        ));
        assert!(matches!(
            parse_content_range_total(None),
            Err(StoreError::ContentRange(None))
        ));
    }

    #[test]
    fn response_mode_maps_to_prefer_header() {
        assert_eq!(ResponseMode::Minimal.prefer_value(), "return=minimal");
        assert_eq!(
            ResponseMode::Representation.prefer_value(),
            "return=representation"
        );
    }
}
