//! A single stored unit inside a fetch-result container.

use chrono::{DateTime, Utc};

use crate::container::format::{self, API_ERROR_NAME, LEGACY_NAME, NETWORK_ERROR_NAME, PAGE_SUFFIX};

/// One named, attributed byte blob stored in a container.
///
/// A part is one of:
///
/// * `API-ERROR.lz4` — the remote service acknowledged a request and signaled
///   failure; the body is the LZ4-compressed raw response.
/// * `NETWORK-ERROR.json.lz4` — no acknowledged response; the body is an
///   LZ4-compressed [`I18nMessage`](crate::models::I18nMessage) in JSON.
/// * `<max-tweet-id>.json.lz4` — one page of results, LZ4-compressed.
/// * `LEGACY.parquet` — the frozen v0 blob, raw Parquet bytes.
///
/// Absent attributes are `None` and are omitted from the on-disk form; they
/// are never written as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPart {
    /// Stored file name inside the container.
    pub name: String,

    /// Body bytes (compressed for pages and errors, raw for the legacy blob).
    pub body: Vec<u8>,

    /// Timestamp of the remote response, or of error detection for
    /// transport failures. Unix epoch for the legacy blob.
    pub mtime: DateTime<Utc>,

    /// Endpoint that produced this part. Absent for the legacy blob.
    pub api_endpoint: Option<String>,

    /// Request parameters, application/x-www-form-urlencoded, sorted by key.
    pub api_params: Option<String>,

    /// Remote status code. Absent for transport failures and the legacy blob.
    pub http_status: Option<String>,

    /// Number of tweets in this part, never 0. Absent for errors and the
    /// legacy blob.
    pub n_tweets: Option<u32>,
}

impl ResultPart {
    /// A data part holding one page of results, named by its newest tweet id.
    pub fn page(
        max_id: i64,
        body: Vec<u8>,
        mtime: DateTime<Utc>,
        api_endpoint: &str,
        api_params: String,
        http_status: String,
        n_tweets: u32,
    ) -> Self {
        Self {
            name: format!("{}{}", max_id, PAGE_SUFFIX),
            body,
            mtime,
            api_endpoint: Some(api_endpoint.to_string()),
            api_params: Some(api_params),
            http_status: Some(http_status),
            n_tweets: Some(n_tweets),
        }
    }

    /// An error part for a non-success response from the remote service.
    pub fn api_error(
        body: Vec<u8>,
        mtime: DateTime<Utc>,
        api_endpoint: &str,
        api_params: String,
        http_status: String,
    ) -> Self {
        Self {
            name: API_ERROR_NAME.to_string(),
            body,
            mtime,
            api_endpoint: Some(api_endpoint.to_string()),
            api_params: Some(api_params),
            http_status: Some(http_status),
            n_tweets: None,
        }
    }

    /// An error part for a request that got no acknowledged response.
    pub fn network_error(
        body: Vec<u8>,
        mtime: DateTime<Utc>,
        api_endpoint: &str,
        api_params: String,
    ) -> Self {
        Self {
            name: NETWORK_ERROR_NAME.to_string(),
            body,
            mtime,
            api_endpoint: Some(api_endpoint.to_string()),
            api_params: Some(api_params),
            http_status: None,
            n_tweets: None,
        }
    }

    /// The frozen v0 blob, carried forward as opaque bytes.
    pub fn legacy(body: Vec<u8>) -> Self {
        Self {
            name: LEGACY_NAME.to_string(),
            body,
            mtime: DateTime::UNIX_EPOCH,
            api_endpoint: None,
            api_params: None,
            http_status: None,
            n_tweets: None,
        }
    }

    /// Whether this part records a failed fetch.
    pub fn is_error(&self) -> bool {
        format::is_error_name(&self.name)
    }

    /// Whether this part is the frozen v0 blob.
    pub fn is_legacy(&self) -> bool {
        self.name == LEGACY_NAME
    }

    /// Whether this part holds a page of results.
    pub fn is_page(&self) -> bool {
        self.name.ends_with(PAGE_SUFFIX) && !self.is_error()
    }

    /// The newest tweet id in this part, parsed from its name.
    pub fn max_tweet_id(&self) -> Option<i64> {
        if !self.is_page() {
            return None;
        }
        self.name.strip_suffix(PAGE_SUFFIX)?.parse().ok()
    }
}
