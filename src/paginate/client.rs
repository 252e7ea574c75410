//! HTTP and request-signing collaborators.
//!
//! The pagination engine talks to the network through two narrow traits so
//! the remote service can be faked in tests and the signing scheme swapped
//! without touching the engine: [`ApiClient`] performs one request,
//! [`RequestSigner`] prepares it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::models::I18nMessage;

/// An acknowledged response, whatever its status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,

    /// The response's `Date` header, if present and parsable.
    pub date: Option<DateTime<Utc>>,

    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivery failed: no acknowledged response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// The localizable description stored in a network-error part.
    pub fn to_message(&self) -> I18nMessage {
        match self {
            TransportError::Timeout => I18nMessage::new("error.network.timeout"),
            TransportError::Connect(detail) => {
                I18nMessage::new("error.network.connectionFailed").arg("detail", detail.as_str())
            }
            TransportError::Other(detail) => {
                I18nMessage::new("error.network.generic").arg("detail", detail.as_str())
            }
        }
    }
}

/// Performs a single HTTP request.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Issue one GET. Returns the acknowledged response for *any* status;
    /// errors only when no response arrived at all.
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ApiResponse, TransportError>;
}

/// A request after signing: possibly rewritten URL plus extra headers.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Prepares one outbound call for authentication. The signing scheme itself
/// is opaque to this crate.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, method: &str, url: &str) -> SignedRequest;
}

/// API credentials, held as an opaque bearer token.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The signer backed by these credentials.
    pub fn signer(&self) -> BearerSigner {
        BearerSigner {
            token: self.token.clone(),
        }
    }
}

/// Signs requests with an `Authorization: Bearer` header.
pub struct BearerSigner {
    token: String,
}

impl RequestSigner for BearerSigner {
    fn sign(&self, _method: &str, url: &str) -> SignedRequest {
        SignedRequest {
            url: url.to_string(),
            headers: vec![("Authorization".to_string(), format!("Bearer {}", self.token))],
        }
    }
}

/// Live [`ApiClient`] backed by reqwest.
pub struct HttpApiClient {
    client: Client,
}

impl HttpApiClient {
    /// Build a client with the given timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("tweetlake/0.1.0")),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        debug!("GET {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let date = response
            .headers()
            .get(reqwest::header::DATE)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(ApiResponse { status, date, body })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
