//! The pagination engine.
//!
//! Drives one logical query to completion against a per-endpoint page
//! budget. Paginated fetches are atomic: either every page succeeds and the
//! run returns an ordered sequence of page parts, or the run returns exactly
//! one error part and every page fetched so far is discarded. To stay under
//! the fetch time budget there are no retries.

pub mod client;

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{self, CodecError};
use crate::models::{QueryKind, ResultPart};
use crate::query;

pub use client::{ApiClient, ApiResponse, BearerSigner, Credentials, HttpApiClient, RequestSigner, SignedRequest, TransportError};

/// Errors that abort a pagination run without producing an error part.
///
/// These are contract violations (the remote sent a "success" we cannot
/// interpret), not remote failures; remote failures become container parts.
#[derive(Debug, Error)]
pub enum PaginateError {
    #[error("malformed API payload: {0}")]
    MalformedPayload(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Page size and page-count ceiling for one kind of query, mirroring the
/// remote service's own result-size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    pub page_size: u32,
    pub max_pages: u32,
}

impl PagePlan {
    pub fn for_kind(kind: QueryKind) -> Self {
        match kind {
            QueryKind::Search => PagePlan {
                page_size: 100,
                max_pages: 10,
            },
            // 3,200 tweets: the service's maximum timeline depth.
            QueryKind::UserTimeline => PagePlan {
                page_size: 200,
                max_pages: 16,
            },
            QueryKind::ListsStatuses => PagePlan {
                page_size: 200,
                max_pages: 5,
            },
        }
    }
}

struct PageStats {
    n_tweets: u32,
    max_id: i64,
    min_id: i64,
}

/// Pull record count and id range out of a success payload.
///
/// `Ok(None)` means a well-formed page with zero records. Payloads missing
/// the expected shape are out of contract and fail loudly.
fn page_stats(kind: QueryKind, payload: &serde_json::Value) -> Result<Option<PageStats>, PaginateError> {
    let records = match kind {
        QueryKind::Search => payload
            .get("statuses")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                PaginateError::MalformedPayload("missing 'statuses' array".to_string())
            })?,
        QueryKind::UserTimeline | QueryKind::ListsStatuses => payload.as_array().ok_or_else(|| {
            PaginateError::MalformedPayload("expected a top-level array".to_string())
        })?,
    };

    if records.is_empty() {
        return Ok(None);
    }

    let id_of = |record: &serde_json::Value, place: &str| {
        record
            .get("id")
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| PaginateError::MalformedPayload(format!("{} record has no id", place)))
    };
    let max_id = id_of(&records[0], "first")?;
    let min_id = id_of(&records[records.len() - 1], "last")?;

    Ok(Some(PageStats {
        n_tweets: records.len() as u32,
        max_id,
        min_id,
    }))
}

/// Fetch pages of results for one logical query.
///
/// Returns an empty vec if there are no new tweets; a single
/// `API-ERROR.lz4` part if the service responds negatively to any request;
/// a single `NETWORK-ERROR.json.lz4` part if any request gets no response;
/// otherwise page parts ordered newest to oldest. Ordering is inherited
/// from the service's own per-page ordering and never re-sorted locally.
pub async fn fetch_paginated(
    api_client: &dyn ApiClient,
    signer: &dyn RequestSigner,
    api_base: &str,
    kind: QueryKind,
    params: &BTreeMap<String, String>,
) -> Result<Vec<ResultPart>, PaginateError> {
    let plan = PagePlan::for_kind(kind);
    let endpoint = kind.endpoint();
    let mut parts: Vec<ResultPart> = Vec::new();
    let mut max_id: Option<i64> = None;

    for page in 0..plan.max_pages {
        let mut page_params = params.clone();
        page_params.insert("tweet_mode".to_string(), "extended".to_string());
        page_params.insert("include_entities".to_string(), "false".to_string());
        page_params.insert("count".to_string(), plan.page_size.to_string());
        if let Some(id) = max_id {
            page_params.insert("max_id".to_string(), id.to_string());
        }
        let api_params = query::encode_params(&page_params);
        let url = format!("{}/{}?{}", api_base.trim_end_matches('/'), endpoint, api_params);
        let signed = signer.sign("GET", &url);

        let response = match api_client.get(&signed.url, &signed.headers).await {
            Ok(response) => response,
            Err(transport) => {
                warn!("{} page {}: {}", endpoint, page, transport);
                let body = codec::compress(&codec::json_bytes(&transport.to_message())?)?;
                return Ok(vec![ResultPart::network_error(
                    body,
                    Utc::now(),
                    endpoint,
                    api_params,
                )]);
            }
        };

        let mtime = response.date.unwrap_or_else(Utc::now);

        if !response.is_success() {
            warn!("{} page {}: HTTP {}", endpoint, page, response.status);
            let body = codec::compress(&response.body)?;
            return Ok(vec![ResultPart::api_error(
                body,
                mtime,
                endpoint,
                api_params,
                response.status.to_string(),
            )]);
        }

        let payload: serde_json::Value = serde_json::from_slice(&response.body)
            .map_err(|e| PaginateError::MalformedPayload(format!("invalid JSON: {}", e)))?;
        let Some(stats) = page_stats(kind, &payload)? else {
            break; // no tweets on this page: the query is exhausted
        };

        debug!(
            "{} page {}: {} tweets, ids {}..={}",
            endpoint, page, stats.n_tweets, stats.min_id, stats.max_id
        );
        parts.push(ResultPart::page(
            stats.max_id,
            codec::compress(&response.body)?,
            mtime,
            endpoint,
            api_params,
            response.status.to_string(),
            stats.n_tweets,
        ));

        // Request again below the oldest tweet seen; minus one so the next
        // page does not repeat it.
        max_id = Some(stats.min_id - 1);
    }

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::models::I18nMessage;
    use crate::testutil::{self, FakeApiClient, NoopSigner};
    use pretty_assertions::assert_eq;

    fn base_params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_pages_until_empty_page() {
        let client = FakeApiClient::new(vec![
            testutil::ok_json(200, testutil::timeline_page(&[500, 400])),
            testutil::ok_json(200, testutil::timeline_page(&[300, 200])),
            testutil::ok_json(200, testutil::timeline_page(&[])),
        ]);
        let parts = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::UserTimeline,
            &base_params(&[("screen_name", "someone")]),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name, "500.json.lz4");
        assert_eq!(parts[1].name, "300.json.lz4");
        assert_eq!(parts[0].n_tweets, Some(2));
        assert!(parts.iter().all(|p| p.http_status.as_deref() == Some("200")));

        // Cursor arithmetic: second request asks below the first page's
        // oldest id, minus one.
        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert!(!requests[0].contains("max_id"));
        assert!(requests[1].contains("max_id=399"));
        assert!(requests[2].contains("max_id=199"));
    }

    #[tokio::test]
    async fn test_page_params_carry_directives() {
        let client = FakeApiClient::new(vec![testutil::ok_json(
            200,
            testutil::timeline_page(&[]),
        )]);
        fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::UserTimeline,
            &base_params(&[("screen_name", "someone")]),
        )
        .await
        .unwrap();

        let url = &client.requests()[0];
        assert!(url.starts_with(
            "https://api.example.com/1.1/statuses/user_timeline.json?"
        ));
        assert!(url.contains("count=200"));
        assert!(url.contains("tweet_mode=extended"));
        assert!(url.contains("include_entities=false"));
        assert!(url.contains("screen_name=someone"));
    }

    #[tokio::test]
    async fn test_stops_at_page_budget() {
        let pages = (0..6)
            .map(|i| {
                let top = 1000 - i * 100;
                testutil::ok_json(200, testutil::timeline_page(&[top, top - 50]))
            })
            .collect();
        let client = FakeApiClient::new(pages);
        let parts = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::ListsStatuses, // max_pages = 5
            &base_params(&[("list_id", "123")]),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 5);
        assert_eq!(client.requests().len(), 5);
    }

    #[tokio::test]
    async fn test_api_error_discards_earlier_pages() {
        let client = FakeApiClient::new(vec![
            testutil::ok_json(200, testutil::search_page(&[500, 400])),
            testutil::ok_body(429, b"{\"errors\":[]}".to_vec()),
        ]);
        let parts = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::Search,
            &base_params(&[("q", "rust")]),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "API-ERROR.lz4");
        assert_eq!(parts[0].http_status.as_deref(), Some("429"));
        assert_eq!(parts[0].n_tweets, None);
        assert_eq!(
            codec::decompress(&parts[0].body).unwrap(),
            b"{\"errors\":[]}"
        );
        // The error part's params keep the cursor of the failed request.
        assert!(parts[0].api_params.as_deref().unwrap().contains("max_id=399"));
    }

    #[tokio::test]
    async fn test_network_error_part() {
        let client = FakeApiClient::new(vec![Err(TransportError::Timeout)]);
        let parts = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::Search,
            &base_params(&[("q", "rust")]),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "NETWORK-ERROR.json.lz4");
        assert_eq!(parts[0].http_status, None);
        let message: I18nMessage =
            serde_json::from_slice(&codec::decompress(&parts[0].body).unwrap()).unwrap();
        assert_eq!(message.id, "error.network.timeout");
    }

    #[tokio::test]
    async fn test_search_payload_shape() {
        let client = FakeApiClient::new(vec![
            testutil::ok_json(200, testutil::search_page(&[42])),
            testutil::ok_json(200, testutil::search_page(&[])),
        ]);
        let parts = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::Search,
            &base_params(&[("q", "rust")]),
        )
        .await
        .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].max_tweet_id(), Some(42));
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_loudly() {
        let client = FakeApiClient::new(vec![testutil::ok_body(200, b"not json".to_vec())]);
        let result = fetch_paginated(
            &client,
            &NoopSigner,
            "https://api.example.com",
            QueryKind::Search,
            &base_params(&[("q", "rust")]),
        )
        .await;

        assert!(matches!(result, Err(PaginateError::MalformedPayload(_))));
    }

    #[test]
    fn test_page_plans() {
        assert_eq!(
            PagePlan::for_kind(QueryKind::Search),
            PagePlan {
                page_size: 100,
                max_pages: 10
            }
        );
        assert_eq!(PagePlan::for_kind(QueryKind::UserTimeline).max_pages, 16);
        assert_eq!(PagePlan::for_kind(QueryKind::ListsStatuses).max_pages, 5);
    }
}
