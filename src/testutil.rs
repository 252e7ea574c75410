//! Shared test fixtures: a scripted API client, page payload builders and
//! legacy Parquet bytes.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::json;

use crate::paginate::{ApiClient, ApiResponse, RequestSigner, SignedRequest, TransportError};

/// An [`ApiClient`] that replays scripted responses and records request
/// URLs.
pub(crate) struct FakeApiClient {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeApiClient {
    pub fn new(responses: Vec<Result<ApiResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiClient for FakeApiClient {
    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// A signer that passes requests through untouched.
pub(crate) struct NoopSigner;

impl RequestSigner for NoopSigner {
    fn sign(&self, _method: &str, url: &str) -> SignedRequest {
        SignedRequest {
            url: url.to_string(),
            headers: Vec::new(),
        }
    }
}

pub(crate) fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// A 200-style JSON response with a fixed `Date` header.
pub(crate) fn ok_json(
    status: u16,
    payload: serde_json::Value,
) -> Result<ApiResponse, TransportError> {
    ok_body(status, payload.to_string().into_bytes())
}

pub(crate) fn ok_body(status: u16, body: Vec<u8>) -> Result<ApiResponse, TransportError> {
    ok_body_dated(status, body, date(2021, 3, 4))
}

pub(crate) fn ok_body_dated(
    status: u16,
    body: Vec<u8>,
    date: DateTime<Utc>,
) -> Result<ApiResponse, TransportError> {
    Ok(ApiResponse {
        status,
        date: Some(date),
        body,
    })
}

/// A user-timeline / list-statuses page: a top-level array of tweets.
pub(crate) fn timeline_page(ids: &[i64]) -> serde_json::Value {
    json!(ids
        .iter()
        .map(|id| json!({"id": id, "full_text": format!("tweet {}", id)}))
        .collect::<Vec<_>>())
}

/// A search page: tweets under a `statuses` key.
pub(crate) fn search_page(ids: &[i64]) -> serde_json::Value {
    json!({ "statuses": timeline_page(ids) })
}

/// Snappy-compressed v0 Parquet bytes with an Int64 `id` column, descending.
pub(crate) fn legacy_parquet_bytes(ids: &[i64]) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    let column = Arc::new(Int64Array::from(ids.to_vec())) as ArrayRef;
    write_parquet(schema, column)
}

/// Like [`legacy_parquet_bytes`], but ids stored as text (an old ingest bug
/// some real v0 files carry).
pub(crate) fn legacy_parquet_bytes_utf8(ids: &[&str]) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
    let column = Arc::new(StringArray::from(ids.to_vec())) as ArrayRef;
    write_parquet(schema, column)
}

fn write_parquet(schema: Arc<Schema>, column: ArrayRef) -> Vec<u8> {
    let batch = RecordBatch::try_new(schema.clone(), vec![column]).unwrap();
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut out = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut out, schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    out
}
