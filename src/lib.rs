//! # Tweetlake
//!
//! An incremental Twitter fetcher with accumulating local storage.
//!
//! Each fetch cycle pulls pages of tweets from one Twitter API endpoint and
//! persists them in an append-oriented container: an uncompressed tar archive
//! of per-page LZ4-compressed API responses, newest first, optionally
//! followed by a frozen legacy Parquet blob from the v0 format. Repeated
//! cycles prepend new pages and evict the oldest parts once a row budget is
//! exceeded.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (result parts, localizable messages,
//!   fetch outcomes, query identity)
//! - **codec**: LZ4 frame compression and deterministic JSON encoding
//! - **container**: On-disk container format (reader, writer, sniffing)
//! - **legacy**: Frozen v0 Parquet blob support
//! - **query**: Query parsing and parameter normalization
//! - **paginate**: Pagination engine and HTTP/signing collaborators
//! - **accumulate**: Fetch-cycle orchestration (continue/reset/merge)
//! - **config**: Configuration loading and validation

pub mod accumulate;
pub mod codec;
pub mod config;
pub mod container;
pub mod legacy;
pub mod models;
pub mod paginate;
pub mod query;

#[cfg(test)]
pub(crate) mod testutil;

pub use models::*;
