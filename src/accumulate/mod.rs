//! Fetch-cycle orchestration.
//!
//! One fetch cycle reads the previous container (if any), decides whether to
//! continue accumulating or start fresh, runs the pagination engine, merges
//! old and new parts under a row budget, and publishes the result. Rules:
//!
//! * A request that changes no outcome changes no bytes: zero new tweets, or
//!   the same error as last time, republish the prior container verbatim.
//! * When parameters change, accumulation resets; a stale cursor from a
//!   different query must never leak into the new one. The exception is a
//!   bare legacy blob, whose parameters are unknowable and assumed current.
//! * The row budget is a circular buffer: once new parts exhaust it, the
//!   oldest stored parts simply are not copied forward. The stored total may
//!   exceed the budget by at most one page.
//! * Every fetch cycle succeeds. Local validation problems are returned as
//!   outcome errors before any network activity; remote and transport
//!   failures are recorded inside the container.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{self, CodecError};
use crate::container::writer::{publish_copy, publish_empty};
use crate::container::{ContainerError, ContainerWriter, ResultFile};
use crate::models::{FetchOutcome, I18nMessage, QueryKind};
use crate::paginate::{self, ApiClient, Credentials, PaginateError};
use crate::query;

/// Default row budget: the circular buffer over stored tweets.
pub const DEFAULT_MAX_ROWS: u32 = 100_000;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Errors that abort a fetch cycle outright.
///
/// These are all environment or contract failures (disk, malformed remote
/// payloads); anything the user can fix shows up as outcome errors instead.
#[derive(Debug, Error)]
pub enum FetchCycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    #[error("pagination error: {0}")]
    Paginate(#[from] PaginateError),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// What the user asked for.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub kind: QueryKind,
    pub query: String,
    /// Keep previously fetched tweets and only fetch newer ones.
    pub accumulate: bool,
}

/// Runs fetch cycles against one API client.
pub struct FetchCycle<'a> {
    client: &'a dyn ApiClient,
    api_base: String,
    max_rows: u32,
}

impl<'a> FetchCycle<'a> {
    pub fn new(client: &'a dyn ApiClient) -> Self {
        Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Override the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Override the row budget.
    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Run one fetch cycle and publish its container at `output_path`.
    ///
    /// `last` is the previous cycle's outcome for the same workflow step,
    /// if any; its container is the accumulation base.
    pub async fn run(
        &self,
        request: &FetchRequest,
        credentials: Option<&Credentials>,
        last: Option<&FetchOutcome>,
        output_path: &Path,
    ) -> Result<FetchOutcome, FetchCycleError> {
        let query_text = request.query.trim();

        if query_text.is_empty() && credentials.is_none() {
            // Nothing configured yet; not worth an error, and not worth a
            // new version either.
            publish_empty(output_path)?;
            return Ok(FetchOutcome::ok(output_path));
        }
        if query_text.is_empty() {
            publish_empty(output_path)?;
            return Ok(FetchOutcome::with_errors(
                output_path,
                vec![I18nMessage::new("error.noQuery")],
            ));
        }
        let credentials = match credentials {
            Some(credentials) => credentials,
            None => {
                publish_empty(output_path)?;
                return Ok(FetchOutcome::with_errors(
                    output_path,
                    vec![I18nMessage::new("error.noCredentials")],
                ));
            }
        };
        let parsed = match query::parse_query(request.kind, query_text) {
            Ok(parsed) => parsed,
            Err(message) => {
                publish_empty(output_path)?;
                return Ok(FetchOutcome::with_errors(output_path, vec![message]));
            }
        };

        let prior = if request.accumulate {
            self.usable_prior(last, &parsed)?
        } else {
            None
        };

        let mut params = parsed.params.clone();
        if let Some(prior) = &prior {
            if let Some(since_id) = prior.newest_id()? {
                debug!("Continuing accumulation above tweet {}", since_id);
                params.insert("since_id".to_string(), since_id.to_string());
            }
        }

        let signer = credentials.signer();
        let new_parts = paginate::fetch_paginated(
            self.client,
            &signer,
            &self.api_base,
            request.kind,
            &params,
        )
        .await?;

        if let Some(prior) = &prior {
            if new_parts.is_empty() {
                info!("No new tweets; keeping prior container unchanged");
                publish_copy(prior.path(), output_path)?;
                return Ok(FetchOutcome::with_errors(output_path, prior_errors(last)));
            }
            if new_parts.len() == 1 && new_parts[0].is_error() {
                if let Some(prior_error) = prior.leading_error()? {
                    let new_error = &new_parts[0];
                    if new_error.name == prior_error.name
                        && new_error.http_status == prior_error.http_status
                        && codec::decompress(&new_error.body)?
                            == codec::decompress(&prior_error.body)?
                    {
                        info!("Same error as last fetch; keeping prior container unchanged");
                        publish_copy(prior.path(), output_path)?;
                        return Ok(FetchOutcome::with_errors(output_path, prior_errors(last)));
                    }
                }
            }
        }

        if prior.is_none() && new_parts.is_empty() {
            // "Fetched and found nothing" is stored exactly like "never
            // fetched": a zero-byte file, not a zero-part archive.
            publish_empty(output_path)?;
            return Ok(FetchOutcome::ok(output_path));
        }

        let mut writer = ContainerWriter::create(output_path)?;
        let mut remaining = self.max_rows as i64;
        for part in &new_parts {
            writer.append(part)?;
            if let Some(n) = part.n_tweets {
                remaining -= n as i64;
                if remaining <= 0 {
                    break;
                }
            }
        }
        if let Some(prior) = &prior {
            if remaining > 0 {
                for part in prior.parts()? {
                    let part = part?;
                    if part.is_error() {
                        // This run either recorded a fresh error or none at
                        // all; a stale one must not survive.
                        continue;
                    }
                    writer.append(&part)?;
                    if let Some(n) = part.n_tweets {
                        remaining -= n as i64;
                        if remaining <= 0 {
                            break;
                        }
                    }
                }
            }
        }
        writer.publish()?;

        info!(
            "Fetched {} new part(s) for {} query '{}'",
            new_parts.len(),
            request.kind,
            query_text
        );
        Ok(FetchOutcome::ok(output_path))
    }

    /// The prior container, if it exists, is non-empty, and answers the same
    /// query we are about to run.
    fn usable_prior(
        &self,
        last: Option<&FetchOutcome>,
        parsed: &query::ParsedQuery,
    ) -> Result<Option<ResultFile>, FetchCycleError> {
        let Some(last) = last else {
            return Ok(None);
        };
        match std::fs::metadata(&last.path) {
            Ok(meta) if meta.len() > 0 => {}
            _ => return Ok(None),
        }
        let candidate = ResultFile::new(&last.path);
        match candidate.query_identity()? {
            // A bare legacy blob predates parameter tracking; assume it was
            // fetched with today's parameters.
            None => Ok(Some(candidate)),
            Some(identity)
                if identity.endpoint == parsed.endpoint && identity.params == parsed.params =>
            {
                Ok(Some(candidate))
            }
            Some(identity) => {
                info!(
                    "Query changed ({} -> {}); discarding prior accumulation",
                    identity.endpoint, parsed.endpoint
                );
                Ok(None)
            }
        }
    }
}

fn prior_errors(last: Option<&FetchOutcome>) -> Vec<I18nMessage> {
    last.map(|outcome| outcome.errors.clone()).unwrap_or_default()
}
