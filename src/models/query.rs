//! Query kinds and query identity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The three supported kinds of query, one per API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    UserTimeline,
    Search,
    ListsStatuses,
}

impl QueryKind {
    /// The API endpoint path this kind of query is served by.
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryKind::UserTimeline => "1.1/statuses/user_timeline.json",
            QueryKind::Search => "1.1/search/tweets.json",
            QueryKind::ListsStatuses => "1.1/lists/statuses.json",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::UserTimeline => "user_timeline",
            QueryKind::Search => "search",
            QueryKind::ListsStatuses => "lists_statuses",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_timeline" => Ok(QueryKind::UserTimeline),
            "search" => Ok(QueryKind::Search),
            "lists_statuses" => Ok(QueryKind::ListsStatuses),
            other => Err(format!("unknown query type '{}'", other)),
        }
    }
}

/// What a stored container's data answers: the endpoint it was fetched from
/// plus its normalized (volatile-keys-stripped) parameters.
///
/// Two fetch cycles accumulate into one continuous series only while this
/// identity is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryIdentity {
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
}

impl QueryIdentity {
    pub fn new(endpoint: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }
}
