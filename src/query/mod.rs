//! Query parsing and parameter normalization.
//!
//! Turns the user's query string into endpoint parameters, and normalizes
//! stored parameter strings back into a comparable query identity. All the
//! accepted query shapes are isolated in this module so endpoint changes
//! are easy to fix.

use std::collections::BTreeMap;

use regex::Regex;

use crate::models::{I18nMessage, QueryKind};

/// Keys that vary between requests of the same logical query: paging
/// directives, cursors and response-shaping options. Stripped before two
/// parameter sets are compared for identity.
const VOLATILE_KEYS: [&str; 9] = [
    "expansions",
    "tweet.fields",
    "user.fields",
    "max_results",
    "count",
    "next_token",
    "since_id",
    "include_entities",
    "tweet_mode",
];

/// A parsed query: the endpoint to call and its base parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub endpoint: &'static str,
    pub params: BTreeMap<String, String>,
}

/// Parse a user query for the given kind.
///
/// The returned parameters do not include paging or response-shaping keys;
/// the pagination engine adds those per request.
pub fn parse_query(kind: QueryKind, query: &str) -> Result<ParsedQuery, I18nMessage> {
    match kind {
        QueryKind::Search => Ok(ParsedQuery {
            endpoint: kind.endpoint(),
            params: BTreeMap::from([("q".to_string(), query.to_string())]),
        }),
        QueryKind::UserTimeline => {
            let re = Regex::new(r"^@?([a-zA-Z0-9_]{1,15})$").unwrap();
            match re.captures(query) {
                Some(caps) => Ok(ParsedQuery {
                    endpoint: kind.endpoint(),
                    params: BTreeMap::from([("screen_name".to_string(), caps[1].to_string())]),
                }),
                None => Err(I18nMessage::new("error.invalidUsername")),
            }
        }
        QueryKind::ListsStatuses => parse_list_query(query),
    }
}

/// Accepts a list URL, `owner/slug`, a numeric list id, or an id URL.
fn parse_list_query(query: &str) -> Result<ParsedQuery, I18nMessage> {
    let owner_slug_url = Regex::new(
        r"^(?:https?://)?twitter\.com/@?([a-zA-Z0-9_]{1,15})/lists/([a-zA-Z][-_a-zA-Z0-9]{0,24})$",
    )
    .unwrap();
    let owner_slug =
        Regex::new(r"^@?([a-zA-Z0-9_]{1,15})/([a-zA-Z][-_a-zA-Z0-9]{0,24})$").unwrap();
    let id_url = Regex::new(r"^(?:https?://)?twitter\.com/i/lists/(\d+)$").unwrap();
    let id_only = Regex::new(r"^(\d+)$").unwrap();

    let params = if let Some(caps) = owner_slug_url.captures(query) {
        BTreeMap::from([
            ("owner_screen_name".to_string(), caps[1].to_string()),
            ("slug".to_string(), caps[2].to_string()),
        ])
    } else if let Some(caps) = owner_slug.captures(query) {
        BTreeMap::from([
            ("owner_screen_name".to_string(), caps[1].to_string()),
            ("slug".to_string(), caps[2].to_string()),
        ])
    } else if let Some(caps) = id_url.captures(query) {
        BTreeMap::from([("list_id".to_string(), caps[1].to_string())])
    } else if let Some(caps) = id_only.captures(query) {
        BTreeMap::from([("list_id".to_string(), caps[1].to_string())])
    } else {
        return Err(I18nMessage::new("error.invalidList"));
    };

    Ok(ParsedQuery {
        endpoint: QueryKind::ListsStatuses.endpoint(),
        params,
    })
}

/// Decode an urlencoded parameter string, dropping volatile keys.
pub fn normalize_params(encoded: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .filter(|(key, _)| !key.is_empty() && !VOLATILE_KEYS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Encode parameters as application/x-www-form-urlencoded, sorted by key.
pub fn encode_params(params: &BTreeMap<String, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
