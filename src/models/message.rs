//! Localizable error messages.
//!
//! User-facing errors are never formatted to English strings inside this
//! crate. They carry a message id plus arguments so the rendering layer can
//! translate them. The JSON form (`{"id": ..., "arguments": ..., "source":
//! ...}`) is also the stored body of a network-error container part.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One argument of an [`I18nMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum I18nArgument {
    Text(String),
    Number(i64),
}

impl From<&str> for I18nArgument {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for I18nArgument {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for I18nArgument {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u16> for I18nArgument {
    fn from(n: u16) -> Self {
        Self::Number(n as i64)
    }
}

/// A structured, localizable message.
///
/// `arguments` is a sorted map so the serialized form is deterministic;
/// identical messages always encode to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18nMessage {
    /// Message id in the translation catalog, e.g. `error.noQuery`.
    pub id: String,

    /// Named interpolation arguments.
    #[serde(default)]
    pub arguments: BTreeMap<String, I18nArgument>,

    /// Originating catalog; `None` means this crate's own catalog.
    #[serde(default)]
    pub source: Option<String>,
}

impl I18nMessage {
    /// Create a message with no arguments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            arguments: BTreeMap::new(),
            source: None,
        }
    }

    /// Add one interpolation argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<I18nArgument>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}
