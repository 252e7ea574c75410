//! The result of one fetch cycle.

use std::path::{Path, PathBuf};

use crate::models::I18nMessage;

/// Where one fetch cycle wrote its container, plus any local validation
/// errors raised before the network was touched.
///
/// Remote and transport failures are *not* reported here; they are recorded
/// inside the container itself as error parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The published container.
    pub path: PathBuf,

    /// Local validation errors (bad query, missing credentials).
    pub errors: Vec<I18nMessage>,
}

impl FetchOutcome {
    /// An outcome with no validation errors.
    pub fn ok(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            errors: Vec::new(),
        }
    }

    /// An outcome carrying validation errors.
    pub fn with_errors(path: impl Into<PathBuf>, errors: Vec<I18nMessage>) -> Self {
        Self {
            path: path.into(),
            errors,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
