use std::path::PathBuf;

use thiserror::Error;

/// Failure to build a domain store from its data source.
///
/// `NotFound` and `Malformed` are kept apart so startup logs can tell a
/// missing download from a corrupt one.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("data source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("malformed data source {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LoadError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }
}

/// A raw object could not be turned into a [`Record`](crate::Record).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("object is missing a non-empty string `{0}` field")]
    MissingKey(&'static str),
}

/// Unknown domain name in configuration or on the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown domain '{0}' (expected one of: enterprise, ics, mobile)")]
pub struct UnknownDomain(pub String);
