use thiserror::Error;

/// Caller-supplied parameter outside the recognised set.
///
/// Only the typed parsers return this. The string-taking query helpers
/// log it and answer with an empty result instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid value '{value}' for parameter '{name}'")]
    InvalidParameter { name: &'static str, value: String },
}
