//! Error taxonomy
//!
//! Expected steady-state conditions (duplicate insert, stale record) are not
//! errors and never reach these types; only contract violations and I/O
//! failures do.

use thiserror::Error;

/// Initial load or subscription failure. Non-fatal: the engine keeps running
/// with whatever it has.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("initial bubble snapshot failed: {0}")]
    Load(String),
    #[error("bubble insert subscription failed: {0}")]
    Subscribe(String),
}

/// Operation addressed a bubble id that is not live.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("bubble `{id}` is not live")]
pub struct NotFoundError {
    pub id: String,
}

impl NotFoundError {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Malformed record or request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record is missing `{0}`")]
    MissingField(&'static str),
    #[error("timestamp `{0}` is not RFC 3339 or epoch millis")]
    InvalidTimestamp(String),
    #[error("reflection count {0} is negative")]
    NegativeCount(i64),
    #[error("label is empty")]
    EmptyLabel,
}

/// Settings file could not be read, parsed or accepted.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings are not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Remote "create bubble" call failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CreateError {
    #[error("bubble creation rejected: {0}")]
    Rejected(String),
    #[error("bubble service unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
