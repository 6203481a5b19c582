use thiserror::Error;

/// Token metadata could not be decoded. Callers fall back to
/// [`TokenMetadata::default`](crate::metadata::TokenMetadata).
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid metadata hex: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
    #[error("invalid metadata encoding: {0}")]
    Abi(#[from] alloy::sol_types::Error),
}

/// A retrieval collaborator failed. Never propagated into the core: the
/// fetch layer turns it into a sentinel value for the affected key.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("request timeout after {secs} seconds")]
    Timeout { secs: u64 },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

impl RetrievalError {
    /// Worth retrying: transport failures, timeouts, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Database(_) | Self::Backend(_) => false,
        }
    }
}

/// A numeric field (network id, count, balance) did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {field}: {value:?}")]
pub struct MalformedRowError {
    pub field: &'static str,
    pub value: String,
}

impl MalformedRowError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}
