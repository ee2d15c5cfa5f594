// provider/errors.rs

use rates_common::ErrorKind;
use thiserror::Error;

/// Error types for price provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("invalid param: {0}")]
    InvalidParameter(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("unexpected status code: {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("missing data: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            ProviderError::UpstreamStatus { status, .. } if (400..500).contains(status) => {
                ErrorKind::InvalidParameter
            }
            ProviderError::NotFound(_) => ErrorKind::NotFound,
            ProviderError::NetworkError(_)
            | ProviderError::UpstreamStatus { .. }
            | ProviderError::ParseError(_) => ErrorKind::Internal,
        }
    }
}

// Convert from common error types
impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseError(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::ParseError(err.to_string())
        } else {
            ProviderError::NetworkError(err.to_string())
        }
    }
}
