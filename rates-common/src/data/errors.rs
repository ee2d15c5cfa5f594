// rates-common/src/data/errors.rs

use std::fmt;
use thiserror::Error;

/// Error classes shared by every layer of the workspace.
///
/// Wrapping an error with extra context never changes its kind, so callers
/// (the HTTP layer in particular) classify failures by kind and not by message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed caller input (symbol list, reducer name, coin values).
    InvalidParameter,
    /// Upstream returned no usable data.
    NotFound,
    /// Network, decode or storage failure.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidParameter => "invalid param",
            ErrorKind::NotFound => "missing data",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// Storage layer errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl DataError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::Validation(_) => ErrorKind::InvalidParameter,
            DataError::Database(_) | DataError::Decode(_) => ErrorKind::Internal,
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
