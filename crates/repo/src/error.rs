//! Repository Error Types

use derive_more::{Display, Error};

/// A repository error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest cannot be served by any loader this crate provides.
    #[display("configuration error: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A manifest or index could not be downloaded.
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// A manifest or index is not valid JSON of the expected shape.
    #[display("failed to decode {_0}")]
    Decode(#[error(not(source))] String),
    /// A duration string is not of the form `1h30m`.
    #[display("invalid interval: {_0:?}")]
    InvalidInterval(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
