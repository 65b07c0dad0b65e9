//! Catalog Error Types

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A catalog entry cannot be turned into the loader that was asked for.
    #[display("configuration error: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A catalog document could not be downloaded.
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// A catalog document is not valid JSON of the expected shape.
    #[display("failed to decode {_0}")]
    Decode(#[error(not(source))] String),
    /// A repository-backed catalog's repository could not be set up.
    #[display("failed to load repository {_0}")]
    Repository(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Repository(_))
    }
}
