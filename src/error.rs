//! Client Error Types

use derive_more::{Display, Error};

/// A client error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings could not be turned into a client.
    #[display("configuration error: {_0}")]
    Configuration(#[error(not(source))] String),
    /// A configured catalog document could not be loaded.
    #[display("failed to load catalog {_0}")]
    Catalog(#[error(not(source))] String),
    /// A configured repository could not be resolved.
    #[display("failed to resolve repository {_0}")]
    Repository(#[error(not(source))] String),
    /// At least one loader failed to release its resources.
    #[display("failed to close loaders")]
    Close,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Catalog(_) | Self::Repository(_))
    }
}
