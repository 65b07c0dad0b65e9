//! Loader Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. These are the errors loaders push
//! onto the collection sink; they never abort sibling loaders.

use derive_more::{Display, Error};
use vexcat_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};

/// A loader error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A purl string could not be parsed.
    #[display("invalid package coordinate: {_0}")]
    InvalidCoordinate(#[error(not(source))] String),
    /// Retrieving bytes from a source failed (possibly a cached failure).
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// A descriptor, manifest or index could not be decoded.
    #[display("failed to decode {_0}")]
    Decode(#[error(not(source))] String),
    /// The declared compression could not be resolved to a decode stream.
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
    /// The document interpreter rejected the body.
    #[display("could not interpret {_0} document")]
    Interpret(#[error(not(source))] String),
    /// Reading from a local archive failed.
    #[display("archive error: {_0}")]
    Archive(#[error(not(source))] String),
    /// The loader did not finish within the collection timeout.
    #[display("loader '{_0}' timed out")]
    TimedOut(#[error(not(source))] String),
    /// The request was cancelled before the loader finished.
    #[display("loader '{_0}' cancelled")]
    Cancelled(#[error(not(source))] String),
    /// The loader task panicked.
    #[display("loader '{_0}' panicked")]
    Panicked(#[error(not(source))] String),
}

impl ErrorKind {
    /// Convert a compression error, keeping the compress crate's frame as a
    /// child in this error tree.
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::TimedOut(_) | Self::Archive(_))
    }
}
