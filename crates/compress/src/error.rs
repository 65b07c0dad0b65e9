//! Compression Error Types

use derive_more::{Display, Error};

/// A compression error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for compression operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A codec could not be set up.
    #[display("failed to initialize codec")]
    Codec,
    /// The payload does not decode as the declared format.
    #[display("corrupt compressed data")]
    Corrupt,
    #[display("unsupported compression: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// Known format, but this build leaves it out.
    #[display("compression not enabled in this build: {_0}")]
    Disabled(#[error(not(source))] String),
    /// Writing the output failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
