//! Archive Error Types

use derive_more::{Display, Error};
use vexcat_compress::error::{Error as CompressionError, ErrorKind as CompressionErrorKind};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path does not name a supported archive type.
    #[display("not a supported archive: {_0}")]
    Unsupported(#[error(not(source))] String),
    /// The archive could not be opened or its table of contents is corrupt.
    #[display("failed to open archive {_0}")]
    Open(#[error(not(source))] String),
    /// An entry was listed but could not be read back.
    #[display("failed to read {_0} from archive")]
    Read(#[error(not(source))] String),
    /// The outer compression layer of a tarball could not be removed.
    #[display("compression error: {_0}")]
    Compression(CompressionErrorKind),
    /// A temporary file could not be removed.
    #[display("failed to remove temporary file {_0}")]
    Cleanup(#[error(not(source))] String),
}

impl ErrorKind {
    #[track_caller]
    pub fn compression(err: CompressionError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Compression(inner))
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Cleanup(_))
    }
}
