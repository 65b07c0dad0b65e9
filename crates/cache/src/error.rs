//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use vexcat_transport::error::{Error as TransportError, ErrorKind as TransportErrorKind};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying pull failed, either just now or on an earlier call
    /// whose failure is still cached.
    #[display("fetch failed: {_0}")]
    Fetch(TransportErrorKind),
    /// The fetch pool stopped handing out permits.
    #[display("fetch pool closed")]
    PoolClosed,
}

impl ErrorKind {
    /// Wrap a fresh transport failure, keeping its frame as a child.
    #[track_caller]
    pub fn fetch(err: TransportError) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Fetch(inner))
    }

    /// Returns `true` if retrying might succeed.
    ///
    /// A cached failure is only retried once its entry expires, so this
    /// reflects the underlying transport failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(inner) => inner.is_retryable(),
            Self::PoolClosed => false,
        }
    }
}
