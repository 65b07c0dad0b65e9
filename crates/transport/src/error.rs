//! Transport Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Kinds are `Clone` because the fetch
//! cache stores failures and replays them until the entry expires.

use derive_more::{Display, Error};

/// A transport error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The server answered with something other than 200.
    #[display("failed to get {url}: {status}")]
    Status {
        url: String,
        status: u16,
    },
    /// Connection, TLS or timeout failure before a response arrived.
    #[display("network error fetching {url}: {reason}")]
    Network {
        url: String,
        reason: String,
    },
    /// The response started but the body could not be read.
    #[display("failed to read response body from {_0}")]
    Body(#[error(not(source))] String),
    /// The HTTP client could not be constructed.
    #[display("invalid HTTP client configuration")]
    Client,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Network { .. } | Self::Body(_) => true,
            Self::Client => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn status_display_names_url_and_code() {
        let kind = ErrorKind::Status {
            url: "https://example.com/vex.json".to_string(),
            status: 404,
        };
        assert_eq!(kind.to_string(), "failed to get https://example.com/vex.json: 404");
    }

    #[rstest]
    #[case(404, false)]
    #[case(403, false)]
    #[case(429, true)]
    #[case(500, true)]
    #[case(503, true)]
    fn status_retryable(#[case] status: u16, #[case] expected: bool) {
        let kind = ErrorKind::Status {
            url: String::new(),
            status,
        };
        assert_eq!(kind.is_retryable(), expected);
    }
}
