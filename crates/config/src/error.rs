//! Configuration Error Types

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file extension does not name a format we read.
    #[display("unsupported configuration format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The merged sources do not describe valid settings.
    #[display("failed to load configuration: {_0}")]
    Load(#[error(not(source))] String),
    /// A setting has the right type but an unusable value.
    #[display("invalid value for {_0}")]
    Invalid(#[error(not(source))] String),
}
