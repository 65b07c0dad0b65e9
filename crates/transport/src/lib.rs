//! HTTP boundary for vexcat.
//!
//! Everything that leaves the process goes through the [`HttpClient`] trait:
//! catalog documents, repository manifests and indexes, archives and the VEX
//! documents themselves. A response carries the body plus the parsed
//! `Last-Modified` header, which the fetch cache uses as its refresh
//! baseline.
//!
//! The production implementation is [`ReqwestClient`]. An in-memory
//! [`MockClient`] is available behind the `mock` feature for other crates'
//! tests.

mod client;
pub mod error;
mod http_date;
#[cfg(feature = "mock")]
mod mock;

pub use self::client::{HttpOptions, ReqwestClient};
pub use self::http_date::parse_http_date;
#[cfg(feature = "mock")]
pub use self::mock::{MockClient, MockRoute};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use time::OffsetDateTime;

/// Shared handle to an HTTP client.
pub type HttpHandle = Arc<dyn HttpClient>;

/// A successful (200) response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub body: Bytes,
    /// Parsed `Last-Modified` header, if the server sent a valid one.
    pub last_modified: Option<OffsetDateTime>,
}

impl Response {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: OffsetDateTime) -> Self {
        self.last_modified = Some(last_modified);
        self
    }
}

/// A GET-capable client.
///
/// Any status other than 200 must be reported as
/// [`ErrorKind::Status`](crate::error::ErrorKind::Status). Implementations
/// never retry; failures surface to the caller as-is.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Name used for logging only.
    fn name(&self) -> &str;

    /// Fetch `url`, returning the whole body.
    async fn get(&self, url: &str) -> Result<Response>;
}
