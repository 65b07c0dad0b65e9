//! Per-package fetch cache.
//!
//! Loaders never talk to the network directly for document bodies; they hand
//! the cache a lazy [`Pull`] and get bytes back. The cache decides whether the
//! pull needs to run:
//!
//! - **First access** for a key, or once the stored expiry has passed, the
//!   pull runs and its outcome replaces the entry. Expiry becomes the
//!   response's `Last-Modified` (or now) plus the update interval.
//! - **Failures are cached** exactly like successes and replayed until the
//!   entry expires.
//! - **Single flight**: entry creation is insert-if-absent, and every entry
//!   has its own lock, so at most one pull per key is in flight while
//!   unrelated keys refresh in parallel.
//!
//! [`MemoryCache`] implements this policy; [`NoCache`] always pulls and keeps
//! nothing. Both share an injected [`FetchPool`] that can cap how many pulls
//! run at once.

pub mod error;
mod memory;
mod none;
mod pool;

pub use self::memory::MemoryCache;
pub use self::none::NoCache;
pub use self::pool::FetchPool;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use vexcat_transport::Response;

/// A lazily evaluated fetch; nothing happens until the cache polls it.
pub type Pull<'a> = BoxFuture<'a, vexcat_transport::error::Result<Response>>;

/// Shared handle to a cache.
pub type CacheHandle = Arc<dyn PackageCache>;

/// Identity of a cache entry.
///
/// The canonical package coordinate string, qualified by the source the
/// bytes come from so that catalogs sharing one cache never collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    coordinate: String,
    source: String,
}

impl CacheKey {
    pub fn new(coordinate: impl Display, source: impl Into<String>) -> Self {
        Self {
            coordinate: coordinate.to_string(),
            source: source.into(),
        }
    }

    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} <{}>", self.coordinate, self.source)
    }
}

/// A fetch cache keyed by package.
#[async_trait]
pub trait PackageCache: Send + Sync {
    /// Return the bytes for `key`, running `pull` only when the entry is
    /// missing or expired.
    async fn fetch(&self, key: CacheKey, interval: Duration, pull: Pull<'_>) -> Result<Bytes>;

    /// Forget every entry for one package coordinate, whatever its source.
    fn flush_package(&self, coordinate: &str);

    /// Forget everything.
    fn flush_all(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_includes_source() {
        let key = CacheKey::new("pkg:npm/left-pad@1.3.0", "https://example.com/vex.json");
        assert_eq!(key.to_string(), "pkg:npm/left-pad@1.3.0 <https://example.com/vex.json>");
        assert_eq!(key.coordinate(), "pkg:npm/left-pad@1.3.0");
        assert_eq!(key.source(), "https://example.com/vex.json");
    }
}
