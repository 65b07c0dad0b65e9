use crate::error::{ErrorKind, Result};
use crate::{CacheKey, FetchPool, PackageCache, Pull};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::instrument;

/// A cache that stores nothing; every fetch pulls.
#[derive(Clone, Debug, Default)]
pub struct NoCache {
    pool: FetchPool,
}

impl NoCache {
    pub fn new(pool: FetchPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageCache for NoCache {
    #[instrument(skip(self, _interval, pull), fields(key = %key))]
    async fn fetch(&self, key: CacheKey, _interval: Duration, pull: Pull<'_>) -> Result<Bytes> {
        let response = self.pool.run(pull).await?.map_err(ErrorKind::fetch)?;
        Ok(response.body)
    }

    fn flush_package(&self, _coordinate: &str) {}

    fn flush_all(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vexcat_transport::Response;

    #[tokio::test]
    async fn test_always_pulls() {
        let cache = NoCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let pulls = Arc::clone(&pulls);
            let body = cache
                .fetch(
                    CacheKey::new("pkg:npm/a@1", "u"),
                    Duration::from_secs(3600),
                    Box::pin(async move {
                        pulls.fetch_add(1, Ordering::SeqCst);
                        Ok(Response::new("doc"))
                    }),
                )
                .await
                .unwrap();
            assert_eq!(body.as_ref(), b"doc");
        }
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
    }
}
