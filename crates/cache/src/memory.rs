use crate::error::{ErrorKind, Result};
use crate::{CacheKey, FetchPool, PackageCache, Pull};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use time::{Date, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::instrument;
use vexcat_transport::error::ErrorKind as TransportErrorKind;

/// Last outcome of a pull: bytes or the failure, never both.
type Outcome = std::result::Result<Bytes, TransportErrorKind>;

struct Entry {
    outcome: Option<Outcome>,
    expires: OffsetDateTime,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            outcome: None,
            expires: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// In-memory fetch cache.
///
/// Entries live as long as the cache unless flushed. See the
/// [crate documentation](crate) for the refresh policy.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Arc<Mutex<Entry>>>,
    pool: FetchPool,
}

impl MemoryCache {
    pub fn new(pool: FetchPool) -> Self {
        Self {
            entries: DashMap::new(),
            pool,
        }
    }

    /// Number of keys with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Existing slot for `key`, or a new one if nobody created it first.
    fn slot(&self, key: CacheKey) -> Arc<Mutex<Entry>> {
        if let Some(slot) = self.entries.get(&key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.entries.entry(key).or_default().value())
    }
}

fn expiry(baseline: OffsetDateTime, interval: Duration) -> OffsetDateTime {
    time::Duration::try_from(interval)
        .ok()
        .and_then(|interval| baseline.checked_add(interval))
        .unwrap_or_else(|| Date::MAX.midnight().assume_utc())
}

#[async_trait]
impl PackageCache for MemoryCache {
    #[instrument(skip(self, interval, pull), fields(key = %key))]
    async fn fetch(&self, key: CacheKey, interval: Duration, pull: Pull<'_>) -> Result<Bytes> {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;
        let now = OffsetDateTime::now_utc();
        if now < entry.expires {
            match &entry.outcome {
                Some(Ok(body)) => return Ok(body.clone()),
                Some(Err(kind)) => return Err(exn::Exn::from(ErrorKind::Fetch(kind.clone()))),
                None => {},
            }
        }

        tracing::debug!("pulling");
        match self.pool.run(pull).await? {
            Ok(response) => {
                entry.expires = expiry(response.last_modified.unwrap_or(now), interval);
                entry.outcome = Some(Ok(response.body.clone()));
                Ok(response.body)
            },
            Err(err) => {
                entry.expires = expiry(now, interval);
                entry.outcome = Some(Err((*err).clone()));
                Err(ErrorKind::fetch(err))
            },
        }
    }

    fn flush_package(&self, coordinate: &str) {
        self.entries.retain(|key, _| key.coordinate() != coordinate);
    }

    fn flush_all(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vexcat_transport::Response;
    use vexcat_transport::error::Error as TransportError;

    const DAY: Duration = Duration::from_secs(86_400);

    fn counting_pull(
        pulls: &Arc<AtomicUsize>,
        result: vexcat_transport::error::Result<Response>,
        delay: Duration,
    ) -> Pull<'static> {
        let pulls = Arc::clone(pulls);
        Box::pin(async move {
            pulls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            result
        })
    }

    fn not_found() -> TransportError {
        exn::Exn::from(TransportErrorKind::Status {
            url: "https://example.com/vex.json".to_string(),
            status: 404,
        })
    }

    fn key(name: &str) -> CacheKey {
        CacheKey::new(format!("pkg:npm/{name}@1.0.0"), "https://example.com/vex.json")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_fetch_pulls_once() {
        let cache = Arc::new(MemoryCache::default());
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let pull = counting_pull(&pulls, Ok(Response::new("doc")), Duration::from_millis(50));
            tasks.push(tokio::spawn(async move { cache.fetch(key("a"), DAY, pull).await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().as_ref(), b"doc");
        }
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unexpired_entry_is_served_from_memory() {
        let cache = MemoryCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let pull = counting_pull(&pulls, Ok(Response::new("doc")), Duration::ZERO);
            cache.fetch(key("a"), DAY, pull).await.unwrap();
        }
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_expired_entry_refreshes_exactly_once() {
        let cache = Arc::new(MemoryCache::default());
        let pulls = Arc::new(AtomicUsize::new(0));
        let interval = Duration::from_millis(100);
        let pull = counting_pull(&pulls, Ok(Response::new("v1")), Duration::ZERO);
        assert_eq!(cache.fetch(key("a"), interval, pull).await.unwrap().as_ref(), b"v1");

        tokio::time::sleep(Duration::from_millis(150)).await;
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let pull = counting_pull(&pulls, Ok(Response::new("v2")), Duration::from_millis(20));
            tasks.push(tokio::spawn(async move { cache.fetch(key("a"), DAY, pull).await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().as_ref(), b"v2");
        }
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_last_modified_sets_baseline() {
        let cache = MemoryCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        let stale = Response::new("old").with_last_modified(OffsetDateTime::now_utc() - time::Duration::days(2));
        cache.fetch(key("a"), DAY, counting_pull(&pulls, Ok(stale), Duration::ZERO)).await.unwrap();
        // Published two days ago with a one day interval: already expired.
        let body = cache
            .fetch(key("a"), DAY, counting_pull(&pulls, Ok(Response::new("new")), Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(body.as_ref(), b"new");
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_cached_and_replayed() {
        let cache = MemoryCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        let first = cache
            .fetch(key("a"), DAY, counting_pull(&pulls, Err(not_found()), Duration::ZERO))
            .await
            .unwrap_err();
        let second = cache
            .fetch(key("a"), DAY, counting_pull(&pulls, Ok(Response::new("doc")), Duration::ZERO))
            .await
            .unwrap_err();
        assert_eq!(*first, *second);
        assert!(matches!(&*second, ErrorKind::Fetch(TransportErrorKind::Status { status: 404, .. })));
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unrelated_keys_are_independent() {
        let cache = MemoryCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        cache.fetch(key("a"), DAY, counting_pull(&pulls, Ok(Response::new("a")), Duration::ZERO)).await.unwrap();
        let b = cache.fetch(key("b"), DAY, counting_pull(&pulls, Ok(Response::new("b")), Duration::ZERO)).await.unwrap();
        assert_eq!(b.as_ref(), b"b");
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_flush_package_and_flush_all() {
        let cache = MemoryCache::default();
        let pulls = Arc::new(AtomicUsize::new(0));
        for name in ["a", "b"] {
            cache.fetch(key(name), DAY, counting_pull(&pulls, Ok(Response::new("doc")), Duration::ZERO)).await.unwrap();
        }
        cache.flush_package("pkg:npm/a@1.0.0");
        assert_eq!(cache.len(), 1);
        cache.fetch(key("a"), DAY, counting_pull(&pulls, Ok(Response::new("doc")), Duration::ZERO)).await.unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 3);

        cache.flush_all();
        assert!(cache.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_bounded_pool_caps_concurrent_pulls() {
        let cache = Arc::new(MemoryCache::new(FetchPool::bounded(2)));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            tasks.push(tokio::spawn(async move {
                let pull: Pull<'static> = Box::pin(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(Response::new("doc"))
                });
                cache.fetch(key(&format!("p{i}")), DAY, pull).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn test_expiry_saturates() {
        let now = OffsetDateTime::now_utc();
        assert!(expiry(now, Duration::MAX) > now);
        assert_eq!(expiry(now, DAY), now + time::Duration::days(1));
    }
}
