use crate::download::download_index;
use crate::model::RepositoryIndex;
use crate::expiry;
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::instrument;
use vexcat_cache::CacheKey;
use vexcat_loader::error::{ErrorKind, Result};
use vexcat_loader::{Context, Request, Sink, VexLoader};

struct IndexSnapshot {
    index: Arc<RepositoryIndex>,
    expires: OffsetDateTime,
}

/// A repository served as plain files over HTTP.
///
/// `index.json` is kept in memory and downloaded again once the update
/// interval has passed since it was last updated. Package documents go
/// through the shared package cache with the same interval.
pub struct UrlIndexLoader<D> {
    root: String,
    index_url: String,
    interval: Duration,
    context: Context<D>,
    index: Mutex<Option<IndexSnapshot>>,
}

impl<D> UrlIndexLoader<D> {
    pub fn new(root: &str, interval: Duration, context: Context<D>) -> Self {
        let root = root.trim_end_matches('/').to_string();
        Self {
            index_url: format!("{root}/index.json"),
            root,
            interval,
            context,
            index: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    fn file_url(&self, location: &str) -> String {
        format!("{}/{}", self.root, location.trim_start_matches('/'))
    }

    /// The current index, downloading it first when missing or stale.
    /// Holding the lock across the download keeps refreshes single-flight.
    async fn index(&self) -> Result<Arc<RepositoryIndex>> {
        let mut current = self.index.lock().await;
        let now = OffsetDateTime::now_utc();
        if let Some(snapshot) = current.as_ref().filter(|snapshot| now < snapshot.expires) {
            return Ok(Arc::clone(&snapshot.index));
        }
        let (index, updated) = download_index(self.context.client.as_ref(), &self.index_url)
            .await
            .or_raise(|| ErrorKind::Fetch(self.index_url.clone()))?;
        let index = Arc::new(index);
        *current = Some(IndexSnapshot {
            index: Arc::clone(&index),
            expires: expiry(updated, self.interval),
        });
        Ok(index)
    }

    /// Forget the in-memory index so the next request downloads it again.
    pub async fn flush(&self) {
        self.index.lock().await.take();
    }
}

#[async_trait]
impl<D: Send + 'static> VexLoader<D> for UrlIndexLoader<D> {
    fn name(&self) -> &str {
        &self.root
    }

    #[instrument(skip_all, fields(repository = %self.root, package = %request.coordinate))]
    async fn load_vex(&self, request: &Request, sink: &Sink<D>) {
        let index = match self.index().await {
            Ok(index) => index,
            Err(err) => return sink.error(err),
        };
        for package in index.packages_for(&request.coordinate) {
            let url = self.file_url(&package.location);
            let key = CacheKey::new(&request.coordinate, url.as_str());
            let result = match self.context.fetch_cached(key, &url, self.interval).await {
                Ok(body) => self.context.decode(body, &package.document_format()),
                Err(err) => Err(err),
            };
            sink.emit(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::context;
    use vexcat_loader::{CollectOptions, JsonDocument, LoaderHandle, PackageCoordinate, collect};
    use vexcat_transport::{MockClient, MockRoute};

    const ROOT: &str = "https://example.com/vex/";
    const INDEX_URL: &str = "https://example.com/vex/index.json";
    const INDEX: &str = r#"{"packages": [
        {"id": "pkg:npm/left-pad", "location": "/npm/left-pad.json"},
        {"id": "pkg:pypi/requests", "location": "pypi/requests.json", "format": "csaf"},
        {"id": "pkg:cargo/gone", "location": "cargo/gone.json"}
    ]}"#;

    fn client() -> Arc<MockClient> {
        Arc::new(MockClient::with_routes([
            (INDEX_URL, MockRoute::ok(INDEX)),
            ("https://example.com/vex/npm/left-pad.json", MockRoute::ok(r#"{"id":"left-pad"}"#)),
            ("https://example.com/vex/pypi/requests.json", MockRoute::ok(r#"{"id":"requests"}"#)),
        ]))
    }

    async fn run(loader: &LoaderHandle<JsonDocument>, purl: &str) -> (Vec<JsonDocument>, usize) {
        let request = Request::new(purl.parse::<PackageCoordinate>().unwrap(), "CVE-2024-1");
        let collected = collect(&request, std::slice::from_ref(loader), &CollectOptions::default()).await;
        (collected.documents, collected.errors.len())
    }

    #[tokio::test]
    async fn test_serves_matching_packages() {
        let client = client();
        let loader: LoaderHandle<JsonDocument> =
            Arc::new(UrlIndexLoader::new(ROOT, Duration::from_secs(3_600), context(client.clone())));
        assert_eq!(loader.name(), "https://example.com/vex");

        let (documents, errors) = run(&loader, "pkg:npm/left-pad@1.3.0").await;
        assert_eq!(errors, 0);
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].standard, "openvex");
        assert_eq!(documents[0].body["id"], "left-pad");

        let (documents, _) = run(&loader, "pkg:pypi/requests@2.31.0").await;
        assert_eq!(documents[0].standard, "csaf");

        let (documents, errors) = run(&loader, "pkg:npm/right-pad@1.0.0").await;
        assert!(documents.is_empty());
        assert_eq!(errors, 0);

        assert_eq!(client.requests(INDEX_URL).await, 1, "index is fetched once per interval");
    }

    #[tokio::test]
    async fn test_missing_package_file_is_an_error() {
        let loader: LoaderHandle<JsonDocument> =
            Arc::new(UrlIndexLoader::new(ROOT, Duration::from_secs(3_600), context(client())));
        let (documents, errors) = run(&loader, "pkg:cargo/gone@0.1.0").await;
        assert!(documents.is_empty());
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_index_failure_is_one_error() {
        let client = Arc::new(MockClient::default());
        let loader: LoaderHandle<JsonDocument> =
            Arc::new(UrlIndexLoader::new(ROOT, Duration::from_secs(3_600), context(client.clone())));
        let (_, errors) = run(&loader, "pkg:npm/left-pad@1.3.0").await;
        assert_eq!(errors, 1);
        // Failed index downloads are not remembered.
        let (_, errors) = run(&loader, "pkg:npm/left-pad@1.3.0").await;
        assert_eq!(errors, 1);
        assert_eq!(client.requests(INDEX_URL).await, 2);
    }

    #[tokio::test]
    async fn test_stale_index_is_refreshed() {
        let client = Arc::new(MockClient::with_routes([(
            INDEX_URL,
            MockRoute::ok(r#"{"updated_at": "2001-01-01T00:00:00Z", "packages": []}"#),
        )]));
        let loader = UrlIndexLoader::new(ROOT, Duration::from_secs(3_600), context(client.clone()));
        loader.index().await.unwrap();
        loader.index().await.unwrap();
        assert_eq!(client.requests(INDEX_URL).await, 2);

        loader.flush().await;
        client.route(INDEX_URL, MockRoute::ok(r#"{"packages": []}"#)).await;
        loader.index().await.unwrap();
        loader.index().await.unwrap();
        assert_eq!(client.requests(INDEX_URL).await, 3);
    }
}
