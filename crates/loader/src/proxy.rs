use crate::collect::fan_out;
use crate::error::Result;
use crate::{CollectOptions, LoaderHandle, Request, Sink, VexLoader};
use async_trait::async_trait;
use tracing::instrument;

/// Many loaders presented as one.
///
/// Every child runs as its own task for each request, exactly as under
/// [`collect()`](crate::collect()), and everything they emit is forwarded to
/// the caller's sink. Proxies nest freely.
pub struct Proxy<D> {
    name: String,
    loaders: Vec<LoaderHandle<D>>,
    options: CollectOptions,
}

impl<D> Proxy<D> {
    pub fn new(name: impl Into<String>, loaders: Vec<LoaderHandle<D>>) -> Self {
        Self {
            name: name.into(),
            loaders,
            options: CollectOptions::default(),
        }
    }

    /// Apply per-child options, e.g. a timeout for each child loader.
    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn push(&mut self, loader: LoaderHandle<D>) {
        self.loaders.push(loader);
    }

    pub fn loaders(&self) -> &[LoaderHandle<D>] {
        &self.loaders
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

#[async_trait]
impl<D: Send + 'static> VexLoader<D> for Proxy<D> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(proxy = %self.name, loaders = self.loaders.len()))]
    async fn load_vex(&self, request: &Request, sink: &Sink<D>) {
        fan_out(request, &self.loaders, sink, &self.options).await;
    }

    /// Close every child, even after a failure; the first failure is returned.
    async fn close(&self) -> Result<()> {
        let mut first = None;
        for loader in &self.loaders {
            if let Err(err) = loader.close().await {
                tracing::warn!(proxy = %self.name, loader = %loader.name(), "failed to close loader: {err}");
                first.get_or_insert(err);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::{PackageCoordinate, collect};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Leaf {
        name: &'static str,
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl VexLoader<String> for Leaf {
        fn name(&self) -> &str {
            self.name
        }

        async fn load_vex(&self, request: &Request, sink: &Sink<String>) {
            sink.document(format!("{}:{}", self.name, request.coordinate.name()));
            if self.name.ends_with('!') {
                sink.error(exn::Exn::from(ErrorKind::Fetch(self.name.to_string())));
            }
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                exn::bail!(ErrorKind::Archive(self.name.to_string()));
            }
            Ok(())
        }
    }

    fn leaf(name: &'static str, closes: &Arc<AtomicUsize>) -> LoaderHandle<String> {
        Arc::new(Leaf {
            name,
            closes: Arc::clone(closes),
            fail_close: false,
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_nested_proxies_forward_everything() {
        let closes = Arc::new(AtomicUsize::new(0));
        let inner: LoaderHandle<String> =
            Arc::new(Proxy::new("inner", vec![leaf("a", &closes), leaf("b!", &closes)]));
        let outer: LoaderHandle<String> = Arc::new(Proxy::new("outer", vec![inner, leaf("c", &closes)]));
        let request = Request::new(PackageCoordinate::new("npm", "", "left-pad", "1.3.0"), "");

        let collected = collect(&request, &[outer], &CollectOptions::default()).await;
        let mut documents = collected.documents;
        documents.sort();
        assert_eq!(documents, vec!["a:left-pad", "b!:left-pad", "c:left-pad"]);
        assert_eq!(collected.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_proxy_emits_nothing() {
        let proxy: LoaderHandle<String> = Arc::new(Proxy::new("empty", Vec::new()));
        let request = Request::new(PackageCoordinate::new("npm", "", "x", ""), "");
        let collected = collect(&request, &[proxy], &CollectOptions::default()).await;
        assert!(collected.documents.is_empty());
        assert!(collected.errors.is_empty());
    }

    #[tokio::test]
    async fn test_close_reaches_every_child() {
        let closes = Arc::new(AtomicUsize::new(0));
        let failing: LoaderHandle<String> = Arc::new(Leaf {
            name: "broken",
            closes: Arc::clone(&closes),
            fail_close: true,
        });
        let proxy = Proxy::new("p", vec![failing, leaf("ok", &closes)]);
        let err = proxy.close().await.unwrap_err();
        assert_eq!(*err, ErrorKind::Archive("broken".to_string()));
        assert_eq!(closes.load(Ordering::SeqCst), 2);
    }
}
