//! Resolve and aggregate VEX documents.
//!
//! [`Vexcat`] ties the workspace together: it reads [`Settings`], builds the
//! HTTP client and the fetch cache, turns every configured catalog document
//! and repository manifest into a loader, and collects from all of them at
//! once.
//!
//! ```no_run
//! # async fn example() -> vexcat::error::Result<()> {
//! use std::sync::Arc;
//! use vexcat::{JsonDocument, JsonInterpreter, Settings, Vexcat};
//!
//! let settings = Settings::load(Settings::default_path().as_deref()).map_err(|err| {
//!     exn::Exn::from(vexcat::error::ErrorKind::Configuration(err.to_string()))
//! })?;
//! let client = Vexcat::<JsonDocument>::from_settings(&settings, Arc::new(JsonInterpreter)).await?;
//! let collected = client.collect("pkg:npm/left-pad@1.3.0".parse().unwrap(), "CVE-2024-1234").await;
//! println!("{} documents, {} errors", collected.documents.len(), collected.errors.len());
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::Arc;
use tracing::instrument;
use vexcat_cache::{CacheHandle, FetchPool, MemoryCache, NoCache};
use vexcat_loader::{CollectOptions, Collected, Context, LoaderHandle, Proxy, VexLoader};
use vexcat_transport::{HttpHandle, HttpOptions, ReqwestClient};

pub use vexcat_config::Settings;
pub use vexcat_loader::{
    DocumentFormat, Interpreter, InterpreterHandle, JsonDocument, JsonInterpreter, PackageCoordinate, Request,
    VulnerabilityId,
};

/// Every configured source behind one collection entry point.
pub struct Vexcat<D> {
    context: Context<D>,
    loaders: Proxy<D>,
    options: CollectOptions,
}

impl<D: Send + 'static> Vexcat<D> {
    /// Build a client talking to the network through `reqwest`.
    pub async fn from_settings(settings: &Settings, interpreter: InterpreterHandle<D>) -> Result<Self> {
        let http = HttpOptions {
            timeout: settings.http_timeout().or_raise(|| configuration("http.timeout"))?,
            user_agent: settings.http.user_agent.clone(),
        };
        let client = ReqwestClient::new(&http).or_raise(|| configuration("http"))?;
        Self::with_client(settings, Arc::new(client), interpreter).await
    }

    /// Build a client over an existing HTTP client.
    ///
    /// Every catalog document and repository manifest is downloaded here. If
    /// any of them fails, the loaders built so far are closed and the
    /// failure is returned.
    #[instrument(skip_all, fields(catalogs = settings.catalogs.len(), repositories = settings.repositories.len()))]
    pub async fn with_client(settings: &Settings, client: HttpHandle, interpreter: InterpreterHandle<D>) -> Result<Self> {
        let interval = settings.update_interval().or_raise(|| configuration("update_interval"))?;
        let options = CollectOptions {
            loader_timeout: settings
                .loader_timeout()
                .or_raise(|| configuration("collect.loader_timeout"))?,
        };
        let pool = FetchPool::bounded(settings.cache.max_concurrent_fetches);
        let cache: CacheHandle = if settings.cache.enabled {
            Arc::new(MemoryCache::new(pool))
        } else {
            Arc::new(NoCache::new(pool))
        };
        let context = Context::new(client, cache, interpreter);

        let mut loaders = Proxy::new("vexcat", Vec::new());
        let built = build_loaders(settings, &context, interval, &mut loaders).await;
        if let Err(err) = built {
            if let Err(close) = loaders.close().await {
                tracing::warn!("failed to close loaders after setup failure: {close}");
            }
            return Err(err);
        }
        tracing::debug!(loaders = loaders.len(), "client ready");
        Ok(Self {
            context,
            loaders,
            options,
        })
    }

    /// Collect everything known about `vulnerability` in `coordinate`.
    pub async fn collect(
        &self,
        coordinate: PackageCoordinate,
        vulnerability: impl Into<VulnerabilityId>,
    ) -> Collected<D> {
        self.collect_with(&Request::new(coordinate, vulnerability)).await
    }

    /// Like [`collect`](Self::collect), for a request the caller built, for
    /// instance one carrying its own cancellation token.
    pub async fn collect_with(&self, request: &Request) -> Collected<D> {
        vexcat_loader::collect(request, self.loaders.loaders(), &self.options).await
    }

    /// Close every loader. Each one is closed even if an earlier one fails.
    pub async fn close(&self) -> Result<()> {
        self.loaders.close().await.or_raise(|| ErrorKind::Close)
    }

    pub fn context(&self) -> &Context<D> {
        &self.context
    }

    pub fn loaders(&self) -> &[LoaderHandle<D>] {
        self.loaders.loaders()
    }
}

async fn build_loaders<D: Send + 'static>(
    settings: &Settings,
    context: &Context<D>,
    interval: std::time::Duration,
    loaders: &mut Proxy<D>,
) -> Result<()> {
    for url in &settings.catalogs {
        let catalog = vexcat_catalog::catalog_loader_from_url(url, context, interval)
            .await
            .or_raise(|| ErrorKind::Catalog(url.clone()))?;
        loaders.push(Arc::new(catalog));
    }
    for url in &settings.repositories {
        let repository = vexcat_repo::resolve_url(url, context)
            .await
            .or_raise(|| ErrorKind::Repository(url.clone()))?;
        loaders.push(repository);
    }
    Ok(())
}

fn configuration(key: &str) -> ErrorKind {
    ErrorKind::Configuration(key.to_string())
}
