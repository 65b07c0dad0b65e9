use crate::error::{ErrorKind, Result};
use crate::model::{Catalog, CatalogDocument, CatalogKind};
use crate::url::UrlCatalogLoader;
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use vexcat_loader::{Context, LoaderHandle, Proxy};
use vexcat_transport::HttpClient;

/// Fetch and parse the catalog document at `url`.
#[instrument(skip(client))]
pub async fn download_catalog(client: &dyn HttpClient, url: &str) -> Result<CatalogDocument> {
    let response = client.get(url).await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
    serde_json::from_slice(&response.body).or_raise(|| ErrorKind::Decode(url.to_string()))
}

/// A loader for a `vex-repo` entry: the manifest at the entry's `url` is
/// downloaded now and resolved to a repository loader.
pub async fn repo_catalog_loader<D: Send + 'static>(catalog: &Catalog, context: &Context<D>) -> Result<LoaderHandle<D>> {
    if catalog.kind != CatalogKind::RepoBacked {
        exn::bail!(ErrorKind::Configuration(format!(
            "requires catalog kind 'vex-repo', found '{}'",
            catalog.kind
        )));
    }
    if catalog.url.is_empty() {
        exn::bail!(ErrorKind::Configuration("vex-repo catalog has no url".to_string()));
    }
    vexcat_repo::resolve_url(&catalog.url, context)
        .await
        .or_raise(|| ErrorKind::Repository(catalog.url.clone()))
}

/// Build one loader per catalog entry and present them as one.
///
/// Entries of unknown kinds are skipped. Any entry that is malformed for its
/// kind, or a repository that cannot be set up, fails the whole document.
#[instrument(skip_all, fields(catalog = %document.metadata.id, entries = document.catalogs.len()))]
pub async fn catalog_loader<D: Send + 'static>(
    document: &CatalogDocument,
    context: &Context<D>,
    interval: Duration,
) -> Result<Proxy<D>> {
    let mut loaders: Vec<LoaderHandle<D>> = Vec::with_capacity(document.catalogs.len());
    for catalog in &document.catalogs {
        let loader: LoaderHandle<D> = match &catalog.kind {
            CatalogKind::Single => Arc::new(UrlCatalogLoader::single(catalog.clone(), context.clone(), interval)?),
            CatalogKind::Template => Arc::new(UrlCatalogLoader::template(catalog.clone(), context.clone(), interval)?),
            CatalogKind::RepoBacked => repo_catalog_loader(catalog, context).await?,
            CatalogKind::Unsupported(kind) => {
                tracing::debug!(%kind, "skipping catalog of unsupported kind");
                continue;
            },
        };
        loaders.push(loader);
    }
    let name = if document.metadata.id.is_empty() {
        "catalog"
    } else {
        document.metadata.id.as_str()
    };
    Ok(Proxy::new(name, loaders))
}

/// [`download_catalog`] followed by [`catalog_loader`].
pub async fn catalog_loader_from_url<D: Send + 'static>(
    url: &str,
    context: &Context<D>,
    interval: Duration,
) -> Result<Proxy<D>> {
    let document = download_catalog(context.client.as_ref(), url).await?;
    catalog_loader(&document, context, interval).await
}
