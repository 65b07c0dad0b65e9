use crate::error::{ErrorKind, Result};
use crate::model::{Catalog, CatalogKind};
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;
use vexcat_cache::CacheKey;
use vexcat_loader::{Context, PackageCoordinate, Request, Sink, VexLoader};
use vexcat_pattern::Pattern;

enum Target {
    Fixed(String),
    Template(Pattern),
}

impl Target {
    fn url(&self, coordinate: &PackageCoordinate, vulnerability: &str) -> String {
        match self {
            Self::Fixed(url) => url.clone(),
            Self::Template(pattern) => pattern.evaluate(coordinate, vulnerability),
        }
    }
}

/// A `single` or `template` catalog entry.
///
/// Requests the entry's filters reject are ignored without emitting
/// anything. Otherwise the document is fetched through the package cache
/// and handed to the interpreter with the entry's declared format.
pub struct UrlCatalogLoader<D> {
    name: String,
    catalog: Catalog,
    target: Target,
    interval: Duration,
    context: Context<D>,
}

impl<D> UrlCatalogLoader<D> {
    /// A loader for a `single` entry, which must have a `url`.
    pub fn single(catalog: Catalog, context: Context<D>, interval: Duration) -> Result<Self> {
        if catalog.kind != CatalogKind::Single {
            exn::bail!(ErrorKind::Configuration(format!(
                "requires catalog kind 'single', found '{}'",
                catalog.kind
            )));
        }
        if catalog.url.is_empty() {
            exn::bail!(ErrorKind::Configuration("single catalog has no url".to_string()));
        }
        let target = Target::Fixed(catalog.url.clone());
        Ok(Self {
            name: catalog.url.clone(),
            catalog,
            target,
            interval,
            context,
        })
    }

    /// A loader for a `template` entry, which must have a `url_template`.
    pub fn template(catalog: Catalog, context: Context<D>, interval: Duration) -> Result<Self> {
        if catalog.kind != CatalogKind::Template {
            exn::bail!(ErrorKind::Configuration(format!(
                "requires catalog kind 'template', found '{}'",
                catalog.kind
            )));
        }
        let Some(pattern) = catalog.url_template.clone() else {
            exn::bail!(ErrorKind::Configuration("template catalog has no url_template".to_string()));
        };
        Ok(Self {
            name: pattern.template().to_string(),
            catalog,
            target: Target::Template(pattern),
            interval,
            context,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[async_trait]
impl<D: Send + 'static> VexLoader<D> for UrlCatalogLoader<D> {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(catalog = %self.name, package = %request.coordinate, url))]
    async fn load_vex(&self, request: &Request, sink: &Sink<D>) {
        if !self.catalog.matches(request) {
            return;
        }
        let url = self.target.url(&request.coordinate, request.vulnerability.as_str());
        tracing::Span::current().record("url", url.as_str());
        let key = CacheKey::new(&request.coordinate, url.as_str());
        let result = match self.context.fetch_cached(key, &url, self.interval).await {
            Ok(body) => self.context.decode(body, &self.catalog.file_format),
            Err(err) => Err(err),
        };
        sink.emit(result);
    }
}
