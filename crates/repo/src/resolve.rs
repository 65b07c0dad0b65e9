use crate::archive_loader::ArchiveLoader;
use crate::download::download_manifest;
use crate::error::{ErrorKind, Result};
use crate::location::{Location, parse_location};
use crate::model::Repository;
use crate::url_index::UrlIndexLoader;
use exn::ResultExt;
use std::sync::Arc;
use tracing::instrument;
use vexcat_loader::{Context, LoaderHandle};

/// Newest repository spec version these loaders understand.
pub const TARGET_SPEC_VERSION: &str = "1.0";

/// Build the loader for a repository manifest.
///
/// Picks the highest version not above [`TARGET_SPEC_VERSION`] and serves
/// the first of its locations that parses; the others are not consulted.
#[instrument(skip_all, fields(repository = %manifest.name))]
pub fn resolve<D: Send + 'static>(manifest: &Repository, context: &Context<D>) -> Result<LoaderHandle<D>> {
    let Some(version) = manifest.closest_version(TARGET_SPEC_VERSION) else {
        exn::bail!(ErrorKind::Configuration(format!(
            "repository '{}' has no version at or below {TARGET_SPEC_VERSION}",
            manifest.name
        )));
    };
    let interval = version.update_interval();
    for location in &version.locations {
        match parse_location(&location.url) {
            Some(Location::Remote { root }) => {
                tracing::debug!(%root, spec_version = %version.spec_version, "serving repository from index");
                return Ok(Arc::new(UrlIndexLoader::new(&root, interval, context.clone())));
            },
            Some(Location::Archive { url, subdir, kind }) => {
                tracing::debug!(%url, %subdir, %kind, spec_version = %version.spec_version, "serving repository from archive");
                return Ok(Arc::new(ArchiveLoader::new(url, subdir, kind, interval, context.clone())));
            },
            None => tracing::debug!(url = %location.url, "skipping unsupported repository location"),
        }
    }
    exn::bail!(ErrorKind::Configuration(format!(
        "repository '{}' version {} has no usable location",
        manifest.name, version.spec_version
    )))
}

/// Download the manifest at `url` and [`resolve`] it.
pub async fn resolve_url<D: Send + 'static>(url: &str, context: &Context<D>) -> Result<LoaderHandle<D>> {
    let manifest = download_manifest(context.client.as_ref(), url).await?;
    resolve(&manifest, context).or_raise(|| ErrorKind::Configuration(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RepositoryLocation, RepositoryVersion};
    use crate::tests::context;
    use vexcat_loader::JsonDocument;
    use vexcat_transport::{MockClient, MockRoute};

    fn version(spec_version: &str, urls: &[&str]) -> RepositoryVersion {
        RepositoryVersion {
            spec_version: spec_version.to_string(),
            locations: urls.iter().map(|url| RepositoryLocation::new(*url)).collect(),
            ..RepositoryVersion::default()
        }
    }

    fn manifest(versions: Vec<RepositoryVersion>) -> Repository {
        Repository {
            name: "hub".to_string(),
            versions,
            ..Repository::default()
        }
    }

    fn resolved_name(manifest: &Repository) -> Result<String> {
        let context = context(Arc::new(MockClient::default()));
        resolve::<JsonDocument>(manifest, &context).map(|loader| loader.name().to_string())
    }

    #[test]
    fn test_picks_closest_version_and_first_usable_location() {
        let manifest = manifest(vec![
            version("0.1", &["https://old.example.com/vex"]),
            version("1.0", &["file-path", "https://example.com/hub.zip//data", "https://example.com/vex/"]),
            version("2.0", &["https://new.example.com/vex"]),
        ]);
        assert_eq!(resolved_name(&manifest).unwrap(), "https://example.com/hub.zip");
    }

    #[test]
    fn test_remote_location() {
        let manifest = manifest(vec![version("0.1", &["https://example.com/vex/"])]);
        assert_eq!(resolved_name(&manifest).unwrap(), "https://example.com/vex");
    }

    #[test]
    fn test_unusable_manifests() {
        let err = resolved_name(&manifest(vec![version("2.0", &["https://example.com/vex"])])).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));

        let err = resolved_name(&manifest(vec![version("1.0", &["/local/path", "a//b//c//d"])])).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));

        let err = resolved_name(&manifest(Vec::new())).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Configuration(_)));
    }

    #[tokio::test]
    async fn test_resolve_url() {
        let client = Arc::new(MockClient::with_routes([(
            "https://example.com/vex-repository.json",
            MockRoute::ok(r#"{"name":"hub","versions":[{"spec_version":"0.1","locations":[{"url":"https://example.com/hub.tgz"}]}]}"#),
        )]));
        let loader = resolve_url::<JsonDocument>("https://example.com/vex-repository.json", &context(client))
            .await
            .unwrap();
        assert_eq!(loader.name(), "https://example.com/hub.tgz");

        let err = resolve_url::<JsonDocument>("https://example.com/missing.json", &context(Arc::new(MockClient::default())))
            .await
            .err()
            .unwrap();
        assert!(err.is_retryable());
    }
}
