//! VEX repositories.
//!
//! A repository publishes a manifest listing the spec versions it
//! implements and, for each, where its data lives. [`resolve`] picks the
//! newest version this crate understands and turns its first usable
//! location into a loader:
//!
//! - a plain URL is served by [`UrlIndexLoader`], which reads
//!   `index.json` and fetches package documents one by one;
//! - an archive URL (optionally followed by `//subdir`) is served by
//!   [`ArchiveLoader`], which downloads the whole archive and reads from it
//!   locally.
//!
//! Both refresh on the version's `update_interval` (24 hours by default).

mod archive_loader;
mod download;
pub mod error;
mod interval;
mod location;
mod model;
mod resolve;
mod url_index;

pub use self::archive_loader::ArchiveLoader;
pub use self::download::{download_index, download_manifest};
pub use self::interval::{DEFAULT_UPDATE_INTERVAL, parse_interval};
pub use self::location::{Location, parse_location};
pub use self::model::{
    IndexPackage, Repository, RepositoryIndex, RepositoryLocation, RepositoryVersion, compare_spec_versions,
};
pub use self::resolve::{TARGET_SPEC_VERSION, resolve, resolve_url};
pub use self::url_index::UrlIndexLoader;
use std::time::Duration;
use time::{Date, OffsetDateTime};

/// `updated + interval`, saturating far in the future.
pub(crate) fn expiry(updated: OffsetDateTime, interval: Duration) -> OffsetDateTime {
    time::Duration::try_from(interval)
        .ok()
        .and_then(|interval| updated.checked_add(interval))
        .unwrap_or_else(|| Date::MAX.midnight().assume_utc())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use vexcat_cache::{FetchPool, MemoryCache};
    use vexcat_loader::{Context, JsonDocument, JsonInterpreter};
    use vexcat_transport::MockClient;

    pub(crate) fn context(client: Arc<MockClient>) -> Context<JsonDocument> {
        Context::new(client, Arc::new(MemoryCache::new(FetchPool::default())), Arc::new(JsonInterpreter))
    }
}
