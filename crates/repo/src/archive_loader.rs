use crate::expiry;
use crate::model::RepositoryIndex;
use async_trait::async_trait;
use bytes::Bytes;
use exn::ResultExt;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::instrument;
use vexcat_archive::{ArchiveKind, ArchiveStore};
use vexcat_loader::error::{ErrorKind, Result};
use vexcat_loader::{Context, Request, Sink, VexLoader};

const INDEX_FILE: &str = "index.json";

/// An opened download of the archive together with its index.
struct Snapshot {
    store: ArchiveStore,
    index: RepositoryIndex,
    expires: OffsetDateTime,
}

/// A repository published as a single archive.
///
/// The archive is downloaded to a temporary file on first use and replaced
/// wholesale once the update interval has passed since it was last
/// modified. Requests already reading from the previous download keep it
/// alive until they finish.
pub struct ArchiveLoader<D> {
    url: String,
    subdir: String,
    kind: ArchiveKind,
    interval: Duration,
    context: Context<D>,
    snapshot: Mutex<Option<Arc<Snapshot>>>,
}

/// Join an archive subdirectory and a path inside it.
fn path_to(subdir: &str, file: &str) -> String {
    let subdir = subdir.trim_matches('/');
    let file = file.trim_start_matches('/');
    if subdir.is_empty() {
        file.to_string()
    } else {
        format!("{subdir}/{file}")
    }
}

/// Write the download to disk, open it and read the index. Blocking.
fn stage(body: Bytes, kind: ArchiveKind, url: &str, index_path: &str) -> Result<(ArchiveStore, RepositoryIndex)> {
    let archive_error = || ErrorKind::Archive(url.to_string());
    let mut download = tempfile::Builder::new()
        .prefix("vexcat-archive-")
        .tempfile()
        .or_raise(archive_error)?;
    download.write_all(&body).or_raise(archive_error)?;
    let store = ArchiveStore::open_owned(download.into_temp_path(), kind).or_raise(archive_error)?;
    let Some(reader) = store.read(index_path).or_raise(archive_error)? else {
        exn::bail!(ErrorKind::Archive(format!("{url} has no {index_path}")));
    };
    let index = RepositoryIndex::from_json_reader(reader).or_raise(|| ErrorKind::Decode(format!("{url}//{index_path}")))?;
    Ok((store, index))
}

/// Read one file out of the snapshot. Blocking.
fn read_entry(snapshot: &Snapshot, inner: &str) -> Result<Bytes> {
    let archive_error = || ErrorKind::Archive(inner.to_string());
    let Some(mut reader) = snapshot.store.read(inner).or_raise(archive_error)? else {
        exn::bail!(archive_error());
    };
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer).or_raise(archive_error)?;
    Ok(Bytes::from(buffer))
}

impl<D> ArchiveLoader<D> {
    pub fn new(
        url: impl Into<String>,
        subdir: impl Into<String>,
        kind: ArchiveKind,
        interval: Duration,
        context: Context<D>,
    ) -> Self {
        Self {
            url: url.into(),
            subdir: subdir.into(),
            kind,
            interval,
            context,
            snapshot: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url, kind = %self.kind))]
    async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        let mut current = self.snapshot.lock().await;
        let now = OffsetDateTime::now_utc();
        if let Some(snapshot) = current.as_ref().filter(|snapshot| now < snapshot.expires) {
            return Ok(Arc::clone(snapshot));
        }
        let response = self.context.fetch_uncached(&self.url).await?;
        let updated = response.last_modified.unwrap_or(now);
        let (kind, url, index_path) = (self.kind, self.url.clone(), path_to(&self.subdir, INDEX_FILE));
        let (store, index) = tokio::task::spawn_blocking(move || stage(response.body, kind, &url, &index_path))
            .await
            .or_raise(|| ErrorKind::Archive(self.url.clone()))??;
        tracing::debug!(entries = store.len(), packages = index.packages.len(), "archive downloaded");
        let snapshot = Arc::new(Snapshot {
            store,
            index,
            expires: expiry(updated, self.interval),
        });
        *current = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }
}

#[async_trait]
impl<D: Send + 'static> VexLoader<D> for ArchiveLoader<D> {
    fn name(&self) -> &str {
        &self.url
    }

    #[instrument(skip_all, fields(archive = %self.url, package = %request.coordinate))]
    async fn load_vex(&self, request: &Request, sink: &Sink<D>) {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => return sink.error(err),
        };
        for package in snapshot.index.packages_for(&request.coordinate) {
            let inner = path_to(&self.subdir, &package.location);
            let reading = Arc::clone(&snapshot);
            let context = self.context.clone();
            let format = package.document_format();
            let document = tokio::task::spawn_blocking(move || {
                read_entry(&reading, &inner).and_then(|body| context.decode(body, &format))
            })
            .await
            .or_raise(|| ErrorKind::Archive(package.location.clone()))
            .and_then(|document| document);
            sink.emit(document);
        }
    }

    /// Delete the downloaded archive. If a request is still reading from it,
    /// the files go once that request finishes instead.
    async fn close(&self) -> Result<()> {
        let Some(snapshot) = self.snapshot.lock().await.take() else {
            return Ok(());
        };
        match Arc::try_unwrap(snapshot) {
            Ok(snapshot) => snapshot
                .store
                .close()
                .or_raise(|| ErrorKind::Archive(self.url.clone())),
            Err(_) => Ok(()),
        }
    }
}
