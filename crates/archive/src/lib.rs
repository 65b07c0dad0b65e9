//! Read-only access to files inside a local archive.
//!
//! An [`ArchiveStore`] is opened over a zip file or a tarball (plain, gzip,
//! bzip2 or xz) and answers "give me the file at this inner path". Inner
//! paths are compared after dropping any leading `/` or `./`, so
//! `/repo/index.json`, `./repo/index.json` and `repo/index.json` all name
//! the same entry.
//!
//! Compressed tarballs cannot be seeked, so they are decompressed once into
//! a temporary file when the store opens. A store opened with
//! [`ArchiveStore::open_owned`] also takes ownership of the archive itself
//! (typically a download) and removes it on [`close`](ArchiveStore::close)
//! or drop.

pub mod error;
mod kind;
mod tarball;
mod zipped;

pub use self::kind::ArchiveKind;
use crate::error::{ErrorKind, Result};
use crate::tarball::TarReader;
use crate::zipped::ZipReader;
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use tempfile::{NamedTempFile, TempPath};
use tracing::instrument;
use vexcat_compress::Compression;

/// Largest buffer reserved up front for an entry. Declared sizes come from
/// the archive itself and are not trusted beyond this.
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Initial capacity for reading an entry that declares `size` bytes.
pub(crate) fn capacity_hint(size: u64) -> usize {
    usize::try_from(size.min(MAX_PREALLOCATION)).unwrap_or_default()
}

/// Strip leading `/` and `./` components.
pub(crate) fn normalize(path: &str) -> &str {
    let mut path = path;
    loop {
        if let Some(rest) = path.strip_prefix("./") {
            path = rest;
        } else if let Some(rest) = path.strip_prefix('/') {
            path = rest;
        } else {
            return path;
        }
    }
}

enum Backend {
    Zip(ZipReader),
    Tar(TarReader),
}

/// An opened archive.
pub struct ArchiveStore {
    kind: ArchiveKind,
    backend: Backend,
    /// Files deleted when the store goes away.
    temporary: Vec<TempPath>,
}

impl ArchiveStore {
    /// Open `path`, guessing its kind from the file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let Some(kind) = ArchiveKind::detect(&path.to_string_lossy()) else {
            exn::bail!(ErrorKind::Unsupported(path.display().to_string()));
        };
        Self::open_as(path, kind)
    }

    /// Open `path` as an archive of the given kind.
    pub fn open_as(path: impl AsRef<Path>, kind: ArchiveKind) -> Result<Self> {
        Self::build(path.as_ref(), kind, Vec::new())
    }

    /// Open a temporary file and take ownership of it. The file is removed
    /// when the store is closed or dropped, or right away if opening fails.
    pub fn open_owned(archive: TempPath, kind: ArchiveKind) -> Result<Self> {
        let path = archive.to_path_buf();
        Self::build(&path, kind, vec![archive])
    }

    #[instrument(skip(temporary), fields(path = %path.display(), %kind, entries))]
    fn build(path: &Path, kind: ArchiveKind, mut temporary: Vec<TempPath>) -> Result<Self> {
        let backend = match kind {
            ArchiveKind::Zip => Backend::Zip(ZipReader::open(path)?),
            ArchiveKind::Tar => Backend::Tar(TarReader::open(path.to_path_buf())?),
            ArchiveKind::TarGz | ArchiveKind::TarBz2 | ArchiveKind::TarXz => {
                let plain = materialize(path, kind.outer_compression())?;
                let reader = TarReader::open(plain.to_path_buf())?;
                temporary.push(plain);
                Backend::Tar(reader)
            },
        };
        let store = Self {
            kind,
            backend,
            temporary,
        };
        tracing::Span::current().record("entries", store.len());
        Ok(store)
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// Number of regular files in the archive.
    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Zip(reader) => reader.len(),
            Backend::Tar(reader) => reader.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one file. `Ok(None)` when the archive has no such entry.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub fn read(&self, inner: &str) -> Result<Option<Box<dyn Read + Send>>> {
        let inner = normalize(inner);
        let contents = match &self.backend {
            Backend::Zip(reader) => reader.read(inner)?,
            Backend::Tar(reader) => reader.read(inner)?,
        };
        Ok(contents.map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    /// Release the archive and delete every temporary file it owns. Every
    /// file is attempted; the first failure is returned.
    pub fn close(self) -> Result<()> {
        let Self { backend, temporary, .. } = self;
        drop(backend);
        let mut outcome = Ok(());
        for path in temporary {
            let display = path.display().to_string();
            if let Err(err) = path.close().or_raise(|| ErrorKind::Cleanup(display)) {
                tracing::warn!(error = %err, "could not remove temporary archive file");
                if outcome.is_ok() {
                    outcome = Err(err);
                }
            }
        }
        outcome
    }
}

/// Decompress a tarball's outer layer into a temporary file.
fn materialize(path: &Path, compression: Compression) -> Result<TempPath> {
    let source = File::open(path).or_raise(|| ErrorKind::Open(path.display().to_string()))?;
    let mut plain = NamedTempFile::new().or_raise(|| ErrorKind::Open(path.display().to_string()))?;
    compression
        .decompress_stream(BufReader::new(source), plain.as_file_mut())
        .map_err(ErrorKind::compression)?;
    Ok(plain.into_temp_path())
}
