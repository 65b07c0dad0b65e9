use crate::error::{ErrorKind, Result};
use crate::{capacity_hint, normalize};
use exn::ResultExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tar::Archive;

/// Tar streams have no index. Opening records each file's position in the
/// stream; every read re-opens the file and walks forward to it.
pub(crate) struct TarReader {
    path: PathBuf,
    /// Normalized name to ordinal position in the stream.
    entries: HashMap<String, usize>,
}

impl TarReader {
    pub(crate) fn open(path: PathBuf) -> Result<Self> {
        let open_error = || ErrorKind::Open(path.display().to_string());
        let file = File::open(&path).or_raise(open_error)?;
        let mut archive = Archive::new(BufReader::new(file));
        let mut entries = HashMap::new();
        for (ordinal, entry) in archive.entries().or_raise(open_error)?.enumerate() {
            let entry = entry.or_raise(open_error)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let name = entry.path().or_raise(open_error)?;
            entries.insert(normalize(&name.to_string_lossy()).to_string(), ordinal);
        }
        Ok(Self { path, entries })
    }

    pub(crate) fn read(&self, inner: &str) -> Result<Option<Vec<u8>>> {
        let Some(&ordinal) = self.entries.get(inner) else {
            return Ok(None);
        };
        let read_error = || ErrorKind::Read(inner.to_string());
        let file = File::open(&self.path).or_raise(read_error)?;
        let mut archive = Archive::new(BufReader::new(file));
        let Some(entry) = archive.entries().or_raise(read_error)?.nth(ordinal) else {
            exn::bail!(read_error());
        };
        let mut entry = entry.or_raise(read_error)?;
        let mut buffer = Vec::with_capacity(capacity_hint(entry.size()));
        entry.read_to_end(&mut buffer).or_raise(read_error)?;
        Ok(Some(buffer))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
