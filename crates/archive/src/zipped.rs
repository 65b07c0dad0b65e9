use crate::error::{ErrorKind, Result};
use crate::{capacity_hint, normalize};
use exn::ResultExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Mutex;
use zip::ZipArchive;

/// Zip archives have a central directory, so entries are read in place.
pub(crate) struct ZipReader {
    archive: Mutex<ZipArchive<File>>,
    /// Normalized name to the name stored in the archive.
    names: HashMap<String, String>,
}

impl ZipReader {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let open_error = || ErrorKind::Open(path.display().to_string());
        let file = File::open(path).or_raise(open_error)?;
        let archive = ZipArchive::new(file).or_raise(open_error)?;
        let names = archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(|name| (normalize(name).to_string(), name.to_string()))
            .collect();
        Ok(Self {
            archive: Mutex::new(archive),
            names,
        })
    }

    pub(crate) fn read(&self, inner: &str) -> Result<Option<Vec<u8>>> {
        let Some(name) = self.names.get(inner) else {
            return Ok(None);
        };
        let Ok(mut archive) = self.archive.lock() else {
            exn::bail!(ErrorKind::Read(inner.to_string()));
        };
        let mut entry = archive.by_name(name).or_raise(|| ErrorKind::Read(inner.to_string()))?;
        let mut buffer = Vec::with_capacity(capacity_hint(entry.size()));
        entry
            .read_to_end(&mut buffer)
            .or_raise(|| ErrorKind::Read(inner.to_string()))?;
        Ok(Some(buffer))
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}
