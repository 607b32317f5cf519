use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// A file being written next to its final destination.
///
/// Nothing is visible at the destination until [`StagedFile::commit`]. The
/// temporary file lives in the destination directory so the final rename never
/// crosses a filesystem boundary.
pub struct StagedFile {
    file:        NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    pub fn new(destination: impl AsRef<Path>) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        fs::create_dir_all(&parent).map_err(|e| Error::Write {
            path:   parent.clone(),
            source: e,
        })?;

        let file = tempfile::Builder::new()
            .prefix(".tmp.")
            .suffix(".cask")
            .tempfile_in(&parent)
            .map_err(|e| Error::Write {
                path:   parent.clone(),
                source: e,
            })?;

        Ok(Self { file, destination })
    }

    /// Path of the temporary file.
    pub fn path(&self) -> &Path { self.file.path() }

    pub fn destination(&self) -> &Path { &self.destination }

    /// Move the staged file to its destination.
    ///
    /// Fails with [`Error::AlreadyExists`] if the destination appeared in the
    /// meantime; the existing file is left untouched and the stage is removed.
    pub fn commit(self, sync: bool) -> Result<PathBuf> {
        if sync {
            self.file.as_file().sync_all().map_err(|e| Error::Write {
                path:   self.file.path().to_path_buf(),
                source: e,
            })?;
        }

        let destination = self.destination;
        match self.file.persist_noclobber(&destination) {
            Ok(_) => {
                tracing::debug!(path = %destination.display(), "committed staged file");
                Ok(destination)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(Error::AlreadyExists { path: destination })
            }
            Err(e) => Err(Error::Write {
                path:   destination,
                source: e.error,
            }),
        }
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.file.write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.file.flush() }
}
