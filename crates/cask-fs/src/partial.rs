//! Helpers for partially downloaded files.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use crate::{Error, Result};

/// Length of the file at `path`, or `None` if it does not exist.
pub fn file_len(path: impl AsRef<Path>) -> Result<Option<u64>> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Read {
            path:   path.to_path_buf(),
            source: e,
        }),
    }
}

/// Create (or truncate) the file at `path`, creating parent directories.
pub fn create(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    ensure_parent(path)?;
    File::create(path).map_err(|e| Error::Write {
        path:   path.to_path_buf(),
        source: e,
    })
}

/// Open the file at `path` for appending, creating it if missing.
pub fn open_append(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    ensure_parent(path)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::Write {
            path:   path.to_path_buf(),
            source: e,
        })
}

/// Cut the file back to `len` bytes.
pub fn truncate(file: &File, path: impl AsRef<Path>, len: u64) -> Result<()> {
    file.set_len(len).map_err(|e| Error::Write {
        path:   path.as_ref().to_path_buf(),
        source: e,
    })
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| Error::Write {
                path:   parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_file_len_missing() {
        let dir = tempdir().unwrap();
        assert_eq!(file_len(dir.path().join("nope")).unwrap(), None);
    }

    #[test]
    fn test_append_then_truncate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("partial");

        create(&path).unwrap().write_all(b"0123").unwrap();
        let mut file = open_append(&path).unwrap();
        file.write_all(b"4567").unwrap();
        assert_eq!(file_len(&path).unwrap(), Some(8));

        truncate(&file, &path, 5).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"01234");
    }
}
