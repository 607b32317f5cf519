//! Filesystem-backed content store.
//!
//! Blobs live at `<root>/blobs/<algorithm>/<encoded>`. A push is staged in a
//! temporary file in the same directory, verified while it is written, and
//! renamed into place only when size and digest match. Readers never see a
//! partially written blob.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use cask_fs::StagedFile;
use cask_verify::VerifiedReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::fetch::copy_chunks;
use crate::options::DEFAULT_BUFFER_SIZE;
use crate::storage::ensure_active;
use crate::{
    ContentError, Deleter, Descriptor, Digest, Fetcher, Pusher, ReadOnlyStorage, ReadStream,
    Result, Verifier,
};

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let blobs = root.join("blobs");
        fs::create_dir_all(&blobs).map_err(|e| cask_fs::Error::Write {
            path:   blobs,
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root.join("blobs").join(digest.algorithm()).join(digest.encoded())
    }

    /// Open the blob for `target`, rejecting a stored size that disagrees.
    fn open_blob(&self, target: &Descriptor) -> Result<File> {
        let path = self.blob_path(&target.digest);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ContentError::NotFound(target.digest.clone()));
            }
            Err(e) => return Err(cask_fs::Error::Read { path, source: e }.into()),
        };
        let len = file
            .metadata()
            .map_err(|e| cask_fs::Error::Read {
                path:   path.clone(),
                source: e,
            })?
            .len();
        if len != target.size {
            return Err(ContentError::NotFound(target.digest.clone()));
        }
        Ok(file)
    }
}

impl Fetcher for FileStore {
    fn fetch(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<ReadStream> {
        ensure_active(cancel)?;
        let file = self.open_blob(target)?;
        debug!(digest = %target.digest, "file fetch");
        Ok(Box::new(file))
    }

    fn fetch_range(
        &self,
        cancel: &CancellationToken,
        target: &Descriptor,
        offset: u64,
    ) -> Result<ReadStream> {
        ensure_active(cancel)?;
        let mut file = self.open_blob(target)?;
        if offset > target.size {
            return Err(ContentError::InvalidRange {
                offset,
                size: target.size,
            });
        }
        file.seek(SeekFrom::Start(offset))?;
        debug!(digest = %target.digest, offset, "file range fetch");
        Ok(Box::new(file))
    }
}

impl ReadOnlyStorage for FileStore {
    fn exists(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<bool> {
        ensure_active(cancel)?;
        let path = self.blob_path(&target.digest);
        Ok(cask_fs::partial::file_len(&path)? == Some(target.size))
    }
}

impl Pusher for FileStore {
    fn push(
        &self,
        cancel: &CancellationToken,
        expected: &Descriptor,
        content: &mut dyn Read,
    ) -> Result<()> {
        ensure_active(cancel)?;
        let path = self.blob_path(&expected.digest);
        if path.exists() {
            return Err(ContentError::AlreadyExists(expected.digest.clone()));
        }

        let verifier = Verifier::new(expected)?;
        let mut staged = StagedFile::new(&path)?;
        let limit = expected.size.saturating_add(1);
        let mut reader = VerifiedReader::new(content.take(limit), verifier);
        copy_chunks(&mut reader, cancel, DEFAULT_BUFFER_SIZE, |chunk| {
            staged.write_all(chunk)?;
            Ok(())
        })?;

        let (_, verifier) = reader.into_parts();
        verifier.verify().map_err(ContentError::from)?;

        match staged.commit(true) {
            Ok(_) => {
                info!(digest = %expected.digest, size = expected.size, "stored blob");
                Ok(())
            }
            Err(cask_fs::Error::AlreadyExists { .. }) => {
                Err(ContentError::AlreadyExists(expected.digest.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Deleter for FileStore {
    fn delete(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<()> {
        ensure_active(cancel)?;
        let path = self.blob_path(&target.digest);
        if cask_fs::partial::file_len(&path)? != Some(target.size) {
            return Err(ContentError::NotFound(target.digest.clone()));
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(digest = %target.digest, "file delete");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(target.digest.clone()))
            }
            Err(e) => Err(cask_fs::Error::Write { path, source: e }.into()),
        }
    }
}
