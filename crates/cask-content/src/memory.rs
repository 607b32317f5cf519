use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, PoisonError, RwLock};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::fetch::read_verified;
use crate::storage::ensure_active;
use crate::{
    ContentError, Deleter, Descriptor, Digest, Fetcher, Pusher, ReadOnlyStorage, ReadStream,
    Result,
};

type Key = (Digest, u64);

/// In-memory [`Storage`](crate::Storage) keyed by digest and size.
///
/// Pushes are verified before anything becomes visible. Safe to share between
/// threads behind an [`Arc`].
#[derive(Default, Debug)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Key, Arc<[u8]>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.blobs.read().unwrap_or_else(PoisonError::into_inner).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn key(target: &Descriptor) -> Key { (target.digest.clone(), target.size) }

    fn get(&self, target: &Descriptor) -> Result<Arc<[u8]>> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs
            .get(&Self::key(target))
            .cloned()
            .ok_or_else(|| ContentError::NotFound(target.digest.clone()))
    }
}

impl Fetcher for MemoryStore {
    fn fetch(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<ReadStream> {
        ensure_active(cancel)?;
        let data = self.get(target)?;
        debug!(digest = %target.digest, "memory fetch");
        Ok(Box::new(Cursor::new(data)))
    }

    fn fetch_range(
        &self,
        cancel: &CancellationToken,
        target: &Descriptor,
        offset: u64,
    ) -> Result<ReadStream> {
        ensure_active(cancel)?;
        let data = self.get(target)?;
        if offset > target.size {
            return Err(ContentError::InvalidRange {
                offset,
                size: target.size,
            });
        }
        debug!(digest = %target.digest, offset, "memory range fetch");
        let mut cursor = Cursor::new(data);
        cursor.set_position(offset);
        Ok(Box::new(cursor))
    }
}

impl ReadOnlyStorage for MemoryStore {
    fn exists(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<bool> {
        ensure_active(cancel)?;
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.contains_key(&Self::key(target)))
    }
}

impl Pusher for MemoryStore {
    fn push(
        &self,
        cancel: &CancellationToken,
        expected: &Descriptor,
        content: &mut dyn Read,
    ) -> Result<()> {
        ensure_active(cancel)?;
        let key = Self::key(expected);
        if self.blobs.read().unwrap_or_else(PoisonError::into_inner).contains_key(&key) {
            return Err(ContentError::AlreadyExists(expected.digest.clone()));
        }

        let (data, verifier) = read_verified(content, cancel, expected)?;
        verifier.verify().map_err(ContentError::from)?;

        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        if blobs.contains_key(&key) {
            return Err(ContentError::AlreadyExists(expected.digest.clone()));
        }
        blobs.insert(key, data.into());
        debug!(digest = %expected.digest, size = expected.size, "memory push");
        Ok(())
    }
}

impl Deleter for MemoryStore {
    fn delete(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<()> {
        ensure_active(cancel)?;
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        match blobs.remove(&Self::key(target)) {
            Some(_) => {
                debug!(digest = %target.digest, "memory delete");
                Ok(())
            }
            None => Err(ContentError::NotFound(target.digest.clone())),
        }
    }
}
