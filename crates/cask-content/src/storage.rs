//! Capability traits a content backend implements.
//!
//! Each capability is its own trait so a backend only implements what it
//! supports: a read-only mirror implements [`ReadOnlyStorage`] and nothing
//! else, a full store adds [`Pusher`] (and optionally [`Deleter`]).
//!
//! Every call takes a [`CancellationToken`]. Streams are closed by dropping them.

use std::io::Read;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{ContentError, Descriptor, Result};

/// Readable content stream returned by a [`Fetcher`].
pub type ReadStream = Box<dyn Read + Send>;

/// Fetches content.
pub trait Fetcher {
    /// Fetch the full content identified by `target`, positioned at offset 0.
    ///
    /// Fails with [`ContentError::NotFound`] when no content matches.
    fn fetch(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<ReadStream>;

    /// Fetch content starting at byte `offset`.
    ///
    /// Backends that cannot serve byte ranges keep this default, which fails
    /// with [`ContentError::RangeUnsupported`].
    fn fetch_range(
        &self,
        cancel: &CancellationToken,
        target: &Descriptor,
        offset: u64,
    ) -> Result<ReadStream> {
        let _ = (cancel, target, offset);
        Err(ContentError::RangeUnsupported)
    }
}

/// Pushes content.
pub trait Pusher {
    /// Store `content`, which must match `expected`.
    ///
    /// Fails with [`ContentError::AlreadyExists`] if matching content is
    /// already stored; the stored content is left unmodified. Backends that
    /// verify report [`ContentError::SizeMismatch`] or
    /// [`ContentError::DigestMismatch`].
    fn push(
        &self,
        cancel: &CancellationToken,
        expected: &Descriptor,
        content: &mut dyn Read,
    ) -> Result<()>;
}

/// Read-only content store.
pub trait ReadOnlyStorage: Fetcher {
    /// Whether content matching `target` exists. Never mutates the store.
    fn exists(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<bool>;
}

/// Content-addressable storage where content is accessed via descriptors.
pub trait Storage: ReadOnlyStorage + Pusher {}

impl<T: ReadOnlyStorage + Pusher + ?Sized> Storage for T {}

/// Removes content.
pub trait Deleter {
    /// Remove all bytes stored for `target`; [`ContentError::NotFound`] if absent.
    fn delete(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<()>;
}

/// Adapts a closure into a [`Fetcher`].
pub struct FetcherFn<F>(pub F);

impl<F> Fetcher for FetcherFn<F>
where
    F: Fn(&CancellationToken, &Descriptor) -> Result<ReadStream>,
{
    fn fetch(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<ReadStream> {
        (self.0)(cancel, target)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for Arc<T> {
    fn fetch(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<ReadStream> {
        (**self).fetch(cancel, target)
    }

    fn fetch_range(
        &self,
        cancel: &CancellationToken,
        target: &Descriptor,
        offset: u64,
    ) -> Result<ReadStream> {
        (**self).fetch_range(cancel, target, offset)
    }
}

impl<T: ReadOnlyStorage + ?Sized> ReadOnlyStorage for Arc<T> {
    fn exists(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<bool> {
        (**self).exists(cancel, target)
    }
}

impl<T: Pusher + ?Sized> Pusher for Arc<T> {
    fn push(
        &self,
        cancel: &CancellationToken,
        expected: &Descriptor,
        content: &mut dyn Read,
    ) -> Result<()> {
        (**self).push(cancel, expected, content)
    }
}

impl<T: Deleter + ?Sized> Deleter for Arc<T> {
    fn delete(&self, cancel: &CancellationToken, target: &Descriptor) -> Result<()> {
        (**self).delete(cancel, target)
    }
}

pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(ContentError::Cancelled)
    } else {
        Ok(())
    }
}
