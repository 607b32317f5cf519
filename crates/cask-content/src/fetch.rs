//! Verified whole-content reads.

use std::io::{self, Read};

use cask_verify::VerifiedReader;
use tokio_util::sync::CancellationToken;

use crate::options::DEFAULT_BUFFER_SIZE;
use crate::storage::ensure_active;
use crate::{ContentError, Descriptor, Fetcher, Result, Verifier};

/// Upper bound on the up-front allocation for a declared size.
const MAX_PREALLOC: usize = 4 * 1024 * 1024;

/// Fetch the content described by `descriptor` and verify it against the
/// declared size and digest.
///
/// The whole content is held in memory, so this is meant for small objects
/// such as manifests and configs, not for arbitrarily large blobs. The stream
/// is dropped on every exit path.
pub fn fetch_all<F: Fetcher + ?Sized>(
    fetcher: &F,
    cancel: &CancellationToken,
    descriptor: &Descriptor,
) -> Result<Vec<u8>> {
    ensure_active(cancel)?;
    let stream = fetcher.fetch(cancel, descriptor)?;
    read_all(stream, cancel, descriptor)
}

/// Read `reader` to the end and verify it against `descriptor`.
///
/// Fails with [`ContentError::VerificationFailed`] on a size or digest mismatch.
pub fn read_all<R: Read>(
    reader: R,
    cancel: &CancellationToken,
    descriptor: &Descriptor,
) -> Result<Vec<u8>> {
    let (content, verifier) = read_verified(reader, cancel, descriptor)?;
    verifier.verify().map_err(ContentError::VerificationFailed)?;
    Ok(content)
}

/// Read at most `size + 1` bytes through a fresh verifier. One byte past the
/// declared size is enough for verification to report oversized content.
pub(crate) fn read_verified<R: Read>(
    reader: R,
    cancel: &CancellationToken,
    descriptor: &Descriptor,
) -> Result<(Vec<u8>, Verifier)> {
    let verifier = Verifier::new(descriptor)?;
    let limit = descriptor.size.saturating_add(1);
    let mut reader = VerifiedReader::new(reader.take(limit), verifier);

    let capacity = usize::try_from(descriptor.size).unwrap_or(MAX_PREALLOC).min(MAX_PREALLOC);
    let mut content = Vec::with_capacity(capacity);
    copy_chunks(&mut reader, cancel, DEFAULT_BUFFER_SIZE, |chunk| {
        content.extend_from_slice(chunk);
        Ok(())
    })?;

    let (_, verifier) = reader.into_parts();
    Ok((content, verifier))
}

/// Pump `reader` into `sink` chunk by chunk, checking `cancel` before every
/// read. Returns the number of bytes copied.
pub(crate) fn copy_chunks<R: Read + ?Sized>(
    reader: &mut R,
    cancel: &CancellationToken,
    buffer_size: usize,
    mut sink: impl FnMut(&[u8]) -> Result<()>,
) -> Result<u64> {
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;
    loop {
        ensure_active(cancel)?;
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        sink(&buf[..n])?;
        total += n as u64;
    }
}
