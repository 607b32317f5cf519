use std::io;

use cask_verify::{HashState, Hasher};

use crate::error::Mismatch;
use crate::{ContentError, Descriptor, Digest, Result};

/// Running verification of one descriptor's content.
///
/// Bytes are fed through [`io::Write`] or [`Hasher::update`]. A mismatch can
/// only be known once the stream has ended: no prefix proves a content hash
/// wrong, and the byte count is only final at end-of-stream. Nothing is
/// buffered beyond the hash state.
#[derive(Clone, Debug)]
pub struct Verifier {
    expected: Digest,
    size:     u64,
    state:    HashState,
}

impl Verifier {
    /// Fails with [`ContentError::UnsupportedAlgorithm`] for digests this crate
    /// cannot compute.
    pub fn new(descriptor: &Descriptor) -> Result<Self> {
        let algorithm = descriptor.digest.hash_algorithm()?;
        Self::with_state(descriptor, HashState::new(algorithm))
    }

    /// Continue verification from a [`Verifier::snapshot`].
    pub fn resume(descriptor: &Descriptor, snapshot: &[u8]) -> Result<Self> {
        let algorithm = descriptor.digest.hash_algorithm()?;
        let state = HashState::restore(algorithm, snapshot)?;
        Self::with_state(descriptor, state)
    }

    pub fn with_state(descriptor: &Descriptor, state: HashState) -> Result<Self> {
        let algorithm = descriptor.digest.hash_algorithm()?;
        if state.algorithm() != algorithm {
            return Err(ContentError::InvalidResumeState(format!(
                "hash state is {} but descriptor uses {}",
                state.algorithm(),
                algorithm
            )));
        }
        Ok(Self {
            expected: descriptor.digest.clone(),
            size: descriptor.size,
            state,
        })
    }

    pub fn bytes_written(&self) -> u64 { self.state.len() }

    pub fn snapshot(&self) -> Vec<u8> { self.state.snapshot() }

    /// True iff the byte count and digest both match the descriptor.
    pub fn verified(&self) -> bool { self.check(self.state.digest()).is_ok() }

    /// Finalize, reporting the first check that failed.
    pub fn verify(self) -> std::result::Result<(), Mismatch> {
        let Self {
            expected,
            size,
            state,
        } = self;
        let len = state.len();
        let algorithm = state.algorithm();
        let raw = state.finalize();
        Self::compare(&expected, size, len, algorithm, &raw)
    }

    fn check(&self, raw: Vec<u8>) -> std::result::Result<(), Mismatch> {
        Self::compare(&self.expected, self.size, self.state.len(), self.state.algorithm(), &raw)
    }

    fn compare(
        expected: &Digest,
        expected_size: u64,
        len: u64,
        algorithm: cask_verify::Algorithm,
        raw: &[u8],
    ) -> std::result::Result<(), Mismatch> {
        if len != expected_size {
            return Err(Mismatch::Size {
                expected: expected_size,
                actual:   len,
            });
        }
        let actual = Digest::from_raw(algorithm, raw);
        if &actual != expected {
            return Err(Mismatch::Digest {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

impl Hasher for Verifier {
    fn update(&mut self, data: &[u8]) { self.state.update(data); }

    fn finalize(self) -> Vec<u8> { self.state.finalize() }
}

impl io::Write for Verifier {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
