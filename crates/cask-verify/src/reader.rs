use std::io::{self, Read};

use crate::{Hasher, Result, VerificationError};

/// Streaming reader that hashes data as it passes through.
/// Wraps any `Read` source so bytes are touched once for hashing and copying.
pub struct VerifiedReader<R, H> {
    reader: R,
    hasher: H,
    read:   u64,
}

impl<R, H> VerifiedReader<R, H> {
    /// Create a new verified reader.
    pub fn new(reader: R, hasher: H) -> Self {
        Self {
            reader,
            hasher,
            read: 0,
        }
    }

    /// Bytes that have passed through the hasher.
    pub fn bytes_read(&self) -> u64 { self.read }

    pub fn hasher(&self) -> &H { &self.hasher }

    /// Split back into the inner reader and the hasher.
    pub fn into_parts(self) -> (R, H) { (self.reader, self.hasher) }
}

impl<R: Read, H: Hasher> Read for VerifiedReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.read += n as u64;
        }
        Ok(n)
    }
}

impl<R: Read, H: Hasher> VerifiedReader<R, H> {
    /// Finalize verification against expected hash.
    /// Returns error on mismatch.
    pub fn finish(self, expected: &[u8]) -> Result<()> {
        let actual = self.hasher.finalize();
        if actual == expected {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: expected.to_vec(),
                actual,
            })
        }
    }
}
