//! Resumable SHA-2 hash state.
//!
//! `sha2` keeps its running state private, so a hasher cannot be persisted
//! half way through a download. [`HashState`] drives the `sha2` block
//! compression functions directly and keeps the chaining value, the partial
//! block and the byte count in the open, which makes the whole state
//! serializable.
//!
//! # Snapshot layout
//!
//! ```text
//! magic (4) | chaining value, big-endian words | partial block, zero padded | length u64 BE
//! ```
//!
//! The magic is `sha\x03` for SHA-256 (108 bytes total) and `sha\x07` for
//! SHA-512 (204 bytes total). The partial block length is recovered from the
//! byte count, so restoring a snapshot reproduces the exact state reached after
//! hashing the same prefix in one pass.

use std::fmt;

use sha2::digest::consts::{U64, U128};
use sha2::digest::generic_array::GenericArray;

use crate::{Algorithm, Hasher, Result, VerificationError};

const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const SHA512_IV: [u64; 8] = [
    0x6a09e667f3bcc908,
    0xbb67ae8584caa73b,
    0x3c6ef372fe94f82b,
    0xa54ff53a5f1d36f1,
    0x510e527fade682d1,
    0x9b05688c2b3e6c1f,
    0x1f83d9abfb41bd6b,
    0x5be0cd19137e2179,
];

trait Core: Copy + fmt::Debug + Send + Sync {
    const MAGIC: &'static [u8; 4];
    const BLOCK: usize;
    const WORDS_LEN: usize;
    /// Width of the trailing bit-length field in the final padded block.
    const LEN_FIELD: usize;

    fn initial() -> Self;
    fn compress(&mut self, block: &[u8]);
    fn write_words(&self, out: &mut Vec<u8>);
    fn read_words(bytes: &[u8]) -> Self;

    fn snapshot_len() -> usize { Self::MAGIC.len() + Self::WORDS_LEN + Self::BLOCK + 8 }
}

#[derive(Clone, Copy, Debug)]
struct Sha256Core([u32; 8]);

impl Core for Sha256Core {
    const MAGIC: &'static [u8; 4] = b"sha\x03";
    const BLOCK: usize = 64;
    const WORDS_LEN: usize = 32;
    const LEN_FIELD: usize = 8;

    fn initial() -> Self { Self(SHA256_IV) }

    fn compress(&mut self, block: &[u8]) {
        let block: &GenericArray<u8, U64> = GenericArray::from_slice(block);
        sha2::compress256(&mut self.0, std::slice::from_ref(block));
    }

    fn write_words(&self, out: &mut Vec<u8>) {
        for word in self.0 {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    fn read_words(bytes: &[u8]) -> Self {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }
}

#[derive(Clone, Copy, Debug)]
struct Sha512Core([u64; 8]);

impl Core for Sha512Core {
    const MAGIC: &'static [u8; 4] = b"sha\x07";
    const BLOCK: usize = 128;
    const WORDS_LEN: usize = 64;
    const LEN_FIELD: usize = 16;

    fn initial() -> Self { Self(SHA512_IV) }

    fn compress(&mut self, block: &[u8]) {
        let block: &GenericArray<u8, U128> = GenericArray::from_slice(block);
        sha2::compress512(&mut self.0, std::slice::from_ref(block));
    }

    fn write_words(&self, out: &mut Vec<u8>) {
        for word in self.0 {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }

    fn read_words(bytes: &[u8]) -> Self {
        let mut words = [0u64; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut be = [0u8; 8];
            be.copy_from_slice(chunk);
            *word = u64::from_be_bytes(be);
        }
        Self(words)
    }
}

#[derive(Clone, Debug)]
struct Engine<C: Core> {
    core:   C,
    buffer: Vec<u8>,
    len:    u64,
}

impl<C: Core> Engine<C> {
    fn new() -> Self {
        Self {
            core:   C::initial(),
            buffer: Vec::with_capacity(C::BLOCK),
            len:    0,
        }
    }

    fn update(&mut self, mut data: &[u8]) {
        self.len = self.len.wrapping_add(data.len() as u64);

        if !self.buffer.is_empty() {
            let take = (C::BLOCK - self.buffer.len()).min(data.len());
            self.buffer.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buffer.len() < C::BLOCK {
                return;
            }
            self.core.compress(&self.buffer);
            self.buffer.clear();
        }

        let mut blocks = data.chunks_exact(C::BLOCK);
        for block in &mut blocks {
            self.core.compress(block);
        }
        self.buffer.extend_from_slice(blocks.remainder());
    }

    fn finalize(mut self) -> Vec<u8> {
        let bit_len = (self.len as u128) << 3;
        let mut tail = std::mem::take(&mut self.buffer);
        tail.push(0x80);
        while tail.len() % C::BLOCK != C::BLOCK - C::LEN_FIELD {
            tail.push(0);
        }
        tail.extend_from_slice(&bit_len.to_be_bytes()[16 - C::LEN_FIELD..]);

        for block in tail.chunks_exact(C::BLOCK) {
            self.core.compress(block);
        }

        let mut out = Vec::with_capacity(C::WORDS_LEN);
        self.core.write_words(&mut out);
        out
    }

    fn snapshot(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(C::snapshot_len());
        out.extend_from_slice(C::MAGIC);
        self.core.write_words(&mut out);
        out.extend_from_slice(&self.buffer);
        out.resize(C::MAGIC.len() + C::WORDS_LEN + C::BLOCK, 0);
        out.extend_from_slice(&self.len.to_be_bytes());
        out
    }

    fn restore(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != C::snapshot_len() {
            return Err(VerificationError::InvalidState(format!(
                "snapshot must be {} bytes, got {}",
                C::snapshot_len(),
                bytes.len()
            )));
        }
        if &bytes[..C::MAGIC.len()] != C::MAGIC {
            return Err(VerificationError::InvalidState(
                "snapshot magic does not match algorithm".to_string(),
            ));
        }

        let words_end = C::MAGIC.len() + C::WORDS_LEN;
        let block_end = words_end + C::BLOCK;
        let core = C::read_words(&bytes[C::MAGIC.len()..words_end]);

        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[block_end..]);
        let len = u64::from_be_bytes(len);

        let pending = (len % C::BLOCK as u64) as usize;
        let mut buffer = Vec::with_capacity(C::BLOCK);
        buffer.extend_from_slice(&bytes[words_end..words_end + pending]);

        Ok(Self { core, buffer, len })
    }
}

#[derive(Clone, Debug)]
enum Inner {
    Sha256(Engine<Sha256Core>),
    Sha512(Engine<Sha512Core>),
}

/// Running hash whose full internal state can be snapshotted and restored.
#[derive(Clone, Debug)]
pub struct HashState(Inner);

impl HashState {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Sha256 => Self(Inner::Sha256(Engine::new())),
            Algorithm::Sha512 => Self(Inner::Sha512(Engine::new())),
        }
    }

    /// Rebuild a state from [`HashState::snapshot`] output.
    pub fn restore(algorithm: Algorithm, snapshot: &[u8]) -> Result<Self> {
        match algorithm {
            Algorithm::Sha256 => Engine::restore(snapshot).map(|e| Self(Inner::Sha256(e))),
            Algorithm::Sha512 => Engine::restore(snapshot).map(|e| Self(Inner::Sha512(e))),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match &self.0 {
            Inner::Sha256(_) => Algorithm::Sha256,
            Inner::Sha512(_) => Algorithm::Sha512,
        }
    }

    /// Number of bytes hashed so far.
    pub fn len(&self) -> u64 {
        match &self.0 {
            Inner::Sha256(e) => e.len,
            Inner::Sha512(e) => e.len,
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn snapshot(&self) -> Vec<u8> {
        match &self.0 {
            Inner::Sha256(e) => e.snapshot(),
            Inner::Sha512(e) => e.snapshot(),
        }
    }

    /// Digest of the bytes seen so far, leaving the state untouched.
    pub fn digest(&self) -> Vec<u8> { self.clone().finalize() }
}

impl Hasher for HashState {
    fn update(&mut self, data: &[u8]) {
        match &mut self.0 {
            Inner::Sha256(e) => e.update(data),
            Inner::Sha512(e) => e.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self.0 {
            Inner::Sha256(e) => e.finalize(),
            Inner::Sha512(e) => e.finalize(),
        }
    }
}
