use std::fmt;
use std::str::FromStr;

use crate::{Sha256Hasher, Sha512Hasher, VerificationError};

/// Digest algorithms with a resumable hash state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Length of the finalized digest in bytes.
    pub fn digest_len(&self) -> usize {
        match self {
            Algorithm::Sha256 => 32,
            Algorithm::Sha512 => 64,
        }
    }

    /// Length of one compression block in bytes.
    pub fn block_len(&self) -> usize {
        match self {
            Algorithm::Sha256 => 64,
            Algorithm::Sha512 => 128,
        }
    }

    /// One-shot digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Algorithm::Sha256 => Sha256Hasher::digest(data),
            Algorithm::Sha512 => Sha512Hasher::digest(data),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Algorithm {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(VerificationError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}
