//! Error types for cask-content.

use std::io;

use cask_verify::VerificationError;
use thiserror::Error;

use crate::Digest;

/// Which end-of-stream check a verifier failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Mismatch {
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    Size { expected: u64, actual: u64 },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    Digest { expected: Digest, actual: Digest },
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(Digest),

    #[error("content already exists: {0}")]
    AlreadyExists(Digest),

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    #[error("verification failed: {0}")]
    VerificationFailed(#[source] Mismatch),

    #[error("stale resume state: {0}")]
    StaleResumeState(String),

    #[error("invalid resume state: {0}")]
    InvalidResumeState(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("backend does not support range fetches")]
    RangeUnsupported,

    #[error("range offset {offset} is beyond content size {size}")]
    InvalidRange { offset: u64, size: u64 },

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error(transparent)]
    Fs(#[from] cask_fs::Error),

    #[error(transparent)]
    Verify(VerificationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<VerificationError> for ContentError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::UnsupportedAlgorithm(algorithm) => {
                ContentError::UnsupportedAlgorithm(algorithm)
            }
            VerificationError::InvalidState(reason) => ContentError::InvalidResumeState(reason),
            VerificationError::Io(e) => ContentError::Io(e),
            other => ContentError::Verify(other),
        }
    }
}

/// Backends that verify on push report the individual mismatch.
impl From<Mismatch> for ContentError {
    fn from(m: Mismatch) -> Self {
        match m {
            Mismatch::Size { expected, actual } => ContentError::SizeMismatch { expected, actual },
            Mismatch::Digest { expected, actual } => {
                ContentError::DigestMismatch { expected, actual }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ContentError>;
