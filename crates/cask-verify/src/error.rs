use std::io;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("checksum mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    Mismatch {
        expected: Vec<u8>,
        actual:   Vec<u8>,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid hash state: {0}")]
    InvalidState(String),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

pub type Result<T> = std::result::Result<T, VerificationError>;
