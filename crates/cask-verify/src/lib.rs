//! Content verification primitives for descriptor-addressed blobs.
//!
//! Provides incremental hashing and verification without enforcing a storage
//! layout or verification policy. The [`HashState`] accumulator can be
//! snapshotted at any byte offset and restored later, which is what allows an
//! interrupted download to continue hashing where it stopped.
//!
//! # Key Features
//!
//! - **Single pass**: [`VerifiedReader`] hashes bytes as they are read
//! - **Resumable**: [`HashState::snapshot`] / [`HashState::restore`] persist a running SHA-2
//! - **Extensible**: the minimal [`Hasher`] trait admits custom implementations
//!
//! # Example
//!
//! ```
//! use cask_verify::{Algorithm, HashState, Hasher};
//!
//! let mut first = HashState::new(Algorithm::Sha256);
//! first.update(b"hello ");
//! let snapshot = first.snapshot();
//!
//! let mut resumed = HashState::restore(Algorithm::Sha256, &snapshot).unwrap();
//! resumed.update(b"world");
//! assert_eq!(resumed.finalize(), Algorithm::Sha256.digest(b"hello world"));
//! ```

pub use self::algorithm::Algorithm;
pub use self::error::{Result, VerificationError};
pub use self::hasher::{Hasher, Sha256Hasher, Sha512Hasher};
pub use self::reader::VerifiedReader;
pub use self::state::HashState;

mod algorithm;
mod error;
mod hasher;
mod reader;
mod state;
