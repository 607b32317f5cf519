//! Descriptor-addressed content storage.
//!
//! Content is identified by a [`Descriptor`]: a digest, a byte size and an
//! optional media type plus free-form annotations. Backends implement the
//! capability traits they support ([`Fetcher`], [`Pusher`],
//! [`ReadOnlyStorage`], [`Storage`], [`Deleter`]), and two consumers sit on
//! top of them:
//!
//! - [`fetch_all`] reads a small object fully into memory and verifies it.
//! - [`ResumableIngest`] streams a large object into a local file and can pick
//!   up an interrupted transfer from the `resume.*` annotations carried on the
//!   descriptor (see [`ResumeState`] and [`annotations`]).
//!
//! # Example
//!
//! ```
//! use cask_content::{fetch_all, Descriptor, MemoryStore, Pusher};
//! use tokio_util::sync::CancellationToken;
//!
//! let store = MemoryStore::new();
//! let cancel = CancellationToken::new();
//! let desc = Descriptor::from_bytes(Some("application/json"), b"{}");
//!
//! store.push(&cancel, &desc, &mut &b"{}"[..]).unwrap();
//! assert_eq!(fetch_all(&store, &cancel, &desc).unwrap(), b"{}");
//! ```

pub use self::descriptor::{Descriptor, Digest};
pub use self::error::{ContentError, Mismatch, Result};
pub use self::fetch::{fetch_all, read_all};
pub use self::file::FileStore;
pub use self::ingest::{IngestState, ResumableIngest, resume_fetch};
pub use self::memory::MemoryStore;
pub use self::options::{DEFAULT_BUFFER_SIZE, IngestOptions};
pub use self::resume::ResumeState;
pub use self::storage::{
    Deleter, Fetcher, FetcherFn, Pusher, ReadOnlyStorage, ReadStream, Storage,
};
pub use self::verifier::Verifier;

pub mod annotations;
mod descriptor;
mod error;
mod fetch;
mod file;
mod ingest;
mod memory;
mod options;
mod resume;
mod storage;
mod verifier;
