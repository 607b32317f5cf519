//! Filesystem primitives for content stores.
//!
//! - [`StagedFile`] writes into a temporary file next to its destination and
//!   moves it into place with a single no-clobber rename on commit. Dropping an
//!   uncommitted stage removes the temporary file.
//! - [`partial`] opens, measures and truncates partially downloaded files.

mod error;
pub mod partial;
mod staged;

pub use error::{Error, Result};
pub use staged::StagedFile;
