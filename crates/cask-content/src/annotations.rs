//! Annotation keys shared by the resume-state writer and the ingest reader.
//!
//! Values are always strings. Absent keys mean the zero value.

/// `"true"` while a resumable download is in progress; any other value is off.
pub const RESUME_ENABLED: &str = "resume.enabled";

/// Path of the partial ingest file.
pub const RESUME_FILENAME: &str = "resume.filename";

/// Lowercase hex of a hash snapshot covering the first `resume.offset` bytes.
pub const RESUME_HASH_STATE: &str = "resume.hash-state";

/// Base-10 byte count already present in the ingest file.
pub const RESUME_OFFSET: &str = "resume.offset";

pub const RESUME_KEYS: [&str; 4] =
    [RESUME_ENABLED, RESUME_FILENAME, RESUME_HASH_STATE, RESUME_OFFSET];

pub(crate) const ENABLED_VALUE: &str = "true";
