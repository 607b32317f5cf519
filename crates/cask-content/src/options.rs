use serde::{Deserialize, Serialize};

use crate::Result;

/// Default chunk size for streaming copies.
pub const DEFAULT_BUFFER_SIZE: usize = 32 * 1024;

/// Configuration for [`ResumableIngest`](crate::ResumableIngest).
///
/// Every field has a default, so partial JSON documents are accepted.
///
/// # Examples
///
/// ```
/// use cask_content::IngestOptions;
///
/// let options = IngestOptions::default().buffer_size(64 * 1024).range_fallback(false);
/// assert_eq!(options.buffer_size, 64 * 1024);
///
/// let parsed = IngestOptions::from_json(r#"{"sync_on_complete": false}"#).unwrap();
/// assert!(!parsed.sync_on_complete);
/// assert!(parsed.range_fallback);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Bytes read from the backend per chunk.
    pub buffer_size: usize,

    /// Restart from offset 0 when the backend cannot fetch byte ranges.
    ///
    /// When disabled, [`ContentError::RangeUnsupported`](crate::ContentError::RangeUnsupported)
    /// is returned instead.
    pub range_fallback: bool,

    /// `fsync` the ingest file before verification completes.
    pub sync_on_complete: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            buffer_size:      DEFAULT_BUFFER_SIZE,
            range_fallback:   true,
            sync_on_complete: true,
        }
    }
}

impl IngestOptions {
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    pub fn range_fallback(mut self, range_fallback: bool) -> Self {
        self.range_fallback = range_fallback;
        self
    }

    pub fn sync_on_complete(mut self, sync_on_complete: bool) -> Self {
        self.sync_on_complete = sync_on_complete;
        self
    }

    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        let buffer_size = options.buffer_size;
        Ok(options.buffer_size(buffer_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = IngestOptions::default();
        assert_eq!(options.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(options.range_fallback);
        assert!(options.sync_on_complete);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(IngestOptions::from_json("{}").unwrap(), IngestOptions::default());
    }

    #[test]
    fn test_zero_buffer_is_clamped() {
        let options = IngestOptions::from_json(r#"{"buffer_size": 0}"#).unwrap();
        assert_eq!(options.buffer_size, 1);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            IngestOptions::from_json(r#"{"buffer_size": "big"}"#),
            Err(crate::ContentError::InvalidOptions(_))
        ));
    }
}
