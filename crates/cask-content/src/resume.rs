//! Resume state carried in descriptor annotations.

use crate::annotations::{
    ENABLED_VALUE, RESUME_ENABLED, RESUME_FILENAME, RESUME_HASH_STATE, RESUME_KEYS, RESUME_OFFSET,
};
use crate::{ContentError, Descriptor, Result, Verifier};

/// View over the four resume annotations of a descriptor.
///
/// Zero values and absent keys are interchangeable: `apply` removes a key
/// whose value is zero, `extract` maps a missing key to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeState {
    pub enabled:    bool,
    pub filename:   String,
    pub hash_state: Option<Vec<u8>>,
    pub offset:     u64,
}

impl ResumeState {
    /// Read the resume annotations of `descriptor`.
    ///
    /// `resume.enabled` is only on for the exact value `"true"`. A malformed
    /// offset or hash state fails with [`ContentError::InvalidResumeState`].
    pub fn extract(descriptor: &Descriptor) -> Result<Self> {
        let enabled = descriptor.annotation(RESUME_ENABLED) == Some(ENABLED_VALUE);
        let filename = descriptor.annotation(RESUME_FILENAME).unwrap_or_default().to_string();

        let hash_state = descriptor
            .annotation(RESUME_HASH_STATE)
            .map(|encoded| {
                hex::decode(encoded).map_err(|e| {
                    ContentError::InvalidResumeState(format!("{RESUME_HASH_STATE}: {e}"))
                })
            })
            .transpose()?;

        let offset = match descriptor.annotation(RESUME_OFFSET) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ContentError::InvalidResumeState(format!("{RESUME_OFFSET} {raw:?}: {e}"))
            })?,
            None => 0,
        };

        Ok(Self {
            enabled,
            filename,
            hash_state,
            offset,
        })
    }

    /// A copy of `descriptor` carrying this state. Other annotations are kept.
    pub fn apply(&self, descriptor: &Descriptor) -> Descriptor {
        let mut out = descriptor.clone();
        let annotations = &mut out.annotations;

        if self.enabled {
            annotations.insert(RESUME_ENABLED.to_string(), ENABLED_VALUE.to_string());
        } else {
            annotations.remove(RESUME_ENABLED);
        }

        if self.filename.is_empty() {
            annotations.remove(RESUME_FILENAME);
        } else {
            annotations.insert(RESUME_FILENAME.to_string(), self.filename.clone());
        }

        match &self.hash_state {
            Some(state) => {
                annotations.insert(RESUME_HASH_STATE.to_string(), hex::encode(state));
            }
            None => {
                annotations.remove(RESUME_HASH_STATE);
            }
        }

        if self.offset == 0 {
            annotations.remove(RESUME_OFFSET);
        } else {
            annotations.insert(RESUME_OFFSET.to_string(), self.offset.to_string());
        }

        out
    }

    /// Enabled state describing `verifier`'s progress on `filename`.
    pub fn checkpoint(filename: impl Into<String>, verifier: &Verifier) -> Self {
        Self {
            enabled:    true,
            filename:   filename.into(),
            hash_state: Some(verifier.snapshot()),
            offset:     verifier.bytes_written(),
        }
    }

    /// A copy of `descriptor` without any resume annotations.
    pub fn clear(descriptor: &Descriptor) -> Descriptor {
        let mut out = descriptor.clone();
        for key in RESUME_KEYS {
            out.annotations.remove(key);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_verify::Hasher;

    fn base() -> Descriptor {
        Descriptor::from_bytes(None, b"0123456789").with_annotation("org.example.keep", "yes")
    }

    #[test]
    fn test_absent_keys_are_zero() {
        assert_eq!(ResumeState::extract(&base()).unwrap(), ResumeState::default());
    }

    #[test]
    fn test_enabled_requires_literal_true() {
        for value in ["TRUE", "1", "yes", "", "true "] {
            let desc = base().with_annotation(RESUME_ENABLED, value);
            assert!(!ResumeState::extract(&desc).unwrap().enabled, "{value:?}");
        }
        let desc = base().with_annotation(RESUME_ENABLED, "true");
        assert!(ResumeState::extract(&desc).unwrap().enabled);
    }

    #[test]
    fn test_malformed_offset() {
        let desc = base().with_annotation(RESUME_OFFSET, "-4");
        assert!(matches!(
            ResumeState::extract(&desc),
            Err(ContentError::InvalidResumeState(_))
        ));
    }

    #[test]
    fn test_malformed_hash_state() {
        let desc = base().with_annotation(RESUME_HASH_STATE, "zz");
        assert!(matches!(
            ResumeState::extract(&desc),
            Err(ContentError::InvalidResumeState(_))
        ));
    }

    #[test]
    fn test_apply_round_trip_keeps_other_annotations() {
        let state = ResumeState {
            enabled:    true,
            filename:   "/var/lib/ingest/blob.partial".to_string(),
            hash_state: Some(vec![1, 2, 3, 0xff]),
            offset:     400,
        };
        let applied = state.apply(&base());

        assert_eq!(applied.annotation(RESUME_OFFSET), Some("400"));
        assert_eq!(applied.annotation(RESUME_HASH_STATE), Some("010203ff"));
        assert_eq!(applied.annotation("org.example.keep"), Some("yes"));
        assert_eq!(ResumeState::extract(&applied).unwrap(), state);
    }

    #[test]
    fn test_clear_removes_only_resume_keys() {
        let mut verifier = Verifier::new(&base()).unwrap();
        verifier.update(b"0123");
        let applied = ResumeState::checkpoint("/tmp/blob", &verifier).apply(&base());
        assert_eq!(applied.annotations.len(), 5);

        let cleared = ResumeState::clear(&applied);
        assert_eq!(cleared.annotations, base().annotations);
        assert_eq!(ResumeState::extract(&cleared).unwrap(), ResumeState::default());
    }

    #[test]
    fn test_apply_disabled_state_is_clear() {
        let applied = ResumeState::checkpoint("/tmp/blob", &Verifier::new(&base()).unwrap())
            .apply(&base());
        let disabled = ResumeState::default().apply(&applied);
        assert_eq!(disabled.annotations, base().annotations);
    }
}
