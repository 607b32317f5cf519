//! Descriptor and digest value types.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use cask_verify::Algorithm;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};

static ALGORITHM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]+(?:[+._-][a-z0-9]+)*$").expect("Failed to compile algorithm regex")
});

static ENCODED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9=_-]+$").expect("Failed to compile encoded regex"));

/// Content digest in `<algorithm>:<encoded>` form.
///
/// Construction goes through [`FromStr`] (or serde) so every `Digest` in the
/// crate is non-empty and well formed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: String,
    encoded:   String,
}

impl Digest {
    /// Digest of `data` under `algorithm`.
    pub fn from_bytes(algorithm: Algorithm, data: &[u8]) -> Self {
        Self::from_raw(algorithm, &algorithm.digest(data))
    }

    pub(crate) fn from_raw(algorithm: Algorithm, raw: &[u8]) -> Self {
        Self {
            algorithm: algorithm.as_str().to_string(),
            encoded:   hex::encode(raw),
        }
    }

    pub fn algorithm(&self) -> &str { &self.algorithm }

    pub fn encoded(&self) -> &str { &self.encoded }

    /// The hash algorithm, if this crate can compute it.
    pub fn hash_algorithm(&self) -> Result<Algorithm> {
        self.algorithm
            .parse::<Algorithm>()
            .map_err(|_| ContentError::UnsupportedAlgorithm(self.algorithm.clone()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Digest({self})") }
}

impl FromStr for Digest {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ContentError::InvalidDigest(s.to_string());
        let (algorithm, encoded) = s.split_once(':').ok_or_else(invalid)?;

        if !ALGORITHM_REGEX.is_match(algorithm) || !ENCODED_REGEX.is_match(encoded) {
            return Err(invalid());
        }

        // Registered algorithms pin the encoding to lowercase hex of fixed length.
        if let Ok(known) = algorithm.parse::<Algorithm>() {
            let hex_ok = encoded.len() == known.digest_len() * 2
                && encoded.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
            if !hex_ok {
                return Err(invalid());
            }
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            encoded:   encoded.to_string(),
        })
    }
}

impl TryFrom<String> for Digest {
    type Error = ContentError;

    fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self { d.to_string() }
}

/// Describes a blob by digest and size, with free-form annotations.
///
/// Equality and hashing only consider the digest and size; media type and
/// annotations are metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type:  Option<String>,
    pub digest:      Digest,
    pub size:        u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Descriptor {
    pub fn new(digest: Digest, size: u64) -> Self {
        Self {
            media_type: None,
            digest,
            size,
            annotations: BTreeMap::new(),
        }
    }

    /// sha256 descriptor of `data`.
    pub fn from_bytes(media_type: Option<&str>, data: &[u8]) -> Self {
        Self {
            media_type: media_type.map(str::to_string),
            ..Self::new(Digest::from_bytes(Algorithm::Sha256, data), data.len() as u64)
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool { self.digest == other.digest && self.size == other.size }
}

impl Eq for Descriptor {}

impl Hash for Descriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.digest.hash(state);
        self.size.hash(state);
    }
}
