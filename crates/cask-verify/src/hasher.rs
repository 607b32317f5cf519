use sha2::Digest;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

/// Non-resumable SHA-256 backed directly by `sha2`.
///
/// Computes one-shot digests for [`Algorithm::digest`](crate::Algorithm::digest)
/// and is the throughput baseline for [`HashState`](crate::HashState).
pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

/// Non-resumable SHA-512 backed directly by `sha2`.
pub struct Sha512Hasher(sha2::Sha512);

impl Hasher for Sha512Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha512Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha512Hasher {
    pub fn new() -> Self { Self(sha2::Sha512::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha512::digest(data).to_vec() }
}
