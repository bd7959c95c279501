//! OS-backed nonce provider

use crate::domain::gateway::NonceProvider;
use crate::domain::value_objects::Nonce;
use platform::crypto::random_bytes;

/// Draws nonces from the operating system CSPRNG
#[derive(Debug, Clone)]
pub struct OsNonceProvider {
    len: usize,
}

impl OsNonceProvider {
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Default for OsNonceProvider {
    fn default() -> Self {
        Self::new(Nonce::DEFAULT_LEN)
    }
}

impl NonceProvider for OsNonceProvider {
    fn generate(&self) -> Nonce {
        Nonce::from_bytes(random_bytes(self.len))
    }
}
