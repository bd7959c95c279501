//! Domain Value Objects
//!
//! Immutable value types for the attestation domain.

use std::fmt;

/// Server-issued challenge bound into the integrity token request
///
/// Never empty: an empty `uniqueValue` from the server means there is
/// nothing to attest against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeValue(String);

impl ChallengeValue {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallengeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque signed token returned by the device integrity service
///
/// Compact JWS layout: `header.payload.signature`, each segment base64url.
#[derive(Clone, PartialEq, Eq)]
pub struct IntegrityToken(String);

impl IntegrityToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The middle (payload) segment, if the token has three segments
    pub fn payload_segment(&self) -> Option<&str> {
        let mut parts = self.0.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }
        Some(payload)
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for IntegrityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntegrityToken({} bytes)", self.0.len())
    }
}

/// Client-generated challenge for a stand-alone device check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Length used when the caller does not supply a nonce
    pub const DEFAULT_LEN: usize = 24;

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Form handed to the integrity service
    pub fn to_base64(&self) -> String {
        platform::crypto::to_base64(&self.0)
    }
}
