//! Cryptographic Utilities

use base64::{
    Engine,
    engine::general_purpose::{self, GeneralPurpose, GeneralPurposeConfig},
    engine::DecodePaddingMode,
};
use rand::{RngCore, rngs::OsRng};

/// URL-safe alphabet that accepts input with or without `=` padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Generate cryptographically secure random bytes
///
/// Backed by the operating system RNG. Panics if the OS cannot supply
/// entropy; there is no fallback to a weaker generator.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Decode a base64url segment (as found in JWS compact serialization)
///
/// Standard-alphabet input is normalised first, since some token issuers
/// emit `+` and `/` in their segments.
pub fn from_base64_url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let normalised: String = s
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_LENIENT.decode(normalised)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(24);
        assert_eq!(bytes.len(), 24);
        // Should not be all zeros (statistically)
        assert!(bytes.iter().any(|&b| b != 0));
        assert_ne!(bytes, random_bytes(24));
    }

    #[test]
    fn test_base64_roundtrip() {
        let data = b"hello world";
        let encoded = to_base64(data);
        let decoded = from_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_url_accepts_unpadded_segment() {
        let decoded =
            from_base64_url("eyJjdHNQcm9maWxlTWF0Y2giOnRydWUsImJhc2ljSW50ZWdyaXR5Ijp0cnVlfQ")
                .unwrap();
        assert_eq!(
            decoded,
            br#"{"ctsProfileMatch":true,"basicIntegrity":true}"#.to_vec()
        );
    }

    #[test]
    fn test_base64_url_accepts_padded_and_standard_alphabet() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(from_base64_url("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(from_base64_url("+/8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_base64_url_rejects_garbage() {
        assert!(from_base64_url("not base64!").is_err());
    }
}
