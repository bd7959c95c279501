//! Domain Services
//!
//! Pure domain logic: cache freshness and verdict decoding.

use crate::domain::entities::{CachedVerdict, IntegrityVerdict};
use crate::domain::value_objects::IntegrityToken;
use serde_json::Value;
use thiserror::Error;

/// Why a token payload could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerdictDecodeError {
    #[error("token is not in header.payload.signature form")]
    Malformed,

    #[error("payload segment is not base64url")]
    Encoding,

    #[error("payload is not a JSON object: {0}")]
    Json(String),
}

/// Check cache freshness: strictly younger than the TTL
///
/// A capture time later than `now_ms` is stale; the clock moved or the
/// stored value is corrupt, and neither should extend the cache lifetime.
pub fn is_fresh(verdict: &CachedVerdict, now_ms: i64, ttl_ms: i64) -> bool {
    let age_ms = now_ms.saturating_sub(verdict.captured_at_ms);
    (0..ttl_ms).contains(&age_ms)
}

/// Decode the verdict fields from the token's payload segment
///
/// Absent fields (or fields of the wrong type) count as `false`.
pub fn decode_verdict(token: &IntegrityToken) -> Result<IntegrityVerdict, VerdictDecodeError> {
    let segment = token
        .payload_segment()
        .ok_or(VerdictDecodeError::Malformed)?;
    let bytes =
        platform::crypto::from_base64_url(segment).map_err(|_| VerdictDecodeError::Encoding)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|e| VerdictDecodeError::Json(e.to_string()))?;
    let payload = value
        .as_object()
        .ok_or_else(|| VerdictDecodeError::Json("expected an object".to_string()))?;

    let flag = |name: &str| payload.get(name).and_then(Value::as_bool).unwrap_or(false);
    Ok(IntegrityVerdict {
        cts_profile_match: flag("ctsProfileMatch"),
        basic_integrity: flag("basicIntegrity"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::crypto::to_base64;

    fn token_with_payload(json: &str) -> IntegrityToken {
        let payload = to_base64(json.as_bytes())
            .replace('+', "-")
            .replace('/', "_")
            .trim_end_matches('=')
            .to_string();
        IntegrityToken::new(format!("h.{payload}.s"))
    }

    #[test]
    fn test_is_fresh_boundary() {
        let verdict = CachedVerdict::new("p", 1_000);
        assert!(is_fresh(&verdict, 1_000, 10));
        assert!(is_fresh(&verdict, 1_009, 10));
        assert!(!is_fresh(&verdict, 1_010, 10));
        assert!(!is_fresh(&verdict, 5_000, 10));
    }

    #[test]
    fn test_is_fresh_with_extreme_timestamps() {
        let verdict = CachedVerdict::new("p", i64::MIN);
        assert!(!is_fresh(&verdict, i64::MAX, 10));

        let verdict = CachedVerdict::new("p", i64::MAX);
        assert!(!is_fresh(&verdict, i64::MIN, 10));
    }

    #[test]
    fn test_future_capture_time_is_stale() {
        let verdict = CachedVerdict::new("p", 1_001);
        assert!(!is_fresh(&verdict, 1_000, 10));

        let year_ahead = CachedVerdict::new("p", 1_000 + 365 * 24 * 3600 * 1000);
        assert!(!is_fresh(&year_ahead, 1_000, 10 * 24 * 3600 * 1000));
    }

    #[test]
    fn test_decode_passing_verdict() {
        let token = IntegrityToken::new(
            "h.eyJjdHNQcm9maWxlTWF0Y2giOnRydWUsImJhc2ljSW50ZWdyaXR5Ijp0cnVlfQ.s",
        );
        let verdict = decode_verdict(&token).unwrap();
        assert!(verdict.cts_profile_match);
        assert!(verdict.basic_integrity);
        assert!(verdict.attestation_passed());
    }

    #[test]
    fn test_decode_either_false_fails() {
        let verdict =
            decode_verdict(&token_with_payload(r#"{"ctsProfileMatch":false,"basicIntegrity":true}"#))
                .unwrap();
        assert!(!verdict.attestation_passed());

        let verdict =
            decode_verdict(&token_with_payload(r#"{"ctsProfileMatch":true,"basicIntegrity":false}"#))
                .unwrap();
        assert!(!verdict.attestation_passed());
    }

    #[test]
    fn test_decode_absent_fields_fail() {
        let verdict = decode_verdict(&token_with_payload(r#"{"ctsProfileMatch":true}"#)).unwrap();
        assert!(verdict.cts_profile_match);
        assert!(!verdict.basic_integrity);
        assert!(!verdict.attestation_passed());

        let verdict = decode_verdict(&token_with_payload(r#"{}"#)).unwrap();
        assert_eq!(verdict, IntegrityVerdict::default());
    }

    #[test]
    fn test_decode_wrong_types_fail_closed() {
        let verdict =
            decode_verdict(&token_with_payload(r#"{"ctsProfileMatch":"yes","basicIntegrity":1}"#))
                .unwrap();
        assert!(!verdict.attestation_passed());

        // One bad field does not poison the other
        let verdict =
            decode_verdict(&token_with_payload(r#"{"ctsProfileMatch":"yes","basicIntegrity":true}"#))
                .unwrap();
        assert!(!verdict.cts_profile_match);
        assert!(verdict.basic_integrity);
    }

    #[test]
    fn test_decode_malformed_tokens() {
        assert_eq!(
            decode_verdict(&IntegrityToken::new("no-dots")),
            Err(VerdictDecodeError::Malformed)
        );
        assert_eq!(
            decode_verdict(&IntegrityToken::new("a.b.c.d")),
            Err(VerdictDecodeError::Malformed)
        );
        assert_eq!(
            decode_verdict(&IntegrityToken::new("h.!!!.s")),
            Err(VerdictDecodeError::Encoding)
        );
        assert!(matches!(
            decode_verdict(&token_with_payload("[true]")),
            Err(VerdictDecodeError::Json(_))
        ));
    }
}
