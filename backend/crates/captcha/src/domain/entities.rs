//! Domain Entities
//!
//! Core business entities for the attestation domain.

use crate::domain::services;
use crate::domain::value_objects::{ChallengeValue, IntegrityToken};
use kernel::{CaptchaId, PaymentId};
use std::fmt;

/// AttestationSession entity - state carried through one pipeline run
///
/// Created when a run starts and dropped when it ends; never persisted.
#[derive(Debug, Clone)]
pub struct AttestationSession {
    pub captcha_id: CaptchaId,
    pub payment_id: PaymentId,
    pub unique_value: Option<ChallengeValue>,
    pub integrity_token: Option<IntegrityToken>,
}

impl AttestationSession {
    pub fn new(captcha_id: CaptchaId, payment_id: PaymentId) -> Self {
        Self {
            captcha_id,
            payment_id,
            unique_value: None,
            integrity_token: None,
        }
    }
}

/// CachedVerdict entity - the most recent attestation result
///
/// Payload and timestamp are always written together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedVerdict {
    /// Opaque serialized verdict (the signed integrity token)
    pub result_payload: String,
    pub captured_at_ms: i64,
}

impl CachedVerdict {
    pub fn new(result_payload: impl Into<String>, captured_at_ms: i64) -> Self {
        Self {
            result_payload: result_payload.into(),
            captured_at_ms,
        }
    }

    /// Check if the verdict is younger than `ttl_ms` at `now_ms`
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        services::is_fresh(self, now_ms, ttl_ms)
    }

    /// Verdict decoded from the cached payload; undecodable payloads fail closed
    pub fn verdict(&self) -> IntegrityVerdict {
        services::decode_verdict(&IntegrityToken::new(self.result_payload.clone()))
            .unwrap_or_default()
    }
}

/// IntegrityVerdict - fields decoded from the integrity token payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityVerdict {
    pub cts_profile_match: bool,
    pub basic_integrity: bool,
}

impl IntegrityVerdict {
    /// Both checks must pass
    pub fn attestation_passed(&self) -> bool {
        self.cts_profile_match && self.basic_integrity
    }
}

/// ScheduledCaptcha entity - a captcha the ads engine asked the user to solve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCaptcha {
    pub captcha_id: CaptchaId,
    pub payment_id: PaymentId,
    /// Set after too many failed runs; the host stops prompting
    pub paused: bool,
    pub failed_attempts: u32,
    /// Times the user postponed this captcha
    pub snooze_count: u32,
}

impl ScheduledCaptcha {
    /// Only the first prompt may be snoozed
    pub fn can_snooze(&self) -> bool {
        self.snooze_count == 0
    }
}

/// Pipeline states, in traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationState {
    Idle,
    CacheCheck,
    RequestingChallenge,
    RequestingIntegrityToken,
    VerifyingPaymentAttestation,
    SolvingCaptcha,
    Succeeded,
    Failed,
}

impl AttestationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttestationState::Succeeded | AttestationState::Failed)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            AttestationState::Idle => "idle",
            AttestationState::CacheCheck => "cache_check",
            AttestationState::RequestingChallenge => "requesting_challenge",
            AttestationState::RequestingIntegrityToken => "requesting_integrity_token",
            AttestationState::VerifyingPaymentAttestation => "verifying_payment_attestation",
            AttestationState::SolvingCaptcha => "solving_captcha",
            AttestationState::Succeeded => "succeeded",
            AttestationState::Failed => "failed",
        }
    }
}

impl fmt::Display for AttestationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
