//! Repository Traits
//!
//! Interfaces for persisted state. Implementation is in infrastructure layer.
//! Method names are distinct across traits so one store type can implement
//! all of them without call-site ambiguity.

use crate::domain::entities::{CachedVerdict, ScheduledCaptcha};
use crate::error::AttestationResult;
use kernel::{CaptchaId, PaymentId};

/// Result cache: at most one verdict per profile
#[trait_variant::make(VerdictCacheRepository: Send)]
pub trait LocalVerdictCacheRepository {
    /// Stored verdict, if any
    async fn load_verdict(&self) -> AttestationResult<Option<CachedVerdict>>;

    /// Overwrite the stored verdict (payload and timestamp together)
    async fn store_verdict(&self, verdict: &CachedVerdict) -> AttestationResult<()>;
}

/// Persisted count of consecutive failed runs
#[trait_variant::make(FailureCounterRepository: Send)]
pub trait LocalFailureCounterRepository {
    async fn failure_count(&self) -> AttestationResult<u32>;

    /// Add one and return the new count
    async fn increment_failures(&self) -> AttestationResult<u32>;

    async fn reset_failures(&self) -> AttestationResult<()>;
}

/// Scheduled captcha bookkeeping
#[trait_variant::make(ScheduledCaptchaRepository: Send)]
pub trait LocalScheduledCaptchaRepository {
    /// Pending captcha, if one is scheduled
    async fn scheduled_captcha(&self) -> AttestationResult<Option<ScheduledCaptcha>>;

    async fn schedule_captcha(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
    ) -> AttestationResult<()>;

    async fn set_captcha_paused(&self, paused: bool) -> AttestationResult<()>;

    /// Add one snooze and return the new count
    async fn increment_snooze_count(&self) -> AttestationResult<u32>;

    /// Drop the scheduled ids, the paused flag and the snooze count
    async fn clear_scheduled_captcha(&self) -> AttestationResult<()>;
}

/// Host-visible "device failed attestation" flag
#[trait_variant::make(IntegrityFlagRepository: Send)]
pub trait LocalIntegrityFlagRepository {
    async fn check_failed(&self) -> AttestationResult<bool>;

    async fn set_check_failed(&self, failed: bool) -> AttestationResult<()>;
}
