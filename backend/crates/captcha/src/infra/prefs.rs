//! Preference-backed Repository Implementations
//!
//! Every repository trait is served from the profile's key/value store.
//! Read-modify-write sequences (the failure counter) rely on the run gate
//! for exclusion; the store itself only guarantees per-batch atomicity.

use crate::domain::entities::{CachedVerdict, ScheduledCaptcha};
use crate::domain::repository::{
    FailureCounterRepository, IntegrityFlagRepository, ScheduledCaptchaRepository,
    VerdictCacheRepository,
};
use crate::error::AttestationResult;
use kernel::{CaptchaId, PaymentId};
use platform::prefs::{PrefBatch, PreferenceStore};
use std::sync::Arc;

pub mod keys {
    pub const FAILED_ATTEMPTS: &str = "scheduled_captcha_failed_attempts";
    pub const CAPTCHA_ID: &str = "scheduled_captcha_id";
    pub const PAYMENT_ID: &str = "scheduled_captcha_payment_id";
    pub const PAUSED: &str = "scheduled_captcha_paused";
    pub const SNOOZE_COUNT: &str = "scheduled_captcha_snooze_count";
    pub const VERDICT_PAYLOAD: &str = "attestation_verdict_payload";
    pub const VERDICT_CAPTURED_AT_MS: &str = "attestation_verdict_captured_at_ms";
    pub const CHECK_FAILED: &str = "safetynet_check_failed";
}

/// Preference-backed repository
pub struct PrefsCaptchaRepository<S: PreferenceStore> {
    store: Arc<S>,
}

impl<S: PreferenceStore> PrefsCaptchaRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn text(&self, key: &str) -> AttestationResult<Option<String>> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|s| !s.is_empty()))
    }

    async fn int(&self, key: &str) -> AttestationResult<Option<i64>> {
        Ok(self.store.get(key).await?.and_then(|v| v.as_i64()))
    }

    async fn count(&self, key: &str) -> AttestationResult<u32> {
        let raw = self.int(key).await?.unwrap_or(0);
        Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
    }

    async fn flag(&self, key: &str) -> AttestationResult<bool> {
        Ok(self
            .store
            .get(key)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

impl<S: PreferenceStore + Send + Sync> VerdictCacheRepository for PrefsCaptchaRepository<S> {
    async fn load_verdict(&self) -> AttestationResult<Option<CachedVerdict>> {
        let payload = self.text(keys::VERDICT_PAYLOAD).await?;
        let captured_at_ms = self.int(keys::VERDICT_CAPTURED_AT_MS).await?;
        Ok(match (payload, captured_at_ms) {
            (Some(payload), Some(captured_at_ms)) => Some(CachedVerdict::new(payload, captured_at_ms)),
            _ => None,
        })
    }

    async fn store_verdict(&self, verdict: &CachedVerdict) -> AttestationResult<()> {
        self.store
            .commit(
                PrefBatch::new()
                    .set(keys::VERDICT_PAYLOAD, verdict.result_payload.as_str())
                    .set(keys::VERDICT_CAPTURED_AT_MS, verdict.captured_at_ms),
            )
            .await?;
        Ok(())
    }
}

impl<S: PreferenceStore + Send + Sync> FailureCounterRepository for PrefsCaptchaRepository<S> {
    async fn failure_count(&self) -> AttestationResult<u32> {
        self.count(keys::FAILED_ATTEMPTS).await
    }

    async fn increment_failures(&self) -> AttestationResult<u32> {
        let next = self.failure_count().await?.saturating_add(1);
        self.store
            .commit(PrefBatch::new().set(keys::FAILED_ATTEMPTS, i64::from(next)))
            .await?;
        Ok(next)
    }

    async fn reset_failures(&self) -> AttestationResult<()> {
        self.store
            .commit(PrefBatch::new().set(keys::FAILED_ATTEMPTS, 0i64))
            .await?;
        Ok(())
    }
}

impl<S: PreferenceStore + Send + Sync> ScheduledCaptchaRepository for PrefsCaptchaRepository<S> {
    async fn scheduled_captcha(&self) -> AttestationResult<Option<ScheduledCaptcha>> {
        let captcha_id = self.text(keys::CAPTCHA_ID).await?;
        let payment_id = self.text(keys::PAYMENT_ID).await?;
        let (Some(captcha_id), Some(payment_id)) = (captcha_id, payment_id) else {
            return Ok(None);
        };

        Ok(Some(ScheduledCaptcha {
            captcha_id: CaptchaId::new(captcha_id),
            payment_id: PaymentId::new(payment_id),
            paused: self.flag(keys::PAUSED).await?,
            failed_attempts: self.failure_count().await?,
            snooze_count: self.count(keys::SNOOZE_COUNT).await?,
        }))
    }

    async fn schedule_captcha(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
    ) -> AttestationResult<()> {
        self.store
            .commit(
                PrefBatch::new()
                    .set(keys::CAPTCHA_ID, captcha_id.as_str())
                    .set(keys::PAYMENT_ID, payment_id.as_str()),
            )
            .await?;
        Ok(())
    }

    async fn set_captcha_paused(&self, paused: bool) -> AttestationResult<()> {
        self.store
            .commit(PrefBatch::new().set(keys::PAUSED, paused))
            .await?;
        Ok(())
    }

    async fn increment_snooze_count(&self) -> AttestationResult<u32> {
        let next = self.count(keys::SNOOZE_COUNT).await?.saturating_add(1);
        self.store
            .commit(PrefBatch::new().set(keys::SNOOZE_COUNT, i64::from(next)))
            .await?;
        Ok(next)
    }

    async fn clear_scheduled_captcha(&self) -> AttestationResult<()> {
        self.store
            .commit(
                PrefBatch::new()
                    .remove(keys::CAPTCHA_ID)
                    .remove(keys::PAYMENT_ID)
                    .remove(keys::PAUSED)
                    .remove(keys::SNOOZE_COUNT),
            )
            .await?;
        Ok(())
    }
}

impl<S: PreferenceStore + Send + Sync> IntegrityFlagRepository for PrefsCaptchaRepository<S> {
    async fn check_failed(&self) -> AttestationResult<bool> {
        self.flag(keys::CHECK_FAILED).await
    }

    async fn set_check_failed(&self, failed: bool) -> AttestationResult<()> {
        self.store
            .commit(PrefBatch::new().set(keys::CHECK_FAILED, failed))
            .await?;
        Ok(())
    }
}
