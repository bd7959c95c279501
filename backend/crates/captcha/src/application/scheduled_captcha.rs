//! Scheduled Captcha Use Case
//!
//! Bookkeeping for captchas the ads engine schedules: remember which one
//! is pending, count how often the user postponed it, and report whether
//! it is due for a given wallet payment id.
//!
//! Writes take the run gate, so a run that is clearing the scheduled
//! captcha never interleaves with a new schedule.

use crate::application::run_gate::RunGate;
use crate::domain::entities::ScheduledCaptcha;
use crate::domain::repository::ScheduledCaptchaRepository;
use crate::error::AttestationResult;
use kernel::{CaptchaId, PaymentId};
use std::sync::Arc;

/// Scheduled Captcha Use Case
pub struct ScheduledCaptchaUseCase<R>
where
    R: ScheduledCaptchaRepository,
{
    repo: Arc<R>,
    gate: RunGate,
}

impl<R> ScheduledCaptchaUseCase<R>
where
    R: ScheduledCaptchaRepository,
{
    pub fn new(repo: Arc<R>, gate: RunGate) -> Self {
        Self { repo, gate }
    }

    /// Remember a captcha the server wants solved
    pub async fn schedule(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
    ) -> AttestationResult<()> {
        let _guard = self.gate.acquire().await;
        self.repo.schedule_captcha(payment_id, captcha_id).await?;
        tracing::info!(%payment_id, %captcha_id, "Captcha scheduled");
        Ok(())
    }

    /// Postpone the prompt; returns how many times it has been snoozed
    ///
    /// Does not pause: pausing is reserved for repeated failed runs.
    pub async fn snooze(&self) -> AttestationResult<u32> {
        let _guard = self.gate.acquire().await;
        let snooze_count = self.repo.increment_snooze_count().await?;
        tracing::info!(snooze_count, "Scheduled captcha snoozed");
        Ok(snooze_count)
    }

    /// The captcha pending for `payment_id`, paused or not
    pub async fn pending(&self, payment_id: &PaymentId) -> AttestationResult<Option<ScheduledCaptcha>> {
        Ok(self
            .repo
            .scheduled_captcha()
            .await?
            .filter(|captcha| &captcha.payment_id == payment_id))
    }

    /// The captcha pending for `payment_id`, unless it is paused
    pub async fn next_due(&self, payment_id: &PaymentId) -> AttestationResult<Option<ScheduledCaptcha>> {
        Ok(self
            .pending(payment_id)
            .await?
            .filter(|captcha| !captcha.paused))
    }
}
