//! Run Attestation Use Case
//!
//! Drives one pipeline run: cache check, start attestation, integrity
//! token, payment attestation, captcha solve. Steps run strictly in that
//! order, each only after the previous one succeeded. The first failure
//! ends the run; there are no retries inside a run.

use crate::application::config::AttestationConfig;
use crate::application::run_gate::RunGate;
use crate::domain::entities::{AttestationSession, AttestationState, CachedVerdict, IntegrityVerdict};
use crate::domain::gateway::{
    AttestationEndpoint, CaptchaSolveEndpoint, IntegrityTokenClient, PaymentAttestationEndpoint,
    PaymentAttestationRequest,
};
use crate::domain::repository::{
    FailureCounterRepository, IntegrityFlagRepository, ScheduledCaptchaRepository,
    VerdictCacheRepository,
};
use crate::domain::services::decode_verdict;
use crate::domain::value_objects::ChallengeValue;
use crate::error::{AttestationError, AttestationResult};
use chrono::Utc;
use kernel::{CaptchaId, FailureKind, PaymentId};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Instrument;

/// Input DTO for a pipeline run
#[derive(Debug, Clone)]
pub struct RunAttestationInput {
    pub captcha_id: CaptchaId,
    pub payment_id: PaymentId,
    /// Ignore any cached verdict and attest from scratch
    pub force_fresh: bool,
}

impl RunAttestationInput {
    pub fn new(captcha_id: impl Into<CaptchaId>, payment_id: impl Into<PaymentId>) -> Self {
        Self {
            captcha_id: captcha_id.into(),
            payment_id: payment_id.into(),
            force_fresh: false,
        }
    }

    pub fn forcing_fresh(mut self) -> Self {
        self.force_fresh = true;
        self
    }
}

/// What the host observes from a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded {
        /// Gates the reward feature
        attestation_passed: bool,
        /// Short-circuited on a fresh cached verdict
        from_cache: bool,
    },
    Failed {
        failed_at: AttestationState,
        kind: FailureKind,
        /// Consecutive failures after this one
        failures: u32,
    },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded { .. })
    }

    pub fn final_state(&self) -> AttestationState {
        match self {
            RunOutcome::Succeeded { .. } => AttestationState::Succeeded,
            RunOutcome::Failed { .. } => AttestationState::Failed,
        }
    }
}

struct PipelineSuccess {
    attestation_passed: bool,
    from_cache: bool,
}

/// Run Attestation Use Case
pub struct RunAttestationUseCase<R, G, I>
where
    R: VerdictCacheRepository
        + FailureCounterRepository
        + ScheduledCaptchaRepository
        + IntegrityFlagRepository,
    G: AttestationEndpoint + PaymentAttestationEndpoint + CaptchaSolveEndpoint,
    I: IntegrityTokenClient,
{
    repo: Arc<R>,
    gateway: Arc<G>,
    integrity: Arc<I>,
    config: Arc<AttestationConfig>,
    gate: RunGate,
}

impl<R, G, I> RunAttestationUseCase<R, G, I>
where
    R: VerdictCacheRepository
        + FailureCounterRepository
        + ScheduledCaptchaRepository
        + IntegrityFlagRepository,
    G: AttestationEndpoint + PaymentAttestationEndpoint + CaptchaSolveEndpoint,
    I: IntegrityTokenClient,
{
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<G>,
        integrity: Arc<I>,
        config: Arc<AttestationConfig>,
        gate: RunGate,
    ) -> Self {
        Self {
            repo,
            gateway,
            integrity,
            config,
            gate,
        }
    }

    /// Run the pipeline once. Never returns an error: every failure is
    /// counted and reported as [`RunOutcome::Failed`].
    pub async fn execute(&self, input: RunAttestationInput) -> RunOutcome {
        let _guard = self.gate.acquire().await;

        let span = tracing::info_span!(
            "attestation_run",
            captcha_id = %input.captcha_id,
            payment_id = %input.payment_id,
            force_fresh = input.force_fresh,
        );
        self.run_guarded(&input).instrument(span).await
    }

    /// Consecutive failed runs, for the host's backoff decisions
    pub async fn failure_count(&self) -> AttestationResult<u32> {
        self.repo.failure_count().await
    }

    async fn run_guarded(&self, input: &RunAttestationInput) -> RunOutcome {
        let progress = Mutex::new(AttestationState::Idle);

        let result =
            match tokio::time::timeout(self.config.run_deadline, self.run_pipeline(input, &progress))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(AttestationError::Transport(format!(
                    "run deadline of {:?} exceeded",
                    self.config.run_deadline
                ))),
            };

        let reached = *progress.lock();
        match result {
            Ok(success) => self.finish_success(success).await,
            Err(err) => self.finish_failure(reached, err).await,
        }
    }

    async fn run_pipeline(
        &self,
        input: &RunAttestationInput,
        progress: &Mutex<AttestationState>,
    ) -> AttestationResult<PipelineSuccess> {
        enter(progress, AttestationState::CacheCheck);
        if !input.force_fresh {
            if let Some(cached) = self.repo.load_verdict().await? {
                let now_ms = Utc::now().timestamp_millis();
                if cached.is_fresh(now_ms, self.config.verdict_ttl_ms()) {
                    let verdict = cached.verdict();
                    tracing::info!(
                        age_ms = now_ms - cached.captured_at_ms,
                        attestation_passed = verdict.attestation_passed(),
                        "Fresh cached verdict, skipping remote attestation"
                    );
                    return Ok(PipelineSuccess {
                        attestation_passed: verdict.attestation_passed(),
                        from_cache: true,
                    });
                }
                tracing::debug!(captured_at_ms = cached.captured_at_ms, "Cached verdict expired");
            }
        }

        let mut session = AttestationSession::new(input.captcha_id.clone(), input.payment_id.clone());

        enter(progress, AttestationState::RequestingChallenge);
        let unique_value = self
            .gateway
            .start(&session.payment_id)
            .await?
            .and_then(ChallengeValue::new)
            .ok_or_else(|| {
                AttestationError::Decode("start attestation returned no uniqueValue".to_string())
            })?;
        tracing::info!("Received attestation challenge");
        session.unique_value = Some(unique_value.clone());

        enter(progress, AttestationState::RequestingIntegrityToken);
        let token = self.integrity.request(unique_value.as_str()).await?;
        tracing::info!("Received integrity token");
        session.integrity_token = Some(token.clone());

        enter(progress, AttestationState::VerifyingPaymentAttestation);
        let request = PaymentAttestationRequest {
            payment_id: session.payment_id.clone(),
            integrity_token: token.clone(),
            unique_value,
            package_name: self.config.package_name.clone(),
        };
        self.gateway.verify(&request).await?;

        let verdict = decode_verdict(&token).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Integrity token payload undecodable, treating as failed");
            IntegrityVerdict::default()
        });
        self.repo
            .store_verdict(&CachedVerdict::new(
                token.as_str(),
                Utc::now().timestamp_millis(),
            ))
            .await?;
        self.repo
            .set_check_failed(!verdict.attestation_passed())
            .await?;
        tracing::info!(
            cts_profile_match = verdict.cts_profile_match,
            basic_integrity = verdict.basic_integrity,
            "Payment attestation verified"
        );

        enter(progress, AttestationState::SolvingCaptcha);
        // The payment id doubles as the solution for attestation captchas
        self.gateway
            .solve(
                &session.payment_id,
                &session.captcha_id,
                session.payment_id.as_str(),
            )
            .await?;

        Ok(PipelineSuccess {
            attestation_passed: verdict.attestation_passed(),
            from_cache: false,
        })
    }

    async fn finish_success(&self, success: PipelineSuccess) -> RunOutcome {
        // A cache hit solved nothing remotely, so the bookkeeping stays.
        if !success.from_cache {
            if let Err(e) = self.repo.reset_failures().await {
                e.log("reset_failures");
            }
            if let Err(e) = self.repo.clear_scheduled_captcha().await {
                e.log("clear_scheduled_captcha");
            }
            tracing::info!(
                attestation_passed = success.attestation_passed,
                "Captcha solved"
            );
        }

        RunOutcome::Succeeded {
            attestation_passed: success.attestation_passed,
            from_cache: success.from_cache,
        }
    }

    async fn finish_failure(&self, failed_at: AttestationState, err: AttestationError) -> RunOutcome {
        err.log(failed_at.as_str());

        let failures = match self.repo.increment_failures().await {
            Ok(count) => count,
            Err(e) => {
                e.log("increment_failures");
                self.repo.failure_count().await.unwrap_or(0)
            }
        };

        if failures >= self.config.max_failed_attempts {
            tracing::warn!(
                failures,
                max = self.config.max_failed_attempts,
                "Too many failed attempts, pausing scheduled captcha"
            );
            if let Err(e) = self.repo.set_captcha_paused(true).await {
                e.log("set_captcha_paused");
            }
        }

        RunOutcome::Failed {
            failed_at,
            kind: err.kind(),
            failures,
        }
    }
}

fn enter(progress: &Mutex<AttestationState>, state: AttestationState) {
    *progress.lock() = state;
    tracing::debug!(step = %state, "Entering step");
}
