//! Device Integrity Check Use Case
//!
//! Stand-alone client attestation: asks the integrity service for a token
//! bound to a client nonce and records the verdict. Shares the verdict
//! cache with the captcha pipeline.

use crate::application::config::AttestationConfig;
use crate::application::run_gate::RunGate;
use crate::domain::entities::{CachedVerdict, IntegrityVerdict};
use crate::domain::gateway::{IntegrityTokenClient, NonceProvider};
use crate::domain::repository::{IntegrityFlagRepository, VerdictCacheRepository};
use crate::domain::services::decode_verdict;
use crate::domain::value_objects::Nonce;
use crate::error::{AttestationError, AttestationResult};
use chrono::Utc;
use std::sync::Arc;

/// Output DTO for a device check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCheckOutput {
    pub verdict: IntegrityVerdict,
    pub from_cache: bool,
}

impl DeviceCheckOutput {
    pub fn attestation_passed(&self) -> bool {
        self.verdict.attestation_passed()
    }
}

/// Device Integrity Check Use Case
pub struct DeviceCheckUseCase<R, I, N>
where
    R: VerdictCacheRepository + IntegrityFlagRepository,
    I: IntegrityTokenClient,
    N: NonceProvider,
{
    repo: Arc<R>,
    integrity: Arc<I>,
    nonces: Arc<N>,
    config: Arc<AttestationConfig>,
    gate: RunGate,
}

impl<R, I, N> DeviceCheckUseCase<R, I, N>
where
    R: VerdictCacheRepository + IntegrityFlagRepository,
    I: IntegrityTokenClient,
    N: NonceProvider,
{
    pub fn new(
        repo: Arc<R>,
        integrity: Arc<I>,
        nonces: Arc<N>,
        config: Arc<AttestationConfig>,
        gate: RunGate,
    ) -> Self {
        Self {
            repo,
            integrity,
            nonces,
            config,
            gate,
        }
    }

    /// Check the device. A caller-supplied nonce always forces a fresh
    /// token; without one a fresh cached verdict is returned as is.
    pub async fn execute(&self, nonce: Option<Vec<u8>>) -> AttestationResult<DeviceCheckOutput> {
        let _guard = self.gate.acquire().await;

        let nonce = match nonce {
            Some(bytes) => Nonce::from_bytes(bytes),
            None => {
                if let Some(cached) = self.repo.load_verdict().await? {
                    let now_ms = Utc::now().timestamp_millis();
                    if cached.is_fresh(now_ms, self.config.verdict_ttl_ms()) {
                        tracing::debug!("Device check served from cache");
                        return Ok(DeviceCheckOutput {
                            verdict: cached.verdict(),
                            from_cache: true,
                        });
                    }
                }
                self.nonces.generate()
            }
        };

        if nonce.is_empty() {
            return Err(AttestationError::Config("nonce must not be empty".to_string()));
        }

        let token = self.integrity.request(&nonce.to_base64()).await?;
        let verdict = decode_verdict(&token).map_err(|e| {
            AttestationError::Decode(format!("integrity token payload: {e}"))
        })?;

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
            nonce_len = nonce.len(),
            attestation_passed = verdict.attestation_passed(),
            "Device integrity check completed"
        );

        Ok(DeviceCheckOutput {
            verdict,
            from_cache: false,
        })
    }
}
