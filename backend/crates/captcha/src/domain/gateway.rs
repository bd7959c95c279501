//! Gateway Traits
//!
//! Remote collaborators driven by the pipeline: the three grant-server
//! endpoints, the platform integrity service, and the nonce source.

use crate::domain::value_objects::{ChallengeValue, IntegrityToken, Nonce};
use crate::error::AttestationResult;
use kernel::{CaptchaId, PaymentId};

/// Input for the payment attestation verification call
#[derive(Debug, Clone)]
pub struct PaymentAttestationRequest {
    pub payment_id: PaymentId,
    pub integrity_token: IntegrityToken,
    pub unique_value: ChallengeValue,
    /// Identity of the calling application
    pub package_name: String,
}

/// Step 1: start attestation for a payment id
#[trait_variant::make(AttestationEndpoint: Send)]
pub trait LocalAttestationEndpoint {
    /// Returns the server-chosen `uniqueValue`, which may be absent or empty
    async fn start(&self, payment_id: &PaymentId) -> AttestationResult<Option<String>>;
}

/// Step 2 (remote half): submit the integrity token for verification
#[trait_variant::make(PaymentAttestationEndpoint: Send)]
pub trait LocalPaymentAttestationEndpoint {
    async fn verify(&self, request: &PaymentAttestationRequest) -> AttestationResult<()>;
}

/// Step 3: mark the captcha solved
#[trait_variant::make(CaptchaSolveEndpoint: Send)]
pub trait LocalCaptchaSolveEndpoint {
    async fn solve(
        &self,
        payment_id: &PaymentId,
        captcha_id: &CaptchaId,
        solution: &str,
    ) -> AttestationResult<()>;
}

/// Platform device-integrity capability
#[trait_variant::make(IntegrityTokenClient: Send)]
pub trait LocalIntegrityTokenClient {
    /// Request a token bound to `nonce`
    async fn request(&self, nonce: &str) -> AttestationResult<IntegrityToken>;
}

/// Source of client-side nonces
pub trait NonceProvider: Send + Sync {
    fn generate(&self) -> Nonce;
}
