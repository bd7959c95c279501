//! Adaptive Captcha Attestation Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, verdict decoding, repository and gateway traits
//! - `application/` - Use cases (attestation run, device check, scheduled captcha)
//! - `infra/` - Preference-backed repositories, HTTP gateway, OS nonce source
//!
//! ## Security Model
//! - A run proves device integrity to the grant server before the captcha is marked solved
//! - Integrity tokens are bound to a server-issued challenge (or a CSPRNG client nonce)
//! - A cached verdict is trusted for at most the configured TTL
//! - One run per profile at a time; failures are counted durably

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::AttestationConfig;
pub use application::device_check::{DeviceCheckOutput, DeviceCheckUseCase};
pub use application::run_attestation::{RunAttestationInput, RunAttestationUseCase, RunOutcome};
pub use application::run_gate::RunGate;
pub use application::scheduled_captcha::ScheduledCaptchaUseCase;
pub use error::{AttestationError, AttestationResult};
pub use infra::http::HttpAttestationGateway;
pub use infra::nonce::OsNonceProvider;
pub use infra::prefs::PrefsCaptchaRepository;

pub use kernel::{CaptchaId, FailureKind, PaymentId};

#[cfg(test)]
mod test_support;
