//! Attestation Error Types
//!
//! Every failure inside a pipeline run is one of these variants. The
//! orchestrator catches them at the step boundary, logs them and turns
//! them into a failed run; they never reach the host as errors.

use kernel::FailureKind;
use platform::http::HttpError;
use platform::prefs::PrefsError;
use thiserror::Error;

/// Attestation result type alias
pub type AttestationResult<T> = Result<T, AttestationError>;

/// Attestation error variants
#[derive(Debug, Error)]
pub enum AttestationError {
    /// Connection, DNS or timeout failure (including the run deadline)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("HTTP status {code}: {message}")]
    HttpStatus { code: u16, message: String },

    /// Malformed JSON or a missing expected field
    #[error("Decode error: {0}")]
    Decode(String),

    /// The device integrity capability failed or is unavailable
    #[error("Integrity service error: {0}")]
    IntegrityService(String),

    /// Persisted preference store failure
    #[error("Storage error: {0}")]
    Storage(#[from] PrefsError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AttestationError {
    /// Get the FailureKind for this error
    pub fn kind(&self) -> FailureKind {
        match self {
            AttestationError::Transport(_) => FailureKind::Transport,
            AttestationError::HttpStatus { .. } => FailureKind::HttpStatus,
            AttestationError::Decode(_) => FailureKind::Decode,
            AttestationError::IntegrityService(_) => FailureKind::IntegrityService,
            AttestationError::Storage(_) => FailureKind::Storage,
            AttestationError::Config(_) => FailureKind::Config,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self, step: &str) {
        match self {
            AttestationError::Storage(e) => {
                tracing::error!(step, error = %e, "Attestation storage error");
            }
            AttestationError::Config(msg) => {
                tracing::error!(step, message = %msg, "Attestation misconfigured");
            }
            AttestationError::HttpStatus { code, message } => {
                tracing::warn!(step, code, message = %message, "Attestation endpoint rejected request");
            }
            AttestationError::IntegrityService(msg) => {
                tracing::warn!(step, message = %msg, "Integrity token request failed");
            }
            _ => {
                tracing::warn!(step, error = %self, "Attestation step failed");
            }
        }
    }
}

impl From<HttpError> for AttestationError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Transport(msg) => AttestationError::Transport(msg),
            HttpError::Status { code, message } => AttestationError::HttpStatus { code, message },
            HttpError::Decode(msg) => AttestationError::Decode(msg),
        }
    }
}
