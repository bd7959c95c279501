//! Application Configuration
//!
//! Configuration for the attestation application layer. Passed in at
//! construction; nothing is looked up lazily.

use crate::error::{AttestationError, AttestationResult};
use reqwest::Url;
use std::env;
use std::time::Duration;

/// Path of the attestation endpoints on the grant server
pub const ATTESTATION_PATH: &str = "/v1/attestations/android";
/// Path of the captcha solution endpoint on the grant server
pub const CAPTCHA_SOLUTION_PATH: &str = "/v3/captcha/solution";

/// Attestation application configuration
#[derive(Debug, Clone)]
pub struct AttestationConfig {
    /// Base URL for start (POST) and verify (PUT `/{paymentId}`)
    pub attestation_base_url: String,
    /// Base URL for solve (POST `/{paymentId}/{captchaId}`)
    pub captcha_base_url: String,
    /// Caller identity sent with the verification request
    pub package_name: String,
    /// Cached verdict lifetime
    pub verdict_ttl: Duration,
    /// End-to-end deadline for one run
    pub run_deadline: Duration,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Failures after which the scheduled captcha is paused
    pub max_failed_attempts: u32,
    /// Length of generated client nonces
    pub nonce_len: usize,
}

impl AttestationConfig {
    /// Derive endpoint URLs from a grant server URL
    pub fn for_server(server_url: &str, package_name: impl Into<String>) -> Self {
        let server = server_url.trim_end_matches('/');
        Self {
            attestation_base_url: format!("{server}{ATTESTATION_PATH}"),
            captcha_base_url: format!("{server}{CAPTCHA_SOLUTION_PATH}"),
            package_name: package_name.into(),
            verdict_ttl: Duration::from_secs(10 * 24 * 3600), // 10 days
            run_deadline: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            max_failed_attempts: 10,
            nonce_len: 24,
        }
    }

    /// Load from `ATTEST_*` environment variables
    ///
    /// `ATTEST_SERVER_URL` and `ATTEST_PACKAGE_NAME` are required; the
    /// rest fall back to the defaults of [`AttestationConfig::for_server`].
    pub fn from_env() -> AttestationResult<Self> {
        let server_url = required_var("ATTEST_SERVER_URL")?;
        let package_name = required_var("ATTEST_PACKAGE_NAME")?;
        let mut config = Self::for_server(&server_url, package_name);

        if let Some(secs) = optional_u64("ATTEST_VERDICT_TTL_SECS")? {
            config.verdict_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = optional_u64("ATTEST_RUN_DEADLINE_SECS")? {
            config.run_deadline = Duration::from_secs(secs);
        }
        if let Some(secs) = optional_u64("ATTEST_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = optional_u64("ATTEST_MAX_FAILED_ATTEMPTS")? {
            config.max_failed_attempts = u32::try_from(max).map_err(|_| {
                AttestationError::Config("ATTEST_MAX_FAILED_ATTEMPTS is out of range".into())
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject unusable values up front
    pub fn validate(&self) -> AttestationResult<()> {
        for (name, url) in [
            ("attestation_base_url", &self.attestation_base_url),
            ("captcha_base_url", &self.captcha_base_url),
        ] {
            let parsed = Url::parse(url)
                .map_err(|e| AttestationError::Config(format!("{name} is not a URL: {e}")))?;
            if parsed.cannot_be_a_base() {
                return Err(AttestationError::Config(format!(
                    "{name} cannot take path segments"
                )));
            }
        }
        if self.package_name.is_empty() {
            return Err(AttestationError::Config("package_name is empty".into()));
        }
        if self.verdict_ttl.is_zero() || self.run_deadline.is_zero() || self.request_timeout.is_zero()
        {
            return Err(AttestationError::Config("durations must be non-zero".into()));
        }
        if self.max_failed_attempts == 0 {
            return Err(AttestationError::Config(
                "max_failed_attempts must be at least 1".into(),
            ));
        }
        if self.nonce_len == 0 {
            return Err(AttestationError::Config("nonce_len must be non-zero".into()));
        }
        Ok(())
    }

    /// TTL in milliseconds, saturating at `i64::MAX`
    pub fn verdict_ttl_ms(&self) -> i64 {
        i64::try_from(self.verdict_ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

fn required_var(name: &str) -> AttestationResult<String> {
    env::var(name).map_err(|_| AttestationError::Config(format!("{name} must be set")))
}

fn optional_u64(name: &str) -> AttestationResult<Option<u64>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AttestationError::Config(format!("{name} must be an integer"))),
        Err(_) => Ok(None),
    }
}
