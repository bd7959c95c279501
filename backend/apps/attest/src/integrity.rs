//! External-command integrity token client
//!
//! Stands in for the platform integrity service on hosts without one: runs
//! a configured command with the nonce as its last argument and reads the
//! token from stdout.

use captcha::AttestationError;
use captcha::AttestationResult;
use captcha::domain::gateway::IntegrityTokenClient;
use captcha::domain::value_objects::IntegrityToken;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CommandIntegrityTokenClient {
    program: String,
    args: Vec<String>,
}

impl CommandIntegrityTokenClient {
    /// Split a whitespace-separated command line
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl IntegrityTokenClient for CommandIntegrityTokenClient {
    async fn request(&self, nonce: &str) -> AttestationResult<IntegrityToken> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(nonce)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AttestationError::IntegrityService(format!("failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AttestationError::IntegrityService(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8(output.stdout)
            .map_err(|_| AttestationError::IntegrityService("token is not UTF-8".into()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AttestationError::IntegrityService("empty token".into()));
        }

        tracing::debug!(program = %self.program, "Integrity token received from command");
        Ok(IntegrityToken::new(token))
    }
}
