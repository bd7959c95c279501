//! Attestation Driver Entry Point
//!
//! Wires the HTTP gateway, a JSON-file preference store and an
//! external-command integrity client for exercising the pipeline against
//! a staging grant server. Uses `anyhow` for startup errors; pipeline
//! failures are reported through `RunOutcome`.

mod cli;
mod integrity;

use anyhow::Context;
use captcha::domain::repository::{
    FailureCounterRepository, IntegrityFlagRepository, ScheduledCaptchaRepository,
    VerdictCacheRepository,
};
use captcha::{
    AttestationConfig, CaptchaId, DeviceCheckUseCase, HttpAttestationGateway, OsNonceProvider,
    PaymentId, PrefsCaptchaRepository, RunAttestationInput, RunAttestationUseCase, RunGate,
    RunOutcome, ScheduledCaptchaUseCase,
};
use clap::Parser;
use cli::{Cli, Command};
use integrity::CommandIntegrityTokenClient;
use platform::crypto::from_base64;
use platform::prefs::JsonFilePreferenceStore;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attest=info,captcha=info,platform=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let store = JsonFilePreferenceStore::open(&cli.prefs)
        .await
        .with_context(|| format!("opening preference file {}", cli.prefs.display()))?;
    let repo = Arc::new(PrefsCaptchaRepository::new(Arc::new(store)));
    let gate = RunGate::new();

    match cli.command {
        Command::Run {
            payment_id,
            captcha_id,
            fresh,
        } => {
            let config = Arc::new(AttestationConfig::from_env()?);
            let integrity = integrity_client(cli.integrity_command.as_deref())?;
            let gateway = Arc::new(HttpAttestationGateway::new(&config)?);
            tracing::info!(server = %config.attestation_base_url, "Starting attestation run");

            let use_case = RunAttestationUseCase::new(repo, gateway, integrity, config, gate);
            let mut input = RunAttestationInput::new(captcha_id, payment_id);
            if fresh {
                input = input.forcing_fresh();
            }

            let outcome = use_case.execute(input).await;
            match outcome {
                RunOutcome::Succeeded {
                    attestation_passed,
                    from_cache,
                } => {
                    println!("solved (attestation_passed={attestation_passed}, from_cache={from_cache})");
                }
                RunOutcome::Failed {
                    failed_at,
                    kind,
                    failures,
                } => {
                    println!("failed at {failed_at}: {kind} (consecutive failures: {failures})");
                }
            }
            Ok(exit_code(outcome.is_success()))
        }
        Command::Check { nonce } => {
            let config = Arc::new(AttestationConfig::from_env()?);
            let integrity = integrity_client(cli.integrity_command.as_deref())?;
            let nonce = nonce
                .map(|encoded| from_base64(&encoded))
                .transpose()
                .context("--nonce must be base64")?;

            let use_case = DeviceCheckUseCase::new(
                repo,
                integrity,
                Arc::new(OsNonceProvider::new(config.nonce_len)),
                config,
                gate,
            );
            let output = use_case.execute(nonce).await?;
            println!(
                "cts_profile_match={} basic_integrity={} from_cache={}",
                output.verdict.cts_profile_match, output.verdict.basic_integrity, output.from_cache
            );
            Ok(exit_code(output.attestation_passed()))
        }
        Command::Schedule {
            payment_id,
            captcha_id,
        } => {
            ScheduledCaptchaUseCase::new(repo, gate)
                .schedule(&PaymentId::new(payment_id), &CaptchaId::new(captcha_id))
                .await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Snooze => {
            let snooze_count = ScheduledCaptchaUseCase::new(repo, gate).snooze().await?;
            println!("snooze_count={snooze_count}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Due { payment_id } => {
            let due = ScheduledCaptchaUseCase::new(repo, gate)
                .next_due(&PaymentId::new(payment_id))
                .await?;
            match due {
                Some(captcha) => println!(
                    "due captcha_id={} can_snooze={}",
                    captcha.captcha_id,
                    captcha.can_snooze()
                ),
                None => println!("nothing due"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let failures = repo.failure_count().await?;
            let check_failed = repo.check_failed().await?;
            let cached = repo.load_verdict().await?;
            let pending = repo.scheduled_captcha().await?;

            println!("failed_attempts={failures}");
            println!("safetynet_check_failed={check_failed}");
            match cached {
                Some(verdict) => println!(
                    "cached_verdict captured_at_ms={} attestation_passed={}",
                    verdict.captured_at_ms,
                    verdict.verdict().attestation_passed()
                ),
                None => println!("cached_verdict none"),
            }
            match pending {
                Some(captcha) => println!(
                    "scheduled_captcha payment_id={} captcha_id={} paused={} snooze_count={}",
                    captcha.payment_id, captcha.captcha_id, captcha.paused, captcha.snooze_count
                ),
                None => println!("scheduled_captcha none"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn integrity_client(command_line: Option<&str>) -> anyhow::Result<Arc<CommandIntegrityTokenClient>> {
    let command_line = command_line.context("ATTEST_INTEGRITY_COMMAND must be set")?;
    let client = CommandIntegrityTokenClient::parse(command_line)
        .context("ATTEST_INTEGRITY_COMMAND is empty")?;
    Ok(Arc::new(client))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
