//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Drive the captcha attestation pipeline against a grant server.
#[derive(Parser, Debug)]
#[command(name = "attest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Preference file holding the verdict cache and failure counter.
    #[arg(long, env = "ATTEST_PREFS_PATH", default_value = "attest-prefs.json")]
    pub prefs: PathBuf,

    /// Integrity token command; the nonce is appended as the last argument.
    #[arg(long, env = "ATTEST_INTEGRITY_COMMAND")]
    pub integrity_command: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Attest the device and solve a captcha.
    Run {
        payment_id: String,
        captcha_id: String,
        /// Ignore a cached verdict.
        #[arg(long)]
        fresh: bool,
    },
    /// Run the stand-alone device integrity check.
    Check {
        /// Base64 nonce; a random one is generated when omitted.
        #[arg(long)]
        nonce: Option<String>,
    },
    /// Remember a captcha to solve later.
    Schedule { payment_id: String, captcha_id: String },
    /// Postpone the scheduled captcha prompt.
    Snooze,
    /// Show the captcha due for a payment id, if any.
    Due { payment_id: String },
    /// Print the persisted attestation state.
    Status,
}
