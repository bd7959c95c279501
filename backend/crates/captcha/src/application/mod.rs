//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod config;
pub mod device_check;
pub mod run_attestation;
pub mod run_gate;
pub mod scheduled_captcha;
