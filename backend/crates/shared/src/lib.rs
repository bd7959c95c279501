//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Failure classification shared by the pipeline and its host
//! - Opaque identifier types (captcha id, payment id)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod kind;
}
pub mod id;

pub use error::kind::FailureKind;
pub use id::{CaptchaId, PaymentId};
