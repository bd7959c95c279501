//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (CSPRNG bytes, Base64)
//! - JSON-over-HTTP client
//! - Persisted key/value preference store

pub mod crypto;
pub mod http;
pub mod prefs;
