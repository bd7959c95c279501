//! Infrastructure Layer - Repository and gateway implementations

pub mod dto;
pub mod http;
pub mod nonce;
pub mod prefs;
