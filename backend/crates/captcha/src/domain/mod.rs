//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (AttestationSession, CachedVerdict, IntegrityVerdict, ScheduledCaptcha)
//! - Domain value objects (ChallengeValue, IntegrityToken, Nonce)
//! - Domain services (verdict decoding, cache freshness)
//! - Repository and gateway traits (interfaces)

pub mod entities;
pub mod gateway;
pub mod repository;
pub mod services;
pub mod value_objects;
