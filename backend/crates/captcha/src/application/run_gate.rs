//! Per-profile run serialization
//!
//! Use cases that write the verdict cache or the failure counter take the
//! same gate, so at most one of them is in flight per profile. Later
//! callers wait their turn rather than racing on the persisted state.

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
pub struct RunGate {
    inner: Arc<Mutex<()>>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other run holds the gate
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.inner.lock().await
    }

    /// True while some run holds the gate
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
