//! Quota store contract and the in-memory fixed-window implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::snapshot::QuotaSnapshot;

/// Abstract counter storage for admission checks.
///
/// `check` atomically counts one attempt for `id` within the current window
/// and reports the resulting state. Implementations must be safe under
/// concurrent callers across processes; the engine pushes all serialization
/// to this boundary and holds no locks of its own.
///
/// The returned snapshot uses the pre-decrement convention described on
/// [`QuotaSnapshot`]: `remaining` includes the attempt being counted.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Count one attempt and return the window state.
    async fn check(
        &self,
        id: &str,
        max: u64,
        window: Duration,
        namespace: &str,
    ) -> Result<QuotaSnapshot, StoreError>;

    /// Establish the store connection. Called once by `start()`; safe to
    /// call again.
    async fn connect(&self) -> Result<(), StoreError>;

    /// Close the store connection. Idempotent, and safe to call even if
    /// `connect` never ran.
    async fn close(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy)]
struct WindowState {
    count: u64,
    reset_at_millis: u64,
}

/// Fixed-window counter held in process memory.
///
/// Suitable for tests and single-process deployments. Multi-process
/// deployments need a shared backend implementing [`QuotaStore`] against a
/// networked key-value store with TTL.
#[derive(Debug, Clone)]
pub struct InMemoryQuotaStore {
    clock: Arc<dyn Clock>,
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl Default for InMemoryQuotaStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryQuotaStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, windows: Arc::new(Mutex::new(HashMap::new())) }
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn check(
        &self,
        id: &str,
        max: u64,
        window: Duration,
        namespace: &str,
    ) -> Result<QuotaSnapshot, StoreError> {
        let key = format!("{}:{}", namespace, id);
        let now = self.clock.now_millis();
        let window_millis = window.as_millis() as u64;

        let mut windows = self.windows.lock().unwrap();
        let state = windows
            .entry(key)
            .or_insert_with(|| WindowState { count: 0, reset_at_millis: now + window_millis });
        if now >= state.reset_at_millis {
            // Window elapsed: start a fresh one at the current instant.
            state.count = 0;
            state.reset_at_millis = now + window_millis;
        }
        state.count += 1;

        Ok(QuotaSnapshot {
            total: max,
            remaining: max.saturating_add(1).saturating_sub(state.count),
            reset: state.reset_at_millis / 1_000,
        })
    }

    async fn connect(&self) -> Result<(), StoreError> {
        tracing::debug!("in-memory quota store connected");
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        tracing::debug!("in-memory quota store closed");
        Ok(())
    }
}
