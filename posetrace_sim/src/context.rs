//! Virtual-clock context implementing ReplayContext for instant, reproducible replays.

use async_trait::async_trait;
use posetrace_env::ReplayContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Replay context backed by a virtual clock.
///
/// This implements `ReplayContext` using:
/// - A virtual clock that can be advanced manually
/// - Simulated sleep that advances virtual time instead of waiting
///
/// Playback driven by a `SimContext` runs as fast as the CPU allows while
/// still reporting the timestamps a real-time replay would have produced.
#[derive(Debug, Clone, Default)]
pub struct SimContext {
    /// Current virtual time (nanoseconds since replay start)
    virtual_time_ns: Arc<AtomicU64>,
}

impl SimContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        self.virtual_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Sets the virtual time to a specific value.
    pub fn set_time(&self, time_ns: u64) {
        self.virtual_time_ns.store(time_ns, Ordering::SeqCst);
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        self.virtual_time_ns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplayContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance_time(duration);
        // let other tasks (signal watchers) observe the frame boundary
        tokio::task::yield_now().await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(future.instrument(tracing::debug_span!("sim_task", name = %name)));
    }
}
