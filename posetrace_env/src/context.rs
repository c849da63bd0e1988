//! Core scheduling context trait for posetrace playback.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// The interface through which playback observes and spends time.
///
/// This trait abstracts the clock so that the playback sequencer can run
/// against real time (tokio) or a virtual clock (simulation, tests).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` - manually advanced virtual clock
///
/// # Suspension points
///
/// Every `sleep` is a cooperative yield. The sequencer relies on this for
/// the inter-frame delay and for the deferred hand-rotation pass.
#[async_trait]
pub trait ReplayContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    ///
    /// Used for out-of-band watchers such as a stop-request listener.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
