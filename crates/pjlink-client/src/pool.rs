//! Shared I/O runtime for all projector connections.
//!
//! One [`PjlinkPool`] owns the tokio runtime that drives every connection.
//! The runtime is restricted to a single worker thread, so all socket reads,
//! writes, and timers for all connections execute serially on that thread —
//! between await points a connection task runs atomically with respect to
//! every other one. Application threads interact with connections only by
//! handing work to this runtime; they never touch a socket.
//!
//! A single pool typically serves all projectors. Multiple pools are
//! permitted but unusual.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

use crate::error::ClientError;

const WORKER_THREAD_NAME: &str = "pjlink-io";
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the I/O runtime shared by all projector connections.
///
/// Cloning yields another handle to the same pool; the runtime itself stays
/// shared. The pool starts stopped — call [`PjlinkPool::start`] before
/// starting any projector.
#[derive(Clone, Default)]
pub struct PjlinkPool {
    inner: Arc<Mutex<Option<Runtime>>>,
}

impl PjlinkPool {
    /// Creates a stopped pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the runtime and its single worker thread. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Runtime`] when the runtime cannot be built.
    pub fn start(&self) -> Result<(), ClientError> {
        let mut guard = self.inner.lock();
        if guard.is_some() {
            return Ok(());
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name(WORKER_THREAD_NAME)
            .enable_io()
            .enable_time()
            .build()
            .map_err(ClientError::Runtime)?;
        *guard = Some(runtime);
        info!("projector pool started");
        Ok(())
    }

    /// Shuts the runtime down, waiting up to ten seconds for in-flight
    /// connection tasks to wind up. Idempotent; safe if never started.
    ///
    /// Must not be called from the pool's own worker thread.
    pub fn stop(&self) {
        let runtime = self.inner.lock().take();
        if let Some(runtime) = runtime {
            runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
            info!("projector pool stopped");
        }
    }

    /// Whether the runtime is up.
    pub fn is_running(&self) -> bool {
        self.inner.lock().is_some()
    }

    /// A handle for spawning connection tasks, when running.
    pub(crate) fn handle(&self) -> Option<Handle> {
        self.inner.lock().as_ref().map(|rt| rt.handle().clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_starts_and_stops() {
        let pool = PjlinkPool::new();
        assert!(!pool.is_running());

        pool.start().expect("start");
        assert!(pool.is_running());
        assert!(pool.handle().is_some());

        pool.stop();
        assert!(!pool.is_running());
        assert!(pool.handle().is_none());
    }

    #[test]
    fn test_start_is_idempotent() {
        let pool = PjlinkPool::new();
        pool.start().expect("first start");
        pool.start().expect("second start");
        assert!(pool.is_running());
        pool.stop();
    }

    #[test]
    fn test_stop_without_start_is_a_noop() {
        let pool = PjlinkPool::new();
        pool.stop();
        assert!(!pool.is_running());
    }

    #[test]
    fn test_clones_share_the_runtime() {
        let pool = PjlinkPool::new();
        let other = pool.clone();
        pool.start().expect("start");
        assert!(other.is_running());
        other.stop();
        assert!(!pool.is_running());
    }
}
