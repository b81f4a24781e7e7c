//! One-shot readiness gate.

use std::time::Duration;

use tokio::sync::watch;
use tracing::warn;

/// One-shot synchronization primitive that releases all waiters once table
/// provisioning completes, regardless of success or failure.
///
/// Starts `Pending` and transitions to `Ready` exactly once; `signal` is
/// idempotent. The wait is bounded and never raises: an operation that times
/// out proceeds anyway and lets the backing store fail clearly if the table
/// is not usable yet.
pub struct ReadinessGate {
    ready: watch::Sender<bool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self { ready }
    }

    /// Release all current and future waiters. Only the first call has
    /// effect; subsequent calls are no-ops.
    pub fn signal(&self) {
        self.ready.send_replace(true);
    }

    /// Whether provisioning has completed.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until signaled or until `timeout` elapses. Returns `true` if the
    /// gate was ready, `false` on timeout. A timeout is logged but not an
    /// error; callers proceed regardless.
    pub async fn await_ready(&self, timeout: Duration) -> bool {
        let mut ready = self.ready.subscribe();
        let became_ready =
            match tokio::time::timeout(timeout, ready.wait_for(|signaled| *signaled)).await {
                Ok(_) => true,
                Err(_) => {
                    warn!(
                        ?timeout,
                        "readiness gate wait timed out; proceeding against the table anyway"
                    );
                    false
                }
            };
        became_ready
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
