//! Retry suppression shared by all users of a directory client

use crate::context::RequestContext;
use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Owner of a client's "retries disabled" flag
///
/// The flag belongs to the client, not to any one lookup. A lookup borrows
/// it through [`RetryControl::suppress`], which hands back a guard that puts
/// the previous value back when dropped. Suppressors are serialised on an
/// async mutex so two lookups never interleave their set/restore pairs.
///
/// Requests that do not suppress retries never wait on the mutex. While a
/// suppression is active they see retries disabled as well.
#[derive(Debug)]
pub struct RetryControl {
    disabled: Arc<AtomicBool>,
    gate: Arc<Mutex<()>>,
}

impl RetryControl {
    /// Create a control with retries enabled
    pub fn new() -> Self {
        Self {
            disabled: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Whether automatic retries are currently disabled
    pub fn retries_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    /// Disable retries until the returned guard is dropped
    ///
    /// Waiting for another suppressor honours `ctx`, so a cancelled lookup
    /// does not queue behind a slow one.
    pub async fn suppress(&self, ctx: &RequestContext) -> Result<RetrySuppression> {
        let gate = Arc::clone(&self.gate);
        let permit = ctx.run(async move { Ok(gate.lock_owned().await) }).await?;
        let prior = self.disabled.swap(true, Ordering::SeqCst);
        debug!(prior, "Retries suppressed");

        Ok(RetrySuppression {
            flag: Arc::clone(&self.disabled),
            prior,
            _permit: permit,
        })
    }
}

impl Default for RetryControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`RetryControl::suppress`]
///
/// Restores the flag before releasing the suppression mutex, on every exit
/// path including unwinding and dropped futures.
#[derive(Debug)]
pub struct RetrySuppression {
    flag: Arc<AtomicBool>,
    prior: bool,
    _permit: OwnedMutexGuard<()>,
}

impl Drop for RetrySuppression {
    fn drop(&mut self) {
        self.flag.store(self.prior, Ordering::SeqCst);
        debug!(restored = self.prior, "Retry suppression released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_restores_flag() {
        let control = RetryControl::new();
        let ctx = RequestContext::background();
        assert!(!control.retries_disabled());

        {
            let _guard = control.suppress(&ctx).await.unwrap();
            assert!(control.retries_disabled());
        }

        assert!(!control.retries_disabled());
    }

    #[tokio::test]
    async fn test_flag_restored_when_task_panics() {
        let control = Arc::new(RetryControl::new());
        let ctx = RequestContext::background();

        let inner = Arc::clone(&control);
        let handle = tokio::spawn(async move {
            let _guard = inner.suppress(&ctx).await.unwrap();
            panic!("lookup blew up");
        });

        assert!(handle.await.is_err());
        assert!(!control.retries_disabled());
    }

    #[tokio::test]
    async fn test_suppressors_serialise() {
        let control = Arc::new(RetryControl::new());
        let ctx = RequestContext::background();

        let first = control.suppress(&ctx).await.unwrap();

        // A second suppressor with a short deadline gives up while the first holds the gate
        let waiting = ctx.with_timeout(Duration::from_millis(20));
        let second = control.suppress(&waiting).await;
        assert!(second.is_err());
        assert!(control.retries_disabled());

        drop(first);
        assert!(!control.retries_disabled());

        let third = control.suppress(&ctx).await.unwrap();
        assert!(control.retries_disabled());
        drop(third);
        assert!(!control.retries_disabled());
    }

    #[tokio::test]
    async fn test_cancelled_context_does_not_touch_flag() {
        let control = RetryControl::new();
        let ctx = RequestContext::background();
        ctx.cancel();

        assert!(control.suppress(&ctx).await.is_err());
        assert!(!control.retries_disabled());
    }
}
