use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token shared between the binary and the fetch stage.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as cancelled and wakes pending waiters.
    pub fn cancel(&self) {
        let already_cancelled = self.cancelled.swap(true, Ordering::SeqCst);
        if !already_cancelled {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        // 先註冊再檢查，避免錯過 notify_waiters
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Raises a shared stop flag when dropped.
///
/// Blocking work handed to `spawn_blocking` keeps running after the awaiting
/// future is dropped by a timeout or cancellation; it polls the flag instead.
#[derive(Debug, Default)]
pub struct StopOnDrop {
    stop: Arc<AtomicBool>,
}

impl StopOnDrop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }
}

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

/// Waits for interrupts: the first one cancels `cancel`, the second one
/// returns `true` so the caller can exit. Returns `false` if the signal
/// source fails.
pub async fn handle_interrupts<F, Fut>(
    mut next_interrupt: F,
    cancel: CancellationToken,
) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_interrupt().await {
        tracing::warn!("Cannot listen for interrupts: {}", e);
        return false;
    }
    tracing::warn!("⚠️  Interrupted, cancelling. Press Ctrl-C again to quit now");
    cancel.cancel();

    if next_interrupt().await.is_err() {
        return false;
    }
    tracing::warn!("Interrupted again, exiting");
    true
}
