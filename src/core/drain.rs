//! # Outstanding-work counter.
//!
//! [`DrainLatch`] counts submitted tasks that have not reported completion. It is
//! independent of the state lock: `add`/`release` are synchronous and never block,
//! and [`DrainLatch::drained`] resolves once the count reaches zero.
//!
//! Built on `tokio::sync::watch`, so every waiter sees the latest count and a
//! release that happens before a waiter subscribes is never missed.

use tokio::sync::watch;

/// Counting completion signal.
pub(crate) struct DrainLatch {
    tx: watch::Sender<usize>,
}

impl DrainLatch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    /// Registers one more outstanding task.
    pub fn add(&self) {
        self.tx.send_modify(|n| *n += 1);
    }

    /// Marks one task as finished and returns how many remain.
    pub fn release(&self) -> usize {
        let mut left = 0;
        self.tx.send_modify(|n| {
            *n = n.saturating_sub(1);
            left = *n;
        });
        left
    }

    /// Current number of outstanding tasks.
    pub fn outstanding(&self) -> usize {
        *self.tx.borrow()
    }

    /// Resolves once the outstanding count is zero.
    pub async fn drained(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}
