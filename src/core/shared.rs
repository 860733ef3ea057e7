use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::events::Bus;

use super::drain::DrainLatch;
use super::state::QueueState;

/// State shared between queue handles and the admission loop.
pub(crate) struct Shared {
    pub cfg: QueueConfig,
    /// The only lock in the queue. Never held across `.await` or while running job code.
    state: Mutex<QueueState>,
    pub latch: DrainLatch,
    /// Wakes the admission loop on submission and completion.
    pub wake: Notify,
    pub bus: Bus,
    /// Stops the admission loop and the subscriber listener.
    pub token: CancellationToken,
}

impl Shared {
    pub fn new(cfg: QueueConfig, bus: Bus, token: CancellationToken) -> Self {
        Self {
            cfg,
            state: Mutex::new(QueueState::new()),
            latch: DrainLatch::new(),
            wake: Notify::new(),
            bus,
            token,
        }
    }

    /// Locks the queue state.
    ///
    /// No code path panics while holding the guard, so a poisoned lock still holds
    /// consistent state and is recovered.
    pub fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
