//! # Logging subscriber.
//!
//! [`LogWriter`] turns queue events into `tracing` records. Install any
//! `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! | Event                                        | Level   |
//! |----------------------------------------------|---------|
//! | submitted / admitted / completed / evicted   | `debug` |
//! | discarded / drained / sealed / shutdown      | `info`  |
//! | task panic / subscriber overflow or panic    | `warn`  |
//! | contract violation                           | `error` |
//!
//! ## Example
//! ```no_run
//! # #[cfg(feature = "logging")]
//! # async fn demo() -> Result<(), cooldown_queue::QueueError> {
//! use std::sync::Arc;
//! use cooldown_queue::{LogWriter, QueueBuilder, QueueConfig};
//!
//! let queue = QueueBuilder::new(QueueConfig::default())
//!     .with_subscribers(vec![Arc::new(LogWriter::new())])
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber backed by `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.map(|id| id.get());
        let label = e.label.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::TaskSubmitted => {
                debug!(seq = e.seq, task, label, enqueued = e.enqueued, "submitted");
            }
            EventKind::TaskAdmitted => {
                debug!(
                    seq = e.seq,
                    task,
                    label,
                    running = e.running,
                    waited_ms = e.elapsed_ms,
                    "admitted"
                );
            }
            EventKind::TaskCompleted => {
                debug!(seq = e.seq, task, label, ran_ms = e.elapsed_ms, "completed");
            }
            EventKind::TaskEvicted => {
                debug!(
                    seq = e.seq,
                    task,
                    label,
                    running = e.running,
                    held_ms = e.elapsed_ms,
                    "evicted"
                );
            }
            EventKind::TaskDiscarded => {
                info!(seq = e.seq, task, label, "discarded");
            }
            EventKind::TaskPanicked => {
                warn!(seq = e.seq, task, reason = e.reason.as_deref(), "task panicked");
            }
            EventKind::ContractViolation => {
                error!(seq = e.seq, task, reason = e.reason.as_deref(), "contract violation");
            }
            EventKind::Drained => {
                info!(seq = e.seq, running = e.running, "drained");
            }
            EventKind::Sealed => {
                info!(seq = e.seq, "sealed");
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, "shutdown requested");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = label, reason = e.reason.as_deref(), "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = label, info = e.reason.as_deref(), "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
