//! # Events emitted by the queue and its subscriber workers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Task events**: one task moving through the queue (submitted, admitted, completed, evicted)
//! - **Queue events**: drain, seal, shutdown, contract violations
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries metadata such as timestamps, the task id and label,
//! queue occupancy at the time of the transition, and elapsed durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cooldown_queue::{Event, EventKind, TaskId};
//!
//! let ev = Event::new(EventKind::TaskAdmitted)
//!     .with_task(TaskId::new(3))
//!     .with_label("fetch")
//!     .with_occupancy(2, 5)
//!     .with_elapsed(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::TaskAdmitted);
//! assert_eq!(ev.task, Some(TaskId::new(3)));
//! assert_eq!(ev.elapsed_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::jobs::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task events ===
    /// Task was accepted and placed in the enqueued set.
    ///
    /// Sets: `task`, `label`, `running`, `enqueued`
    TaskSubmitted,

    /// Task was promoted into the running set and its work launched.
    ///
    /// Sets: `task`, `label`, `running`, `enqueued`,
    /// `elapsed_ms` (time spent enqueued)
    TaskAdmitted,

    /// Task reported completion; its slot is now cooling down.
    ///
    /// Sets: `task`, `label`, `elapsed_ms` (time since admission)
    TaskCompleted,

    /// Task was removed from the running set after its cooldown elapsed.
    ///
    /// Sets: `task`, `label`, `running`, `enqueued`,
    /// `elapsed_ms` (time held since completion)
    TaskEvicted,

    /// Task was dropped from the enqueued set by shutdown without ever running.
    ///
    /// Sets: `task`, `label`
    TaskDiscarded,

    /// Task work panicked. The slot stays occupied until the task is reported done.
    ///
    /// Sets: `task`, `reason` (panic message)
    TaskPanicked,

    // === Queue events ===
    /// Completion was reported for an identifier that is not running or already done.
    ///
    /// Sets: `task`, `reason` (error label)
    ContractViolation,

    /// Every submitted task reported completion; `wait` returned.
    ///
    /// Sets: `running`, `enqueued`
    Drained,

    /// Queue sealed after a drain (`DrainPolicy::Seal`).
    Sealed,

    /// Queue teardown requested; the admission loop is stopping.
    ShutdownRequested,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `label` (subscriber name), `reason` (panic info)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `label` (subscriber name), `reason` (e.g. "full", "closed")
    SubscriberOverflow,
}

/// Queue event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task the event refers to.
    pub task: Option<TaskId>,
    /// Job label, or subscriber name for subscriber events.
    pub label: Option<Arc<str>>,
    /// Human-readable reason (panic text, error label, overflow cause).
    pub reason: Option<Arc<str>>,
    /// Size of the running set after the transition.
    pub running: Option<usize>,
    /// Size of the enqueued set after the transition.
    pub enqueued: Option<usize>,
    /// Duration attached to the transition, in milliseconds.
    pub elapsed_ms: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            label: None,
            reason: None,
            running: None,
            enqueued: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a task identifier.
    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches a label.
    #[inline]
    pub fn with_label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches running/enqueued set sizes.
    #[inline]
    pub fn with_occupancy(mut self, running: usize, enqueued: usize) -> Self {
        self.running = Some(running);
        self.enqueued = Some(enqueued);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(millis(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_label(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_label(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}
