//! Error types used by the queue and its configuration.
//!
//! This module defines two enums:
//!
//! - [`ConfigError`]: the queue configuration is invalid; no queue is created.
//! - [`QueueError`]: errors raised by queue operations (construction, submission,
//!   completion reports, drain).
//!
//! Both provide `as_label` for logs/metrics. Usage contract violations
//! (reporting completion for a task that is not running, or reporting twice) are
//! errors in the caller; see [`QueueError::is_contract_violation`].

use thiserror::Error;

use crate::jobs::TaskId;

/// # Invalid queue configuration.
///
/// Returned by [`QueueConfig::validate`](crate::QueueConfig::validate) and wrapped into
/// [`QueueError::Config`] by the constructors.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Capacity must allow at least one running task.
    #[error("capacity must be positive, got {capacity}")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cooldown_queue::ConfigError;
    ///
    /// let err = ConfigError::InvalidCapacity { capacity: 0 };
    /// assert_eq!(err.as_label(), "config_invalid_capacity");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::InvalidCapacity { .. } => "config_invalid_capacity",
        }
    }
}

/// # Errors produced by queue operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The queue was constructed outside of a tokio runtime.
    #[error("no tokio runtime available to run the admission loop")]
    NoRuntime,

    /// Completion reported for a task that is not in the running set
    /// (never submitted, still enqueued, or already evicted).
    #[error("task {id} is not running")]
    NotRunning {
        /// Identifier passed by the caller.
        id: TaskId,
    },

    /// Completion reported twice for the same task.
    #[error("task {id} already reported completion")]
    AlreadyDone {
        /// Identifier passed by the caller.
        id: TaskId,
    },

    /// The queue drained under [`DrainPolicy::Seal`](crate::DrainPolicy::Seal)
    /// and accepts no further use.
    #[error("queue is sealed after drain")]
    Sealed,

    /// The queue was shut down.
    #[error("queue is shut down")]
    Closed,
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use cooldown_queue::{QueueError, TaskId};
    ///
    /// let err = QueueError::AlreadyDone { id: TaskId::new(7) };
    /// assert_eq!(err.as_label(), "queue_already_done");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::Config(e) => e.as_label(),
            QueueError::NoRuntime => "queue_no_runtime",
            QueueError::NotRunning { .. } => "queue_not_running",
            QueueError::AlreadyDone { .. } => "queue_already_done",
            QueueError::Sealed => "queue_sealed",
            QueueError::Closed => "queue_closed",
        }
    }

    /// Indicates a programming error in the caller's completion reporting.
    ///
    /// Returns `true` for [`QueueError::NotRunning`] and [`QueueError::AlreadyDone`].
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            QueueError::NotRunning { .. } | QueueError::AlreadyDone { .. }
        )
    }

    /// Identifier the error refers to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            QueueError::NotRunning { id } | QueueError::AlreadyDone { id } => Some(*id),
            _ => None,
        }
    }
}
