//! # One-shot unit of work.
//!
//! A [`Job`] is consumed when the admission loop promotes it: [`Job::spawn`] turns it
//! into a future that runs on its own tokio task. The job receives the [`TaskId`] the
//! queue assigned at submission and must eventually pass it to
//! [`Queue::done`](crate::Queue::done) exactly once.
//!
//! A job that never reports completion keeps its slot forever and blocks
//! [`Queue::wait`](crate::Queue::wait).

use std::future::Future;
use std::pin::Pin;

use crate::jobs::TaskId;

/// Boxed future produced by a job once it is admitted.
pub type BoxJobFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// # Unit of work submitted to a [`Queue`](crate::Queue).
///
/// # Example
/// ```
/// use cooldown_queue::{BoxJobFuture, Job, Queue, TaskId};
///
/// struct Ping {
///     queue: Queue,
/// }
///
/// impl Job for Ping {
///     fn label(&self) -> &str { "ping" }
///
///     fn spawn(self: Box<Self>, id: TaskId) -> BoxJobFuture {
///         Box::pin(async move {
///             // talk to the rate-limited service...
///             let _ = self.queue.done(id);
///         })
///     }
/// }
/// ```
pub trait Job: Send + 'static {
    /// Human-readable label used in events and logs.
    fn label(&self) -> &str {
        "job"
    }

    /// Consumes the job and produces the future to run for task `id`.
    ///
    /// Called by the admission loop outside of the queue lock, so the job may call
    /// back into the queue (including [`Queue::done`](crate::Queue::done)).
    fn spawn(self: Box<Self>, id: TaskId) -> BoxJobFuture;
}
