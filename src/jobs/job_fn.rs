//! # Closure-backed job (`JobFn`)
//!
//! [`JobFn`] wraps a closure `F: FnOnce(TaskId) -> Fut`. The closure is invoked once,
//! when the task is admitted, and the returned future runs on its own tokio task.
//!
//! ## Example
//! ```rust
//! use cooldown_queue::{Job, JobFn, TaskId};
//!
//! let job = JobFn::named("fetch", |id: TaskId| async move {
//!     println!("running {id}");
//! });
//! assert_eq!(job.label(), "fetch");
//! ```

use std::borrow::Cow;
use std::future::Future;

use crate::jobs::{BoxJobFuture, Job, TaskId};

/// Closure-backed job implementation.
#[derive(Debug)]
pub struct JobFn<F> {
    label: Cow<'static, str>,
    f: F,
}

impl<F> JobFn<F> {
    /// Wraps a closure with the default `"job"` label.
    pub fn new(f: F) -> Self {
        Self::named("job", f)
    }

    /// Wraps a closure with a custom label.
    pub fn named(label: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }
}

impl<F, Fut> Job for JobFn<F>
where
    F: FnOnce(TaskId) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn spawn(self: Box<Self>, id: TaskId) -> BoxJobFuture {
        let this = *self;
        Box::pin((this.f)(id))
    }
}
