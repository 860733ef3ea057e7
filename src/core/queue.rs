//! # Queue handle: submit, report completion, wait for drain, tear down.
//!
//! [`Queue`] is a cheap, cloneable handle. All clones share one state, one
//! admission loop and one event bus. Jobs usually capture a clone so they can
//! report their own completion:
//!
//! ```rust
//! use std::time::Duration;
//! use cooldown_queue::{Queue, QueueConfig, TaskId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), cooldown_queue::QueueError> {
//!     let queue = Queue::new(QueueConfig::new(2, Duration::from_millis(10)))?;
//!
//!     for _ in 0..4 {
//!         let q = queue.clone();
//!         queue.submit_fn(move |id: TaskId| async move {
//!             // call the rate-limited service...
//!             q.done(id).expect("reported once");
//!         })?;
//!     }
//!
//!     queue.wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Lifecycle
//! ```text
//! Queue::new ──► admission loop running
//!     ├─► submit / done (any number, from any task)
//!     ├─► wait() ──► outstanding == 0
//!     │       ├─ DrainPolicy::Seal  ─► sealed: loop stopped, submit/done ─► Err(Sealed)
//!     │       └─ DrainPolicy::Reuse ─► open: submit more, wait again
//!     └─► shutdown() / last handle dropped ─► loop stopped, submit ─► Err(Closed)
//!             └─ enqueued tasks discarded; running ones may still call done()
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::DropGuard;

use crate::config::{DrainPolicy, QueueConfig};
use crate::error::QueueError;
use crate::events::{Event, EventKind};
use crate::jobs::{Job, JobFn, TaskId};

use super::builder::QueueBuilder;
use super::shared::Shared;
use super::state::QueueSnapshot;

/// Handle to an admission-controlled queue.
///
/// At most `capacity` tasks hold a slot at any instant; a slot stays occupied for
/// `cooldown` after its task reports completion.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<Inner>,
}

struct Inner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    /// Cancels the stop token when the last handle goes away.
    ///
    /// Enqueued jobs holding a handle keep `Inner` alive, so dropping every other
    /// handle with work still enqueued does not fire this; call [`Queue::shutdown`].
    _guard: DropGuard,
}

impl Queue {
    /// Creates a queue without subscribers.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// - [`QueueError::Config`] if the configuration is invalid
    /// - [`QueueError::NoRuntime`] outside of a tokio runtime
    pub fn new(cfg: QueueConfig) -> Result<Self, QueueError> {
        QueueBuilder::new(cfg).build()
    }

    /// Returns a builder for a queue with subscribers.
    pub fn builder(cfg: QueueConfig) -> QueueBuilder {
        QueueBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        shared: Arc<Shared>,
        worker: JoinHandle<()>,
        listener: Option<JoinHandle<()>>,
    ) -> Self {
        let guard = shared.token.clone().drop_guard();
        Self {
            inner: Arc::new(Inner {
                shared,
                worker: Mutex::new(Some(worker)),
                listener: Mutex::new(listener),
                _guard: guard,
            }),
        }
    }

    /// Returns the configuration the queue was built with.
    pub fn config(&self) -> &QueueConfig {
        &self.inner.shared.cfg
    }

    /// Submits a job and returns its identifier.
    ///
    /// Never waits for admission. The job must eventually call [`Queue::done`] with
    /// the identifier it receives.
    ///
    /// # Errors
    /// - [`QueueError::Sealed`] after a drain under [`DrainPolicy::Seal`]
    /// - [`QueueError::Closed`] after [`Queue::shutdown`]
    pub fn submit<J: Job>(&self, job: J) -> Result<TaskId, QueueError> {
        let shared = &self.inner.shared;
        let label: Arc<str> = Arc::from(job.label());

        let (id, running, enqueued) = {
            let mut st = shared.lock();
            if st.is_sealed() {
                return Err(QueueError::Sealed);
            }
            if shared.token.is_cancelled() {
                return Err(QueueError::Closed);
            }
            let id = st.enqueue(Box::new(job), Arc::clone(&label), Instant::now());
            shared.latch.add();
            (id, st.running_len(), st.enqueued_len())
        };

        shared.bus.publish(
            Event::new(EventKind::TaskSubmitted)
                .with_task(id)
                .with_label(label)
                .with_occupancy(running, enqueued),
        );
        shared.wake.notify_one();
        Ok(id)
    }

    /// Submits a closure `FnOnce(TaskId) -> Future`.
    ///
    /// Shorthand for `submit(JobFn::new(f))`.
    pub fn submit_fn<F, Fut>(&self, f: F) -> Result<TaskId, QueueError>
    where
        F: FnOnce(TaskId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.submit(JobFn::new(f))
    }

    /// Reports that the work of task `id` has finished.
    ///
    /// The task keeps its slot until the cooldown elapses. Never blocks beyond the
    /// short state lock.
    ///
    /// # Errors
    /// - [`QueueError::NotRunning`] if `id` is not running (never submitted, not yet
    ///   admitted, or already evicted)
    /// - [`QueueError::AlreadyDone`] if `id` already reported completion
    /// - [`QueueError::Sealed`] after a drain under [`DrainPolicy::Seal`]
    ///
    /// Contract violations are also published as [`EventKind::ContractViolation`].
    pub fn done(&self, id: TaskId) -> Result<(), QueueError> {
        let shared = &self.inner.shared;

        let completed = {
            let mut st = shared.lock();
            if st.is_sealed() {
                Err(QueueError::Sealed)
            } else {
                st.complete(id, Instant::now())
            }
        };

        match completed {
            Ok(done) => {
                shared.latch.release();
                shared.bus.publish(
                    Event::new(EventKind::TaskCompleted)
                        .with_task(id)
                        .with_label(done.label)
                        .with_elapsed(done.ran),
                );
                shared.wake.notify_one();
                Ok(())
            }
            Err(e) => {
                if e.is_contract_violation() {
                    shared.bus.publish(
                        Event::new(EventKind::ContractViolation)
                            .with_task(id)
                            .with_reason(e.as_label()),
                    );
                }
                Err(e)
            }
        }
    }

    /// Waits until every submitted task has reported completion.
    ///
    /// Cooling tasks may still hold their slots when this returns. Under
    /// [`DrainPolicy::Seal`] the queue is sealed on return and later calls return
    /// immediately.
    ///
    /// # Errors
    /// Currently infallible; the `Result` leaves room for lifecycle errors.
    pub async fn wait(&self) -> Result<(), QueueError> {
        let shared = &self.inner.shared;
        loop {
            shared.latch.drained().await;
            if self.finish_drain() {
                return Ok(());
            }
        }
    }

    /// Confirms the drain under the lock and applies the drain policy.
    ///
    /// Returns `false` if a submission slipped in after the latch hit zero.
    fn finish_drain(&self) -> bool {
        let shared = &self.inner.shared;
        let seal = shared.cfg.drain == DrainPolicy::Seal;

        let (running, enqueued) = {
            let mut st = shared.lock();
            if st.is_sealed() {
                return true;
            }
            if shared.latch.outstanding() != 0 {
                return false;
            }
            if seal {
                st.seal();
            }
            (st.running_len(), st.enqueued_len())
        };

        shared
            .bus
            .publish(Event::new(EventKind::Drained).with_occupancy(running, enqueued));
        if seal {
            shared.bus.publish(Event::new(EventKind::Sealed));
            shared.token.cancel();
        }
        true
    }

    /// Stops the admission loop and waits for it (and the subscriber listener) to exit.
    ///
    /// Tasks still waiting for admission are discarded: they never run, count as
    /// finished for [`Queue::wait`], and are published as [`EventKind::TaskDiscarded`].
    /// Running jobs are not cancelled; they may still call [`Queue::done`] so that
    /// [`Queue::wait`] can complete. Further submissions fail with [`QueueError::Closed`].
    pub async fn shutdown(&self) {
        let shared = &self.inner.shared;
        {
            // Discard and cancel under one lock so no submission lands in between.
            let mut st = shared.lock();
            if !shared.token.is_cancelled() {
                shared.bus.publish(Event::new(EventKind::ShutdownRequested));
            }
            for (id, label) in st.discard_enqueued() {
                shared.latch.release();
                shared.bus.publish(
                    Event::new(EventKind::TaskDiscarded)
                        .with_task(id)
                        .with_label(label),
                );
            }
            shared.token.cancel();
        }

        let worker = take(&self.inner.worker);
        if let Some(h) = worker {
            if let Err(e) = h.await {
                tracing::warn!(error = %e, "admission loop ended abnormally");
            }
        }
        let listener = take(&self.inner.listener);
        if let Some(h) = listener {
            let _ = h.await;
        }
    }

    /// Returns a point-in-time view of the queue.
    pub fn snapshot(&self) -> QueueSnapshot {
        let shared = &self.inner.shared;
        let st = shared.lock();
        st.snapshot(shared.cfg.capacity, shared.latch.outstanding())
    }

    /// Returns `true` once the queue was sealed by a drain.
    pub fn is_sealed(&self) -> bool {
        self.inner.shared.lock().is_sealed()
    }

    /// Returns `true` once the admission loop was told to stop (shutdown, seal, or drop).
    pub fn is_closed(&self) -> bool {
        self.inner.shared.token.is_cancelled()
    }
}

fn take(slot: &Mutex<Option<JoinHandle<()>>>) -> Option<JoinHandle<()>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("config", self.config())
            .field("closed", &self.is_closed())
            .finish()
    }
}
