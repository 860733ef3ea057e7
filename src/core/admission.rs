//! # Admission loop: promote, launch, evict, sleep.
//!
//! One long-lived tokio task per queue. It never awaits task work; it only
//! observes state.
//!
//! ## Cycle
//! ```text
//! loop {
//!   ├─► lock state
//!   │     ├─► promote(capacity)      enqueued ──► running (ascending id)
//!   │     ├─► evict(cooldown)        running ──► gone (completed_at + cooldown <= now)
//!   │     └─► next_expiry(cooldown)  earliest pending cooldown end
//!   ├─► unlock
//!   ├─► publish TaskEvicted / TaskAdmitted
//!   ├─► launch admitted jobs into the JoinSet (outside the lock)
//!   └─► evicted && enqueued left?  ──► next cycle immediately
//!       otherwise wait for the first of:
//!         - stop token cancelled      ──► exit
//!         - a launched job finished   ──► report panics, cycle
//!         - wake (submit / done)      ──► cycle
//!         - next_expiry reached       ──► cycle
//! }
//!
//! On exit: still-running jobs are detached, never aborted.
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Instant, sleep_until};

use crate::events::{Event, EventKind, millis};
use crate::jobs::{BoxJobFuture, TaskId};
use crate::subscribers::panic_message;

use super::shared::Shared;
use super::state::Admitted;

/// Outcome of one launched job: its id and the panic message, if it panicked.
type JobExit = (TaskId, Option<String>);

/// What the loop does after a cycle.
enum Next {
    /// Slots were freed while work is still enqueued.
    Cycle,
    /// Sleep until woken, or until the given cooldown expiry.
    Sleep(Option<Instant>),
}

/// Runs the admission loop until the queue's stop token is cancelled.
pub(crate) async fn run(shared: Arc<Shared>) {
    let mut work: JoinSet<JobExit> = JoinSet::new();
    tracing::trace!(
        capacity = shared.cfg.capacity,
        cooldown_ms = millis(shared.cfg.cooldown),
        "admission loop started"
    );

    while !shared.token.is_cancelled() {
        let deadline = match cycle(&shared, &mut work) {
            Next::Cycle => continue,
            Next::Sleep(deadline) => deadline,
        };

        let expiry = async {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = shared.token.cancelled() => break,
            Some(exit) = work.join_next(), if !work.is_empty() => report_exit(&shared, exit),
            _ = shared.wake.notified() => {}
            _ = expiry => {}
        }
    }

    tracing::trace!(in_flight = work.len(), "admission loop stopped");
    work.detach_all();
}

/// One promote/evict step under the lock, then launches the admitted jobs.
fn cycle(shared: &Shared, work: &mut JoinSet<JobExit>) -> Next {
    let now = Instant::now();
    let cfg = &shared.cfg;

    let (admitted, evicted, running, enqueued, next_expiry) = {
        let mut st = shared.lock();
        let admitted = st.promote(cfg.capacity, now);
        let evicted = st.evict(cfg.cooldown, now);
        (
            admitted,
            evicted,
            st.running_len(),
            st.enqueued_len(),
            st.next_expiry(cfg.cooldown),
        )
    };

    for ev in &evicted {
        shared.bus.publish(
            Event::new(EventKind::TaskEvicted)
                .with_task(ev.id)
                .with_label(Arc::clone(&ev.label))
                .with_occupancy(running, enqueued)
                .with_elapsed(ev.held),
        );
    }
    for job in admitted {
        launch(shared, work, job, running, enqueued);
    }

    if !evicted.is_empty() && enqueued > 0 {
        Next::Cycle
    } else {
        Next::Sleep(next_expiry)
    }
}

/// Starts the work of an admitted task on its own tokio task.
fn launch(
    shared: &Shared,
    work: &mut JoinSet<JobExit>,
    admitted: Admitted,
    running: usize,
    enqueued: usize,
) {
    let Admitted {
        id,
        job,
        label,
        waited,
    } = admitted;

    shared.bus.publish(
        Event::new(EventKind::TaskAdmitted)
            .with_task(id)
            .with_label(label)
            .with_occupancy(running, enqueued)
            .with_elapsed(waited),
    );

    // `spawn` runs caller code synchronously; a panic there must not take the loop down.
    match std::panic::catch_unwind(AssertUnwindSafe(|| job.spawn(id))) {
        Ok(fut) => {
            work.spawn(guarded(id, fut));
        }
        Err(panic) => publish_panic(shared, id, panic_message(&*panic)),
    }
}

/// Runs a job future, turning a panic into a message instead of a `JoinError`.
async fn guarded(id: TaskId, fut: BoxJobFuture) -> JobExit {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(()) => (id, None),
        Err(panic) => (id, Some(panic_message(&*panic))),
    }
}

fn report_exit(shared: &Shared, exit: Result<JobExit, JoinError>) {
    match exit {
        Ok((_, None)) => {}
        Ok((id, Some(msg))) => publish_panic(shared, id, msg),
        Err(e) => tracing::warn!(error = %e, "job task ended abnormally"),
    }
}

/// The slot stays occupied: only the job itself can report completion.
fn publish_panic(shared: &Shared, id: TaskId, msg: String) {
    shared.bus.publish(
        Event::new(EventKind::TaskPanicked)
            .with_task(id)
            .with_reason(msg),
    );
}
