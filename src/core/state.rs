//! # Queue state: the enqueued and running sets.
//!
//! [`QueueState`] is the single consistency domain of the queue. It lives behind one
//! mutex (see [`Shared`](super::shared::Shared)) and every transition below runs as one
//! atomic step under that lock.
//!
//! ```text
//! enqueue()                 promote()                 complete()               evict()
//!   ──► enqueued{id} ──────────► running{id, ─────────────► running{id, ─────────────► (gone)
//!       (BTreeMap, FIFO)          completed_at: None}        completed_at: Some(t)}    now - t >= cooldown
//! ```
//!
//! ## Rules
//! - An id lives in at most one of `enqueued` / `running`.
//! - `promote` stops as soon as `running.len() == capacity`.
//! - `completed_at` is set once and never changed.
//! - Promotion order is ascending id (submission order).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::QueueError;
use crate::jobs::{Job, TaskId};

/// Task waiting for admission.
struct Pending {
    job: Box<dyn Job>,
    label: Arc<str>,
    submitted_at: Instant,
}

/// Task holding a slot (executing or cooling down).
#[derive(Debug, Clone)]
struct Slot {
    label: Arc<str>,
    admitted_at: Instant,
    completed_at: Option<Instant>,
}

/// Task moved from `enqueued` to `running` in one cycle; its work is not launched yet.
pub(crate) struct Admitted {
    pub id: TaskId,
    pub job: Box<dyn Job>,
    pub label: Arc<str>,
    /// Time spent enqueued.
    pub waited: Duration,
}

/// Task removed from `running` after its cooldown.
#[derive(Debug)]
pub(crate) struct Evicted {
    pub id: TaskId,
    pub label: Arc<str>,
    /// Time the slot was held after completion.
    pub held: Duration,
}

/// Result of a successful completion report.
#[derive(Debug)]
pub(crate) struct Completed {
    pub label: Arc<str>,
    /// Time between admission and completion.
    pub ran: Duration,
}

/// Point-in-time view of a queue, returned by [`Queue::snapshot`](crate::Queue::snapshot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Configured capacity.
    pub capacity: usize,
    /// Enqueued ids in promotion order.
    pub enqueued: Vec<TaskId>,
    /// Running ids (executing and cooling down), ascending.
    pub running: Vec<TaskId>,
    /// Running tasks that have not reported completion.
    pub executing: usize,
    /// Running tasks waiting for their cooldown to elapse.
    pub cooling: usize,
    /// Submitted tasks that have not reported completion.
    pub outstanding: usize,
    /// Whether the queue was sealed by a drain.
    pub sealed: bool,
}

/// Enqueued and running sets plus the id counter.
pub(crate) struct QueueState {
    next_id: TaskId,
    enqueued: BTreeMap<TaskId, Pending>,
    running: HashMap<TaskId, Slot>,
    sealed: bool,
}

impl QueueState {
    pub fn new() -> Self {
        Self {
            next_id: TaskId::new(0),
            enqueued: BTreeMap::new(),
            running: HashMap::new(),
            sealed: false,
        }
    }

    /// Stores a job under the next id and returns that id.
    pub fn enqueue(&mut self, job: Box<dyn Job>, label: Arc<str>, now: Instant) -> TaskId {
        let id = self.next_id;
        self.next_id = id.next();
        self.enqueued.insert(
            id,
            Pending {
                job,
                label,
                submitted_at: now,
            },
        );
        id
    }

    /// Moves enqueued tasks into `running` in id order until capacity is reached.
    pub fn promote(&mut self, capacity: usize, now: Instant) -> Vec<Admitted> {
        let free = capacity.saturating_sub(self.running.len());
        let mut admitted = Vec::with_capacity(free.min(self.enqueued.len()));

        while self.running.len() < capacity {
            let Some((id, pending)) = self.enqueued.pop_first() else {
                break;
            };
            self.running.insert(
                id,
                Slot {
                    label: Arc::clone(&pending.label),
                    admitted_at: now,
                    completed_at: None,
                },
            );
            admitted.push(Admitted {
                id,
                job: pending.job,
                label: pending.label,
                waited: now.saturating_duration_since(pending.submitted_at),
            });
        }
        admitted
    }

    /// Removes every completed task whose cooldown has fully elapsed.
    ///
    /// Returned in ascending id order.
    pub fn evict(&mut self, cooldown: Duration, now: Instant) -> Vec<Evicted> {
        let mut expired: Vec<(TaskId, Duration)> = self
            .running
            .iter()
            .filter_map(|(id, slot)| {
                let held = now.saturating_duration_since(slot.completed_at?);
                (held >= cooldown).then_some((*id, held))
            })
            .collect();
        expired.sort_unstable_by_key(|(id, _)| *id);

        expired
            .into_iter()
            .filter_map(|(id, held)| {
                self.running.remove(&id).map(|slot| Evicted {
                    id,
                    label: slot.label,
                    held,
                })
            })
            .collect()
    }

    /// Stamps the completion time of a running task.
    ///
    /// # Errors
    /// - [`QueueError::NotRunning`] if `id` is not in the running set
    /// - [`QueueError::AlreadyDone`] if completion was already reported
    pub fn complete(&mut self, id: TaskId, now: Instant) -> Result<Completed, QueueError> {
        let slot = self
            .running
            .get_mut(&id)
            .ok_or(QueueError::NotRunning { id })?;
        if slot.completed_at.is_some() {
            return Err(QueueError::AlreadyDone { id });
        }
        slot.completed_at = Some(now);
        Ok(Completed {
            label: Arc::clone(&slot.label),
            ran: now.saturating_duration_since(slot.admitted_at),
        })
    }

    /// Earliest instant at which a cooling task becomes evictable.
    ///
    /// `None` when nothing is cooling, or when the expiry lies beyond the clock's range.
    pub fn next_expiry(&self, cooldown: Duration) -> Option<Instant> {
        self.running
            .values()
            .filter_map(|slot| slot.completed_at)
            .min()
            .and_then(|at| at.checked_add(cooldown))
    }

    /// Drops every task still waiting for admission.
    ///
    /// Returned in ascending id order. Running tasks are kept.
    pub fn discard_enqueued(&mut self) -> Vec<(TaskId, Arc<str>)> {
        std::mem::take(&mut self.enqueued)
            .into_iter()
            .map(|(id, pending)| (id, pending.label))
            .collect()
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn enqueued_len(&self) -> usize {
        self.enqueued.len()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn snapshot(&self, capacity: usize, outstanding: usize) -> QueueSnapshot {
        let mut running: Vec<TaskId> = self.running.keys().copied().collect();
        running.sort_unstable();
        let cooling = self
            .running
            .values()
            .filter(|slot| slot.completed_at.is_some())
            .count();

        QueueSnapshot {
            capacity,
            enqueued: self.enqueued.keys().copied().collect(),
            executing: running.len() - cooling,
            running,
            cooling,
            outstanding,
            sealed: self.sealed,
        }
    }
}
