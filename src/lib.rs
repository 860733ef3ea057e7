//! # cooldown-queue
//!
//! **cooldown-queue** is a bounded-concurrency task admission controller for tokio.
//!
//! Callers submit jobs; the queue admits at most `capacity` of them at any instant,
//! and after a job reports completion its slot stays occupied for a `cooldown`
//! before another job may take it. Use it to pace work against downstream
//! resources that must not be hit faster than a configured cadence.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Job      │   │     Job      │   │     Job      │
//!     │ (FnOnce(id)) │   │ (FnOnce(id)) │   │ (FnOnce(id)) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ submit           ▼ submit           ▼ submit
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Queue (handle, Clone)                                            │
//! │  - QueueState: enqueued (FIFO) + running, behind one mutex        │
//! │  - DrainLatch: outstanding-work counter for wait()                │
//! │  - Notify: wakes the admission loop on submit/done                │
//! │  - Bus: broadcast events                                          │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        ▼                                                     │
//! ┌──────────────────────────────────┐                         │
//! │  admission loop (one tokio task) │                         │
//! │  promote ─► launch ─► evict      │                         │
//! │  sleep until wake / cooldown end │                         │
//! └──────┬───────────────────────────┘                         │
//!        ▼ spawn                                               ▼
//!     job(id) ... queue.done(id)                 subscriber listener ─► SubscriberSet
//! ```
//!
//! ### Task lifecycle
//! ```text
//! submit ──► enqueued ──► running (executing) ──done──► running (cooling) ──cooldown──► gone
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                 |
//! |-------------------|--------------------------------------------------------------|------------------------------------|
//! | **Queue**         | Submit, report completion, wait for drain, shut down.        | [`Queue`], [`QueueBuilder`]        |
//! | **Jobs**          | One-shot units of work receiving their [`TaskId`].           | [`Job`], [`JobFn`]                 |
//! | **Configuration** | Capacity, cooldown, drain policy.                            | [`QueueConfig`], [`DrainPolicy`]   |
//! | **Events**        | Every transition as an [`Event`] on a broadcast bus.         | [`Event`], [`EventKind`]           |
//! | **Subscribers**   | Hook into queue events (logging, metrics).                   | [`Subscribe`], [`SubscriberSet`]   |
//! | **Errors**        | Typed configuration, lifecycle and contract errors.          | [`QueueError`], [`ConfigError`]    |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that writes events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use cooldown_queue::{Queue, QueueConfig, TaskId};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // At most 3 in flight; a slot is reusable 50ms after its task finishes.
//!     let queue = Queue::new(QueueConfig::new(3, Duration::from_millis(50)))?;
//!
//!     for n in 0..10 {
//!         let q = queue.clone();
//!         queue.submit_fn(move |id: TaskId| async move {
//!             println!("request {n} as {id}");
//!             q.done(id).expect("reported once");
//!         })?;
//!     }
//!
//!     queue.wait().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod jobs;
mod subscribers;

// ---- Public re-exports ----

pub use config::{DrainPolicy, QueueConfig};
pub use core::{Queue, QueueBuilder, QueueSnapshot};
pub use error::{ConfigError, QueueError};
pub use events::{Event, EventKind};
pub use jobs::{BoxJobFuture, Job, JobFn, TaskId};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the tracing-backed log writer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
