//! Queue events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the queue.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Queue` operations (`submit`, `done`, `wait`, `shutdown`),
//!   the admission loop, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `QueueBuilder::build`,
//!   which fans out to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub(crate) use event::millis;
