//! # Event subscribers for the queue.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and, behind the `logging` feature, the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Queue / admission loop ── publish(Event) ──► Bus ──► subscriber listener
//!                                                          │
//!                                                          ▼
//!                                                    SubscriberSet::emit
//!                                                 ┌────────┼────────┐
//!                                                 ▼        ▼        ▼
//!                                             LogWriter  Metrics  Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
