//! Queue core: state machine, admission loop and lifecycle.
//!
//! The public API from this module is [`Queue`], [`QueueBuilder`] and
//! [`QueueSnapshot`].
//!
//! Internal modules:
//! - [`state`]: enqueued/running sets and the promote/evict/complete transitions;
//! - [`admission`]: the background loop that promotes, launches and evicts;
//! - [`drain`]: outstanding-work counter behind [`Queue::wait`];
//! - [`shared`]: state shared by queue handles and the loop (the single lock);
//! - [`queue`]: the public handle;
//! - [`builder`]: construction, subscriber wiring.
//!
//! ## Wiring
//! ```text
//! Queue::submit ──► lock ─► QueueState::enqueue ─► DrainLatch::add ─► Notify
//!                                                                       │
//!                                              admission::run ◄─────────┘
//!                                                ├─► lock ─► promote / evict
//!                                                └─► JoinSet::spawn(job)  ──► job(id)
//!                                                                               │
//! Queue::done(id) ◄─────────────────────────────────────────────────────────────┘
//!     └─► lock ─► QueueState::complete ─► DrainLatch::release ─► Notify
//!
//! Queue::wait ──► DrainLatch::drained ─► lock ─► (Seal: seal + stop loop)
//! ```

mod admission;
mod builder;
mod drain;
mod queue;
mod shared;
mod state;

pub use builder::QueueBuilder;
pub use queue::Queue;
pub use state::QueueSnapshot;
