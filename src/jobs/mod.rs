//! # Units of work accepted by the queue.
//!
//! This module provides the job-related types:
//! - [`TaskId`] - identifier assigned by the queue at submission
//! - [`Job`] - trait for a one-shot unit of work that receives its identifier
//! - [`JobFn`] - closure-backed job implementation
//! - [`BoxJobFuture`] - the future a job produces once admitted

mod id;
mod job;
mod job_fn;

pub use id::TaskId;
pub use job::{BoxJobFuture, Job};
pub use job_fn::JobFn;
