//! # Queue configuration.
//!
//! Provides [`QueueConfig`], the settings fixed at construction time, and
//! [`DrainPolicy`], which decides what happens to the queue once
//! [`Queue::wait`](crate::Queue::wait) observes a drain.
//!
//! ## Sentinel values
//! - `cooldown = 0s` → a slot is reusable as soon as its task reports completion
//! - `bus_capacity = 0` → clamped to 1 by [`QueueConfig::bus_capacity_clamped`]

use std::time::Duration;

use crate::error::ConfigError;

/// What the queue does after [`Queue::wait`](crate::Queue::wait) returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Seal the queue after the first drain.
    ///
    /// The admission loop stops; further `submit`/`done` calls fail with
    /// [`QueueError::Sealed`](crate::QueueError::Sealed).
    #[default]
    Seal,

    /// Keep accepting work after a drain.
    ///
    /// `wait` may be called again after more submissions.
    Reuse,
}

/// Settings for a [`Queue`](crate::Queue).
///
/// ## Field semantics
/// - `capacity`: maximum number of tasks in the running set (executing or cooling down);
///   must be `> 0`
/// - `cooldown`: how long a slot stays occupied after its task reports completion
/// - `drain`: lifecycle after a drain (see [`DrainPolicy`])
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Maximum number of tasks admitted at once.
    pub capacity: usize,

    /// Minimum time a slot remains occupied after completion.
    pub cooldown: Duration,

    /// Lifecycle after [`Queue::wait`](crate::Queue::wait) returns.
    pub drain: DrainPolicy,

    /// Capacity of the event bus broadcast channel.
    ///
    /// Slow subscribers that lag more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,
}

impl QueueConfig {
    /// Creates a configuration with the given capacity and cooldown and default
    /// drain policy / bus capacity.
    pub fn new(capacity: usize, cooldown: Duration) -> Self {
        Self {
            capacity,
            cooldown,
            ..Self::default()
        }
    }

    /// Replaces the drain policy.
    #[must_use]
    pub fn with_drain_policy(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// [`ConfigError::InvalidCapacity`] if `capacity == 0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `capacity = 1`
    /// - `cooldown = 0s`
    /// - `drain = DrainPolicy::Seal`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            capacity: 1,
            cooldown: Duration::ZERO,
            drain: DrainPolicy::default(),
            bus_capacity: 1024,
        }
    }
}
