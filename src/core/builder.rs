use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

use super::{admission, queue::Queue, shared::Shared};

/// Builder for constructing a [`Queue`] with optional subscribers.
pub struct QueueBuilder {
    cfg: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl QueueBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive queue events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the configuration and starts the queue.
    ///
    /// Initializes the event bus, the subscriber workers and listener (if any
    /// subscribers were given) and spawns the admission loop on the current runtime.
    ///
    /// # Errors
    /// - [`QueueError::Config`] if the configuration is invalid
    /// - [`QueueError::NoRuntime`] outside of a tokio runtime
    pub fn build(self) -> Result<Queue, QueueError> {
        self.cfg.validate()?;
        let runtime = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = CancellationToken::new();

        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            Some(runtime.spawn(subscriber_listener(bus.subscribe(), subs, token.clone())))
        };

        let shared = Arc::new(Shared::new(self.cfg, bus, token));
        let worker = runtime.spawn(admission::run(Arc::clone(&shared)));
        Ok(Queue::from_parts(shared, worker, listener))
    }
}

/// Forwards bus events to the subscriber set until the queue stops.
///
/// Events already on the bus when the stop token fires are still delivered; the
/// subscriber workers then drain their own queues before this task exits.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Ok(ev) => subs.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged");
                }
                Err(RecvError::Closed) => break,
            },
            _ = token.cancelled() => break,
        }
    }
    subs.shutdown().await;
}
