//! # Example: random_tasks
//!
//! 100 jobs of random length (0..5s) through a queue of capacity 33 with a
//! one-second cooldown per slot.
//!
//! Demonstrates how to:
//! - Build a [`Queue`] with the [`LogWriter`] subscriber.
//! - Submit closures that report their own completion with [`Queue::done`].
//! - Block on [`Queue::wait`] until everything has finished.
//!
//! ## Flow
//! ```text
//! submit x100 ──► admission loop
//!     ├─► admit first 33 (TaskAdmitted)
//!     ├─► job: sleep(random) ──► done(id) (TaskCompleted)
//!     ├─► 1s later: evict (TaskEvicted) ──► admit next
//!     └─► last done ──► wait() returns (Drained, Sealed)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=cooldown_queue=debug cargo run --example random_tasks --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing_subscriber::EnvFilter;

use cooldown_queue::{LogWriter, Queue, QueueConfig, TaskId};

const TASKS: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let queue = Queue::builder(QueueConfig::new(33, Duration::from_secs(1)))
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()?;

    for i in 0..TASKS {
        let q = queue.clone();
        queue.submit_fn(move |id: TaskId| async move {
            let dur = Duration::from_secs(rand::rng().random_range(0..5));
            println!("Start {i} dur: {dur:?}");
            tokio::time::sleep(dur).await;
            println!("End {i}");
            if let Err(e) = q.done(id) {
                eprintln!("[{i}] {e}");
            }
        })?;
    }

    queue.wait().await?;
    queue.shutdown().await;

    println!("All {TASKS} tasks finished");
    Ok(())
}
