use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, sleep_until, timeout};

use cooldown_queue::{
    ConfigError, DrainPolicy, Event, EventKind, JobFn, Queue, QueueConfig, QueueError, Subscribe,
    TaskId,
};

/// Collects every event it sees.
#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Event>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.seen.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn find(&self, kind: EventKind) -> Option<Event> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, e: &Event) {
        self.seen.lock().unwrap().push(e.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

fn cfg(capacity: usize, cooldown_ms: u64) -> QueueConfig {
    QueueConfig::new(capacity, Duration::from_millis(cooldown_ms))
}

#[tokio::test(start_paused = true)]
async fn never_more_than_capacity_running() {
    let queue = Queue::new(cfg(3, 50)).unwrap();
    let executing = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let peak_slots = Arc::new(AtomicUsize::new(0));

    for _ in 0..12 {
        let q = queue.clone();
        let executing = Arc::clone(&executing);
        let peak = Arc::clone(&peak);
        let peak_slots = Arc::clone(&peak_slots);
        queue
            .submit_fn(move |id: TaskId| async move {
                let now = executing.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                peak_slots.fetch_max(q.snapshot().running.len(), Ordering::SeqCst);

                sleep(Duration::from_millis(20)).await;

                executing.fetch_sub(1, Ordering::SeqCst);
                q.done(id).unwrap();
            })
            .unwrap();
    }

    queue.wait().await.unwrap();
    assert_eq!(peak.load(Ordering::SeqCst), 3);
    assert!(peak_slots.load(Ordering::SeqCst) <= 3);
}

#[tokio::test(start_paused = true)]
async fn freed_slot_waits_for_cooldown() {
    let queue = Queue::new(cfg(1, 100)).unwrap();
    let (done_tx, done_rx) = oneshot::channel::<Instant>();
    let (start_tx, start_rx) = oneshot::channel::<Instant>();

    let q = queue.clone();
    queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
            let _ = done_tx.send(Instant::now());
        })
        .unwrap();

    let q = queue.clone();
    let second = queue
        .submit_fn(move |id: TaskId| async move {
            let _ = start_tx.send(Instant::now());
            q.done(id).unwrap();
        })
        .unwrap();

    let a_done = done_rx.await.unwrap();

    sleep_until(a_done + Duration::from_millis(99)).await;
    assert_eq!(queue.snapshot().enqueued, vec![second]);

    let b_start = start_rx.await.unwrap();
    let gap = b_start.duration_since(a_done);
    assert!(gap >= Duration::from_millis(100), "admitted early: {gap:?}");
    assert!(gap < Duration::from_millis(101), "admitted late: {gap:?}");

    queue.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn under_capacity_starts_without_delay() {
    let queue = Queue::new(cfg(5, 1_000)).unwrap();
    let t0 = Instant::now();
    let starts = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let q = queue.clone();
        let starts = Arc::clone(&starts);
        queue
            .submit_fn(move |id: TaskId| async move {
                starts.lock().unwrap().push(Instant::now());
                q.done(id).unwrap();
            })
            .unwrap();
    }

    queue.wait().await.unwrap();

    let starts = starts.lock().unwrap();
    assert_eq!(starts.len(), 3);
    for s in starts.iter() {
        assert!(s.duration_since(t0) < Duration::from_millis(1_000));
    }
}

#[tokio::test(start_paused = true)]
async fn ids_are_sequential_and_admitted_in_order() {
    let queue = Queue::new(cfg(1, 0)).unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let mut ids = Vec::new();
    for _ in 0..5 {
        let q = queue.clone();
        let order = Arc::clone(&order);
        ids.push(
            queue
                .submit_fn(move |id: TaskId| async move {
                    order.lock().unwrap().push(id);
                    q.done(id).unwrap();
                })
                .unwrap(),
        );
    }

    let expected: Vec<TaskId> = (0..5).map(TaskId::new).collect();
    assert_eq!(ids, expected);

    queue.wait().await.unwrap();
    assert_eq!(*order.lock().unwrap(), expected);
}

#[tokio::test(start_paused = true)]
async fn wait_returns_after_every_task_reported() {
    let queue = Queue::new(cfg(4, 30)).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    for n in 0..10u64 {
        let q = queue.clone();
        let finished = Arc::clone(&finished);
        queue
            .submit_fn(move |id: TaskId| async move {
                sleep(Duration::from_millis(10 * n)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                q.done(id).unwrap();
            })
            .unwrap();
    }

    queue.wait().await.unwrap();
    assert_eq!(finished.load(Ordering::SeqCst), 10);
    assert_eq!(queue.snapshot().outstanding, 0);
}

#[tokio::test(start_paused = true)]
async fn wait_blocks_while_a_task_is_unreported() {
    let queue = Queue::new(cfg(2, 10)).unwrap();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let q = queue.clone();
    queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
        })
        .unwrap();
    let q = queue.clone();
    queue
        .submit_fn(move |id: TaskId| async move {
            let _ = release_rx.await;
            q.done(id).unwrap();
        })
        .unwrap();

    assert!(
        timeout(Duration::from_millis(500), queue.wait())
            .await
            .is_err(),
        "wait returned with one task unreported"
    );
    assert_eq!(queue.snapshot().outstanding, 1);

    release_tx.send(()).unwrap();
    timeout(Duration::from_millis(1), queue.wait())
        .await
        .expect("last report releases wait")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn wait_on_empty_queue_returns_immediately() {
    let queue = Queue::new(cfg(2, 10)).unwrap();
    timeout(Duration::from_millis(1), queue.wait())
        .await
        .expect("no outstanding work")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn double_done_is_rejected() {
    let recorder = Arc::new(Recorder::default());
    let queue = Queue::builder(cfg(1, 10))
        .with_subscriber(recorder.clone())
        .build()
        .unwrap();
    let (tx, rx) = oneshot::channel();

    let q = queue.clone();
    let id = queue
        .submit_fn(move |id: TaskId| async move {
            let first = q.done(id);
            let second = q.done(id);
            let _ = tx.send((first, second));
        })
        .unwrap();

    let (first, second) = rx.await.unwrap();
    assert_eq!(first, Ok(()));
    assert_eq!(second, Err(QueueError::AlreadyDone { id }));

    queue.wait().await.unwrap();
    queue.shutdown().await;

    let violation = recorder.find(EventKind::ContractViolation).unwrap();
    assert_eq!(violation.task, Some(id));
    assert_eq!(violation.reason.as_deref(), Some("queue_already_done"));
}

#[tokio::test(start_paused = true)]
async fn done_for_unknown_id_is_rejected() {
    let queue = Queue::new(cfg(1, 10).with_drain_policy(DrainPolicy::Reuse)).unwrap();
    let bogus = TaskId::new(99);
    assert_eq!(queue.done(bogus), Err(QueueError::NotRunning { id: bogus }));
    assert_eq!(queue.snapshot().outstanding, 0);
}

#[tokio::test(start_paused = true)]
async fn done_before_admission_is_rejected() {
    let queue = Queue::new(cfg(1, 10)).unwrap();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    let q = queue.clone();
    queue
        .submit_fn(move |id: TaskId| async move {
            let _ = release_rx.await;
            q.done(id).unwrap();
        })
        .unwrap();
    let q = queue.clone();
    let second = queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
        })
        .unwrap();

    sleep(Duration::from_millis(5)).await;
    assert_eq!(queue.snapshot().enqueued, vec![second]);
    assert_eq!(queue.done(second), Err(QueueError::NotRunning { id: second }));

    release_tx.send(()).unwrap();
    queue.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sealed_after_drain() {
    let queue = Queue::new(cfg(2, 10)).unwrap();

    let q = queue.clone();
    let id = queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
        })
        .unwrap();

    queue.wait().await.unwrap();
    assert!(queue.is_sealed());
    assert!(queue.is_closed());

    assert_eq!(queue.submit_fn(|_| async {}), Err(QueueError::Sealed));
    assert_eq!(queue.done(id), Err(QueueError::Sealed));

    // Further waits return at once.
    timeout(Duration::from_millis(1), queue.wait())
        .await
        .expect("sealed queue is drained")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn reuse_policy_accepts_work_after_drain() {
    let queue = Queue::new(cfg(2, 10).with_drain_policy(DrainPolicy::Reuse)).unwrap();
    let finished = Arc::new(AtomicUsize::new(0));

    for round in 0..2 {
        for _ in 0..3 {
            let q = queue.clone();
            let finished = Arc::clone(&finished);
            queue
                .submit(JobFn::named("round", move |id: TaskId| async move {
                    finished.fetch_add(1, Ordering::SeqCst);
                    q.done(id).unwrap();
                }))
                .unwrap();
        }
        queue.wait().await.unwrap();
        assert_eq!(finished.load(Ordering::SeqCst), 3 * (round + 1));
        assert!(!queue.is_sealed());
    }

    let snap = queue.snapshot();
    assert_eq!(snap.outstanding, 0);
    assert!(snap.enqueued.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cooling_slots_survive_wait_under_reuse() {
    let queue = Queue::new(cfg(2, 500).with_drain_policy(DrainPolicy::Reuse)).unwrap();

    let q = queue.clone();
    let id = queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
        })
        .unwrap();

    queue.wait().await.unwrap();
    let snap = queue.snapshot();
    assert_eq!(snap.running, vec![id]);
    assert_eq!(snap.cooling, 1);

    sleep(Duration::from_millis(600)).await;
    assert!(queue.snapshot().running.is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_rejects_new_work() {
    let queue = Queue::new(cfg(1, 10)).unwrap();
    queue.shutdown().await;

    assert!(queue.is_closed());
    assert!(!queue.is_sealed());
    assert_eq!(queue.submit_fn(|_| async {}), Err(QueueError::Closed));

    // Idempotent.
    queue.shutdown().await;
}

#[tokio::test]
async fn zero_capacity_is_a_config_error() {
    let err = Queue::new(cfg(0, 10)).unwrap_err();
    assert_eq!(
        err,
        QueueError::Config(ConfigError::InvalidCapacity { capacity: 0 })
    );
}

#[test]
fn construction_outside_runtime_fails() {
    let err = Queue::new(cfg(1, 10)).unwrap_err();
    assert_eq!(err, QueueError::NoRuntime);
}

#[tokio::test(start_paused = true)]
async fn panicking_job_is_reported() {
    let recorder = Arc::new(Recorder::default());
    let queue = Queue::builder(cfg(1, 10))
        .with_subscriber(recorder.clone())
        .build()
        .unwrap();

    let id = queue
        .submit_fn(|_id: TaskId| async move {
            panic!("boom");
        })
        .unwrap();

    sleep(Duration::from_millis(5)).await;
    // The slot is still held; the caller reports on the job's behalf.
    assert_eq!(queue.snapshot().executing, 1);
    queue.done(id).unwrap();

    queue.wait().await.unwrap();
    queue.shutdown().await;

    let panicked = recorder.find(EventKind::TaskPanicked).unwrap();
    assert_eq!(panicked.task, Some(id));
    assert_eq!(panicked.reason.as_deref(), Some("boom"));
}

#[tokio::test(start_paused = true)]
async fn subscriber_sees_full_lifecycle() {
    let recorder = Arc::new(Recorder::default());
    let queue = Queue::builder(cfg(1, 20))
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .build()
        .unwrap();

    for _ in 0..2 {
        let q = queue.clone();
        queue
            .submit_fn(move |id: TaskId| async move {
                q.done(id).unwrap();
            })
            .unwrap();
    }

    queue.wait().await.unwrap();
    queue.shutdown().await;

    let kinds = recorder.kinds();
    let count = |k: EventKind| kinds.iter().filter(|x| **x == k).count();
    assert_eq!(count(EventKind::TaskSubmitted), 2);
    assert_eq!(count(EventKind::TaskAdmitted), 2);
    assert_eq!(count(EventKind::TaskCompleted), 2);
    // The first slot had to cool down before the second task was admitted.
    assert!(count(EventKind::TaskEvicted) >= 1);
    assert_eq!(kinds.last(), Some(&EventKind::Sealed));

    let seqs: Vec<u64> = recorder.seen.lock().unwrap().iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test(start_paused = true)]
async fn instant_tasks_under_capacity_leave_no_slots_behind() {
    let queue = Queue::new(cfg(3, 0).with_drain_policy(DrainPolicy::Reuse)).unwrap();

    for _ in 0..2 {
        let q = queue.clone();
        queue
            .submit_fn(move |id: TaskId| async move {
                q.done(id).unwrap();
            })
            .unwrap();
    }

    timeout(Duration::from_millis(1), queue.wait())
        .await
        .expect("both admitted at once")
        .unwrap();

    sleep(Duration::from_millis(1)).await;
    let snap = queue.snapshot();
    assert!(snap.running.is_empty());
    assert!(snap.enqueued.is_empty());
}

#[tokio::test(start_paused = true)]
async fn huge_cooldown_keeps_loop_alive() {
    let queue = Queue::new(
        QueueConfig::new(2, Duration::MAX).with_drain_policy(DrainPolicy::Reuse),
    )
    .unwrap();

    let q = queue.clone();
    let first = queue
        .submit_fn(move |id: TaskId| async move {
            q.done(id).unwrap();
        })
        .unwrap();
    queue.wait().await.unwrap();

    // The first slot cools forever; the second one is still free.
    let (tx, rx) = oneshot::channel::<TaskId>();
    let second = queue
        .submit_fn(move |id: TaskId| async move {
            let _ = tx.send(id);
        })
        .unwrap();

    let started = timeout(Duration::from_millis(10), rx)
        .await
        .expect("admitted into the free slot")
        .unwrap();
    assert_eq!(started, second);

    let snap = queue.snapshot();
    assert_eq!(snap.running, vec![first, second]);
    assert!(snap.enqueued.is_empty());

    queue.done(second).unwrap();
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_enqueued_and_releases_wait() {
    let recorder = Arc::new(Recorder::default());
    let queue = Queue::builder(cfg(1, 10))
        .with_subscriber(recorder.clone())
        .build()
        .unwrap();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let ran = Arc::new(AtomicUsize::new(0));

    let q = queue.clone();
    let first = queue
        .submit_fn(move |id: TaskId| async move {
            let _ = release_rx.await;
            q.done(id).unwrap();
        })
        .unwrap();
    let q = queue.clone();
    let counter = Arc::clone(&ran);
    let second = queue
        .submit_fn(move |id: TaskId| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            q.done(id).unwrap();
        })
        .unwrap();

    sleep(Duration::from_millis(5)).await;
    queue.shutdown().await;

    let snap = queue.snapshot();
    assert!(snap.enqueued.is_empty());
    assert_eq!(snap.running, vec![first]);
    assert_eq!(snap.outstanding, 1);
    assert_eq!(queue.done(second), Err(QueueError::NotRunning { id: second }));

    release_tx.send(()).unwrap();
    timeout(Duration::from_secs(3600), queue.wait())
        .await
        .expect("running task releases wait after shutdown")
        .unwrap();
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    let discarded = recorder.find(EventKind::TaskDiscarded).unwrap();
    assert_eq!(discarded.task, Some(second));
}
