//! Teardown behavior: dispose, drop and callback replacement.

use pacekeeper::infrastructure::mocks::ManualScheduler;
use pacekeeper::{Debouncer, ThrottlePhase, Throttler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(100);

fn counting_throttler(scheduler: &ManualScheduler) -> (Throttler<()>, Arc<AtomicUsize>) {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let throttler = Throttler::builder(move |_: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .with_delay(DELAY)
    .with_scheduler(Arc::new(scheduler.clone()))
    .with_clock(Arc::new(scheduler.clock()))
    .build()
    .unwrap();
    (throttler, runs)
}

#[test]
fn test_dispose_before_trailing_fire() {
    let scheduler = ManualScheduler::new();
    let (throttler, runs) = counting_throttler(&scheduler);

    throttler.call(());
    throttler.call(());
    assert_eq!(scheduler.pending(), 1);

    throttler.dispose();
    assert_eq!(scheduler.pending(), 0);

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_drop_before_trailing_fire() {
    let scheduler = ManualScheduler::new();
    let (throttler, runs) = counting_throttler(&scheduler);

    throttler.call(());
    throttler.call(());
    drop(throttler);

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn test_dispose_before_settlement() {
    let scheduler = ManualScheduler::new();
    let settled = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&settled);

    let value = Debouncer::builder(0u32)
        .with_delay(DELAY)
        .with_scheduler(Arc::new(scheduler.clone()))
        .with_listener(move |v: &u32| sink.lock().unwrap().push(*v))
        .build()
        .unwrap();

    value.set(1);
    scheduler.advance(DELAY / 2);
    value.dispose();

    scheduler.advance(Duration::from_secs(10));
    assert!(settled.lock().unwrap().is_empty());
    assert_eq!(value.get(), 0);
    assert_eq!(value.metrics().timers_cancelled(), 1);
}

#[test]
fn test_drop_before_settlement() {
    let scheduler = ManualScheduler::new();
    let settled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&settled);

    let value = Debouncer::builder(0u32)
        .with_delay(DELAY)
        .with_scheduler(Arc::new(scheduler.clone()))
        .with_listener(move |_: &u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    value.set(1);
    drop(value);

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(settled.load(Ordering::SeqCst), 0);
}

#[test]
fn test_dispose_after_quiet_period_keeps_settled_value() {
    let scheduler = ManualScheduler::new();
    let value = Debouncer::builder("initial")
        .with_delay(DELAY)
        .with_scheduler(Arc::new(scheduler.clone()))
        .build()
        .unwrap();

    value.set("settled");
    scheduler.advance(DELAY);
    value.dispose();

    assert_eq!(value.get(), "settled");
    assert_eq!(value.metrics().timers_cancelled(), 0);
}

#[test]
fn test_replace_never_runs_stale_callback() {
    let scheduler = ManualScheduler::new();
    let (throttler, old_runs) = counting_throttler(&scheduler);
    let new_runs = Arc::new(AtomicUsize::new(0));

    throttler.call(());
    throttler.call(());

    let counter = Arc::clone(&new_runs);
    throttler.replace(
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
        DELAY,
    );

    scheduler.advance(Duration::from_secs(10));
    assert_eq!(old_runs.load(Ordering::SeqCst), 1);
    assert_eq!(new_runs.load(Ordering::SeqCst), 0);
    assert_eq!(throttler.metrics().timers_cancelled(), 1);
}

#[test]
fn test_maximum_delay_never_fires() {
    let scheduler = ManualScheduler::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let throttler = Throttler::builder(move |_: u32| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .with_delay(Duration::MAX)
    .with_scheduler(Arc::new(scheduler.clone()))
    .with_clock(Arc::new(scheduler.clock()))
    .build()
    .unwrap();

    let settled = Arc::new(AtomicUsize::new(0));
    let settle_counter = Arc::clone(&settled);
    let value = Debouncer::builder(0u32)
        .with_delay(Duration::MAX)
        .with_scheduler(Arc::new(scheduler.clone()))
        .with_listener(move |_: &u32| {
            settle_counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    throttler.call(1);
    throttler.call(2);
    value.set(1);
    value.set(2);
    value.set_delay(Duration::MAX);

    assert_eq!(scheduler.pending(), 2);
    scheduler.advance(Duration::from_secs(3_600));

    // Only the leading call runs
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(settled.load(Ordering::SeqCst), 0);
    assert_eq!(value.get(), 0);
    assert!(value.is_pending());
    assert_eq!(throttler.phase(), ThrottlePhase::CooldownWithPending);
}

#[cfg(feature = "async")]
mod tokio_runtime {
    use super::*;
    use pacekeeper::{TokioClock, TokioScheduler};

    #[tokio::test(start_paused = true)]
    async fn test_throttle_on_tokio_time() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let start = tokio::time::Instant::now();

        let throttler = Throttler::builder(move |arg: u32| {
            sink.lock().unwrap().push((arg, start.elapsed()));
        })
        .with_delay(DELAY)
        .build()
        .unwrap();

        throttler.call(0);
        tokio::time::sleep(Duration::from_millis(10)).await;
        throttler.call(10);
        tokio::time::sleep(Duration::from_millis(20)).await;
        throttler.call(30);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let seen = seen.lock().unwrap().clone();
        let args: Vec<u32> = seen.iter().map(|(arg, _)| *arg).collect();
        assert_eq!(args, vec![0, 30]);
        assert!(seen[1].1 >= DELAY);
        assert!(seen[1].1 < DELAY + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_subscription() {
        let value = Debouncer::builder(String::new())
            .with_delay(Duration::from_millis(300))
            .with_scheduler(Arc::new(TokioScheduler::try_current().unwrap()))
            .build()
            .unwrap();
        let mut settled = value.subscribe();
        assert_eq!(*settled.borrow(), "");

        value.set("r".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        value.set("rust".to_string());

        settled.changed().await.unwrap();
        assert_eq!(*settled.borrow_and_update(), "rust");
        assert_eq!(value.get(), "rust");
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_on_tokio_time() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let throttler = Throttler::builder(move |_: ()| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_delay(DELAY)
        .with_scheduler(Arc::new(TokioScheduler::try_current().unwrap()))
        .with_clock(Arc::new(TokioClock::new()))
        .build()
        .unwrap();

        throttler.call(());
        throttler.call(());
        throttler.dispose();

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maximum_delay_on_tokio_time() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let throttler = Throttler::builder(move |_: u32| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .with_delay(Duration::MAX)
        .build()
        .unwrap();

        let value = Debouncer::builder(0u32)
            .with_delay(Duration::MAX)
            .build()
            .unwrap();

        throttler.call(1);
        throttler.call(2);
        value.set(1);
        value.set(2);

        tokio::time::sleep(Duration::from_secs(3_600)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(value.get(), 0);
        assert!(!throttler.is_disposed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_throttle_shared_across_tasks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let throttler = Arc::new(
            Throttler::builder(move |_: usize| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .with_delay(Duration::from_millis(50))
            .build()
            .unwrap(),
        );

        let mut handles = Vec::new();
        for task in 0..8 {
            let throttler = Arc::clone(&throttler);
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    throttler.call(task * 10 + i);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;

        // One leading call plus one coalesced trailing call
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        assert_eq!(throttler.metrics().calls_received(), 80);
    }
}
