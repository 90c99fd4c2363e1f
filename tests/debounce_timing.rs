//! Timing behavior of the debounced value holder in virtual time.

use pacekeeper::infrastructure::mocks::ManualScheduler;
use pacekeeper::Debouncer;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(300);

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Settlements as (value, virtual time of settlement).
type Log = Arc<Mutex<Vec<(String, Duration)>>>;

fn debounced(scheduler: &ManualScheduler) -> (Debouncer<String>, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let clock = scheduler.clock();

    let debouncer = Debouncer::builder(String::new())
        .with_delay(DELAY)
        .with_scheduler(Arc::new(scheduler.clone()))
        .with_listener(move |value: &String| {
            sink.lock().unwrap().push((value.clone(), clock.elapsed()));
        })
        .build()
        .unwrap();

    (debouncer, log)
}

fn settlements(log: &Log) -> Vec<(String, Duration)> {
    log.lock().unwrap().clone()
}

#[test]
fn test_rapid_inputs_settle_only_the_last_value() {
    let scheduler = ManualScheduler::new();
    let (query, log) = debounced(&scheduler);

    let typed = ["r", "ru", "rus", "rust"];
    for (i, text) in typed.iter().enumerate() {
        scheduler.advance_to(ms(100 * i as u64));
        query.set(text.to_string());
    }

    // Last input at t=300, settles at t=600
    scheduler.advance_to(ms(599));
    assert!(settlements(&log).is_empty());
    assert_eq!(query.get(), "");

    scheduler.advance_to(ms(2_000));
    assert_eq!(settlements(&log), vec![("rust".to_string(), ms(600))]);
    assert_eq!(query.get(), "rust");
}

#[test]
fn test_spaced_inputs_each_settle_once() {
    let scheduler = ManualScheduler::new();
    let (value, log) = debounced(&scheduler);

    let arrivals = [0, 300, 700, 1_000];
    for (i, at) in arrivals.iter().enumerate() {
        scheduler.advance_to(ms(*at));
        value.set(format!("v{i}"));
    }
    scheduler.advance(ms(5_000));

    let expected: Vec<_> = arrivals
        .iter()
        .enumerate()
        .map(|(i, at)| (format!("v{i}"), ms(at + 300)))
        .collect();
    assert_eq!(settlements(&log), expected);
}

#[test]
fn test_same_value_twice_settles_once() {
    let scheduler = ManualScheduler::new();
    let (value, log) = debounced(&scheduler);

    value.set("same".to_string());
    value.set("same".to_string());
    scheduler.advance(ms(1_000));

    assert_eq!(settlements(&log), vec![("same".to_string(), ms(300))]);
    assert_eq!(value.metrics().invocations_deferred(), 1);
}

#[test]
fn test_settled_value_was_stable_for_delay() {
    let scheduler = ManualScheduler::new();
    let (value, log) = debounced(&scheduler);
    let mut last_input = Duration::ZERO;
    let mut inputs = Vec::new();

    let mut t = 0;
    for (i, gap) in [50, 400, 120, 299, 300, 10, 500, 301].iter().enumerate() {
        t += gap;
        scheduler.advance_to(ms(t));
        value.set(i.to_string());
        inputs.push((i.to_string(), ms(t)));
        last_input = ms(t);
    }
    scheduler.advance_to(last_input + ms(1_000));

    for (settled, at) in settlements(&log) {
        let arrived = inputs
            .iter()
            .find(|(v, _)| *v == settled)
            .map(|(_, arrived)| *arrived)
            .unwrap();
        assert_eq!(at, arrived + DELAY);

        // No other input arrived during the quiet period. An input landing
        // exactly on the deadline is delivered after the settlement.
        assert!(inputs
            .iter()
            .all(|(v, t)| *v == settled || *t < arrived || *t >= at));
    }
}

#[test]
fn test_initial_value_before_any_settlement() {
    let scheduler = ManualScheduler::new();
    let value = Debouncer::builder(42u32)
        .with_scheduler(Arc::new(scheduler.clone()))
        .build()
        .unwrap();

    assert_eq!(value.get(), 42);
    value.set(7);
    assert_eq!(value.get(), 42);
    scheduler.advance(value.delay());
    assert_eq!(value.get(), 7);
}

#[test]
fn test_zero_delay_settles_on_next_tick() {
    let scheduler = ManualScheduler::new();
    let value = Debouncer::builder(0u32)
        .with_delay(Duration::ZERO)
        .with_scheduler(Arc::new(scheduler.clone()))
        .build()
        .unwrap();

    value.set(1);
    assert_eq!(value.get(), 0);
    assert_eq!(scheduler.advance(Duration::ZERO), 1);
    assert_eq!(value.get(), 1);
}

#[test]
fn test_shortening_delay_settles_sooner() {
    let scheduler = ManualScheduler::new();
    let (value, log) = debounced(&scheduler);

    value.set("a".to_string());
    scheduler.advance(ms(100));
    value.set_delay(ms(50));

    scheduler.advance(ms(50));
    assert_eq!(settlements(&log), vec![("a".to_string(), ms(150))]);
}
