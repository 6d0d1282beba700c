//! End-to-end runs of the retry engine on tokio's paused clock.
//!
//! Virtual time makes the interval/deadline race deterministic, so attempt
//! counts and elapsed times are asserted exactly.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use retrier_core::retry::condition;
use retrier_core::{Action, Blocking, Dispatch, Exponential, NoError, Retry};
use tokio::time::Instant;

const SEC: Duration = Duration::from_secs(1);

fn counter(start: u64, step: u64) -> impl Action<Value = u64, Error = Infallible> {
    let value = Arc::new(AtomicU64::new(start));
    NoError(move || {
        let value = Arc::clone(&value);
        async move { value.fetch_add(step, Ordering::SeqCst) + step }
    })
}

fn greater_than(v: u64) -> impl Fn(&Result<u64, Infallible>) -> bool + Send + Sync + 'static {
    move |r| matches!(r, Ok(x) if *x >= v)
}

fn sleepy(d: Duration) -> impl Action<Value = (), Error = Infallible> {
    NoError(move || tokio::time::sleep(d))
}

#[tokio::test(start_paused = true)]
async fn counter_stops_when_condition_met() {
    let out = Retry::with(counter(0, 2))
        .within(10 * SEC)
        .every(SEC)
        .until(greater_than(10))
        .go()
        .await;
    assert_eq!(out.last_value(), Some(&10));
    assert!(out.satisfied);
    assert!(!out.timed_out);
    assert_eq!(out.attempts, 5);
    assert_eq!(out.elapsed, 5 * SEC);
}

#[tokio::test(start_paused = true)]
async fn slow_action_times_out_after_budget() {
    let start = Instant::now();
    let out = Retry::with(sleepy(Duration::from_millis(500)))
        .every(SEC)
        .within(10 * SEC)
        .go()
        .await;
    assert_eq!(start.elapsed(), 10 * SEC);
    assert!(out.timed_out);
    assert!(!out.satisfied);
    assert_eq!(out.attempts, 10);
}

#[tokio::test(start_paused = true)]
async fn max_attempts_stops_before_budget() {
    let out = Retry::with(sleepy(Duration::from_millis(500)))
        .every(SEC)
        .within(10 * SEC)
        .max_attempts(5)
        .go()
        .await;
    assert!(!out.timed_out);
    assert_eq!(out.attempts, 5);
    assert_eq!(out.elapsed, 5 * SEC);
}

#[tokio::test(start_paused = true)]
async fn exponential_backoff_total_elapsed() {
    let out = Retry::with(counter(0, 1))
        .every(SEC)
        .backoff(Exponential::new(2.0))
        .max_attempts(5)
        .go()
        .await;
    // 1 + 2 + 4 + 8 + 16
    assert_eq!(out.elapsed, 31 * SEC);
    assert_eq!(out.last_value(), Some(&5));
    assert_eq!(out.attempts, 5);
    assert!(!out.timed_out);
}

#[tokio::test(start_paused = true)]
async fn fails_until_sixth_call_then_yields_value() {
    let calls = Arc::new(AtomicU64::new(0));
    let action = {
        let calls = Arc::clone(&calls);
        move || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 5 {
                    Ok(42)
                } else {
                    Err("not yet")
                }
            }
        }
    };
    let out = Retry::with(action)
        .within(Duration::from_secs(300))
        .every(10 * SEC)
        .until_condition(condition::succeeded())
        .go()
        .await;
    assert_eq!(out.attempts, 6);
    assert!(out.last_error().is_none());
    assert_eq!(out.last_value(), Some(&42));
    assert_eq!(out.last_attempt, Some(5));
    assert!(!out.timed_out);
}

#[tokio::test(start_paused = true)]
async fn errors_are_data_for_the_condition() {
    let out = Retry::with(|| async { Err::<(), _>("permanent") })
        .every(SEC)
        .until_condition(condition::failed_with::<(), &str, _>(|e| *e == "permanent"))
        .go()
        .await;
    assert!(out.satisfied);
    assert_eq!(out.attempts, 1);
    assert_eq!(out.last_error(), Some(&"permanent"));
}

async fn invocation_times<A>(retry: Retry<A>, times: Arc<Mutex<Vec<Instant>>>) -> Vec<Duration>
where
    A: Action,
{
    let start = Instant::now();
    retry.go().await;
    let times = times.lock().unwrap();
    times.iter().map(|t| t.duration_since(start)).collect()
}

fn recording(times: Arc<Mutex<Vec<Instant>>>) -> impl Action<Value = (), Error = Infallible> {
    NoError(move || {
        times.lock().unwrap().push(Instant::now());
        async {}
    })
}

#[tokio::test(start_paused = true)]
async fn uniform_spacing_is_constant() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let retry = Retry::with(recording(Arc::clone(&times)))
        .every(SEC)
        .max_attempts(4);
    let offsets = invocation_times(retry, times).await;
    assert_eq!(offsets, vec![Duration::ZERO, SEC, 2 * SEC, 3 * SEC]);
}

#[tokio::test(start_paused = true)]
async fn exponential_spacing_doubles() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let retry = Retry::with(recording(Arc::clone(&times)))
        .every(SEC)
        .backoff(Exponential::new(2.0))
        .max_attempts(5);
    let offsets = invocation_times(retry, times).await;
    assert_eq!(
        offsets,
        vec![Duration::ZERO, SEC, 3 * SEC, 7 * SEC, 15 * SEC]
    );
}

#[tokio::test(start_paused = true)]
async fn custom_backoff_closure() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let retry = Retry::with(recording(Arc::clone(&times)))
        .every(SEC)
        .backoff(|attempt: u64, interval: Duration| interval * (attempt as u32 + 1))
        .max_attempts(3);
    let offsets = invocation_times(retry, times).await;
    assert_eq!(offsets, vec![Duration::ZERO, SEC, 3 * SEC]);
}

/// Attempt `i` sleeps `durations[i]` and returns `i`.
fn staggered(durations: Vec<Duration>) -> impl Action<Value = u64, Error = Infallible> {
    let next = Arc::new(AtomicU64::new(0));
    NoError(move || {
        let i = next.fetch_add(1, Ordering::SeqCst);
        let d = durations.get(i as usize).copied().unwrap_or(Duration::ZERO);
        async move {
            tokio::time::sleep(d).await;
            i
        }
    })
}

#[tokio::test(start_paused = true)]
async fn first_satisfying_result_wins_over_straggler() {
    // Attempt 0 finishes at 1.5s, attempt 1 (started at 1s) finishes at 1.6s.
    let action = staggered(vec![Duration::from_millis(1500), Duration::from_millis(600)]);
    let out = Retry::with(action)
        .every(SEC)
        .until_condition(condition::succeeded())
        .go()
        .await;
    assert!(out.satisfied);
    assert_eq!(out.attempts, 2);
    assert_eq!(out.last_attempt, Some(0));
    assert_eq!(out.last_value(), Some(&0));
}

#[tokio::test(start_paused = true)]
async fn no_dispatch_after_stop_is_observed() {
    let calls = Arc::new(AtomicU64::new(0));
    let action = {
        let calls = Arc::clone(&calls);
        NoError(move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { n }
        })
    };
    let out = Retry::with(action)
        .every(SEC)
        .until(greater_than(3))
        .go()
        .await;
    assert_eq!(out.last_value(), Some(&3));
    assert_eq!(out.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

fn tracking_overlap(
    work: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
) -> impl Action<Value = (), Error = Infallible> {
    NoError(move || {
        let active = Arc::clone(&active);
        let peak = Arc::clone(&peak);
        async move {
            let now = active.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(work).await;
            active.fetch_sub(1, Ordering::SeqCst);
        }
    })
}

#[tokio::test(start_paused = true)]
async fn concurrent_dispatch_overlaps_slow_actions() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let out = Retry::with(tracking_overlap(
        Duration::from_millis(2500),
        Arc::clone(&active),
        Arc::clone(&peak),
    ))
    .every(SEC)
    .max_attempts(3)
    .go()
    .await;
    assert_eq!(out.attempts, 3);
    assert_eq!(out.elapsed, 3 * SEC);
    assert_eq!(peak.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn serial_dispatch_never_overlaps() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let out = Retry::with(tracking_overlap(
        Duration::from_millis(2500),
        Arc::clone(&active),
        Arc::clone(&peak),
    ))
    .every(SEC)
    .max_attempts(3)
    .dispatch(Dispatch::Serial)
    .go()
    .await;
    assert_eq!(out.attempts, 3);
    assert_eq!(out.elapsed, Duration::from_millis(3 * 3500));
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn timeout_does_not_wait_for_in_flight_action() {
    let out = Retry::with(sleepy(Duration::from_secs(3600)))
        .every(SEC)
        .within(3 * SEC)
        .go()
        .await;
    assert!(out.timed_out);
    assert_eq!(out.elapsed, 3 * SEC);
    assert_eq!(out.attempts, 3);
    assert!(out.last.is_none());
}

#[tokio::test(start_paused = true)]
async fn serial_timeout_counts_attempt_in_flight() {
    let out = Retry::with(sleepy(Duration::from_secs(3600)))
        .every(SEC)
        .within(3 * SEC)
        .dispatch(Dispatch::Serial)
        .go()
        .await;
    assert!(out.timed_out);
    assert_eq!(out.elapsed, 3 * SEC);
    assert_eq!(out.attempts, 1);
    assert!(out.last.is_none());
}

#[test]
fn blocking_entry_point_with_blocking_action() {
    let calls = Arc::new(AtomicU64::new(0));
    let action = {
        let calls = Arc::clone(&calls);
        Blocking::new(move || {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, Infallible>(calls.fetch_add(1, Ordering::SeqCst) + 1)
        })
    };
    let out = Retry::with(action)
        .every(Duration::from_millis(100))
        .within(Duration::from_secs(30))
        .max_attempts(3)
        .go_blocking()
        .unwrap();
    assert!(!out.timed_out);
    assert_eq!(out.attempts, 3);
    assert!(out.elapsed >= Duration::from_millis(300));
    assert_eq!(out.last_value(), Some(&3));
}
