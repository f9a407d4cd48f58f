//! Property-based tests for the retry schedule

use proptest::prelude::*;
use std::time::Duration;
use tidewater::retry::{Acceptor, Retryer};
use tidewater::testing::RecordingTimer;
use tokio_util::sync::CancellationToken;

fn run_until_attempt(
    accept_at: u32,
    delay_ms: u64,
    backoff: f64,
    max_ms: u64,
) -> (Result<Option<u32>, String>, RecordingTimer) {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());
    let acceptor = Acceptor::new(move |attempt: u32, _: Duration| async move {
        Ok::<_, String>((attempt == accept_at).then_some(attempt))
    })
    .with_delay(Duration::from_millis(delay_ms))
    .with_backoff(backoff)
    .with_max_delay(Duration::from_millis(max_ms));

    let outcome = tokio_test::block_on(retryer.until(&CancellationToken::new(), acceptor));
    (outcome, timer)
}

proptest! {
    #[test]
    fn prop_delays_never_exceed_max(
        accept_at in 0u32..60,
        delay_ms in 0u64..5_000,
        backoff in 0.0f64..4.0,
        max_ms in 1u64..10_000,
    ) {
        let (_, timer) = run_until_attempt(accept_at, delay_ms, backoff, max_ms);
        let max = Duration::from_millis(max_ms);

        prop_assert!(timer.delays().iter().all(|d| *d <= max));
    }

    #[test]
    fn prop_delays_non_decreasing_when_growing(
        accept_at in 1u32..60,
        delay_ms in 1u64..1_000,
        backoff in 1.0f64..3.0,
        max_ms in 1u64..30_000,
    ) {
        let (_, timer) = run_until_attempt(accept_at, delay_ms, backoff, max_ms);
        let delays = timer.delays();

        prop_assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(delays[0], Duration::from_millis(delay_ms.min(max_ms)));
    }

    #[test]
    fn prop_one_wait_per_rejected_attempt(accept_at in 0u32..100) {
        let (outcome, timer) = run_until_attempt(accept_at, 10, 2.0, 1_000);

        prop_assert_eq!(outcome, Ok(Some(accept_at)));
        prop_assert_eq!(timer.waits(), accept_at as usize);
    }

    #[test]
    fn prop_error_stops_the_loop(fail_at in 0u32..50) {
        let timer = RecordingTimer::new();
        let retryer = Retryer::new(timer.clone());
        let acceptor = Acceptor::new(move |attempt: u32, _: Duration| async move {
            if attempt == fail_at {
                Err(format!("failed at {}", attempt))
            } else {
                Ok(None::<()>)
            }
        });

        let outcome = tokio_test::block_on(retryer.until(&CancellationToken::new(), acceptor));

        prop_assert_eq!(outcome, Err(format!("failed at {}", fail_at)));
        prop_assert_eq!(timer.waits(), fail_at as usize);
    }
}
