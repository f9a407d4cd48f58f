//! Behavioural tests for the retry loop.

use super::*;
use crate::testing::RecordingTimer;
use futures::future::ready;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

#[tokio::test]
async fn test_backoff_doubles_between_attempts() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());
    let mut offered = Vec::new();

    let outcome = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|attempt: u32, next: Duration| {
                offered.push(next);
                ready(Ok::<_, String>((attempt == 4).then_some(attempt)))
            })
            .with_delay(secs(1))
            .with_backoff(2.0)
            .with_max_delay(secs(100)),
        )
        .await;

    assert_eq!(outcome, Ok(Some(4)));
    assert_eq!(timer.delays(), vec![secs(1), secs(2), secs(4), secs(8)]);
    // The predicate sees the delay it would wait if it declined.
    assert_eq!(offered, vec![secs(1), secs(2), secs(4), secs(8), secs(16)]);
}

#[tokio::test]
async fn test_delay_is_clamped_to_max_delay() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());

    let outcome = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|attempt: u32, _: Duration| {
                ready(Ok::<_, ()>((attempt == 150).then_some(())))
            })
            .with_delay(secs(1))
            .with_backoff(2.0)
            .with_max_delay(secs(10)),
        )
        .await;

    assert_eq!(outcome, Ok(Some(())));
    let delays = timer.delays();
    assert_eq!(delays.len(), 150);
    assert!(delays.iter().all(|d| *d <= secs(10)));
    assert!(delays[100..].iter().all(|d| *d == secs(10)));
}

#[tokio::test]
async fn test_immediate_acceptance_never_waits() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());

    let outcome = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|_: u32, _: Duration| ready(Ok::<_, ()>(Some(vec![1, 2, 3])))),
        )
        .await;

    assert_eq!(outcome, Ok(Some(vec![1, 2, 3])));
    assert_eq!(timer.waits(), 0);
}

#[tokio::test]
async fn test_error_short_circuits() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());
    let calls = AtomicU32::new(0);

    let outcome: Result<Option<()>, String> = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|attempt: u32, _: Duration| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(if attempt == 3 {
                    Err(format!("failed on attempt {}", attempt))
                } else {
                    Ok(None)
                })
            }),
        )
        .await;

    assert_eq!(outcome, Err("failed on attempt 3".to_string()));
    assert_eq!(timer.waits(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_error_on_first_attempt_never_waits() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());

    let outcome = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|_: u32, _: Duration| ready(Err::<Option<()>, _>("nope"))),
        )
        .await;

    assert_eq!(outcome, Err("nope"));
    assert_eq!(timer.waits(), 0);
}

#[tokio::test]
async fn test_cancellation_is_not_an_error() {
    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());
    let ctx = CancellationToken::new();

    let outcome: Result<Option<()>, String> = retryer
        .until(
            &ctx,
            Acceptor::new(|attempt: u32, _: Duration| {
                if attempt == 2 {
                    ctx.cancel();
                }
                ready(Ok(None))
            }),
        )
        .await;

    assert_eq!(outcome, Ok(None));
    // Attempts 0 and 1 waited; attempt 2 cancelled before its wait.
    assert_eq!(timer.waits(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_from_another_task_interrupts_wait() {
    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);
    let outcome: Result<Option<()>, ()> = until(
        &ctx,
        Acceptor::new(|_: u32, _: Duration| {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(Ok(None))
        })
        .with_delay(secs(3600))
        .with_max_delay(secs(3600)),
    )
    .await;

    assert_eq!(outcome, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(50), "{:?}", elapsed);
    assert!(elapsed < secs(1), "{:?}", elapsed);
}

#[tokio::test]
async fn test_already_cancelled_context_still_calls_predicate_once() {
    let ctx = CancellationToken::new();
    ctx.cancel();
    let calls = AtomicU32::new(0);

    let outcome: Result<Option<()>, ()> = Retryer::new(RecordingTimer::new())
        .until(
            &ctx,
            Acceptor::new(|_: u32, _: Duration| {
                calls.fetch_add(1, Ordering::SeqCst);
                ready(Ok(None))
            }),
        )
        .await;

    assert_eq!(outcome, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_accepting_after_cancel_request_still_wins() {
    let ctx = CancellationToken::new();
    ctx.cancel();

    let outcome = Retryer::new(RecordingTimer::new())
        .until(
            &ctx,
            Acceptor::new(|_: u32, _: Duration| ready(Ok::<_, ()>(Some("accepted")))),
        )
        .await;

    assert_eq!(outcome, Ok(Some("accepted")));
}

#[tokio::test]
async fn test_async_predicate() {
    let polls = Arc::new(AtomicU32::new(0));

    let outcome = Retryer::new(RecordingTimer::new())
        .until(
            &CancellationToken::new(),
            Acceptor::new({
                let polls = polls.clone();
                move |_: u32, _: Duration| {
                    let polls = polls.clone();
                    async move {
                        tokio::task::yield_now().await;
                        let n = polls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>((n >= 2).then_some("done"))
                    }
                }
            }),
        )
        .await;

    assert_eq!(outcome, Ok(Some("done")));
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_real_timer_waits_default_schedule() {
    let start = tokio::time::Instant::now();

    let outcome = until(
        &CancellationToken::new(),
        Acceptor::new(|attempt: u32, _: Duration| ready(Ok::<_, ()>((attempt == 2).then_some(())))),
    )
    .await;

    assert_eq!(outcome, Ok(Some(())));
    // 100ms + 150ms with the default schedule.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(250), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(300), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_until_timeout_gives_up_without_error() {
    let start = tokio::time::Instant::now();

    let outcome: Result<Option<()>, String> = until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| ready(Ok(None))).with_delay(secs(1)),
        secs(3),
    )
    .await;

    assert_eq!(outcome, Ok(None));
    let elapsed = start.elapsed();
    assert!(elapsed >= secs(3), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3100), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_until_timeout_returns_acceptance_before_deadline() {
    let outcome = until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|attempt: u32, _: Duration| ready(Ok::<_, ()>((attempt == 1).then_some(attempt)))),
        secs(60),
    )
    .await;

    assert_eq!(outcome, Ok(Some(1)));
}

#[tokio::test(start_paused = true)]
async fn test_until_deadline_passes_errors_through() {
    let deadline = tokio::time::Instant::now() + secs(60);

    let outcome = until_deadline(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| ready(Err::<Option<()>, _>("bad gateway"))),
        deadline,
    )
    .await;

    assert_eq!(outcome, Err("bad gateway"));
}

#[tokio::test(start_paused = true)]
async fn test_until_deadline_observes_parent_cancellation() {
    let ctx = CancellationToken::new();

    let outcome: Result<Option<()>, ()> = Retryer::default()
        .until_deadline(
            &ctx,
            Acceptor::new(|attempt: u32, _: Duration| {
                if attempt == 1 {
                    ctx.cancel();
                }
                ready(Ok(None))
            }),
            tokio::time::Instant::now() + secs(3600),
        )
        .await;

    assert_eq!(outcome, Ok(None));
}

#[tokio::test(start_paused = true)]
async fn test_until_deadline_in_the_past_stops_after_first_attempt() {
    let calls = AtomicU32::new(0);

    let outcome: Result<Option<()>, ()> = until_deadline(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| {
            calls.fetch_add(1, Ordering::SeqCst);
            ready(Ok(None))
        }),
        tokio::time::Instant::now(),
    )
    .await;

    assert_eq!(outcome, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_does_not_cancel_parent() {
    let ctx = CancellationToken::new();

    let _: Result<Option<()>, ()> = until_timeout(
        &ctx,
        Acceptor::new(|_: u32, _: Duration| ready(Ok(None))),
        Duration::from_millis(500),
    )
    .await;

    assert!(!ctx.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn test_huge_timeout_does_not_overflow() {
    let outcome = until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| ready(Ok::<_, ()>(Some(7)))),
        Duration::MAX,
    )
    .await;

    assert_eq!(outcome, Ok(Some(7)));
}

#[tokio::test]
async fn test_closure_timer_sees_every_wait() {
    let waited = Arc::new(AtomicU32::new(0));
    let retryer = Retryer::new({
        let waited = waited.clone();
        move |_: Duration| {
            waited.fetch_add(1, Ordering::SeqCst);
            async {}
        }
    });

    let outcome = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|attempt: u32, _: Duration| ready(Ok::<_, ()>((attempt == 5).then_some(())))),
        )
        .await;

    assert_eq!(outcome, Ok(Some(())));
    assert_eq!(waited.load(Ordering::SeqCst), 5);
}

#[cfg(feature = "tracing")]
mod tracing_tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_rejected_attempts_are_logged() {
        let _ = Retryer::new(RecordingTimer::new())
            .until(
                &CancellationToken::new(),
                Acceptor::new(|attempt: u32, _: Duration| ready(Ok::<_, ()>((attempt == 1).then_some(())))),
            )
            .await;

        assert!(logs_contain("attempt not accepted"));
    }
}
