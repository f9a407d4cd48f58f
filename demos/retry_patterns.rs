//! Retry Patterns Example
//!
//! Demonstrates polling with `tidewater::retry`:
//! - Waiting for a condition with exponential backoff
//! - Stopping early on a hard failure
//! - Giving up after a timeout
//! - Cancelling from another task
//! - Capping the delay

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tidewater::retry::{self, Acceptor, Retryer};
use tidewater::testing::RecordingTimer;
use tokio_util::sync::CancellationToken;

// ==================== Basic Polling ====================

/// Example 1: wait until a service reports ready
async fn example_wait_until_ready() {
    println!("\n=== Example 1: Wait Until Ready ===");

    let checks = Arc::new(AtomicU32::new(0));
    let outcome = retry::until(
        &CancellationToken::new(),
        Acceptor::new({
            let checks = checks.clone();
            move |attempt: u32, delay: Duration| {
                let checks = checks.clone();
                async move {
                    let n = checks.fetch_add(1, Ordering::SeqCst);
                    println!("  attempt {} (next wait {:?})", attempt, delay);
                    Ok::<_, String>((n >= 3).then(|| format!("ready after {} checks", n + 1)))
                }
            }
        })
        .with_delay(Duration::from_millis(20))
        .with_backoff(2.0),
    )
    .await;

    match outcome {
        Ok(Some(status)) => println!("Service: {}", status),
        Ok(None) => println!("Cancelled"),
        Err(e) => println!("Failed: {}", e),
    }
}

// ==================== Hard Failures ====================

/// Example 2: a predicate error ends the loop immediately
async fn example_hard_failure() {
    println!("\n=== Example 2: Hard Failure ===");

    let outcome: Result<Option<()>, String> = retry::until(
        &CancellationToken::new(),
        Acceptor::new(|attempt: u32, _: Duration| async move {
            if attempt == 2 {
                Err("404 Not Found".to_string())
            } else {
                println!("  attempt {}: 503, retrying", attempt);
                Ok(None)
            }
        })
        .with_delay(Duration::from_millis(10)),
    )
    .await;

    println!("Outcome: {:?}", outcome);
}

// ==================== Timeouts ====================

/// Example 3: a condition that never becomes true
async fn example_timeout() {
    println!("\n=== Example 3: Timeout ===");

    let outcome = retry::until_timeout(
        &CancellationToken::new(),
        Acceptor::new(|_: u32, _: Duration| async { Ok::<Option<()>, String>(None) })
            .with_delay(Duration::from_millis(25)),
        Duration::from_millis(200),
    )
    .await;

    // Running out of time is reported as "not accepted", not as an error.
    println!("Outcome after timeout: {:?}", outcome);
}

// ==================== Cancellation ====================

/// Example 4: another task cancels the wait
async fn example_cancellation() {
    println!("\n=== Example 4: Cancellation ===");

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        println!("  shutdown requested");
        canceller.cancel();
    });

    let outcome = retry::until(
        &token,
        Acceptor::new(|attempt: u32, _: Duration| async move {
            println!("  attempt {}", attempt);
            Ok::<Option<()>, String>(None)
        })
        .with_delay(Duration::from_millis(50))
        .with_backoff(1.0),
    )
    .await;

    println!("Outcome: {:?}", outcome);
}

// ==================== Delay Schedule ====================

/// Example 5: inspect the schedule without waiting
async fn example_schedule() {
    println!("\n=== Example 5: Delay Schedule ===");

    let timer = RecordingTimer::new();
    let retryer = Retryer::new(timer.clone());

    let _ = retryer
        .until(
            &CancellationToken::new(),
            Acceptor::new(|attempt: u32, _: Duration| async move {
                Ok::<_, String>((attempt == 12).then_some(()))
            })
            .with_delay(Duration::from_millis(100))
            .with_backoff(2.0)
            .with_max_delay(Duration::from_secs(10)),
        )
        .await;

    for (i, delay) in timer.delays().iter().enumerate() {
        println!("  wait {:>2}: {:?}", i, delay);
    }
}

#[tokio::main]
async fn main() {
    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_wait_until_ready().await;
    example_hard_failure().await;
    example_timeout().await;
    example_cancellation().await;
    example_schedule().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
