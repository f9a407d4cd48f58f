//! Exponential-backoff retry coordination.
//!
//! The caller supplies an acceptance predicate; the engine keeps calling it
//! with a growing delay in between until it accepts, fails, or the
//! cancellation token fires:
//!
//! - **Acceptor**: the predicate plus `delay`, `backoff` and `max_delay`
//!   overrides (100ms, 1.5x and 5s by default)
//! - **Retryer**: the loop itself, parameterized over a [`Timer`] so tests can
//!   run without waiting
//! - **until / until_deadline / until_timeout**: entry points using the real
//!   clock
//!
//! # Quick Start
//!
//! ```rust
//! use tidewater::retry::{self, Acceptor};
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let ctx = CancellationToken::new();
//! let outcome = retry::until(
//!     &ctx,
//!     Acceptor::new(|attempt: u32, _next: Duration| async move {
//!         if attempt < 2 {
//!             Ok(None) // not ready yet, try again
//!         } else {
//!             Ok::<_, String>(Some("ready"))
//!         }
//!     })
//!     .with_delay(Duration::from_millis(1)),
//! )
//! .await;
//!
//! assert_eq!(outcome, Ok(Some("ready")));
//! # });
//! ```
//!
//! # Outcomes
//!
//! | Predicate / context            | `until` returns |
//! |--------------------------------|-----------------|
//! | `Ok(Some(v))` on some attempt  | `Ok(Some(v))`   |
//! | `Err(e)` on some attempt       | `Err(e)`        |
//! | cancelled while waiting        | `Ok(None)`      |
//!
//! Cancellation is not an error. There is also no "retries exhausted" error:
//! the engine never gives up on its own, so the predicate (or a deadline)
//! has to.

mod acceptor;
mod timer;
mod until;

pub use acceptor::{Acceptor, DEFAULT_BACKOFF, DEFAULT_DELAY, DEFAULT_MAX_DELAY};
pub use timer::{Timer, TokioTimer};
pub use until::{until, until_deadline, until_timeout, Retryer};

#[cfg(test)]
mod tests;
