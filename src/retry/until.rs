//! The retry loop and its deadline/timeout wrappers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::acceptor::Acceptor;
use super::timer::{Timer, TokioTimer};

/// Runs acceptors against an injectable [`Timer`].
///
/// A retryer carries no state between calls; keeping one around is only
/// useful for reusing a custom timer, e.g. a fake one in tests.
///
/// # Examples
///
/// ```rust
/// use tidewater::retry::{Acceptor, Retryer};
/// use tokio_util::sync::CancellationToken;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let retryer = Retryer::new(|_: Duration| async {});
/// let outcome = retryer
///     .until(
///         &CancellationToken::new(),
///         Acceptor::new(|attempt: u32, _: Duration| async move {
///             Ok::<_, String>((attempt == 3).then_some(attempt))
///         }),
///     )
///     .await;
///
/// assert_eq!(outcome, Ok(Some(3)));
/// # });
/// ```
#[derive(Clone)]
pub struct Retryer {
    timer: Arc<dyn Timer>,
}

impl Retryer {
    /// Create a retryer that waits using `timer`.
    pub fn new(timer: impl Timer + 'static) -> Self {
        Self {
            timer: Arc::new(timer),
        }
    }

    /// Create a retryer sharing an existing timer.
    pub fn from_arc(timer: Arc<dyn Timer>) -> Self {
        Self { timer }
    }

    /// Call the acceptor's predicate until it accepts, fails, or `ctx` is
    /// cancelled.
    ///
    /// Returns:
    ///
    /// - `Ok(Some(value))` when the predicate accepted with `value`
    /// - `Err(error)` when the predicate failed; the error is passed through
    ///   untouched
    /// - `Ok(None)` when `ctx` was cancelled while waiting between attempts
    ///
    /// Cancellation is deliberately not reported as an error. Callers that
    /// need to tell it apart from acceptance check for `None`.
    ///
    /// There is no attempt limit. Bound the loop from the predicate (by
    /// returning an error past some attempt) or with a deadline.
    ///
    /// Cancellation is only observed while waiting; a predicate that never
    /// completes blocks the loop regardless of `ctx`.
    pub async fn until<F, Fut, T, E>(
        &self,
        ctx: &CancellationToken,
        acceptor: Acceptor<F>,
    ) -> Result<Option<T>, E>
    where
        F: FnMut(u32, Duration) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        self.run(ctx.cancelled(), acceptor).await
    }

    /// Like [`until`](Self::until), but also stops at `deadline`.
    ///
    /// The loop waits on a child scope of `ctx` that is cancelled when the
    /// deadline passes. The scope is cancelled on every exit path, including
    /// unwinding out of the predicate.
    pub async fn until_deadline<F, Fut, T, E>(
        &self,
        ctx: &CancellationToken,
        acceptor: Acceptor<F>,
        deadline: Instant,
    ) -> Result<Option<T>, E>
    where
        F: FnMut(u32, Duration) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let scope = ctx.child_token();
        let _guard = scope.clone().drop_guard();

        let cancelled = async {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("retry deadline reached");
                    scope.cancel();
                }
            }
        };

        self.run(cancelled, acceptor).await
    }

    /// Like [`until`](Self::until), but gives up after `timeout`.
    pub async fn until_timeout<F, Fut, T, E>(
        &self,
        ctx: &CancellationToken,
        acceptor: Acceptor<F>,
        timeout: Duration,
    ) -> Result<Option<T>, E>
    where
        F: FnMut(u32, Duration) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(far_future);
        self.until_deadline(ctx, acceptor, deadline).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        cancelled: impl Future<Output = ()>,
        acceptor: Acceptor<F>,
    ) -> Result<Option<T>, E>
    where
        F: FnMut(u32, Duration) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        tokio::pin!(cancelled);

        let mut schedule = acceptor.schedule();
        let mut accept = acceptor.accept;
        let mut attempt = 0u32;

        loop {
            let delay = schedule.current();

            if let Some(value) = accept(attempt, delay).await? {
                return Ok(Some(value));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, ?delay, "attempt not accepted, waiting");

            tokio::select! {
                biased;
                _ = &mut cancelled => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt, "retry cancelled");
                    return Ok(None);
                }
                _ = self.timer.sleep(delay) => {}
            }

            schedule.advance();
            attempt = attempt.saturating_add(1);
        }
    }
}

impl Default for Retryer {
    fn default() -> Self {
        Self::new(TokioTimer)
    }
}

impl fmt::Debug for Retryer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retryer").finish_non_exhaustive()
    }
}

/// Roughly 30 years from now; used when a timeout overflows `Instant`.
fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(86_400 * 365 * 30)
}

/// [`Retryer::until`] with the real-time timer.
///
/// # Examples
///
/// ```rust
/// use tidewater::retry::{self, Acceptor};
/// use tokio_util::sync::CancellationToken;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let outcome = retry::until(
///     &CancellationToken::new(),
///     Acceptor::new(|_: u32, _: Duration| async { Err::<Option<()>, _>("boom") }),
/// )
/// .await;
///
/// assert_eq!(outcome, Err("boom"));
/// # });
/// ```
pub async fn until<F, Fut, T, E>(
    ctx: &CancellationToken,
    acceptor: Acceptor<F>,
) -> Result<Option<T>, E>
where
    F: FnMut(u32, Duration) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    Retryer::default().until(ctx, acceptor).await
}

/// [`Retryer::until_deadline`] with the real-time timer.
pub async fn until_deadline<F, Fut, T, E>(
    ctx: &CancellationToken,
    acceptor: Acceptor<F>,
    deadline: Instant,
) -> Result<Option<T>, E>
where
    F: FnMut(u32, Duration) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    Retryer::default().until_deadline(ctx, acceptor, deadline).await
}

/// [`Retryer::until_timeout`] with the real-time timer.
pub async fn until_timeout<F, Fut, T, E>(
    ctx: &CancellationToken,
    acceptor: Acceptor<F>,
    timeout: Duration,
) -> Result<Option<T>, E>
where
    F: FnMut(u32, Duration) -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    Retryer::default().until_timeout(ctx, acceptor, timeout).await
}
