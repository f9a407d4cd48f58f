//! Pluggable wait primitive used between attempts.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

/// Something that can wait for a duration.
///
/// The retry loop races this future against cancellation, so dropping it
/// early must be harmless. Timers shared between concurrent retry loops must
/// be safe to use from several tasks at once.
///
/// Any `Fn(Duration) -> impl Future<Output = ()>` closure is a timer:
///
/// ```rust
/// use tidewater::retry::{Retryer, Timer};
/// use std::time::Duration;
///
/// // Never actually wait.
/// let retryer = Retryer::new(|_: Duration| async {});
/// # let _ = retryer;
/// ```
pub trait Timer: Send + Sync {
    /// Resolve once `delay` has elapsed.
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()>;
}

/// Real-time timer backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(delay).boxed()
    }
}

impl<F, Fut> Timer for F
where
    F: Fn(Duration) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        self(delay).boxed()
    }
}
