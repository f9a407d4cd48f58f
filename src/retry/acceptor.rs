//! The acceptor: a retry predicate plus its timing overrides.

use std::fmt;
use std::time::Duration;

/// Initial delay used when an [`Acceptor`] does not override it.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

/// Multiplicative backoff used when an [`Acceptor`] does not override it.
pub const DEFAULT_BACKOFF: f64 = 1.5;

/// Delay ceiling used when an [`Acceptor`] does not override it.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// A retry predicate bundled with optional timing overrides.
///
/// The predicate is called with the attempt number (starting at 0) and the
/// delay that will be waited if it declines. It returns a future resolving to:
///
/// - `Ok(Some(value))` to accept and stop with `value`
/// - `Ok(None)` to decline and try again after the delay
/// - `Err(error)` to stop immediately with `error`
///
/// Any timing value left unset falls back to [`DEFAULT_DELAY`],
/// [`DEFAULT_BACKOFF`] and [`DEFAULT_MAX_DELAY`]. An acceptor is built per
/// retry operation and consumed by it.
///
/// # Examples
///
/// ```rust
/// use tidewater::retry::Acceptor;
/// use std::time::Duration;
///
/// let acceptor = Acceptor::new(|_attempt: u32, _next: Duration| async {
///     Ok::<_, String>(Some("done"))
/// })
/// .with_delay(Duration::from_secs(1))
/// .with_backoff(2.0)
/// .with_max_delay(Duration::from_secs(30));
///
/// assert_eq!(acceptor.delay(), Duration::from_secs(1));
/// assert_eq!(acceptor.backoff(), 2.0);
/// assert_eq!(acceptor.max_delay(), Duration::from_secs(30));
/// ```
pub struct Acceptor<F> {
    pub(crate) accept: F,
    delay: Option<Duration>,
    backoff: Option<f64>,
    max_delay: Option<Duration>,
}

impl<F> Acceptor<F> {
    /// Create an acceptor using the default timing.
    ///
    /// ```rust
    /// use tidewater::retry::{Acceptor, DEFAULT_BACKOFF, DEFAULT_DELAY, DEFAULT_MAX_DELAY};
    /// use std::time::Duration;
    ///
    /// let acceptor = Acceptor::new(|_: u32, _: Duration| async { Ok::<Option<()>, ()>(None) });
    /// assert_eq!(acceptor.delay(), DEFAULT_DELAY);
    /// assert_eq!(acceptor.backoff(), DEFAULT_BACKOFF);
    /// assert_eq!(acceptor.max_delay(), DEFAULT_MAX_DELAY);
    /// ```
    pub fn new(accept: F) -> Self {
        Self {
            accept,
            delay: None,
            backoff: None,
            max_delay: None,
        }
    }

    /// Set the delay waited after the first declined attempt.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set the factor the delay is multiplied by after each declined attempt.
    ///
    /// Factors below `1.0` are accepted and make the delay shrink; negative
    /// factors collapse the delay to zero.
    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Set the ceiling the delay is clamped to.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Effective initial delay.
    pub fn delay(&self) -> Duration {
        self.delay.unwrap_or(DEFAULT_DELAY)
    }

    /// Effective backoff factor.
    pub fn backoff(&self) -> f64 {
        self.backoff.unwrap_or(DEFAULT_BACKOFF)
    }

    /// Effective delay ceiling.
    pub fn max_delay(&self) -> Duration {
        self.max_delay.unwrap_or(DEFAULT_MAX_DELAY)
    }

    pub(crate) fn schedule(&self) -> Schedule {
        Schedule {
            delay: self.delay(),
            backoff: self.backoff(),
            max_delay: self.max_delay(),
        }
    }
}

impl<F> fmt::Debug for Acceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acceptor")
            .field("delay", &self.delay)
            .field("backoff", &self.backoff)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

/// Pure delay progression for one retry loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Schedule {
    pub(crate) delay: Duration,
    pub(crate) backoff: f64,
    pub(crate) max_delay: Duration,
}

impl Schedule {
    /// The delay for the current attempt, clamped to the ceiling.
    pub(crate) fn current(&self) -> Duration {
        self.delay.min(self.max_delay)
    }

    /// Advance to the next attempt's delay.
    pub(crate) fn advance(&mut self) {
        // Scale in whole nanoseconds so exact factors give exact delays.
        let next = (self.current().as_nanos() as f64 * self.backoff).round();
        self.delay = if next.is_nan() || next <= 0.0 {
            Duration::ZERO
        } else if next >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(next as u64)
        };
    }
}
