//! Testing utilities for code built on tidewater.
//!
//! Deterministic doubles for both halves of the crate: a timer that records
//! instead of waiting, fixture environments backed by in-memory stores, and
//! assertion macros for validation outcomes.
//!
//! # Examples
//!
//! ## RecordingTimer
//!
//! ```rust
//! use tidewater::retry::{Acceptor, Retryer};
//! use tidewater::testing::RecordingTimer;
//! use tokio_util::sync::CancellationToken;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let timer = RecordingTimer::new();
//! let retryer = Retryer::new(timer.clone());
//!
//! let outcome = retryer
//!     .until(
//!         &CancellationToken::new(),
//!         Acceptor::new(|attempt: u32, _: Duration| async move {
//!             Ok::<_, ()>((attempt == 2).then_some(()))
//!         }),
//!     )
//!     .await;
//!
//! assert_eq!(outcome, Ok(Some(())));
//! assert_eq!(timer.delays(), vec![Duration::from_millis(100), Duration::from_millis(150)]);
//! # });
//! ```
//!
//! ## Fixture environments and assertion macros
//!
//! ```rust
//! use tidewater::env::{Registry, VarOptions};
//! use tidewater::testing::fixture_env;
//! use tidewater::{assert_env_error, assert_valid};
//!
//! let registry = Registry::new();
//! let port = registry.declare_int("PORT", "listen port", VarOptions::new());
//!
//! let good = fixture_env([("TIDEWATER_PORT", "8080")]);
//! assert_valid!(port.validate_in(&good));
//!
//! let bad = fixture_env([("TIDEWATER_PORT", "eighty")]);
//! assert_env_error!(port.validate_in(&bad));
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::env::{Env, MapStore};
use crate::retry::Timer;

/// A [`Timer`] that completes immediately and remembers every delay it was
/// asked to wait.
///
/// Clones share the same record, so keep one clone and hand the other to a
/// [`Retryer`](crate::retry::Retryer).
#[derive(Debug, Clone, Default)]
pub struct RecordingTimer {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingTimer {
    /// Create a timer with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delay requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many waits were requested.
    pub fn waits(&self) -> usize {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Timer for RecordingTimer {
    fn sleep(&self, delay: Duration) -> BoxFuture<'static, ()> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
        futures::future::ready(()).boxed()
    }
}

/// Build an [`Env`] over an in-memory store holding `pairs`.
///
/// Keys are used verbatim, so include the registry prefix.
pub fn fixture_env<I, K, V>(pairs: I) -> Env
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    Env::new(MapStore::from_pairs(pairs))
}

/// Assert that a validation produced neither a warning nor an error.
///
/// # Example
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
/// use tidewater::testing::fixture_env;
/// use tidewater::assert_valid;
///
/// let registry = Registry::new();
/// let name = registry.declare_string("NAME", "a name", VarOptions::new());
/// assert_valid!(name.validate_in(&fixture_env([("TIDEWATER_NAME", "x")])));
/// ```
#[macro_export]
macro_rules! assert_valid {
    ($validation:expr) => {
        match $validation {
            Ok(None) => {}
            Ok(Some(warning)) => {
                panic!("Expected valid, got warning: {}", warning);
            }
            Err(error) => {
                panic!("Expected valid, got error: {}", error);
            }
        }
    };
}

/// Assert that a validation produced a warning and no error.
///
/// # Example
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
/// use tidewater::testing::fixture_env;
/// use tidewater::assert_warns;
///
/// let registry = Registry::new();
/// let debug = registry.declare_bool("DEBUG", "debug mode", VarOptions::new());
/// assert_warns!(debug.validate_in(&fixture_env([("TIDEWATER_DEBUG", "yes")])));
/// ```
#[macro_export]
macro_rules! assert_warns {
    ($validation:expr) => {
        match $validation {
            Ok(Some(_)) => {}
            Ok(None) => {
                panic!("Expected warning, got valid");
            }
            Err(error) => {
                panic!("Expected warning, got error: {}", error);
            }
        }
    };
}

/// Assert that a validation failed with a hard error.
///
/// # Example
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
/// use tidewater::testing::fixture_env;
/// use tidewater::assert_env_error;
///
/// let registry = Registry::new();
/// let port = registry.declare_int("PORT", "listen port", VarOptions::new());
/// assert_env_error!(port.validate_in(&fixture_env([("TIDEWATER_PORT", "abc")])));
/// ```
#[macro_export]
macro_rules! assert_env_error {
    ($validation:expr) => {
        match $validation {
            Err(_) => {}
            Ok(None) => {
                panic!("Expected error, got valid");
            }
            Ok(Some(warning)) => {
                panic!("Expected error, got warning: {}", warning);
            }
        }
    };
}
