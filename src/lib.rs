//! # Tidewater
//!
//! > *"Wait for the tide, then read the water"*
//!
//! Two small building blocks for services that start up against an
//! unreliable world:
//!
//! - [`retry`]: poll an async predicate with exponential backoff until it
//!   accepts, fails, or the caller cancels
//! - [`env`]: declare typed environment variables once, then read, document
//!   and validate them
//!
//! ## Quick Example
//!
//! ```rust
//! use std::time::Duration;
//! use tidewater::env::{Env, MapStore, Registry, VarOptions};
//! use tidewater::retry::{self, Acceptor};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let registry = Registry::new();
//! let attempts = registry.declare_int("READY_AFTER", "attempts before ready", VarOptions::new().with_default("3"));
//! let env = Env::new(MapStore::new());
//!
//! let ready_after = env.get_int(&attempts) as u32;
//! let outcome = retry::until(
//!     &CancellationToken::new(),
//!     Acceptor::new(move |attempt: u32, _delay: Duration| async move {
//!         Ok::<_, std::io::Error>((attempt + 1 >= ready_after).then_some(attempt))
//!     })
//!     .with_delay(Duration::from_millis(1)),
//! )
//! .await;
//!
//! assert_eq!(outcome.unwrap(), Some(2));
//! # });
//! ```
//!
//! See the `demos/` directory for longer walkthroughs.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod env;
pub mod retry;
pub mod testing;

// Re-exports
pub use env::{Env, EnvError, Registry, VarOptions, Warning};
pub use retry::{Acceptor, Retryer, Timer};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::env::{
        BoolValue, Env, EnvError, IntValue, MapStore, Registry, StringValue, VarOptions, Warning,
    };
    pub use crate::retry::{Acceptor, Retryer, Timer, TokioTimer};
}
