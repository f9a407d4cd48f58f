//! Typed, declarative configuration read from environment variables.
//!
//! Variables are declared once, usually at startup, and read through typed
//! handles:
//!
//! - **Store**: where raw strings come from (process environment, in-memory
//!   maps, or several joined in order)
//! - **Registry**: the ordered list of declared variables, used for
//!   documentation and startup validation
//! - **Value**: a typed handle (`StringValue`, `BoolValue`, `IntValue`) that
//!   resolves against the global environment or any [`Env`]
//!
//! Reads are fail-soft: a missing or malformed value reads as `""`, `false`
//! or `0`. Validation is separate and distinguishes warnings from errors.
//!
//! # Quick Start
//!
//! ```rust
//! use tidewater::env::{Env, MapStore, Registry, VarOptions};
//!
//! let registry = Registry::new();
//! let experimental = registry.declare_bool("EXPERIMENTAL", "enable experimental features", VarOptions::new());
//! let engine = registry.declare_string(
//!     "ENGINE",
//!     "experimental engine to use",
//!     VarOptions::new().with_needs(&experimental).with_default("classic"),
//! );
//!
//! let off = Env::new(MapStore::new().with("TIDEWATER_ENGINE", "turbo"));
//! assert_eq!(engine.value_in(&off), "classic");
//! assert_eq!(engine.display_in(&off), "needs TIDEWATER_EXPERIMENTAL (turbo)");
//! assert!(engine.validate_in(&off).unwrap().is_some()); // set but ignored
//!
//! let on = Env::new(
//!     MapStore::new()
//!         .with("TIDEWATER_EXPERIMENTAL", "true")
//!         .with("TIDEWATER_ENGINE", "turbo"),
//! );
//! assert_eq!(engine.value_in(&on), "turbo");
//! ```
//!
//! # Global declarations
//!
//! The free functions declare into [`Registry::global`], and
//! [`Value::value`] reads from [`Env::global`]:
//!
//! ```rust
//! use tidewater::env::{self, VarOptions};
//!
//! let parallel = env::declare_int("DOC_PARALLEL", "worker count", VarOptions::new().with_default("4"));
//! # env::reset_global_store();
//! assert_eq!(parallel.value(), 4);
//! assert!(env::variables().iter().any(|v| v.name == "TIDEWATER_DOC_PARALLEL"));
//! ```

mod environment;
mod error;
mod kind;
mod options;
mod registry;
mod store;
mod value;

pub use environment::{reset_global_store, set_global_store, Env};
pub use error::{BoxError, EnvError, SharedError, Validated, ValidationReport, Warning};
pub use kind::{is_truthy, BoolKind, IntKind, Kind, StringKind};
pub use options::{DefaultFn, VarOptions};
pub use registry::{Registry, VarId, VarInfo, DEFAULT_PREFIX};
pub use store::{JoinedStore, MapStore, ProcessStore, Store};
pub use value::{BoolValue, IntValue, StringValue, Value, WeakValue};

/// Declare a string variable in the global registry.
pub fn declare_string(
    name: impl Into<String>,
    description: impl Into<String>,
    options: VarOptions,
) -> StringValue {
    Registry::global().declare_string(name, description, options)
}

/// Declare a boolean variable in the global registry.
pub fn declare_bool(
    name: impl Into<String>,
    description: impl Into<String>,
    options: VarOptions,
) -> BoolValue {
    Registry::global().declare_bool(name, description, options)
}

/// Declare an integer variable in the global registry.
pub fn declare_int(
    name: impl Into<String>,
    description: impl Into<String>,
    options: VarOptions,
) -> IntValue {
    Registry::global().declare_int(name, description, options)
}

/// Every variable in the global registry, sorted by resolved name.
pub fn variables() -> Vec<VarInfo> {
    Registry::global().variables()
}

/// Validate every variable in the global registry against the global
/// environment.
pub fn validate_all() -> ValidationReport {
    Registry::global().validate_all(&Env::global())
}
