//! Validation findings for environment variables.

use std::error::Error as StdError;
use std::num::ParseIntError;
use std::sync::Arc;

/// Error produced by a computed default, shared so memoized results can be
/// handed out more than once.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Error type computed defaults return.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A hard validation failure.
///
/// Only [`Value::validate`](super::Value::validate) reports these; reading a
/// value never fails.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnvError {
    /// The value is not a base-10 integer.
    #[error("{var}: {value:?} is not a valid integer")]
    InvalidInt {
        /// Resolved variable name.
        var: String,
        /// The offending value.
        value: String,
        /// Parser error.
        #[source]
        source: ParseIntError,
    },
    /// The computed default could not be produced.
    #[error("{var}: computing the default value failed: {source}")]
    DefaultFailed {
        /// Resolved variable name.
        var: String,
        /// Error returned by the default function.
        #[source]
        source: SharedError,
    },
}

impl EnvError {
    /// The resolved name of the variable this error is about.
    pub fn var(&self) -> &str {
        match self {
            Self::InvalidInt { var, .. } | Self::DefaultFailed { var, .. } => var,
        }
    }
}

/// An advisory finding: the value is used, but probably not as intended.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Warning {
    /// The variable is set, but a prerequisite is not, so it is ignored.
    #[error("{var} is set but will be ignored because {needs} is not enabled")]
    Ignored {
        /// Resolved variable name.
        var: String,
        /// Resolved name of the first unmet prerequisite.
        needs: String,
    },
    /// The value does not look like a boolean and reads as `false`.
    #[error("{var}: {value:?} is not a recognized boolean and will be treated as false")]
    NotBoolean {
        /// Resolved variable name.
        var: String,
        /// The offending value.
        value: String,
    },
}

impl Warning {
    /// The resolved name of the variable this warning is about.
    pub fn var(&self) -> &str {
        match self {
            Self::Ignored { var, .. } | Self::NotBoolean { var, .. } => var,
        }
    }
}

/// Outcome of validating a single variable.
pub type Validated = Result<Option<Warning>, EnvError>;

/// Findings collected across every variable of a registry.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
/// use tidewater::testing::fixture_env;
///
/// let registry = Registry::new();
/// registry.declare_int("WORKERS", "worker count", VarOptions::new());
/// registry.declare_bool("VERBOSE", "chatty output", VarOptions::new());
///
/// let env = fixture_env([("TIDEWATER_WORKERS", "many"), ("TIDEWATER_VERBOSE", "loud")]);
/// let report = registry.validate_all(&env);
///
/// assert_eq!(report.warnings().len(), 1);
/// assert_eq!(report.errors().len(), 1);
/// assert!(report.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    warnings: Vec<Warning>,
    errors: Vec<EnvError>,
}

impl ValidationReport {
    pub(crate) fn record(&mut self, finding: Validated) {
        match finding {
            Ok(None) => {}
            Ok(Some(warning)) => self.warnings.push(warning),
            Err(error) => self.errors.push(error),
        }
    }

    /// Advisory findings, in variable order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Hard failures, in variable order.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// True when there are neither warnings nor errors.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    /// True when at least one hard failure was found.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The warnings if there were no errors, otherwise the errors.
    pub fn into_result(self) -> Result<Vec<Warning>, Vec<EnvError>> {
        if self.errors.is_empty() {
            Ok(self.warnings)
        } else {
            Err(self.errors)
        }
    }
}
