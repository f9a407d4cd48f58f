//! Declaration options.

use std::fmt;
use std::sync::Arc;

use super::environment::Env;
use super::error::BoxError;
use super::kind::BoolKind;
use super::value::{BoolValue, WeakValue};

/// Function computing a default from other values in the same [`Env`].
pub type DefaultFn = dyn Fn(&Env) -> Result<String, BoxError> + Send + Sync;

#[derive(Clone)]
pub(crate) enum DefaultValue {
    Static(String),
    Computed(Arc<DefaultFn>),
}

/// Options for declaring a variable.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
///
/// let registry = Registry::new();
/// let experimental = registry.declare_bool("EXPERIMENTAL", "enable experiments", VarOptions::new());
/// let token = registry.declare_string(
///     "ACCESS_TOKEN",
///     "token used to reach the backend",
///     VarOptions::new()
///         .with_secret()
///         .with_needs(&experimental)
///         .with_alternative("LEGACY_ACCESS_TOKEN"),
/// );
///
/// assert_eq!(token.name(), "TIDEWATER_ACCESS_TOKEN");
/// ```
#[derive(Clone, Default)]
pub struct VarOptions {
    pub(crate) no_prefix: bool,
    pub(crate) secret: bool,
    pub(crate) needs: Vec<WeakValue<BoolKind>>,
    pub(crate) alternative: Option<String>,
    pub(crate) default: Option<DefaultValue>,
}

impl VarOptions {
    /// No options: prefixed, not secret, no prerequisites, no fallbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look the variable up under its bare name, without the registry prefix.
    pub fn with_no_prefix(mut self) -> Self {
        self.no_prefix = true;
        self
    }

    /// Redact the value in display output.
    pub fn with_secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Only honour this variable when `prerequisite` is true.
    ///
    /// May be given several times; prerequisites are checked in the order
    /// given and the first unmet one is reported.
    pub fn with_needs(mut self, prerequisite: &BoolValue) -> Self {
        self.needs.push(prerequisite.downgrade());
        self
    }

    /// Secondary key consulted when the primary key is absent.
    ///
    /// The alternative is used verbatim, without the registry prefix.
    pub fn with_alternative(mut self, name: impl Into<String>) -> Self {
        self.alternative = Some(name.into());
        self
    }

    /// Fallback used when neither key is present.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Fallback computed from the resolving [`Env`] when neither key is
    /// present.
    ///
    /// The result is memoized per `Env`: the function runs at most once for
    /// each environment it is resolved in. An error makes the variable read
    /// as unset and is reported by validation.
    ///
    /// The function is owned by the registry, so read sibling variables
    /// through a [`WeakValue`] rather than capturing a `Value`.
    ///
    /// ```rust
    /// use tidewater::env::{Env, MapStore, Registry, VarOptions};
    ///
    /// let registry = Registry::new();
    /// let home = registry.declare_string("HOME", "home directory", VarOptions::new());
    /// let cache = registry.declare_string(
    ///     "CACHE_DIR",
    ///     "cache directory",
    ///     VarOptions::new().with_default_fn({
    ///         let home = home.downgrade();
    ///         move |env: &Env| Ok(format!("{}/.cache", home.get_in(env).unwrap_or_default()))
    ///     }),
    /// );
    ///
    /// let env = Env::new(MapStore::new().with("TIDEWATER_HOME", "/home/ada"));
    /// assert_eq!(env.get_string(&cache), "/home/ada/.cache");
    /// ```
    pub fn with_default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Env) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }
}

impl fmt::Debug for VarOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VarOptions")
            .field("no_prefix", &self.no_prefix)
            .field("secret", &self.secret)
            .field("needs", &self.needs.len())
            .field("alternative", &self.alternative)
            .field(
                "default",
                &match &self.default {
                    None => "none",
                    Some(DefaultValue::Static(_)) => "static",
                    Some(DefaultValue::Computed(_)) => "computed",
                },
            )
            .finish()
    }
}
