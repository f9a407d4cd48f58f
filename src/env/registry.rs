//! The registry of declared variables and the resolution rules they share.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock, Weak};

use super::environment::Env;
use super::error::{EnvError, SharedError, ValidationReport, Validated, Warning};
use super::kind::{BoolKind, IntKind, Kind, KindInfo, StringKind};
use super::options::{DefaultValue, VarOptions};
use super::value::{BoolValue, IntValue, StringValue, Value};

/// Prefix prepended to variable names unless declared with
/// [`VarOptions::with_no_prefix`].
pub const DEFAULT_PREFIX: &str = "TIDEWATER_";

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Index of a variable within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

/// Ordered, append-only set of declared variables.
///
/// Registries own the metadata of every variable declared through them; the
/// typed [`Value`] handles they hand out only hold the registry and an index.
/// Cloning a registry clones the handle, not the contents.
///
/// Most code declares into the process-wide [`Registry::global`] through the
/// free functions in [`crate::env`]. Tests can build a fresh registry so
/// their declarations do not leak into the global list.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{Registry, VarOptions};
///
/// let registry = Registry::with_prefix("APP_");
/// let port = registry.declare_int("PORT", "listen port", VarOptions::new().with_default("8080"));
/// let debug = registry.declare_bool("DEBUG", "debug logging", VarOptions::new());
///
/// let names: Vec<_> = registry.variables().into_iter().map(|v| v.name).collect();
/// assert_eq!(names, vec!["APP_DEBUG", "APP_PORT"]);
/// # let _ = (port, debug);
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

pub(crate) struct RegistryInner {
    id: u64,
    prefix: String,
    vars: RwLock<Vec<Arc<VarEntry>>>,
}

impl Registry {
    /// Create an empty registry using [`DEFAULT_PREFIX`].
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    /// Create an empty registry with a custom name prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
                prefix: prefix.into(),
                vars: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// The prefix prepended to variable names.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Declare a string variable.
    pub fn declare_string(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        options: VarOptions,
    ) -> StringValue {
        self.declare::<StringKind>(name, description, options)
    }

    /// Declare a boolean variable.
    pub fn declare_bool(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        options: VarOptions,
    ) -> BoolValue {
        self.declare::<BoolKind>(name, description, options)
    }

    /// Declare an integer variable.
    pub fn declare_int(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        options: VarOptions,
    ) -> IntValue {
        self.declare::<IntKind>(name, description, options)
    }

    /// Declare a variable of any [`Kind`].
    ///
    /// The variable is registered exactly once and the returned handle is
    /// immediately usable.
    pub fn declare<K: Kind>(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        options: VarOptions,
    ) -> Value<K> {
        let base_name = name.into();
        let name = if options.no_prefix {
            base_name.clone()
        } else {
            format!("{}{}", self.inner.prefix, base_name)
        };

        let mut vars = self.inner.vars.write().unwrap_or_else(PoisonError::into_inner);
        let id = VarId(vars.len());
        vars.push(Arc::new(VarEntry {
            id,
            registry: self.inner.id,
            base_name,
            name,
            description: description.into(),
            kind: KindInfo::of::<K>(),
            options,
        }));
        drop(vars);

        Value {
            registry: self.clone(),
            id,
            _kind: PhantomData,
        }
    }

    /// Every declared variable, sorted by resolved name.
    pub fn variables(&self) -> Vec<VarInfo> {
        let mut infos: Vec<VarInfo> = self.entries().iter().map(|entry| entry.info()).collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.inner
            .vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate every declared variable against `env`, in declaration order.
    pub fn validate_all(&self, env: &Env) -> ValidationReport {
        let mut report = ValidationReport::default();
        for entry in self.entries() {
            report.record(entry.validate(env));
        }
        report
    }

    /// Snapshot of the entries, so no lock is held while user code runs.
    fn entries(&self) -> Vec<Arc<VarEntry>> {
        self.inner
            .vars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn entry(&self, id: VarId) -> Arc<VarEntry> {
        let vars = self.inner.vars.read().unwrap_or_else(PoisonError::into_inner);
        // Ids are only minted by `declare` on this registry, which never removes.
        Arc::clone(&vars[id.0])
    }

    pub(crate) fn downgrade(&self) -> Weak<RegistryInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("prefix", &self.inner.prefix)
            .field("len", &self.len())
            .finish()
    }
}

/// Introspection record for one declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VarInfo {
    /// Resolved lookup key, including the prefix.
    pub name: String,
    /// Name as declared.
    pub base_name: String,
    /// Human-readable description.
    pub description: String,
    /// Type name: `string`, `bool` or `int`.
    pub kind: &'static str,
    /// Whether display output is redacted.
    pub secret: bool,
    /// Secondary lookup key, if any.
    pub alternative: Option<String>,
    /// Resolved names of the prerequisites, in check order.
    pub needs: Vec<String>,
    /// Whether a static or computed default is declared.
    pub has_default: bool,
}

/// Metadata and resolution rules for one variable.
pub(crate) struct VarEntry {
    id: VarId,
    registry: u64,
    base_name: String,
    pub(crate) name: String,
    description: String,
    pub(crate) kind: KindInfo,
    options: VarOptions,
}

impl VarEntry {
    pub(crate) fn info(&self) -> VarInfo {
        VarInfo {
            name: self.name.clone(),
            base_name: self.base_name.clone(),
            description: self.description.clone(),
            kind: self.kind.name,
            secret: self.options.secret,
            alternative: self.options.alternative.clone(),
            needs: self
                .options
                .needs
                .iter()
                .filter_map(|p| p.upgrade().map(|v| v.name()))
                .collect(),
            has_default: self.options.default.is_some(),
        }
    }

    /// The explicitly supplied value: primary key, then alternative key.
    pub(crate) fn explicit(&self, env: &Env) -> Option<String> {
        env.lookup(&self.name).or_else(|| {
            self.options
                .alternative
                .as_deref()
                .and_then(|alternative| env.lookup(alternative))
        })
    }

    /// The declared default, computed (and memoized) in `env` if needed.
    pub(crate) fn fallback(&self, env: &Env) -> Option<Result<String, SharedError>> {
        match self.options.default.as_ref()? {
            DefaultValue::Static(value) => Some(Ok(value.clone())),
            DefaultValue::Computed(f) => Some(env.memoized(self.registry, self.id, || {
                (**f)(env).map_err(|err| {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(var = %self.name, error = %err, "computing default value failed");
                    SharedError::from(err)
                })
            })),
        }
    }

    /// Resolved name of the first prerequisite that is not true in `env`.
    pub(crate) fn missing_prerequisite(&self, env: &Env) -> Option<String> {
        self.options.needs.iter().find_map(|prerequisite| match prerequisite.upgrade() {
            Some(value) if value.value_in(env) => None,
            Some(value) => Some(value.name()),
            // The declaring registry is gone; nothing can satisfy it.
            None => Some(format!("<dropped variable #{}>", prerequisite.id().0)),
        })
    }

    /// The explicit value, else the default, ignoring prerequisites.
    pub(crate) fn underlying(&self, env: &Env) -> Option<String> {
        self.explicit(env)
            .or_else(|| self.fallback(env).and_then(Result::ok))
    }

    /// The string a read parses: gated by prerequisites, falling back to the
    /// default when one is unmet.
    pub(crate) fn effective(&self, env: &Env) -> Option<String> {
        if self.missing_prerequisite(env).is_some() {
            self.fallback(env).and_then(Result::ok)
        } else {
            self.underlying(env)
        }
    }

    pub(crate) fn validate(&self, env: &Env) -> Validated {
        let explicit = self.explicit(env);

        if let Some(needs) = self.missing_prerequisite(env) {
            return Ok(explicit.map(|_| Warning::Ignored {
                var: self.name.clone(),
                needs,
            }));
        }

        let value = match explicit {
            Some(value) => value,
            None => match self.fallback(env) {
                None => return Ok(None),
                Some(Err(source)) => {
                    return Err(EnvError::DefaultFailed {
                        var: self.name.clone(),
                        source,
                    })
                }
                Some(Ok(value)) if value.is_empty() => return Ok(None),
                Some(Ok(value)) => value,
            },
        };

        (self.kind.check)(&self.name, &value)
    }

    pub(crate) fn display(&self, env: &Env) -> String {
        if self.options.secret {
            return "[secret]".to_string();
        }

        let shown = match self.explicit(env) {
            Some(value) => (self.kind.display)(&value),
            None => match self.fallback(env) {
                Some(Ok(value)) => format!("default {}", (self.kind.display)(&value)),
                _ => return "unset".to_string(),
            },
        };

        match self.missing_prerequisite(env) {
            Some(needs) => format!("needs {} ({})", needs, shown),
            None => shown,
        }
    }
}
