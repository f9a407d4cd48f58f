//! Typed handles to declared variables.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Weak;

use super::environment::Env;
use super::error::Validated;
use super::kind::{BoolKind, IntKind, Kind, StringKind};
use super::registry::{Registry, RegistryInner, VarId, VarInfo};

/// A typed handle to a declared variable.
///
/// The handle is just a registry reference and an index; all metadata lives
/// in the [`Registry`]. Methods without a suffix resolve against
/// [`Env::global`]; the `_in` variants take an explicit environment and leave
/// the declaration untouched.
///
/// Reads never fail: a missing or malformed value reads as the type's zero
/// value. Use [`validate`](Self::validate) to find out why.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{Env, MapStore, Registry, VarOptions};
///
/// let registry = Registry::new();
/// let password = registry.declare_string("PASSWORD", "database password", VarOptions::new().with_secret());
///
/// let env = Env::new(MapStore::new().with("TIDEWATER_PASSWORD", "hidden"));
/// assert_eq!(password.value_in(&env), "hidden");
/// assert_eq!(password.display_in(&env), "[secret]");
/// ```
pub struct Value<K> {
    pub(crate) registry: Registry,
    pub(crate) id: VarId,
    pub(crate) _kind: PhantomData<fn() -> K>,
}

/// A declared string variable.
pub type StringValue = Value<StringKind>;

/// A declared boolean variable.
pub type BoolValue = Value<BoolKind>;

/// A declared integer variable.
pub type IntValue = Value<IntKind>;

impl<K: Kind> Value<K> {
    /// Resolved lookup key, including the prefix.
    pub fn name(&self) -> String {
        self.registry.entry(self.id).name.clone()
    }

    /// Index of this variable in its registry.
    pub fn id(&self) -> VarId {
        self.id
    }

    /// The registry this variable was declared in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Introspection record for this variable.
    pub fn info(&self) -> VarInfo {
        self.registry.entry(self.id).info()
    }

    /// Typed value in the global environment.
    pub fn value(&self) -> K::Output {
        self.value_in(&Env::global())
    }

    /// Typed value in `env`.
    ///
    /// Resolution order:
    /// 1. if a prerequisite is unmet, the default (or zero)
    /// 2. the primary key
    /// 3. the alternative key
    /// 4. the default (or zero)
    pub fn value_in(&self, env: &Env) -> K::Output {
        self.registry
            .entry(self.id)
            .effective(env)
            .map(|raw| K::parse(&raw))
            .unwrap_or_default()
    }

    /// Raw string in the global environment, ignoring prerequisites.
    pub fn underlying(&self) -> Option<String> {
        self.underlying_in(&Env::global())
    }

    /// Raw string in `env`: the explicit value, else the default, ignoring
    /// prerequisites. Secret values are returned unredacted.
    pub fn underlying_in(&self, env: &Env) -> Option<String> {
        self.registry.entry(self.id).underlying(env)
    }

    /// Whether the variable was explicitly set in the global environment.
    pub fn is_set(&self) -> bool {
        self.is_set_in(&Env::global())
    }

    /// Whether the variable was explicitly set (primary or alternative key)
    /// in `env`.
    pub fn is_set_in(&self, env: &Env) -> bool {
        self.registry.entry(self.id).explicit(env).is_some()
    }

    /// Validate against the global environment.
    pub fn validate(&self) -> Validated {
        self.validate_in(&Env::global())
    }

    /// Validate against `env`.
    ///
    /// - `Ok(Some(warning))`: the variable was set while a prerequisite is
    ///   unmet, or (for booleans) the value does not look boolean
    /// - `Err(error)`: an integer failed to parse or a computed default
    ///   failed
    /// - `Ok(None)`: nothing to report
    pub fn validate_in(&self, env: &Env) -> Validated {
        self.registry.entry(self.id).validate(env)
    }

    /// Display form in `env`.
    ///
    /// One of `unset`, `default <value>`, `needs <PREREQ> (<shown>)` or the
    /// formatted value; always `[secret]` for secret variables.
    pub fn display_in(&self, env: &Env) -> String {
        self.registry.entry(self.id).display(env)
    }
}

/// A non-owning handle to a declared variable.
///
/// Registries own their computed defaults, so a default function that
/// captured a [`Value`] would keep its own registry alive. Capture a
/// `WeakValue` instead:
///
/// ```rust
/// use tidewater::env::{Env, MapStore, Registry, VarOptions};
///
/// let registry = Registry::new();
/// let host = registry.declare_string("HOST", "host name", VarOptions::new().with_default("localhost"));
/// let url = registry.declare_string(
///     "URL",
///     "service url",
///     VarOptions::new().with_default_fn({
///         let host = host.downgrade();
///         move |env: &Env| Ok(format!("https://{}", host.get_in(env).unwrap_or_default()))
///     }),
/// );
///
/// assert_eq!(url.value_in(&Env::new(MapStore::new())), "https://localhost");
/// ```
pub struct WeakValue<K> {
    registry: Weak<RegistryInner>,
    id: VarId,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Value<K> {
    /// A handle that does not keep the registry alive.
    pub fn downgrade(&self) -> WeakValue<K> {
        WeakValue {
            registry: self.registry.downgrade(),
            id: self.id,
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> WeakValue<K> {
    /// The owning handle, or `None` once the registry has been dropped.
    pub fn upgrade(&self) -> Option<Value<K>> {
        let inner = self.registry.upgrade()?;
        Some(Value {
            registry: Registry::from_inner(inner),
            id: self.id,
            _kind: PhantomData,
        })
    }

    /// Typed value in `env`, or `None` once the registry has been dropped.
    pub fn get_in(&self, env: &Env) -> Option<K::Output> {
        self.upgrade().map(|value| value.value_in(env))
    }

    /// Index of this variable in its registry.
    pub fn id(&self) -> VarId {
        self.id
    }
}

impl<K> Clone for WeakValue<K> {
    fn clone(&self) -> Self {
        Self {
            registry: Weak::clone(&self.registry),
            id: self.id,
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> fmt::Debug for WeakValue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakValue")
            .field("id", &self.id)
            .field("kind", &K::NAME)
            .field("live", &(self.registry.strong_count() > 0))
            .finish()
    }
}

impl<K> Clone for Value<K> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            id: self.id,
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> fmt::Display for Value<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_in(&Env::global()))
    }
}

impl<K: Kind> fmt::Debug for Value<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("name", &self.name())
            .field("kind", &K::NAME)
            .finish()
    }
}
