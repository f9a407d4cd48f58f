//! Resolution environments: a store plus memoized computed defaults.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError, RwLock};

use super::error::SharedError;
use super::kind::{BoolKind, IntKind, Kind, StringKind};
use super::registry::VarId;
use super::store::{ProcessStore, Store};
use super::value::Value;

type Memo = Arc<OnceLock<Result<String, SharedError>>>;

static GLOBAL_STORE: LazyLock<RwLock<Arc<dyn Store>>> =
    LazyLock::new(|| RwLock::new(Arc::new(ProcessStore)));

static GLOBAL_ENV: LazyLock<Env> = LazyLock::new(|| Env::new(GlobalStore));

/// The store values are read from, plus a cache of computed defaults.
///
/// Handles are cheap to clone and clones share the cache. Each
/// [`Env::new`] starts with an empty cache, so the same declared variable
/// can be evaluated against different fixtures without interference.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{Env, MapStore, Registry, VarOptions};
///
/// let registry = Registry::new();
/// let retries = registry.declare_int("RETRIES", "retry budget", VarOptions::new().with_default("3"));
///
/// let env = Env::new(MapStore::new().with("TIDEWATER_RETRIES", "10"));
/// assert_eq!(env.get_int(&retries), 10);
/// assert_eq!(Env::new(MapStore::new()).get_int(&retries), 3);
/// ```
#[derive(Clone)]
pub struct Env {
    inner: Arc<EnvInner>,
}

struct EnvInner {
    store: Arc<dyn Store>,
    defaults: Mutex<HashMap<(u64, VarId), Memo>>,
}

impl Env {
    /// An environment reading from `store`.
    pub fn new(store: impl Store + 'static) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// An environment reading from a shared store.
    pub fn from_arc(store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(EnvInner {
                store,
                defaults: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide environment, reading from the global store.
    ///
    /// The global store is the process environment unless replaced with
    /// [`set_global_store`].
    pub fn global() -> Env {
        GLOBAL_ENV.clone()
    }

    /// Raw lookup in the underlying store.
    pub fn lookup(&self, key: &str) -> Option<String> {
        self.inner.store.get(key)
    }

    /// Read any typed value in this environment.
    pub fn get<K: Kind>(&self, value: &Value<K>) -> K::Output {
        value.value_in(self)
    }

    /// Read a string value in this environment.
    pub fn get_string(&self, value: &Value<StringKind>) -> String {
        self.get(value)
    }

    /// Read a boolean value in this environment.
    pub fn get_bool(&self, value: &Value<BoolKind>) -> bool {
        self.get(value)
    }

    /// Read an integer value in this environment.
    pub fn get_int(&self, value: &Value<IntKind>) -> i64 {
        self.get(value)
    }

    /// The computed default for `(registry, var)`, running `compute` at most
    /// once per environment.
    pub(crate) fn memoized(
        &self,
        registry: u64,
        var: VarId,
        compute: impl FnOnce() -> Result<String, SharedError>,
    ) -> Result<String, SharedError> {
        let memo = {
            let mut defaults = self
                .inner
                .defaults
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(defaults.entry((registry, var)).or_default())
        };
        // The map lock is released so defaults may read other defaults.
        memo.get_or_init(compute).clone()
    }

    fn clear_defaults(&self) {
        self.inner
            .defaults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .inner
            .defaults
            .lock()
            .map(|defaults| defaults.len())
            .unwrap_or_default();
        f.debug_struct("Env")
            .field("cached_defaults", &cached)
            .finish_non_exhaustive()
    }
}

/// Store that forwards to whatever the global store currently is.
struct GlobalStore;

impl Store for GlobalStore {
    fn get(&self, key: &str) -> Option<String> {
        let store = Arc::clone(&GLOBAL_STORE.read().unwrap_or_else(PoisonError::into_inner));
        store.get(key)
    }
}

/// Replace the store behind [`Env::global`].
///
/// Intended for test setup, before values are read concurrently. Computed
/// defaults cached by the global environment are discarded.
///
/// ```rust
/// use tidewater::env::{self, MapStore, VarOptions};
///
/// let region = env::declare_string("DOC_REGION", "deployment region", VarOptions::new());
///
/// env::set_global_store(MapStore::new().with("TIDEWATER_DOC_REGION", "eu-west-1"));
/// assert_eq!(region.value(), "eu-west-1");
///
/// env::reset_global_store();
/// ```
pub fn set_global_store(store: impl Store + 'static) {
    *GLOBAL_STORE.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(store);
    GLOBAL_ENV.clear_defaults();
}

/// Point [`Env::global`] back at the process environment.
pub fn reset_global_store() {
    set_global_store(ProcessStore);
}
