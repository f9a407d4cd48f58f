//! Key/value lookups backing declared variables.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A source of raw variable values.
///
/// Implementations must be cheap to query and safe to share between
/// threads; values are looked up on every read.
pub trait Store: Send + Sync {
    /// The value stored under `key`, or `None` if absent.
    ///
    /// An empty string is a present value.
    fn get(&self, key: &str) -> Option<String>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// The process environment.
///
/// Values that are not valid Unicode are converted lossily.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessStore;

impl Store for ProcessStore {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

/// An in-memory map, mostly for tests.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{MapStore, Store};
///
/// let store = MapStore::new()
///     .with("TIDEWATER_HOST", "example.com")
///     .with("TIDEWATER_PORT", "8080");
///
/// assert_eq!(store.get("TIDEWATER_HOST").as_deref(), Some("example.com"));
/// assert_eq!(store.get("TIDEWATER_USER"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStore {
    values: HashMap<String, String>,
}

impl MapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from key/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Add an entry, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove an entry, returning its old value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the store has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Store for MapStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Several stores checked in order; the first hit wins.
///
/// # Examples
///
/// ```rust
/// use tidewater::env::{JoinedStore, MapStore, Store};
///
/// let overrides = MapStore::new().with("K", "v1");
/// let base = MapStore::new().with("K", "v2").with("K2", "v3");
/// let joined = JoinedStore::new().with(overrides).with(base);
///
/// assert_eq!(joined.get("K").as_deref(), Some("v1"));
/// assert_eq!(joined.get("K2").as_deref(), Some("v3"));
/// ```
#[derive(Clone, Default)]
pub struct JoinedStore {
    stores: Vec<Arc<dyn Store>>,
}

impl JoinedStore {
    /// Create a joined store with no members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member, builder style. Earlier members take precedence.
    pub fn with(mut self, store: impl Store + 'static) -> Self {
        self.push(Arc::new(store));
        self
    }

    /// Append a shared member.
    pub fn push(&mut self, store: Arc<dyn Store>) {
        self.stores.push(store);
    }

    /// Number of member stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// True when there are no member stores.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl FromIterator<Arc<dyn Store>> for JoinedStore {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Store>>>(iter: I) -> Self {
        Self {
            stores: iter.into_iter().collect(),
        }
    }
}

impl Store for JoinedStore {
    fn get(&self, key: &str) -> Option<String> {
        self.stores.iter().find_map(|store| store.get(key))
    }
}

impl fmt::Debug for JoinedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinedStore")
            .field("stores", &self.stores.len())
            .finish()
    }
}
