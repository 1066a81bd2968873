use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Value stored in the [`GlobalStore`]
pub type StoreValue = Arc<dyn Any + Send + Sync>;

/// Key-value side channel shared by every action and predicate of a parse
#[derive(Clone, Default)]
pub struct GlobalStore {
    values: HashMap<String, StoreValue>,
}

impl GlobalStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value, if it exists and is of the requested type
    pub fn get<V: Any + Send + Sync>(&self, key: &str) -> Option<&V> {
        self.values.get(key).and_then(|value| value.downcast_ref())
    }

    /// Get a value without checking its type
    pub fn get_raw(&self, key: &str) -> Option<&StoreValue> {
        self.values.get(key)
    }

    /// Insert a value, returning the previous one
    pub fn insert<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) -> Option<StoreValue> {
        self.values.insert(key.into(), Arc::new(value))
    }

    /// Insert or remove a raw value, returning the previous one
    pub fn set_raw(&mut self, key: impl Into<String>, value: Option<StoreValue>) -> Option<StoreValue> {
        let key = key.into();

        match value {
            Some(value) => self.values.insert(key, value),
            None => self.values.remove(&key),
        }
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<StoreValue> {
        self.values.remove(key)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl fmt::Debug for GlobalStore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("GlobalStore").field("keys", &keys).finish()
    }
}

/// Parser options
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of expressions to evaluate before aborting (`None` for no limit)
    pub max_expressions: Option<u64>,

    /// Trace every evaluation step through the `log` facade
    pub debug: bool,

    /// Memoize the result of rules and expressions (packrat parsing).
    /// Bounds parsing time to be linear in the input's length, at the cost of memory.
    ///
    /// Expressions reading or binding labels of their enclosing scope are always evaluated again. A memoized rule
    /// replays its result without running its actions, so actions writing to the global store may run fewer times.
    pub memoize: bool,

    /// Convert panics raised by actions and predicates to diagnostics
    pub recover: bool,

    /// Values made available to actions and predicates
    pub global_store: GlobalStore,
}

impl Options {
    /// Create a new set of options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expressions ceiling, returning the previous one
    pub fn set_max_expressions(&mut self, max: Option<u64>) -> Option<u64> {
        std::mem::replace(&mut self.max_expressions, max)
    }

    /// Enable or disable tracing, returning the previous setting
    pub fn set_debug(&mut self, debug: bool) -> bool {
        std::mem::replace(&mut self.debug, debug)
    }

    /// Enable or disable memoization, returning the previous setting
    pub fn set_memoize(&mut self, memoize: bool) -> bool {
        std::mem::replace(&mut self.memoize, memoize)
    }

    /// Enable or disable fault recovery, returning the previous setting
    pub fn set_recover(&mut self, recover: bool) -> bool {
        std::mem::replace(&mut self.recover, recover)
    }

    pub fn with_max_expressions(mut self, max: u64) -> Self {
        self.max_expressions = Some(max);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn with_recover(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    pub fn with_global<V: Any + Send + Sync>(mut self, key: impl Into<String>, value: V) -> Self {
        self.global_store.insert(key, value);
        self
    }

    /// Apply a setting, returning the setting which reverts it
    ///
    /// ```
    /// use packrat::runtime::{Options, Setting};
    ///
    /// let mut options = Options::new();
    /// let undo = options.apply(Setting::Memoize(true));
    /// assert!(options.memoize);
    ///
    /// options.apply(undo);
    /// assert!(!options.memoize);
    /// ```
    pub fn apply(&mut self, setting: Setting) -> Setting {
        match setting {
            Setting::MaxExpressions(max) => Setting::MaxExpressions(self.set_max_expressions(max)),
            Setting::Debug(debug) => Setting::Debug(self.set_debug(debug)),
            Setting::Memoize(memoize) => Setting::Memoize(self.set_memoize(memoize)),
            Setting::Recover(recover) => Setting::Recover(self.set_recover(recover)),
            Setting::GlobalStore(key, value) => {
                let previous = self.global_store.set_raw(key.clone(), value);
                Setting::GlobalStore(key, previous)
            }
        }
    }

    /// Apply a list of settings in order, returning the settings reverting them (in the order they must be applied)
    pub fn apply_all(&mut self, settings: impl IntoIterator<Item = Setting>) -> Vec<Setting> {
        let mut undo: Vec<_> = settings.into_iter().map(|setting| self.apply(setting)).collect();
        undo.reverse();
        undo
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_expressions: None,
            debug: false,
            memoize: false,
            recover: true,
            global_store: GlobalStore::new(),
        }
    }
}

/// A single option value, applied with [`Options::apply`]
#[derive(Clone)]
pub enum Setting {
    MaxExpressions(Option<u64>),
    Debug(bool),
    Memoize(bool),
    Recover(bool),

    /// Set a global store entry (`None` removes it)
    GlobalStore(String, Option<StoreValue>),
}

impl Setting {
    /// Build a setting storing a typed value in the global store
    pub fn global<V: Any + Send + Sync>(key: impl Into<String>, value: V) -> Self {
        Self::GlobalStore(key.into(), Some(Arc::new(value)))
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MaxExpressions(max) => f.debug_tuple("MaxExpressions").field(max).finish(),
            Self::Debug(debug) => f.debug_tuple("Debug").field(debug).finish(),
            Self::Memoize(memoize) => f.debug_tuple("Memoize").field(memoize).finish(),
            Self::Recover(recover) => f.debug_tuple("Recover").field(recover).finish(),
            Self::GlobalStore(key, value) => f
                .debug_tuple("GlobalStore")
                .field(key)
                .field(&value.is_some())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_are_reversible() {
        let mut options = Options::new();

        let undo = options.apply_all(vec![
            Setting::MaxExpressions(Some(10)),
            Setting::Recover(false),
            Setting::global("answer", 42u32),
        ]);

        assert_eq!(options.max_expressions, Some(10));
        assert!(!options.recover);
        assert_eq!(options.global_store.get::<u32>("answer"), Some(&42));

        options.apply_all(undo);

        assert_eq!(options.max_expressions, None);
        assert!(options.recover);
        assert!(!options.global_store.contains_key("answer"));
    }

    #[test]
    fn stacked_global_values_restore_in_order() {
        let mut options = Options::new().with_global("mode", "strict");

        let undo = options.apply(Setting::global("mode", "lenient"));
        assert_eq!(options.global_store.get::<&str>("mode"), Some(&"lenient"));

        options.apply(undo);
        assert_eq!(options.global_store.get::<&str>("mode"), Some(&"strict"));
    }

    #[test]
    fn typed_lookup_rejects_other_types() {
        let store = Options::new().with_global("n", 1i64).global_store;
        assert!(store.get::<u8>("n").is_none());
        assert!(store.get_raw("n").is_some());
    }
}
