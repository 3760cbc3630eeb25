use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{ReentrantMutex, RwLock};

use super::value::ThemeValue;
use super::variables::ThemeVariables;

/// Variable prefix used by the global store and by default everywhere else.
pub const DEFAULT_THEME_PREFIX: &str = "theme";

type Listener = Arc<dyn Fn(&ThemeValue) + Send + Sync>;

/// Handle returned by [`ThemeStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A theme derived from a parent by deep-merging an override.
///
/// Always complete: every token the parent defines is present unless the
/// override replaced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedTheme {
    value: ThemeValue,
    variables: ThemeVariables,
    prefix: String,
}

impl ScopedTheme {
    pub fn value(&self) -> &ThemeValue {
        &self.value
    }

    pub fn variables(&self) -> &ThemeVariables {
        &self.variables
    }

    /// Derives a nested scope from this one.
    pub fn derive(&self, overrides: &ThemeValue) -> ScopedTheme {
        derive_scoped(&self.value, overrides, &self.prefix)
    }
}

/// Deep-merges `overrides` onto `parent` and flattens the result.
///
/// `parent` is not modified; each call returns an independent value.
pub fn derive_scoped(parent: &ThemeValue, overrides: &ThemeValue, prefix: &str) -> ScopedTheme {
    let value = parent.merged(overrides);
    let variables = value.flatten(prefix);
    ScopedTheme {
        value,
        variables,
        prefix: prefix.to_string(),
    }
}

struct State {
    value: ThemeValue,
    variables: ThemeVariables,
}

/// Holds the active theme and its flattened variables, and notifies
/// subscribers when it changes.
///
/// `set_theme` calls are serialised: subscribers of one update all run
/// before the next update starts, and the new value and variables are
/// visible to readers before any subscriber runs. A subscriber may call
/// `set_theme` itself; the nested update notifies everyone with the newer
/// value, and the outer update stops notifying.
pub struct ThemeStore {
    prefix: String,
    state: RwLock<State>,
    listeners: RwLock<Vec<(Subscription, Listener)>>,
    next_id: AtomicU64,
    generation: AtomicU64,
    update: ReentrantMutex<()>,
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("prefix", &self.prefix)
            .field("value", &self.state.read().value)
            .field("subscribers", &self.listeners.read().len())
            .finish()
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(DEFAULT_THEME_PREFIX)
    }
}

impl ThemeStore {
    /// Creates a store holding an empty theme.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_theme(prefix, ThemeValue::empty())
    }

    /// Creates a store initialised with `value`.
    pub fn with_theme(prefix: impl Into<String>, value: ThemeValue) -> Self {
        let prefix = prefix.into();
        let variables = value.flatten(&prefix);
        Self {
            prefix,
            state: RwLock::new(State { value, variables }),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            update: ReentrantMutex::new(()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Replaces the active theme, recomputes its variables, and notifies
    /// every subscriber synchronously.
    pub fn set_theme(&self, value: ThemeValue) {
        let _update = self.update.lock();
        let variables = value.flatten(&self.prefix);
        log::debug!("theme replaced ({} variables)", variables.len());
        {
            let mut state = self.state.write();
            state.value = value.clone();
            state.variables = variables;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Snapshot so subscribers may (un)subscribe while being notified.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            if self.generation.load(Ordering::SeqCst) != generation {
                break;
            }
            listener(&value);
        }
    }

    /// The active theme.
    pub fn get_theme(&self) -> ThemeValue {
        self.state.read().value.clone()
    }

    /// The active theme's flattened variables.
    pub fn variables(&self) -> ThemeVariables {
        self.state.read().variables.clone()
    }

    /// The active theme as a `:root` block.
    pub fn root_block(&self) -> String {
        self.state.read().variables.to_root_block()
    }

    /// Derives a scope from the active theme.
    pub fn derive_scoped(&self, overrides: &ThemeValue) -> ScopedTheme {
        let parent = self.get_theme();
        derive_scoped(&parent, overrides, &self.prefix)
    }

    /// Registers a listener called with the new value on every `set_theme`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ThemeValue) + Send + Sync + 'static,
    {
        let id = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().len()
    }
}

static GLOBAL: Lazy<ThemeStore> = Lazy::new(ThemeStore::default);

/// The process-wide theme store.
///
/// Starts out empty; call [`ThemeStore::set_theme`] at startup to install a
/// theme and again whenever it is redefined.
pub fn global() -> &'static ThemeStore {
    &GLOBAL
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;
    use serial_test::serial;

    use super::*;

    fn theme(value: serde_json::Value) -> ThemeValue {
        ThemeValue::try_from(value).unwrap()
    }

    // =========================================================================
    // set / get
    // =========================================================================

    #[test]
    fn test_set_theme_updates_value_and_variables() {
        let store = ThemeStore::default();
        assert!(store.variables().is_empty());
        store.set_theme(theme(json!({"colors": {"primary": "red"}})));
        assert_eq!(store.get_theme().get("colors.primary"), Some(&json!("red")));
        assert_eq!(
            store.root_block(),
            ":root {\n  --theme-colors-primary: red;\n}"
        );
    }

    #[test]
    fn test_custom_prefix() {
        let store = ThemeStore::with_theme("tk", theme(json!({"a": 1})));
        assert_eq!(store.variables().get("--tk-a"), Some("1"));
        assert_eq!(store.prefix(), "tk");
    }

    // =========================================================================
    // subscribers
    // =========================================================================

    #[test]
    fn test_subscribers_see_new_value_after_update() {
        let store = Arc::new(ThemeStore::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let observer = Arc::clone(&store);
        let log = Arc::clone(&seen);
        store.subscribe(move |value| {
            // the store already reflects the value being announced
            assert_eq!(&observer.get_theme(), value);
            let primary = observer.variables().get("--theme-primary").map(String::from);
            log.lock().unwrap().push(primary);
        });

        store.set_theme(theme(json!({"primary": "red"})));
        store.set_theme(theme(json!({"primary": "blue"})));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("red".to_string()), Some("blue".to_string())]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let store = ThemeStore::default();
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        let sub = store.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        store.set_theme(ThemeValue::empty());
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.set_theme(ThemeValue::empty());
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_fire_in_order() {
        let store = ThemeStore::default();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            store.subscribe(move |_| order.lock().unwrap().push(i));
        }
        store.set_theme(ThemeValue::empty());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_nested_set_theme_from_subscriber() {
        let store = Arc::new(ThemeStore::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&store);
        store.subscribe(move |value| {
            if value.get("step") == Some(&json!(1)) {
                inner.set_theme(theme(json!({"step": 2})));
            }
        });
        let log = Arc::clone(&seen);
        store.subscribe(move |value| {
            log.lock().unwrap().push(value.get("step").cloned());
        });

        store.set_theme(theme(json!({"step": 1})));
        // the second subscriber only hears about the newest value
        assert_eq!(*seen.lock().unwrap(), vec![Some(json!(2))]);
        assert_eq!(store.get_theme().get("step"), Some(&json!(2)));
    }

    // =========================================================================
    // scopes
    // =========================================================================

    #[test]
    fn test_derive_scoped_from_store() {
        let store = ThemeStore::with_theme(
            DEFAULT_THEME_PREFIX,
            theme(json!({"colors": {"primary": "red", "text": "black"}})),
        );
        let scoped = store.derive_scoped(&theme(json!({"colors": {"primary": "blue"}})));
        assert_eq!(
            scoped.value().as_json(),
            &json!({"colors": {"primary": "blue", "text": "black"}})
        );
        assert_eq!(scoped.variables().get("--theme-colors-text"), Some("black"));
        // global untouched
        assert_eq!(store.get_theme().get("colors.primary"), Some(&json!("red")));
    }

    #[test]
    fn test_nested_scopes() {
        let parent = theme(json!({"a": 1, "b": 2, "c": 3}));
        let outer = derive_scoped(&parent, &theme(json!({"b": 20})), "theme");
        let inner = outer.derive(&theme(json!({"c": 30})));
        assert_eq!(inner.value().as_json(), &json!({"a": 1, "b": 20, "c": 30}));
        assert_eq!(outer.value().as_json(), &json!({"a": 1, "b": 20, "c": 3}));
    }

    #[test]
    fn test_concurrent_scopes_from_one_parent() {
        let parent = Arc::new(theme(json!({"colors": {"primary": "red", "text": "black"}})));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let parent = Arc::clone(&parent);
                std::thread::spawn(move || {
                    derive_scoped(&parent, &theme(json!({"colors": {"primary": i}})), "theme")
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let scoped = handle.join().unwrap();
            assert_eq!(scoped.value().get("colors.primary"), Some(&json!(i)));
            assert_eq!(scoped.value().get("colors.text"), Some(&json!("black")));
        }
        assert_eq!(parent.get("colors.primary"), Some(&json!("red")));
    }

    // =========================================================================
    // global
    // =========================================================================

    #[test]
    #[serial]
    fn test_global_store_is_shared() {
        global().set_theme(theme(json!({"brand": "teal"})));
        assert_eq!(global().variables().get("--theme-brand"), Some("teal"));
        assert!(std::ptr::eq(global(), global()));
        global().set_theme(ThemeValue::empty());
    }
}
