use std::fmt;

use super::codec::Codec;
use super::store::ParamStore;

/// One piece of state mirrored into a single query-string parameter.
///
/// The cell keeps the decoded value in memory. Writes go to memory and to the
/// store (history replace). Navigation is picked up with `sync`, which
/// re-decodes from the store.
pub struct ParamCell<C: Codec> {
    key: &'static str,
    default: C::Value,
    value: C::Value,
    codec: C,
}

impl<C> fmt::Debug for ParamCell<C>
where
    C: Codec,
    C::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamCell")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("default", &self.default)
            .finish()
    }
}

impl<C> ParamCell<C>
where
    C: Codec,
    C::Value: Clone + PartialEq,
{
    /// Declare a cell. Its value starts at `default` until `load` is called.
    pub fn new(key: &'static str, default: C::Value, codec: C) -> Self {
        Self {
            key,
            value: default.clone(),
            default,
            codec,
        }
    }

    /// Declare and immediately decode from `store`.
    pub fn mount(store: &dyn ParamStore, key: &'static str, default: C::Value, codec: C) -> Self {
        let mut cell = Self::new(key, default, codec);
        cell.load(store);
        cell
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn value(&self) -> &C::Value {
        &self.value
    }

    pub fn default_value(&self) -> &C::Value {
        &self.default
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Whether the store carries this key (as opposed to the default showing).
    pub fn is_explicit(&self, store: &dyn ParamStore) -> bool {
        store.get(self.key).is_some()
    }

    /// Decode the current value from `store`.
    pub fn load(&mut self, store: &dyn ParamStore) {
        self.value = self.read(store);
    }

    /// Re-decode after navigation. Returns whether the value changed.
    pub fn sync(&mut self, store: &dyn ParamStore) -> bool {
        let next = self.read(store);
        if next == self.value {
            return false;
        }
        self.value = next;
        true
    }

    /// Write `next` to memory and to the store. Equal values are a no-op.
    /// Returns whether anything was written.
    pub fn set(&mut self, store: &mut dyn ParamStore, next: C::Value) -> bool {
        if next == self.value {
            return false;
        }
        let encoded = self.codec.encode(&next);
        store.replace(self.key, encoded.as_deref());
        self.value = next;
        true
    }

    /// Like `set`, but a value equal to the default drops the key instead, so
    /// toggles and menus keep shared URLs short.
    pub fn set_or_clear(&mut self, store: &mut dyn ParamStore, next: C::Value) -> bool {
        if next != self.default {
            return self.set(store, next);
        }
        let explicit = store.get(self.key).is_some();
        let changed = self.value != next;
        self.reset(store);
        explicit || changed
    }

    /// Functional update on the current value.
    pub fn update<F>(&mut self, store: &mut dyn ParamStore, f: F) -> bool
    where
        F: FnOnce(&C::Value) -> C::Value,
    {
        let next = f(&self.value);
        self.set(store, next)
    }

    /// Drop the key from the store and fall back to the default.
    pub fn reset(&mut self, store: &mut dyn ParamStore) {
        if store.get(self.key).is_some() {
            store.replace(self.key, None);
        }
        self.value = self.default.clone();
    }

    fn read(&self, store: &dyn ParamStore) -> C::Value {
        let Some(raw) = store.get(self.key) else {
            return self.default.clone();
        };
        match self.codec.decode(&raw) {
            Some(value) => value,
            None => {
                tracing::debug!(
                    key = self.key,
                    raw = %raw,
                    codec = %self.codec.kind(),
                    "undecodable query parameter, using default"
                );
                self.default.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BoolCodec, JsonCodec, LocationStore, NumberCodec, OptionalCodec};

    #[test]
    fn absent_key_yields_default() {
        let store = LocationStore::from_query("other=1");
        let cell = ParamCell::mount(&store, "entry", 2.8249, NumberCodec);
        assert_eq!(*cell.value(), 2.8249);
        assert!(!cell.is_explicit(&store));
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let store = LocationStore::from_query("entry=abc&ts=%5B%5B2");
        let entry = ParamCell::mount(&store, "entry", 100.0, NumberCodec);
        let ladder = ParamCell::mount(&store, "ts", vec![(2.0, 0.0)], JsonCodec::<Vec<(f64, f64)>>::new());
        assert_eq!(*entry.value(), 100.0);
        assert_eq!(*ladder.value(), vec![(2.0, 0.0)]);
    }

    #[test]
    fn set_writes_once_and_suppresses_repeats() {
        let mut store = LocationStore::default();
        let mut cell = ParamCell::mount(&store, "entry", 100.0, NumberCodec);

        assert!(cell.set(&mut store, 101.5));
        let href = store.href();
        assert!(!cell.set(&mut store, 101.5));
        assert_eq!(store.href(), href);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("entry").as_deref(), Some("101.5"));
    }

    #[test]
    fn setting_the_default_still_writes_the_key() {
        let mut store = LocationStore::default();
        let mut cell = ParamCell::mount(&store, "discrete", false, BoolCodec);
        cell.set(&mut store, true);
        cell.set(&mut store, false);
        assert_eq!(store.get("discrete").as_deref(), Some("false"));
    }

    #[test]
    fn optional_none_removes_key() {
        let mut store = LocationStore::from_query("risk=5");
        let mut cell = ParamCell::mount(&store, "risk", None, OptionalCodec(NumberCodec));
        assert_eq!(*cell.value(), Some(5.0));
        cell.set(&mut store, None);
        assert_eq!(store.get("risk"), None);
    }

    #[test]
    fn set_or_clear_drops_default_values() {
        let mut store = LocationStore::default();
        let mut short = ParamCell::mount(&store, "short", false, BoolCodec);
        assert!(short.set_or_clear(&mut store, true));
        assert_eq!(store.get("short").as_deref(), Some("true"));
        assert!(short.set_or_clear(&mut store, false));
        assert_eq!(store.get("short"), None);
        assert!(!short.set_or_clear(&mut store, false));
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn update_and_reset() {
        let mut store = LocationStore::from_query("capital=1000");
        let mut cell = ParamCell::mount(&store, "capital", 500.0, NumberCodec);
        cell.update(&mut store, |c| c * 2.0);
        assert_eq!(store.get("capital").as_deref(), Some("2000"));

        cell.reset(&mut store);
        assert_eq!(*cell.value(), 500.0);
        assert_eq!(store.query(), None);
    }

    #[test]
    fn sync_picks_up_navigation() {
        let mut store = LocationStore::from_query("lev=10");
        let mut cell = ParamCell::mount(&store, "lev", 1.0, NumberCodec);
        cell.set(&mut store, 20.0);
        store.navigate(url::Url::parse("http://localhost/?lev=5").unwrap());

        assert!(cell.sync(&store));
        assert_eq!(*cell.value(), 5.0);
        assert!(!cell.sync(&store));

        store.back();
        assert!(cell.sync(&store));
        assert_eq!(*cell.value(), 20.0);
    }

    #[test]
    fn independent_keys_do_not_interfere() {
        let mut store = LocationStore::default();
        let mut a = ParamCell::mount(&store, "a", 0.0, NumberCodec);
        let mut b = ParamCell::mount(&store, "b", 0.0, NumberCodec);
        a.set(&mut store, 1.0);
        b.set(&mut store, 2.0);
        a.set(&mut store, 3.0);
        assert_eq!(store.query(), Some("a=3&b=2"));
        assert!(!b.sync(&store));
    }
}
