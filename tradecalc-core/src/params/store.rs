//! Query-string state store.
//!
//! Calculators never touch an ambient location. They receive a `ParamStore`
//! with a narrow get/replace/subscribe surface. `LocationStore` is the
//! in-memory implementation: a browser-like history of URLs where parameter
//! writes replace the current entry and back/forward notify subscribers.

use std::fmt;

use url::Url;

/// Base used when a bare query string (`entry=100&sl=90`) is loaded.
pub const LOCAL_BASE: &str = "http://localhost/";

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What moved the location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// A new entry was pushed (a different URL was opened).
    Push,
    Back,
    Forward,
}

/// Fired when the location changes for reasons other than a parameter write.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    pub href: String,
}

pub type Listener = Box<dyn FnMut(&NavigationEvent)>;

/// Capability interface for URL-backed state.
pub trait ParamStore {
    /// Raw (percent-decoded) value of `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `key` into the current entry without creating a history entry.
    /// `None` removes the key. Other keys, the path and the fragment are kept.
    fn replace(&mut self, key: &str, value: Option<&str>);

    /// Register for navigation events.
    fn subscribe(&mut self, listener: Listener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// In-memory location with a history stack.
pub struct LocationStore {
    entries: Vec<Url>,
    cursor: usize,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    writes: u64,
}

impl fmt::Debug for LocationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationStore")
            .field("href", &self.href())
            .field("cursor", &self.cursor)
            .field("entries", &self.entries.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for LocationStore {
    fn default() -> Self {
        Self::from_query("")
    }
}

impl LocationStore {
    pub fn new(url: Url) -> Self {
        Self {
            entries: vec![url],
            cursor: 0,
            listeners: Vec::new(),
            next_id: 0,
            writes: 0,
        }
    }

    /// Open a full URL.
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Url::parse(href).map(Self::new)
    }

    /// Open a bare query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let mut url = Url::parse(LOCAL_BASE).expect("static base URL");
        let query = query.trim_start_matches('?');
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        Self::new(url)
    }

    /// Accept either a full URL or a bare query string.
    pub fn open(input: &str) -> Self {
        let input = input.trim();
        match Url::parse(input) {
            Ok(url) if !url.cannot_be_a_base() => Self::new(url),
            _ => Self::from_query(input),
        }
    }

    pub fn url(&self) -> &Url {
        &self.entries[self.cursor]
    }

    pub fn href(&self) -> String {
        self.url().to_string()
    }

    pub fn query(&self) -> Option<&str> {
        self.url().query()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.url().fragment()
    }

    /// Change the fragment of the current entry in place (route switch).
    pub fn set_fragment(&mut self, fragment: Option<&str>) {
        self.entries[self.cursor].set_fragment(fragment);
    }

    /// Number of parameter writes performed so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn history_len(&self) -> usize {
        self.entries.len()
    }

    /// Push a new entry, dropping any forward history.
    pub fn navigate(&mut self, url: Url) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(url);
        self.cursor = self.entries.len() - 1;
        self.notify(NavigationKind::Push);
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.notify(NavigationKind::Back);
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        self.notify(NavigationKind::Forward);
        true
    }

    fn notify(&mut self, kind: NavigationKind) {
        let event = NavigationEvent {
            kind,
            href: self.href(),
        };
        tracing::debug!(?kind, href = %event.href, "navigation");
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

impl ParamStore for LocationStore {
    fn get(&self, key: &str) -> Option<String> {
        self.url()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn replace(&mut self, key: &str, value: Option<&str>) {
        let url = &mut self.entries[self.cursor];
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        match value {
            Some(value) => {
                let mut found = false;
                pairs.retain_mut(|(k, v)| {
                    if k != key {
                        return true;
                    }
                    if found {
                        // Drop duplicates so `get` and the URL agree.
                        return false;
                    }
                    found = true;
                    *v = value.to_string();
                    true
                });
                if !found {
                    pairs.push((key.to_string(), value.to_string()));
                }
            }
            None => pairs.retain(|(k, _)| k != key),
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs.iter());
        }
        self.writes += 1;
        tracing::trace!(key, ?value, "query parameter replaced");
    }

    fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}
