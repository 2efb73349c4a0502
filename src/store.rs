use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum_macros::AsRefStr;
use thiserror::Error as ThisError;
use tokio::time::{Duration, Instant};

/// The Store is responsible for managing key-value pairs, with optional time-to-live settings for
/// string keys. Expired keys are removed lazily: every operation checks the expiration of the
/// keys it touches and drops them before doing anything else.
///
/// The store is thread-safe and is shared between connections by cloning it, which only bumps a
/// reference count. All operations run while holding a single lock, see [`InnerStore::lock`].
#[derive(Clone)]
pub struct Store {
    inner: Arc<InnerStore>,
}

impl Store {
    pub fn new() -> Store {
        let state = State {
            keys: HashMap::new(),
        };

        let inner = Arc::new(InnerStore {
            state: Mutex::new(state),
        });

        Self { inner }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Store {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

pub struct InnerStore {
    state: Mutex<State>,
}

impl InnerStore {
    /// Locks the whole store. Everything done through the returned guard is atomic with respect
    /// to other connections, so compound operations (expire then read, create then append) are
    /// never observed half way.
    pub fn lock(&self) -> InnerStoreLocked<'_> {
        // A panic while holding the lock leaves the map itself intact, keep serving it.
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        InnerStoreLocked { state }
    }
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    /// Returns the string stored at `key`. Lists read as `None`.
    pub fn get(&mut self, key: &str) -> Option<Bytes> {
        match &self.live(key)?.value {
            Value::String(data) => Some(data.clone()),
            Value::List(_) => None,
        }
    }

    /// Stores `data` as a string without expiration, replacing whatever `key` held.
    pub fn set(&mut self, key: String, data: Bytes) {
        let entry = Entry {
            value: Value::String(data),
            expires_at: None,
        };
        self.state.keys.insert(key, entry);
    }

    /// Like [`set`](Self::set) but the key expires after `ttl`. A `ttl` too large to represent
    /// as an instant means the key never expires.
    pub fn set_with_ttl(&mut self, key: String, data: Bytes, ttl: Duration) {
        let entry = Entry {
            value: Value::String(data),
            expires_at: Instant::now().checked_add(ttl),
        };
        self.state.keys.insert(key, entry);
    }

    /// Pushes `values` to the list at `key`, creating it if needed, and returns the new length.
    ///
    /// At the front values are pushed one at a time, so `[a, b]` ends up as `b, a, ...`.
    pub fn push(
        &mut self,
        key: String,
        values: Vec<Bytes>,
        end: ListEnd,
    ) -> Result<usize, WrongKind> {
        self.expire(&key);

        let entry = self.state.keys.entry(key).or_insert_with(|| Entry {
            value: Value::List(VecDeque::new()),
            expires_at: None,
        });

        let list = match &mut entry.value {
            Value::List(list) => list,
            Value::String(_) => return Err(WrongKind),
        };

        match end {
            ListEnd::Front => {
                for value in values {
                    list.push_front(value);
                }
            }
            ListEnd::Back => list.extend(values),
        }

        Ok(list.len())
    }

    /// Returns the elements between `start` and `stop`, both inclusive. A missing key is an empty
    /// list, a key holding a string is `None`.
    pub fn range(&mut self, key: &str, start: usize, stop: usize) -> Option<Vec<Bytes>> {
        let list = match self.live(key) {
            None => return Some(vec![]),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => list,
            Some(_) => return None,
        };

        if start >= list.len() || start > stop {
            return Some(vec![]);
        }

        let stop = stop.min(list.len() - 1);

        Some(list.range(start..=stop).cloned().collect())
    }

    pub fn list_len(&mut self, key: &str) -> Result<usize, WrongKind> {
        match self.live(key) {
            None => Ok(0),
            Some(Entry {
                value: Value::List(list),
                ..
            }) => Ok(list.len()),
            Some(_) => Err(WrongKind),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Entry> {
        self.expire(key);
        self.state.keys.remove(key)
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.live(key).is_some()
    }

    pub fn kind(&mut self, key: &str) -> Option<Kind> {
        self.live(key).map(|entry| entry.value.kind())
    }

    /// Remaining time to live of `key`, `None` if it does not exist or has no expiration.
    pub fn get_ttl(&mut self, key: &str) -> Option<Duration> {
        let expires_at = self.live(key)?.expires_at?;
        Some(expires_at.saturating_duration_since(Instant::now()))
    }

    /// Number of live keys. Expired keys found along the way are dropped.
    pub fn size(&mut self) -> usize {
        let now = Instant::now();
        self.state.keys.retain(|_, entry| !entry.is_expired(now));
        self.state.keys.len()
    }

    fn expire(&mut self, key: &str) {
        let now = Instant::now();
        let expired = self
            .state
            .keys
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));

        if expired {
            self.state.keys.remove(key);
        }
    }

    fn live(&mut self, key: &str) -> Option<&Entry> {
        self.expire(key);
        self.state.keys.get(key)
    }
}

type Key = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    String,
    List,
}

#[derive(Debug, ThisError, PartialEq)]
#[error("operation against a key holding the wrong kind of value")]
pub struct WrongKind;

#[derive(Debug)]
pub enum Value {
    String(Bytes),
    List(VecDeque<Bytes>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::List(_) => Kind::List,
        }
    }
}

#[derive(Debug)]
pub struct Entry {
    pub value: Value,
    pub expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

pub struct State {
    keys: HashMap<Key, Entry>,
}
