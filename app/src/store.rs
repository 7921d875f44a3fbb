use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use models::schemas::tournament::TournamentSchema;

/// Process-wide keyed map. The map lock only guards membership; critical
/// sections stay short and never span I/O.
pub struct SharedMap<T> {
    data: Arc<Mutex<HashMap<String, T>>>,
}

impl<T> Clone for SharedMap<T> {
    fn clone(&self) -> Self {
        SharedMap {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> SharedMap<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, T>> {
        self.data.lock().unwrap()
    }

    pub fn insert(&self, key: &str, value: T) {
        self.guard().insert(key.to_owned(), value);
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        self.guard().remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.guard().contains_key(key)
    }

    pub fn update<F, O>(&self, key: &str, update: F) -> Option<O>
    where
        F: FnOnce(&mut T) -> O,
    {
        self.guard().get_mut(key).map(update)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

impl<T: Default> SharedMap<T> {
    pub fn update_or_default<F, O>(&self, key: &str, update: F) -> O
    where
        F: FnOnce(&mut T) -> O,
    {
        update(self.guard().entry(key.to_owned()).or_default())
    }
}

impl<T: Clone> SharedMap<T> {
    pub fn get(&self, key: &str) -> Option<T> {
        self.guard().get(key).cloned()
    }
}

impl<T> Default for SharedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One tournament behind its own lock. Every mutation of a tournament's
/// player list or bracket serializes through this handle, so the winner
/// cascade never interleaves; tournaments never contend with each other.
type TournamentHandle = Arc<Mutex<TournamentSchema>>;

#[derive(Clone, Default)]
pub struct TournamentStore {
    inner: SharedMap<TournamentHandle>,
}

impl TournamentStore {
    pub fn new() -> Self {
        Self {
            inner: SharedMap::new(),
        }
    }

    pub fn contains(&self, code: &str) -> bool {
        self.inner.contains_key(code)
    }

    pub fn insert(&self, code: &str, tournament: TournamentSchema) {
        self.inner.insert(code, Arc::new(Mutex::new(tournament)));
    }

    /// Clone of the current state, taken under the per-tournament lock.
    pub fn snapshot(&self, code: &str) -> Option<TournamentSchema> {
        let handle = self.inner.get(code)?;
        let tournament = handle.lock().unwrap();
        Some(tournament.clone())
    }

    /// Run a mutation while holding this tournament's lock. The map lock is
    /// released before the per-tournament lock is taken.
    pub fn with<F, O>(&self, code: &str, mutate: F) -> Option<O>
    where
        F: FnOnce(&mut TournamentSchema) -> O,
    {
        let handle = self.inner.get(code)?;
        let mut tournament = handle.lock().unwrap();
        Some(mutate(&mut tournament))
    }
}
