// File: crates/canvas-core/src/cache.rs
// Summary: Explicit shared resource cache (typefaces, images) with init / get-or-populate / clear.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// Keyed cache shared by every surface on the UI thread.
///
/// Populating is idempotent: the first populate for a key wins and later requests for
/// the same key return the stored value without running their closure.
pub struct ResourceCache<K, V> {
    entries: RefCell<HashMap<K, Rc<V>>>,
}

impl<K: Eq + Hash, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self { entries: RefCell::new(HashMap::new()) }
    }

    pub fn get(&self, key: &K) -> Option<Rc<V>> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn get_or_populate(&self, key: K, populate: impl FnOnce() -> V) -> Rc<V> {
        if let Some(v) = self.get(&key) {
            return v;
        }
        // The borrow is not held while populating so the closure may read the cache.
        let value = Rc::new(populate());
        self.entries.borrow_mut().entry(key).or_insert(value).clone()
    }

    /// Fallible populate; errors leave the key absent so a later request retries.
    pub fn get_or_try_populate<E>(&self, key: K, populate: impl FnOnce() -> Result<V, E>) -> Result<Rc<V>, E> {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        let value = Rc::new(populate()?);
        Ok(self.entries.borrow_mut().entry(key).or_insert(value).clone())
    }

    pub fn insert(&self, key: K, value: V) -> Rc<V> {
        self.entries.borrow_mut().entry(key).or_insert_with(|| Rc::new(value)).clone()
    }

    pub fn len(&self) -> usize { self.entries.borrow().len() }

    pub fn is_empty(&self) -> bool { self.entries.borrow().is_empty() }

    pub fn clear(&self) { self.entries.borrow_mut().clear(); }
}

impl<K: Eq + Hash, V> Default for ResourceCache<K, V> {
    fn default() -> Self { Self::new() }
}
