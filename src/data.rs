//! A dense, generational arena used for every owning collection in the kernel
//! (bodies, colliders, constraints). Implements Design Note "Cyclic references":
//! structures that would otherwise need `Pair <-> Collidable`-style back-pointers
//! instead hold a stable handle (`slotmap::Key`) into the owning arena, so an
//! orphaned back-reference becomes `None` rather than a dangling pointer.

use slotmap::SlotMap;

/// A dense arena of `T`, keyed by a generational `K`. Thin wrapper kept around
/// `slotmap::SlotMap` so the rest of the crate depends on this module's name, not on
/// `slotmap` directly (the same indirection rapier uses around its own `data::arena`).
pub struct Arena<K: slotmap::Key, T> {
    inner: SlotMap<K, T>,
}

impl<K: slotmap::Key, T> Default for Arena<K, T> {
    fn default() -> Self {
        Self {
            inner: SlotMap::with_key(),
        }
    }
}

impl<K: slotmap::Key, T> Arena<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> K {
        self.inner.insert(value)
    }

    pub fn remove(&mut self, key: K) -> Option<T> {
        self.inner.remove(key)
    }

    pub fn get(&self, key: K) -> Option<&T> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.inner.get_mut(key)
    }

    pub fn contains(&self, key: K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.inner.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.inner.iter_mut()
    }

    /// Mutably borrows two distinct entries at once. Returns `None` for either slot
    /// that's missing, and panics if `a == b` (mirrors `slotmap`'s own contract).
    pub fn get2_mut(&mut self, a: K, b: K) -> (Option<&mut T>, Option<&mut T>) {
        assert_ne!(a, b, "get2_mut called with the same key twice");
        match self.inner.get_disjoint_mut([a, b]) {
            Some([ra, rb]) => (Some(ra), Some(rb)),
            None => {
                // At least one key was stale; fall back to independent lookups so the
                // caller still gets whichever side is actually live.
                let has_a = self.inner.contains_key(a);
                let has_b = self.inner.contains_key(b);
                match (has_a, has_b) {
                    (true, false) => (self.inner.get_mut(a), None),
                    (false, true) => (None, self.inner.get_mut(b)),
                    _ => (None, None),
                }
            }
        }
    }
}

pub use slotmap::new_key_type;
