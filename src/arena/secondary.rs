//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{ArenaKey, ArenaMap};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// A sparse side-table for keys of some primary [`ArenaMap`]. Not every key
/// needs to have a value, and keys can be removed again.
///
/// Analyses use these to attach per-node state to a graph without touching
/// the graph itself, e.g. lattice values or visit counts.
///
/// ```
/// # use onyx::arena_key;
/// # use onyx::arena::*;
/// arena_key! { struct Key; }
///
/// let mut primary = ArenaMap::new();
/// let k1: Key = primary.insert(1);
/// let k2 = primary.insert(2);
/// let mut doubled = SecondaryMap::with_primary(&primary);
///
/// doubled.insert(k2, primary[k2] * 2);
///
/// assert_eq!(doubled.get(k1), None);
/// assert_eq!(doubled[k2], 4);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecondaryMap<K: ArenaKey, V> {
    slots: Vec<Option<V>>,
    len: usize,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> SecondaryMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Creates an empty map with space for every key currently in `primary`.
    pub fn with_primary<T>(primary: &ArenaMap<K, T>) -> Self {
        let mut slots = Vec::with_capacity(primary.len());

        slots.resize_with(primary.len(), || None);

        Self {
            slots,
            len: 0,
            _unused: PhantomData,
        }
    }

    /// Creates a map with `f(key)` for every key in `primary`.
    pub fn fill_with<T, F>(primary: &ArenaMap<K, T>, mut f: F) -> Self
    where
        F: FnMut(K) -> V,
    {
        Self {
            slots: primary.keys().map(|k| Some(f(k))).collect(),
            len: primary.len(),
            _unused: PhantomData,
        }
    }

    /// Checks whether `key` currently has a value.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        matches!(self.slots.get(key.key_index()), Some(Some(_)))
    }

    /// Sets the value for `key`, returning the previous one if it existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = key.key_index();

        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }

        let old = self.slots[index].replace(value);

        if old.is_none() {
            self.len += 1;
        }

        old
    }

    /// Gets the value for `key`, if one exists.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.key_index()).and_then(Option::as_ref)
    }

    /// Gets the value for `key` mutably, if one exists.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.key_index()).and_then(Option::as_mut)
    }

    /// Gets the value for `key`, inserting `f()` first if it doesn't exist.
    pub fn get_or_insert_with<F: FnOnce() -> V>(&mut self, key: K, f: F) -> &mut V {
        if !self.contains(key) {
            self.insert(key, f());
        }

        &mut self[key]
    }

    /// Removes the value for `key` and returns it.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let old = self.slots.get_mut(key.key_index()).and_then(Option::take);

        if old.is_some() {
            self.len -= 1;
        }

        old
    }

    /// The number of keys with values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether any key has a value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over the keys that have values, in key order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over every `(key, value)` pair in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (K::key_new(i), v)))
    }
}

impl<K: ArenaKey, V> Default for SecondaryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Index<K> for SecondaryMap<K, V> {
    type Output = V;

    fn index(&self, key: K) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key {key:?} does not exist in secondary map"),
        }
    }
}

impl<K: ArenaKey, V> IndexMut<K> for SecondaryMap<K, V> {
    fn index_mut(&mut self, key: K) -> &mut V {
        match self.slots.get_mut(key.key_index()) {
            Some(Some(v)) => v,
            _ => panic!("key {key:?} does not exist in secondary map"),
        }
    }
}

impl<K: ArenaKey, V: Debug> Debug for SecondaryMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SecondaryMap ")?;

        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense_arena_key;

    dense_arena_key! { struct Key; }

    #[test]
    fn sparse_insert_and_remove() {
        let mut primary = ArenaMap::<Key, ()>::new();
        let keys: Vec<Key> = (0..5).map(|_| primary.insert(())).collect();
        let mut map = SecondaryMap::new();

        assert_eq!(map.insert(keys[4], "last"), None);
        assert_eq!(map.insert(keys[1], "one"), None);
        assert_eq!(map.insert(keys[1], "uno"), Some("one"));
        assert_eq!(map.len(), 2);
        assert!(!map.contains(keys[0]));
        assert_eq!(map.keys().collect::<Vec<_>>(), [keys[1], keys[4]]);

        assert_eq!(map.remove(keys[4]), Some("last"));
        assert_eq!(map.remove(keys[4]), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn fill_with_covers_every_key() {
        let mut primary = ArenaMap::<Key, u32>::new();
        let a = primary.insert(10);
        let b = primary.insert(20);
        let mut map = SecondaryMap::fill_with(&primary, |k| primary[k] + 1);

        *map.get_or_insert_with(a, || 0) += 1;

        assert_eq!(map[a], 12);
        assert_eq!(map[b], 21);
    }

    #[test]
    #[should_panic(expected = "does not exist in secondary map")]
    fn indexing_missing_key_panics() {
        let mut primary = ArenaMap::<Key, ()>::new();
        let k = primary.insert(());
        let map = SecondaryMap::<Key, i32>::with_primary(&primary);

        let _ = map[k];
    }
}
