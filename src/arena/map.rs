//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::ArenaKey;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The primary `K -> V` mapping. Every key is handed out by [`Self::insert`],
/// and slots are never freed: removing a node from the flow graph only
/// unlinks it, the arena slot lives as long as the graph does.
///
/// Other data keyed on the same key type belongs in a
/// [`SecondaryMap`](super::SecondaryMap) or [`SecondarySet`](super::SecondarySet).
///
/// ```
/// # use onyx::arena_key;
/// # use onyx::arena::ArenaMap;
/// arena_key! { struct Id; }
///
/// let mut names = ArenaMap::new();
/// let a: Id = names.insert("a");
/// let b = names.insert("b");
///
/// assert_eq!(names[a], "a");
/// assert_eq!(names.keys().collect::<Vec<_>>(), [a, b]);
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ArenaMap<K: ArenaKey, V> {
    slots: Vec<V>,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey, V> ArenaMap<K, V> {
    /// Creates an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            _unused: PhantomData,
        }
    }

    /// Creates an empty arena with room for `capacity` values.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            _unused: PhantomData,
        }
    }

    /// Checks whether `key` was ever returned by [`Self::insert`].
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        key.key_index() < self.slots.len()
    }

    /// Gets the value for `key`, if the key exists.
    #[inline]
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key.key_index())
    }

    /// Gets the value for `key` mutably, if the key exists.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key.key_index())
    }

    /// Pushes a value into the arena and returns its key.
    #[inline]
    pub fn insert(&mut self, value: V) -> K {
        self.slots.push(value);

        K::key_new(self.slots.len() - 1)
    }

    /// The key that the next call to [`Self::insert`] will return.
    #[inline]
    pub fn next_key(&self) -> K {
        K::key_new(self.slots.len())
    }

    /// The number of values ever inserted.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether or not anything has been inserted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over every key in insertion order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = K> + ExactSizeIterator {
        (0..self.slots.len()).map(K::key_new)
    }

    /// Iterates over every value in insertion order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
        self.slots.iter()
    }

    /// Iterates over every `(key, value)` pair in insertion order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (K, &V)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, v)| (K::key_new(i), v))
    }

    /// Iterates mutably over every `(key, value)` pair in insertion order.
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = (K, &mut V)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(i, v)| (K::key_new(i), v))
    }
}

impl<K: ArenaKey, V> Default for ArenaMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey, V> Index<K> for ArenaMap<K, V> {
    type Output = V;

    #[inline]
    fn index(&self, key: K) -> &V {
        &self.slots[key.key_index()]
    }
}

impl<K: ArenaKey, V> IndexMut<K> for ArenaMap<K, V> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut V {
        &mut self.slots[key.key_index()]
    }
}

impl<K: ArenaKey, V: Debug> Debug for ArenaMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaMap ")?;

        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_key;

    arena_key! { struct Key(u32); }

    #[test]
    fn next_key_matches_insert() {
        let mut map = ArenaMap::new();
        let predicted: Key = map.next_key();

        assert!(!map.contains(predicted));

        let k = map.insert(3.5);

        assert_eq!(k, predicted);
        assert!(map.contains(k));
        assert_eq!(map.get(k), Some(&3.5));
    }

    #[test]
    fn iteration_is_in_insertion_order() {
        let mut map = ArenaMap::<Key, char>::with_capacity(3);
        let a = map.insert('a');
        let b = map.insert('b');
        let c = map.insert('c');

        map[b] = 'B';

        assert_eq!(map.len(), 3);
        assert_eq!(map.iter().collect::<Vec<_>>(), [(a, &'a'), (b, &'B'), (c, &'c')]);
        assert_eq!(map.keys().rev().collect::<Vec<_>>(), [c, b, a]);
    }
}
