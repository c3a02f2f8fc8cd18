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
use smallbitvec::{sbvec, SmallBitVec};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// A dense set of keys from some primary map, stored as one bit per key.
///
/// This is what reachability and liveness bits are stored in, they only
/// ever need a single bit of information per block or instruction.
///
/// ```
/// # use onyx::arena_key;
/// # use onyx::arena::*;
/// arena_key! { struct Key; }
///
/// let mut primary = ArenaMap::new();
/// let k1: Key = primary.insert(15);
/// let k2 = primary.insert(20);
/// let mut set = SecondarySet::with_primary(&primary);
///
/// assert!(set.insert(k2));
/// assert!(!set.insert(k2));
/// assert!(!set.contains(k1));
/// assert!(set.contains(k2));
/// ```
#[derive(Clone)]
pub struct SecondarySet<K: ArenaKey> {
    bits: SmallBitVec,
    cardinality: usize,
    _unused: PhantomData<fn() -> K>,
}

impl<K: ArenaKey> SecondarySet<K> {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            bits: SmallBitVec::new(),
            cardinality: 0,
            _unused: PhantomData,
        }
    }

    /// Creates an empty set pre-sized for every key in `primary`.
    pub fn with_primary<T>(primary: &ArenaMap<K, T>) -> Self {
        Self {
            bits: sbvec![false; primary.len()],
            cardinality: 0,
            _unused: PhantomData,
        }
    }

    /// The number of keys in the set.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Whether the set has no keys in it.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    /// Checks if `key` is in the set.
    #[inline]
    pub fn contains(&self, key: K) -> bool {
        self.bits.get(key.key_index()).unwrap_or(false)
    }

    /// Adds `key` to the set. Returns `true` if it was not already present.
    pub fn insert(&mut self, key: K) -> bool {
        let index = key.key_index();

        if index >= self.bits.len() {
            self.bits.resize(index + 1, false);
        }

        let was_present = self.bits[index];

        if !was_present {
            self.bits.set(index, true);
            self.cardinality += 1;
        }

        !was_present
    }

    /// Removes `key` from the set. Returns `true` if it was present.
    pub fn remove(&mut self, key: K) -> bool {
        let index = key.key_index();

        if !self.contains(key) {
            return false;
        }

        self.bits.set(index, false);
        self.cardinality -= 1;

        true
    }

    /// Removes every key from the set.
    pub fn clear(&mut self) {
        self.bits.clear();
        self.cardinality = 0;
    }

    /// Iterates over the keys in the set, in key order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, present)| *present)
            .map(|(i, _)| K::key_new(i))
    }
}

impl<K: ArenaKey> Default for SecondarySet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ArenaKey> PartialEq for SecondarySet<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cardinality == other.cardinality && self.keys().eq(other.keys())
    }
}

impl<K: ArenaKey> Eq for SecondarySet<K> {}

impl<K: ArenaKey> Debug for SecondarySet<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "SecondarySet ")?;

        f.debug_set().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense_arena_key;

    dense_arena_key! { struct Key; }

    #[test]
    fn grows_past_primary_size() {
        let mut primary = ArenaMap::<Key, ()>::new();
        let a = primary.insert(());
        let mut set = SecondarySet::with_primary(&primary);
        let b = primary.insert(());
        let c = primary.insert(());

        assert!(set.insert(c));
        assert!(set.insert(a));
        assert!(!set.contains(b));
        assert_eq!(set.cardinality(), 2);
        assert_eq!(set.keys().collect::<Vec<_>>(), [a, c]);
    }

    #[test]
    fn remove_and_clear() {
        let mut primary = ArenaMap::<Key, ()>::new();
        let a = primary.insert(());
        let b = primary.insert(());
        let mut set = SecondarySet::new();

        set.insert(a);
        set.insert(b);

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.cardinality(), 1);

        set.clear();

        assert!(set.is_empty());
        assert!(!set.contains(b));
    }
}
