//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::{Debug, Formatter, Result};
use std::mem;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A type with a value that can be set aside to mean "nothing", so that an
/// optional instance of it can be stored in exactly as much space as the
/// type itself.
///
/// Keys made with [`dense_arena_key`](crate::dense_arena_key) implement this
/// automatically with `u32::MAX` as the reserved value.
pub trait Packable {
    /// The reserved "none" value.
    fn reserved() -> Self;

    /// Whether `self` is the reserved "none" value.
    fn is_reserved(&self) -> bool;
}

/// An [`Option`]-like wrapper for [`Packable`] types that does not need a
/// separate discriminant. Blocks use these for their dominator link and
/// instructions for their owning block.
///
/// ```
/// # use onyx::dense_arena_key;
/// # use onyx::arena::ArenaMap;
/// # use onyx::utility::PackedOption;
/// dense_arena_key! { struct Key; }
///
/// let mut map = ArenaMap::new();
/// let k: Key = map.insert(());
/// let mut opt = PackedOption::some(k);
///
/// assert_eq!(opt.take(), Some(k));
/// assert!(opt.is_none());
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct PackedOption<T: Packable>(T);

impl<T: Packable> PackedOption<T> {
    /// A `None` value.
    #[inline]
    pub fn none() -> Self {
        Self(T::reserved())
    }

    /// A `Some` value. `value` must not be the reserved value.
    #[inline]
    pub fn some(value: T) -> Self {
        debug_assert!(!value.is_reserved());

        Self(value)
    }

    /// Whether this is a `None` value.
    #[inline]
    pub fn is_none(&self) -> bool {
        self.0.is_reserved()
    }

    /// Whether this is a `Some` value.
    #[inline]
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Converts into a normal [`Option`].
    #[inline]
    pub fn expand(self) -> Option<T> {
        if self.is_none() {
            None
        } else {
            Some(self.0)
        }
    }

    /// Takes the value out, leaving `None` behind.
    #[inline]
    pub fn take(&mut self) -> Option<T> {
        mem::replace(self, Self::none()).expand()
    }
}

impl<T: Packable> Default for PackedOption<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T: Packable> From<Option<T>> for PackedOption<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            None => Self::none(),
            Some(t) => Self::some(t),
        }
    }
}

impl<T: Packable> From<T> for PackedOption<T> {
    fn from(value: T) -> Self {
        Self::some(value)
    }
}

impl<T> Debug for PackedOption<T>
where
    T: Packable + Copy + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.expand().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaMap;
    use crate::dense_arena_key;
    use static_assertions::assert_eq_size;

    dense_arena_key! { struct Key; }

    #[test]
    fn packed_is_same_size_as_key() {
        assert_eq_size!(PackedOption<Key>, Key);
    }

    #[test]
    fn conversions() {
        let mut map = ArenaMap::new();
        let k: Key = map.insert(());

        assert_eq!(PackedOption::from(Some(k)).expand(), Some(k));
        assert_eq!(PackedOption::<Key>::from(None).expand(), None);
        assert_eq!(PackedOption::from(k), PackedOption::some(k));
        assert!(PackedOption::<Key>::default().is_none());
    }
}
