//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Debug;

/// Models a type that can be used to index into the arena types.
///
/// Keys are plain integers under the hood: every node of the flow graph is
/// referred to by one of these instead of by a pointer, which is what lets
/// the graph be freely mutated while holding references to other nodes.
///
/// Prefer the [`arena_key`](crate::arena_key) or [`dense_arena_key`](crate::dense_arena_key)
/// macros over implementing this directly.
pub trait ArenaKey: Copy + Eq + Debug {
    /// Creates a key from an arena slot index. Panics if the index
    /// cannot be represented by the key's storage type.
    fn key_new(index: usize) -> Self;

    /// Gets the arena slot index the key refers to.
    fn key_index(self) -> usize;
}

/// Creates a type-safe key for an [`ArenaMap`](crate::arena::ArenaMap) and
/// the secondary structures keyed on it.
///
/// ```
/// # use onyx::arena_key;
/// # use onyx::arena::ArenaMap;
/// arena_key! {
///     /// Defaults to `usize` storage.
///     pub struct Node;
///
///     struct Tiny(u8);
/// }
///
/// let mut nodes = ArenaMap::new();
/// let n: Node = nodes.insert("root");
///
/// assert_eq!(nodes[n], "root");
/// ```
#[macro_export(local_inner_macros)]
macro_rules! arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident($ty:ty); $($rest:tt)* ) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($ty);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn key_new(index: usize) -> Self {
                use std::convert::TryInto;

                Self(index.try_into().expect("arena index overflowed key type"))
            }

            #[inline]
            fn key_index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> ::std::result::Result<(), ::std::fmt::Error> {
                std::write!(f, "{}({})", std::stringify!($name), self.0)
            }
        }

        arena_key!($($rest)*);
    };

    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(usize); $($rest)* }
    };

    () => {}
}

/// Creates an arena key backed by a [`u32`], with `u32::MAX` reserved so that
/// the key can be stored in a [`PackedOption`](crate::utility::PackedOption)
/// without any extra space.
///
/// ```
/// # use onyx::dense_arena_key;
/// # use onyx::arena::ArenaMap;
/// # use onyx::utility::PackedOption;
/// dense_arena_key! {
///     pub struct Edge;
/// }
///
/// let mut edges = ArenaMap::new();
/// let e: Edge = edges.insert((0, 1));
/// let maybe = PackedOption::some(e);
///
/// assert_eq!(maybe.expand(), Some(e));
/// ```
#[macro_export(local_inner_macros)]
macro_rules! dense_arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(u32); }

        impl $crate::utility::Packable for $name {
            #[inline]
            fn reserved() -> Self {
                Self(u32::MAX)
            }

            #[inline]
            fn is_reserved(&self) -> bool {
                self.0 == u32::MAX
            }
        }

        dense_arena_key!($($rest)*);
    };

    () => {}
}
