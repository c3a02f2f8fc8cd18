//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A simple typed arena module.
//!
//! The flow graph is a cyclic structure (blocks point at their predecessors,
//! definitions point at their users and users at their definitions), so
//! nodes are stored in arenas and refer to each other through small typed
//! keys. Arena slots are never freed, a node that is "removed" from the
//! graph is simply unlinked from it.
//!
//! ```
//! # use onyx::dense_arena_key;
//! # use onyx::arena::*;
//! dense_arena_key! {
//!     pub struct Node;
//! }
//!
//! enum Expr {
//!     Literal(i64),
//!     Add(Node, Node),
//! }
//!
//! let mut arena = ArenaMap::new();
//! let lhs: Node = arena.insert(Expr::Literal(3));
//! let rhs = arena.insert(Expr::Literal(4));
//! let sum = arena.insert(Expr::Add(lhs, rhs));
//!
//! let mut folded = SecondarySet::new();
//! folded.insert(sum);
//! ```

mod key;
mod map;
mod secondary;
mod secondary_set;

pub use key::ArenaKey;
pub use map::ArenaMap;
pub use secondary::SecondaryMap;
pub use secondary_set::SecondarySet;
