//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::dense_arena_key;
use static_assertions::assert_eq_size;
use std::fmt;
use std::fmt::{Display, Formatter};

dense_arena_key! {
    /// A reference to a basic block in a [`FlowGraph`](crate::ir::FlowGraph).
    ///
    /// Block keys double as the block id: predecessor lists are kept sorted
    /// by them.
    pub struct Block;

    /// A reference to an instruction in a [`FlowGraph`](crate::ir::FlowGraph).
    ///
    /// Instructions that produce a value are *definitions*, and for those
    /// the key is also the SSA index of the value (printed as `v<n>`).
    /// Phis, parameters and constants are instructions as well, they just
    /// live in their block's phi or initial-definition list instead of the
    /// normal instruction list.
    pub struct Inst;
}

assert_eq_size!(Block, u32);
assert_eq_size!(Inst, u32);

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl Display for Inst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which input list of its user a [`Use`] lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UseSlot {
    /// The `n`th data input.
    Input(u32),
    /// The `n`th deoptimization environment entry.
    Env(u32),
}

/// A use edge: "input `slot` of `user` reads some definition".
///
/// Every use edge is recorded in exactly one of the two use lists of the
/// definition it reads (input uses or environment uses, depending on the slot).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Use {
    /// The instruction doing the reading.
    pub user: Inst,
    /// Where in `user` the edge lives.
    pub slot: UseSlot,
}

impl Use {
    /// A data input edge.
    #[inline]
    pub fn input(user: Inst, index: usize) -> Self {
        Self {
            user,
            slot: UseSlot::Input(index as u32),
        }
    }

    /// An environment edge.
    #[inline]
    pub fn env(user: Inst, index: usize) -> Self {
        Self {
            user,
            slot: UseSlot::Env(index as u32),
        }
    }

    /// Whether this is an environment edge.
    #[inline]
    pub fn is_env(self) -> bool {
        matches!(self.slot, UseSlot::Env(_))
    }
}
