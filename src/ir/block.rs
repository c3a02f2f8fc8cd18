//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, Inst};
use crate::utility::PackedOption;
use smallvec::SmallVec;
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The different kinds of basic blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum BlockKind {
    /// The root of the graph. Holds no instructions, only the canonical
    /// constants as initial definitions. Its successors are the other
    /// entry blocks.
    GraphEntry,
    /// The normal entry of the function, holds the parameters.
    FunctionEntry,
    /// The entry used when transferring from unoptimized code mid-loop.
    OsrEntry,
    /// The entry of an exception handler, holds the exception and stack
    /// trace parameters.
    CatchEntry,
    /// A control-flow merge point. The only kind of block (besides indirect
    /// entries) that can have multiple predecessors and phis.
    Join,
    /// The target of a branch. Always has exactly one predecessor.
    Target,
    /// A join that is the target of an indirect goto.
    IndirectEntry,
}

impl BlockKind {
    /// Whether blocks of this kind can have phis.
    #[inline]
    pub fn is_join_like(self) -> bool {
        matches!(self, Self::Join | Self::IndirectEntry)
    }

    /// Whether blocks of this kind have initial definitions.
    #[inline]
    pub fn is_entry_like(self) -> bool {
        matches!(
            self,
            Self::GraphEntry | Self::FunctionEntry | Self::OsrEntry | Self::CatchEntry
        )
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GraphEntry => "graph entry",
            Self::FunctionEntry => "function entry",
            Self::OsrEntry => "osr entry",
            Self::CatchEntry => "catch entry",
            Self::Join => "join",
            Self::Target => "target",
            Self::IndirectEntry => "indirect entry",
        })
    }
}

/// All the data associated with a single basic block, besides its
/// instruction list (that lives in the [`Layout`](crate::ir::Layout)).
///
/// Blocks are never freed. Removing a block means making it unreachable
/// from the graph entry, after which block discovery no longer visits it.
#[derive(Clone, Debug)]
pub struct BlockData {
    pub(in crate::ir) kind: BlockKind,
    pub(in crate::ir) phis: Vec<Inst>,
    pub(in crate::ir) initial_defs: Vec<Inst>,
    pub(in crate::ir) predecessors: SmallVec<[Block; 2]>,
    pub(in crate::ir) dominator: PackedOption<Block>,
    pub(in crate::ir) dominated: Vec<Block>,
    pub(in crate::ir) preorder_number: Option<u32>,
    pub(in crate::ir) postorder_number: Option<u32>,
    pub(in crate::ir) try_index: Option<u32>,
}

impl BlockData {
    pub(in crate::ir) fn new(kind: BlockKind, try_index: Option<u32>) -> Self {
        Self {
            kind,
            phis: Vec::new(),
            initial_defs: Vec::new(),
            predecessors: SmallVec::new(),
            dominator: PackedOption::none(),
            dominated: Vec::new(),
            preorder_number: None,
            postorder_number: None,
            try_index,
        }
    }

    /// The kind of block.
    #[inline]
    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// The phis of the block, in order. Always empty unless the block is join-like.
    #[inline]
    pub fn phis(&self) -> &[Inst] {
        &self.phis
    }

    /// The initial definitions of the block. Always empty unless the block is entry-like.
    #[inline]
    pub fn initial_definitions(&self) -> &[Inst] {
        &self.initial_defs
    }

    /// The predecessors of the block, sorted by block id. Phi input `i`
    /// corresponds to predecessor `i`.
    #[inline]
    pub fn predecessors(&self) -> &[Block] {
        &self.predecessors
    }

    /// The immediate dominator. Only the graph entry has none.
    #[inline]
    pub fn dominator(&self) -> Option<Block> {
        self.dominator.expand()
    }

    /// The blocks immediately dominated by this one.
    #[inline]
    pub fn dominated_blocks(&self) -> &[Block] {
        &self.dominated
    }

    /// The position of the block in the last computed preorder, if it was reachable.
    #[inline]
    pub fn preorder_number(&self) -> Option<u32> {
        self.preorder_number
    }

    /// The position of the block in the last computed postorder, if it was reachable.
    #[inline]
    pub fn postorder_number(&self) -> Option<u32> {
        self.postorder_number
    }

    /// The exception handler region the block belongs to.
    #[inline]
    pub fn try_index(&self) -> Option<u32> {
        self.try_index
    }
}
