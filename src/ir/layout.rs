//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondaryMap;
use crate::ir::{Block, Inst};
use crate::utility::PackedOption;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct InstNode {
    prev: PackedOption<Inst>,
    next: PackedOption<Inst>,
    block: Block,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
struct BlockNode {
    first: PackedOption<Inst>,
    last: PackedOption<Inst>,
}

/// Iterates over the instructions of a block in order.
#[derive(Copy, Clone, Debug)]
pub struct InstIter<'layout> {
    next: Option<Inst>,
    layout: &'layout Layout,
}

impl<'l> Iterator for InstIter<'l> {
    type Item = Inst;

    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|inst| {
            self.next = self.layout.nodes[inst].next.expand();

            inst
        })
    }
}

/// The ordered instruction list of every block.
///
/// Each block's list is a doubly-linked list threaded through the instruction
/// keys, so that instructions can be inserted and removed anywhere in O(1)
/// without invalidating any other key. Phis and initial definitions are not
/// part of the layout, they are plain lists on the block.
#[derive(Default, Clone, Debug)]
pub struct Layout {
    nodes: SecondaryMap<Inst, InstNode>,
    blocks: SecondaryMap<Block, BlockNode>,
}

impl Layout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `inst` to the end of `block`.
    pub fn append_inst(&mut self, inst: Inst, block: Block) {
        debug_assert!(!self.nodes.contains(inst), "cannot insert an inst twice");

        let node = self.blocks.get_or_insert_with(block, BlockNode::default);
        let prev = node.last;

        node.last = PackedOption::some(inst);

        match prev.expand() {
            Some(prev) => self.nodes[prev].next = PackedOption::some(inst),
            None => node.first = PackedOption::some(inst),
        }

        self.nodes.insert(
            inst,
            InstNode {
                prev,
                next: PackedOption::none(),
                block,
            },
        );
    }

    /// Inserts `inst` directly after `after`, in the same block.
    pub fn insert_inst_after(&mut self, inst: Inst, after: Inst) {
        debug_assert!(!self.nodes.contains(inst), "cannot insert an inst twice");

        let block = self.nodes[after].block;
        let next = self.nodes[after].next;

        self.nodes[after].next = PackedOption::some(inst);

        match next.expand() {
            Some(next) => self.nodes[next].prev = PackedOption::some(inst),
            None => self.blocks[block].last = PackedOption::some(inst),
        }

        self.nodes.insert(
            inst,
            InstNode {
                prev: PackedOption::some(after),
                next,
                block,
            },
        );
    }

    /// Inserts `inst` directly before `before`, in the same block.
    pub fn insert_inst_before(&mut self, inst: Inst, before: Inst) {
        debug_assert!(!self.nodes.contains(inst), "cannot insert an inst twice");

        let block = self.nodes[before].block;
        let prev = self.nodes[before].prev;

        self.nodes[before].prev = PackedOption::some(inst);

        match prev.expand() {
            Some(prev) => self.nodes[prev].next = PackedOption::some(inst),
            None => self.blocks[block].first = PackedOption::some(inst),
        }

        self.nodes.insert(
            inst,
            InstNode {
                prev,
                next: PackedOption::some(before),
                block,
            },
        );
    }

    /// Unlinks `inst` from its block.
    pub fn remove_inst(&mut self, inst: Inst) {
        let node = match self.nodes.remove(inst) {
            Some(node) => node,
            None => panic!("{inst} is not in the layout"),
        };

        match node.prev.expand() {
            Some(prev) => self.nodes[prev].next = node.next,
            None => self.blocks[node.block].first = node.next,
        }

        match node.next.expand() {
            Some(next) => self.nodes[next].prev = node.prev,
            None => self.blocks[node.block].last = node.prev,
        }
    }

    /// Moves every instruction of `from` to the end of `to`, leaving `from` empty.
    pub fn splice_block(&mut self, from: Block, to: Block) {
        let moved = match self.blocks.remove(from) {
            Some(node) if node.first.is_some() => node,
            _ => return,
        };

        let mut curr = moved.first.expand();

        while let Some(inst) = curr {
            self.nodes[inst].block = to;
            curr = self.nodes[inst].next.expand();
        }

        let dest = self.blocks.get_or_insert_with(to, BlockNode::default);

        match dest.last.expand() {
            Some(last) => {
                dest.last = moved.last;
                self.nodes[last].next = moved.first;

                // `moved.first` is known to be `Some`
                if let Some(first) = moved.first.expand() {
                    self.nodes[first].prev = PackedOption::some(last);
                }
            }
            None => *dest = moved,
        }
    }

    /// Whether `inst` is currently in some block.
    #[inline]
    pub fn is_inst_inserted(&self, inst: Inst) -> bool {
        self.nodes.contains(inst)
    }

    /// Iterates over the instructions in `block`, in order.
    pub fn insts_in_block(&self, block: Block) -> InstIter<'_> {
        InstIter {
            next: self.block_first_inst(block),
            layout: self,
        }
    }

    /// The first instruction in `block`.
    pub fn block_first_inst(&self, block: Block) -> Option<Inst> {
        self.blocks.get(block).and_then(|node| node.first.expand())
    }

    /// The last instruction in `block`. In a well-formed graph this is the terminator.
    pub fn block_last_inst(&self, block: Block) -> Option<Inst> {
        self.blocks.get(block).and_then(|node| node.last.expand())
    }

    /// The instruction after `inst` in its block.
    pub fn inst_next(&self, inst: Inst) -> Option<Inst> {
        self.nodes[inst].next.expand()
    }

    /// The instruction before `inst` in its block.
    pub fn inst_prev(&self, inst: Inst) -> Option<Inst> {
        self.nodes[inst].prev.expand()
    }

    /// The block containing `inst`, if it is in one.
    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        self.nodes.get(inst).map(|node| node.block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaMap;

    fn keys() -> (Vec<Block>, Vec<Inst>) {
        let mut blocks = ArenaMap::<Block, ()>::new();
        let mut insts = ArenaMap::<Inst, ()>::new();

        (
            (0..3).map(|_| blocks.insert(())).collect(),
            (0..6).map(|_| insts.insert(())).collect(),
        )
    }

    #[test]
    fn insertion_order() {
        let (b, i) = keys();
        let mut layout = Layout::new();

        layout.append_inst(i[0], b[0]);
        layout.append_inst(i[2], b[0]);
        layout.insert_inst_after(i[1], i[0]);
        layout.insert_inst_before(i[3], i[0]);
        layout.insert_inst_after(i[4], i[2]);

        assert_eq!(
            layout.insts_in_block(b[0]).collect::<Vec<_>>(),
            [i[3], i[0], i[1], i[2], i[4]]
        );
        assert_eq!(layout.block_first_inst(b[0]), Some(i[3]));
        assert_eq!(layout.block_last_inst(b[0]), Some(i[4]));
        assert_eq!(layout.insts_in_block(b[1]).count(), 0);
    }

    #[test]
    fn removal_relinks() {
        let (b, i) = keys();
        let mut layout = Layout::new();

        for inst in &i[0..3] {
            layout.append_inst(*inst, b[0]);
        }

        layout.remove_inst(i[1]);
        assert_eq!(layout.insts_in_block(b[0]).collect::<Vec<_>>(), [i[0], i[2]]);

        layout.remove_inst(i[0]);
        layout.remove_inst(i[2]);
        assert_eq!(layout.block_first_inst(b[0]), None);
        assert_eq!(layout.block_last_inst(b[0]), None);
        assert!(!layout.is_inst_inserted(i[2]));
    }

    #[test]
    fn splice_moves_everything() {
        let (b, i) = keys();
        let mut layout = Layout::new();

        layout.append_inst(i[0], b[0]);
        layout.append_inst(i[1], b[1]);
        layout.append_inst(i[2], b[1]);

        layout.splice_block(b[1], b[0]);

        assert_eq!(layout.insts_in_block(b[0]).collect::<Vec<_>>(), [i[0], i[1], i[2]]);
        assert_eq!(layout.inst_block(i[2]), Some(b[0]));
        assert_eq!(layout.insts_in_block(b[1]).count(), 0);

        layout.splice_block(b[0], b[2]);

        assert_eq!(layout.block_last_inst(b[2]), Some(i[2]));
        assert_eq!(layout.inst_prev(i[1]), Some(i[0]));
    }
}
