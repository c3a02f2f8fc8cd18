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
use crate::ir::{Block, FlowGraph};
use crate::utility::Packable;
use smallvec::SmallVec;

/// Models the dominator tree for the reachable blocks of a graph.
///
/// # Implementation
/// The algorithm used is described in "A Simple, Fast Dominance Algorithm"
/// by Cooper et. al. It runs over the block orders from the last
/// [`FlowGraph::discover_blocks`], so those must be current.
///
/// The tree is stored as a side-table mapping each block to its immediate
/// dominator. The graph copies this into its blocks, most code should use
/// [`FlowGraph::dominates`] and [`crate::ir::BlockData::dominator`] instead.
#[derive(Clone, Debug)]
pub struct DominatorTree {
    // maps B -> idom(B) for given block B. the root maps to a reserved key
    tree: SecondaryMap<Block, Block>,
}

impl DominatorTree {
    /// Computes dominance information for the reachable blocks of `graph`.
    pub fn compute(graph: &FlowGraph) -> Self {
        Self {
            tree: compute_idoms(graph),
        }
    }

    /// Gets the immediate dominator of `block`, if one exists. The only
    /// reachable block without an immediate dominator is the graph entry.
    pub fn idom(&self, block: Block) -> Option<Block> {
        self.tree.get(block).copied().filter(|idom| !idom.is_reserved())
    }

    /// Checks if `possible_dominator` dominates `block`. Every block
    /// dominates itself.
    pub fn dominates(&self, block: Block, possible_dominator: Block) -> bool {
        (block == possible_dominator) || self.strictly_dominates(block, possible_dominator)
    }

    /// Checks if `possible_dominator` strictly dominates `block`.
    pub fn strictly_dominates(&self, block: Block, possible_dominator: Block) -> bool {
        let mut curr = block;

        while let Some(idom) = self.idom(curr) {
            if idom == possible_dominator {
                return true;
            }

            curr = idom;
        }

        false
    }

    /// Checks if a block was reachable when the tree was computed.
    pub fn is_reachable(&self, block: Block) -> bool {
        self.tree.contains(block)
    }
}

fn intersect(
    po_numbers: &SecondaryMap<Block, usize>,
    idoms: &SecondaryMap<Block, Block>,
    bb1: Block,
    bb2: Block,
) -> Block {
    let mut f1 = bb1;
    let mut f2 = bb2;

    while f1 != f2 {
        let f2v = po_numbers[f2];

        while po_numbers[f1] < f2v {
            f1 = idoms[f1];
        }

        let f1v = po_numbers[f1];

        while po_numbers[f2] < f1v {
            f2 = idoms[f2];
        }
    }

    f1
}

//
// this implements the dominator algorithm described in "A Simple, Fast Dominance Algorithm"
// by Cooper et. al. See the paper: http://www.hipersoft.rice.edu/grads/publications/dom14.pdf.
//
fn compute_idoms(graph: &FlowGraph) -> SecondaryMap<Block, Block> {
    let po = graph.postorder();
    let mut idoms = SecondaryMap::new();

    let root = match po.last() {
        Some(root) => *root,
        None => return idoms,
    };

    // map block -> postorder number.
    // this is just mapping block -> index of block in `po`
    let po_numbers = {
        let mut map = SecondaryMap::new();

        for (i, bb) in po.iter().copied().enumerate() {
            map.insert(bb, i);
        }

        map
    };

    let mut changed = true;

    // for the purposes of the algorithm, the entry node is its own idom
    idoms.insert(root, root);

    while changed {
        changed = false;

        // root has no predecessors, so we need to make sure we skip the root node.
        for block in po.iter().rev().copied().skip(1) {
            debug_assert_ne!(block, root);

            // every processed predecessor. in reverse postorder there is always
            // at least one, the one that the DFS reached this block through
            let preds: SmallVec<[Block; 16]> = graph
                .block(block)
                .predecessors()
                .iter()
                .copied()
                .filter(|p| idoms.contains(*p))
                .collect();

            let mut iter = preds.into_iter();
            let mut idom = match iter.next() {
                Some(first) => first,
                None => panic!("{block} has no processed predecessor in reverse postorder"),
            };

            for pred in iter {
                idom = intersect(&po_numbers, &idoms, pred, idom);
            }

            if idoms.insert(block, idom) != Some(idom) {
                changed = true;
            }
        }
    }

    // remove the root -> root idom relationship, mark a
    // sentinel we can look for instead.
    idoms.insert(root, Block::reserved());

    idoms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilationContext;
    use crate::ir::*;

    #[test]
    fn loop_with_early_exit() {
        //
        // B1: goto B2
        // B2: branch B3, B4     (loop header)
        // B3: branch B5, B6
        // B5: goto B2           (back edge)
        // B6: return            (early exit)
        // B4: return
        //
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let header = b.create_block(BlockKind::Join);
        let body = b.create_block(BlockKind::Target);
        let exit = b.create_block(BlockKind::Target);
        let latch = b.create_block(BlockKind::Target);
        let early = b.create_block(BlockKind::Target);

        b.switch_to(entry);
        b.append().goto(header);
        b.switch_to(header);
        b.append().branch(x, body, exit);
        b.switch_to(body);
        b.append().branch(x, latch, early);
        b.switch_to(latch);
        b.append().goto(header);
        b.switch_to(early);
        b.append().ret(x);
        b.switch_to(exit);
        b.append().ret(x);

        let graph = b.finish();
        let tree = DominatorTree::compute(&graph);
        let root = graph.graph_entry();

        assert_eq!(tree.idom(root), None);
        assert_eq!(tree.idom(entry), Some(root));
        assert_eq!(tree.idom(header), Some(entry));
        assert_eq!(tree.idom(body), Some(header));
        assert_eq!(tree.idom(exit), Some(header));
        assert_eq!(tree.idom(latch), Some(body));
        assert_eq!(tree.idom(early), Some(body));

        assert!(tree.dominates(latch, header));
        assert!(tree.dominates(header, header));
        assert!(!tree.strictly_dominates(header, header));
        assert!(!tree.dominates(exit, body));
    }

    #[test]
    fn unreachable_blocks_have_no_idom() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let dead = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        b.append().ret(x);
        b.switch_to(dead);
        b.append().ret(x);

        let graph = b.finish();
        let tree = DominatorTree::compute(&graph);

        assert!(!tree.is_reachable(dead));
        assert_eq!(tree.idom(dead), None);
        assert_eq!(graph.block(dead).dominator(), None);
    }
}
