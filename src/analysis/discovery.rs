//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::{SecondaryMap, SecondarySet};
use crate::ir::{Block, FlowGraph};
use smallvec::SmallVec;

/// The result of walking the control-flow edges of a graph from the
/// graph entry.
#[derive(Clone, Debug)]
pub struct BlockOrders {
    /// Every reachable block, in DFS preorder. The graph entry is first.
    pub preorder: Vec<Block>,
    /// Every reachable block, in DFS postorder. The graph entry is last.
    pub postorder: Vec<Block>,
    /// The reachable predecessors of every reachable block, sorted by block id.
    pub predecessors: SecondaryMap<Block, SmallVec<[Block; 2]>>,
}

/// Walks the successor edges of every block reachable from the graph entry,
/// computing a preorder, a postorder and the predecessor lists implied by
/// the edges.
///
/// Successors are visited in terminator order, so the true side of a branch
/// comes before the false side in the preorder.
pub fn compute_block_orders(graph: &FlowGraph) -> BlockOrders {
    let root = graph.graph_entry();
    let mut preorder = Vec::new();
    let mut postorder = Vec::new();
    let mut predecessors: SecondaryMap<Block, SmallVec<[Block; 2]>> = SecondaryMap::new();
    let mut seen = SecondarySet::new();

    // each frame is a block and the index of the next successor to look at.
    // this is the recursive algorithm, but without the recursion limit
    let mut stack: Vec<(Block, SmallVec<[Block; 2]>, usize)> = Vec::new();

    seen.insert(root);
    preorder.push(root);
    predecessors.insert(root, SmallVec::new());
    stack.push((root, graph.successors(root), 0));

    while let Some((block, succs, next)) = stack.last_mut() {
        let block = *block;

        match succs.get(*next).copied() {
            Some(succ) => {
                *next += 1;

                predecessors
                    .get_or_insert_with(succ, SmallVec::new)
                    .push(block);

                if seen.insert(succ) {
                    preorder.push(succ);
                    stack.push((succ, graph.successors(succ), 0));
                }
            }
            None => {
                postorder.push(block);
                stack.pop();
            }
        }
    }

    for block in preorder.iter().copied() {
        if let Some(preds) = predecessors.get_mut(block) {
            preds.sort_unstable();
            preds.dedup();
        }
    }

    BlockOrders {
        preorder,
        postorder,
        predecessors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilationContext;
    use crate::ir::*;

    #[test]
    fn diamond_orders() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let left = b.create_block(BlockKind::Target);
        let right = b.create_block(BlockKind::Target);
        let join = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        b.append().branch(x, left, right);
        b.switch_to(left);
        b.append().goto(join);
        b.switch_to(right);
        b.append().goto(join);
        b.switch_to(join);
        b.append().ret(x);

        let graph = b.finish();
        let orders = compute_block_orders(&graph);
        let root = graph.graph_entry();

        assert_eq!(orders.preorder, [root, entry, left, join, right]);
        assert_eq!(orders.postorder, [join, left, right, entry, root]);
        assert_eq!(orders.predecessors[join].as_slice(), [left, right]);
        assert_eq!(orders.predecessors[entry].as_slice(), [root]);
        assert!(orders.predecessors[root].is_empty());
    }

    #[test]
    fn unreachable_blocks_are_skipped() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let dead = b.create_block(BlockKind::Join);
        let join = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        b.append().goto(join);
        b.switch_to(dead);
        b.append().goto(join);
        b.switch_to(join);
        b.append().ret(x);

        let graph = b.graph().clone();
        let orders = compute_block_orders(&graph);

        assert!(!orders.preorder.contains(&dead));
        assert_eq!(orders.predecessors[join].as_slice(), [entry]);
        assert!(orders.predecessors.get(dead).is_none());
    }

    #[test]
    fn loops_terminate() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let header = b.create_block(BlockKind::Join);
        let body = b.create_block(BlockKind::Target);
        let exit = b.create_block(BlockKind::Target);
        let x = b.parameter(entry, 0);

        b.switch_to(entry);
        b.append().goto(header);
        b.switch_to(header);
        b.append().branch(x, body, exit);
        b.switch_to(body);
        b.append().goto(header);
        b.switch_to(exit);
        b.append().ret(x);

        let graph = b.finish();
        let orders = compute_block_orders(&graph);

        assert_eq!(orders.preorder.len(), 5);
        assert_eq!(orders.predecessors[header].as_slice(), [entry, body]);
        assert_eq!(orders.postorder.last(), Some(&graph.graph_entry()));
    }
}
