//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::context::CompilerOptions;
use crate::ir::*;
use crate::transforms::common::has_side_effect;
use crate::transforms::constprop::transform::remove_if_dead;
use tracing::debug;

/// Replaces branches whose two sides end up in the same place with a plain
/// `goto`, as long as the condition has no side effects.
///
/// Both sides are followed through chains of empty blocks (blocks with
/// nothing but a `goto`) that only the branch can reach. If both chains end
/// at the same join, and that join has no phis that could tell the two
/// paths apart, the branch doesn't do anything. The empty blocks are cleared.
///
/// Returns whether anything changed. If so the block orders, predecessors
/// and dominators have been recomputed.
pub(super) fn eliminate_redundant_branches(graph: &mut FlowGraph, options: &CompilerOptions) -> bool {
    let mut changed = false;
    let postorder = graph.postorder().to_vec();

    for block in postorder {
        let term = match graph.terminator(block) {
            Some(term) => term,
            None => continue,
        };

        let (true_target, false_target) = match graph.data(term) {
            InstData::Branch {
                true_target,
                false_target,
                ..
            } => (*true_target, *false_target),
            _ => continue,
        };

        let condition = graph.input(term, 0);

        if has_side_effect(graph, condition) {
            continue;
        }

        let mut empty_blocks = Vec::new();
        let if_true = first_non_empty_successor(graph, true_target, &mut empty_blocks);
        let if_false = first_non_empty_successor(graph, false_target, &mut empty_blocks);

        if if_true != if_false {
            continue;
        }

        let join = graph.block(if_true);

        if join.kind() != BlockKind::Join || !join.phis().is_empty() {
            continue;
        }

        graph.replace_terminator_with_goto(block, if_true);

        for empty in empty_blocks {
            graph.clear_block(empty);
        }

        remove_if_dead(graph, condition);

        if options.trace_constant_propagation {
            debug!(%block, target = %if_true, "eliminated redundant branch");
        }

        changed = true;
    }

    if changed {
        graph.discover_blocks();
        graph.merge_blocks();
        graph.compute_dominators();
    }

    changed
}

// a block that jumps to itself is an infinite loop, not an empty block
fn empty_block_target(graph: &FlowGraph, block: Block) -> Option<Block> {
    let data = graph.block(block);

    if !data.phis().is_empty()
        || data.kind().is_entry_like()
        || data.kind() == BlockKind::IndirectEntry
    {
        return None;
    }

    match graph.block_first_inst(block).map(|inst| graph.data(inst)) {
        Some(InstData::Goto(target)) if *target != block => Some(*target),
        _ => None,
    }
}

fn first_non_empty_successor(graph: &FlowGraph, start: Block, empty: &mut Vec<Block>) -> Block {
    let mut current = start;

    while let Some(next) = empty_block_target(graph, current) {
        if !graph.dominates(start, current) || empty.contains(&current) {
            break;
        }

        empty.push(current);
        current = next;
    }

    current
}
