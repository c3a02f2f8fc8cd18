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
use crate::transforms::constprop::analysis::{bool_test_operand, unwrap_phi, Fixpoint};
use tracing::debug;

/// Rewrites a graph according to the fixpoint of the analysis.
///
/// Block orders, predecessors and dominators are not kept up to date while
/// rewriting, they are recomputed once at the very end.
pub(super) fn transform(graph: &mut FlowGraph, options: &CompilerOptions, fixpoint: &Fixpoint) {
    let tracing = options.trace_constant_propagation;
    let rpo: Vec<Block> = graph.reverse_postorder().collect();

    for block in rpo {
        if !fixpoint.reachable.contains(block) {
            if tracing {
                debug!(%block, "unreachable block removed");
            }

            graph.clear_block(block);

            continue;
        }

        if graph.block(block).kind().is_join_like() {
            prune_phis(graph, options, fixpoint, block);
        }

        for phi in graph.block(block).phis().to_vec() {
            if replace_with_constant(graph, fixpoint, phi, tracing) {
                graph.remove_phi(phi);
            }
        }

        let insts: Vec<Inst> = graph.insts_in_block(block).collect();

        for inst in insts {
            if replace_with_constant(graph, fixpoint, inst, tracing) {
                graph.remove_inst(inst);
            } else if let Some(operand) = bool_test_operand(graph, inst) {
                if tracing {
                    debug!(compare = %inst, %operand, "bool test replaced by its operand");
                }

                graph.replace_uses_with(inst, operand);
                graph.remove_inst(inst);
            }
        }

        rewrite_decided_branch(graph, fixpoint, block, tracing);
    }

    graph.discover_blocks();
    graph.merge_blocks();
    graph.compute_dominators();
}

fn prune_phis(graph: &mut FlowGraph, options: &CompilerOptions, fixpoint: &Fixpoint, block: Block) {
    let before = graph.block(block).predecessors().len();
    let live = graph.retain_predecessors(block, |pred| fixpoint.reachable.contains(pred));

    for phi in graph.block(block).phis().to_vec() {
        if !fixpoint.unwrapped_phis.contains(phi) {
            continue;
        }

        // a strict compare was folded assuming the phi is the same value as
        // its input, so it has to actually become that input
        if let Some(input) = unwrap_phi(graph, &fixpoint.reachable, phi) {
            graph.replace_uses_with(phi, input);
            graph.remove_phi(phi);
        }
    }

    if live < before && live == 1 && options.remove_redundant_phis {
        for phi in graph.block(block).phis().to_vec() {
            let input = graph.input(phi, 0);

            graph.replace_uses_with(phi, input);
            graph.remove_phi(phi);
        }
    }
}

fn replace_with_constant(graph: &mut FlowGraph, fixpoint: &Fixpoint, def: Inst, tracing: bool) -> bool {
    let value = match fixpoint.value(def).as_constant() {
        Some(value) => value.clone(),
        None => return false,
    };

    let data = graph.data(def);

    // an integer op only gets a constant value when it cannot throw
    let removable = data.is_binary_integer_op() || !has_side_effect(graph, def);

    if data.is_constant() || !removable || !(value.is_smi(graph.word_size()) || value.is_canonical()) {
        return false;
    }

    if tracing {
        debug!(%def, %value, "replaced with constant");
    }

    let constant = graph.get_constant(value);

    graph.replace_uses_with(def, constant);

    true
}

fn rewrite_decided_branch(graph: &mut FlowGraph, fixpoint: &Fixpoint, block: Block, tracing: bool) {
    let term = match graph.terminator(block) {
        Some(term) => term,
        None => return,
    };

    let (true_target, false_target) = match graph.data(term) {
        InstData::Branch {
            true_target,
            false_target,
            ..
        } => (*true_target, *false_target),
        _ => return,
    };

    let survivor = match (
        fixpoint.reachable.contains(true_target),
        fixpoint.reachable.contains(false_target),
    ) {
        (true, false) => true_target,
        (false, true) => false_target,
        _ => return,
    };

    if tracing {
        debug!(%block, target = %survivor, "branch replaced with goto");
    }

    let condition = graph.input(term, 0);

    graph.replace_terminator_with_goto(block, survivor);
    graph.set_block_kind(survivor, BlockKind::Join);
    remove_if_dead(graph, condition);
}

/// Removes `def` if it is a normal instruction that nothing uses anymore and
/// that has no side effects.
pub(super) fn remove_if_dead(graph: &mut FlowGraph, def: Inst) {
    let data = graph.data(def);

    if !graph.is_attached(def)
        || graph.inst(def).has_uses()
        || data.is_phi()
        || data.is_constant()
        || data.is_parameter()
        || has_side_effect(graph, def)
    {
        return;
    }

    graph.remove_inst(def);
}
