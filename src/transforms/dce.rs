//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondarySet;
use crate::context::CompilationContext;
use crate::ir::{Block, FlowGraph, Inst};
use crate::pass::{GraphTransformPass, PreservedAnalyses};
use crate::transforms::common::has_side_effect;

/// Aggressive dead code elimination.
///
/// Everything is assumed dead until proven otherwise: instructions with side
/// effects are the roots, and anything they read (as an input or through a
/// deoptimization environment) is live. Dead phis and dead instructions are
/// removed, parameters and constants are left alone.
pub struct DeadCodeEliminationPass;

impl GraphTransformPass for DeadCodeEliminationPass {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run(&mut self, graph: &mut FlowGraph, _: &mut CompilationContext) -> PreservedAnalyses {
        eliminate_dead_code(graph);

        // control flow is never touched
        PreservedAnalyses::all()
    }
}

/// Removes every phi and instruction whose result is never needed. Returns
/// whether anything was removed.
pub fn eliminate_dead_code(graph: &mut FlowGraph) -> bool {
    let blocks: Vec<Block> = graph.reverse_postorder().collect();
    let mut live = SecondarySet::new();
    let mut worklist = Vec::new();

    for block in blocks.iter().copied() {
        for inst in graph.insts_in_block(block) {
            if has_side_effect(graph, inst) && live.insert(inst) {
                worklist.push(inst);
            }
        }
    }

    while let Some(inst) = worklist.pop() {
        let node = graph.inst(inst);

        for input in node.inputs().iter().chain(node.env()).copied() {
            if live.insert(input) {
                worklist.push(input);
            }
        }
    }

    let mut changed = false;

    for block in blocks {
        for phi in graph.block(block).phis().to_vec() {
            if !live.contains(phi) {
                graph.remove_phi(phi);
                changed = true;
            }
        }

        let dead: Vec<Inst> = graph
            .insts_in_block(block)
            .filter(|inst| !live.contains(*inst))
            .collect();

        changed |= !dead.is_empty();

        for inst in dead {
            graph.remove_inst(inst);
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    #[test]
    fn removes_unused_pure_code() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let one = b.iconst(1);

        b.switch_to(entry);
        let unused = b.append().iadd(x, one);
        let also_unused = b.append().imul(unused, unused);
        let check = b.append().check_null(x);
        let in_env = b.append().isub(x, one);
        let call = b
            .append()
            .static_call(CallTarget::Function("effect".into()), &[]);
        b.set_env(call, &[in_env]);
        let ret = b.append().ret(x);

        let mut graph = b.finish();

        assert!(eliminate_dead_code(&mut graph));
        assert!(!graph.is_attached(unused));
        assert!(!graph.is_attached(also_unused));
        assert!(graph.is_attached(check));
        assert!(graph.is_attached(in_env));
        assert!(graph.is_attached(call));
        assert!(graph.is_attached(ret));
        assert!(graph.is_attached(one));
        assert!(!eliminate_dead_code(&mut graph));
    }

    #[test]
    fn removes_dead_loop_phis() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let one = b.iconst(1);
        let header = b.create_block(BlockKind::Join);
        let body = b.create_block(BlockKind::Target);
        let exit = b.create_block(BlockKind::Target);

        b.switch_to(entry);
        b.append().goto(header);

        let counter = b.phi(header, &[]);

        b.switch_to(header);
        b.append().branch(x, body, exit);
        b.switch_to(body);
        let next = b.append().iadd(counter, one);
        b.append().goto(header);
        b.switch_to(exit);
        b.append().ret(x);
        b.set_phi_inputs(counter, &[x, next]);

        let mut graph = b.finish();

        assert!(eliminate_dead_code(&mut graph));
        assert!(!graph.is_attached(counter));
        assert!(!graph.is_attached(next));
        assert!(graph.block(header).phis().is_empty());
    }
}
