//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::context::CompilationContext;
use crate::ir::{CompileType, FlowGraph};
use crate::pass::{GraphTransformPass, PreservedAnalyses};

/// Recomputes the static type of every definition.
///
/// Parameters keep whatever type they were given. Everything else starts
/// out as [`CompileType::none`] and is recomputed from its inputs in reverse
/// postorder until nothing changes, so loop phis end up with the union of
/// what actually flows into them instead of whatever they started with.
pub struct TypePropagationPass;

impl GraphTransformPass for TypePropagationPass {
    fn name(&self) -> &'static str {
        "type-propagation"
    }

    fn run(&mut self, graph: &mut FlowGraph, _: &mut CompilationContext) -> PreservedAnalyses {
        propagate_types(graph);

        PreservedAnalyses::all()
    }
}

/// Runs type propagation to a fixpoint. Returns the number of sweeps over
/// the graph it took.
pub fn propagate_types(graph: &mut FlowGraph) -> usize {
    let defs = graph.definitions();
    let mut sweeps = 0;

    for def in defs.iter().copied() {
        if !graph.data(def).is_parameter() {
            graph.set_type(def, CompileType::none());
        }
    }

    loop {
        let mut changed = false;

        sweeps += 1;

        for def in defs.iter().copied() {
            if graph.data(def).is_parameter() {
                continue;
            }

            let ty = graph.compute_type(def);

            if ty != graph.ty(def) {
                graph.set_type(def, ty);
                changed = true;
            }
        }

        if !changed {
            break sweeps;
        }
    }
}
