//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{BlockOrders, DominatorTree};
use crate::context::CompilationContext;
use crate::ir::FlowGraph;
use crate::pass::*;
use crate::transforms::verify_graph_panic;
use tracing::debug;

/// Manages running a set of passes over a graph.
///
/// After each pass, any graph-resident analysis the pass did not preserve
/// (block orders and dominators) is recomputed, so the next pass always
/// sees an up-to-date graph. If [`CompilerOptions::verify_after_passes`] is
/// set, the graph is also verified after every pass.
///
/// An important note is that this is actually a pass itself, it's a pass
/// that simply runs other passes.
///
/// [`CompilerOptions::verify_after_passes`]: crate::context::CompilerOptions::verify_after_passes
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn GraphTransformPass>>,
}

impl PassManager {
    /// Creates a new, empty, pass manager.
    pub fn new() -> Self {
        Self {
            passes: Vec::default(),
        }
    }

    /// Adds a transformation pass to the pass manager. This pass's order is defined
    /// relative to other calls to [`Self::add_pass`].
    pub fn add_pass<T: GraphTransformPass + 'static>(&mut self, pass: T) {
        self.passes.push(Box::new(pass));
    }

    /// The number of passes that will be run.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Whether no passes have been added.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl GraphTransformPass for PassManager {
    fn name(&self) -> &'static str {
        "pass-manager"
    }

    fn run(&mut self, graph: &mut FlowGraph, ctx: &mut CompilationContext) -> PreservedAnalyses {
        let mut preserved = PreservedAnalyses::all();

        for pass in self.passes.iter_mut() {
            debug!(pass = pass.name(), "running pass");

            let other = pass.run(graph, ctx);

            if !other.is_preserved::<BlockOrders>() {
                graph.discover_blocks();
            }

            if !other.is_preserved::<DominatorTree>() {
                graph.compute_dominators();
            }

            if ctx.options().verify_after_passes {
                verify_graph_panic(graph, pass.name());
            }

            preserved = preserved.intersect(other)
        }

        preserved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilerOptions;
    use crate::ir::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingPass {
        runs: Rc<Cell<u32>>,
    }

    impl GraphTransformPass for CountingPass {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run(&mut self, _: &mut FlowGraph, _: &mut CompilationContext) -> PreservedAnalyses {
            self.runs.set(self.runs.get() + 1);

            let mut preserved = PreservedAnalyses::none();
            preserved.preserve::<BlockOrders>();
            preserved
        }
    }

    #[test]
    fn runs_passes_in_order_and_intersects() {
        let mut ctx = CompilationContext::new(CompilerOptions {
            verify_after_passes: true,
            ..CompilerOptions::default()
        });
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);

        b.switch_to(entry);
        b.append().ret(x);

        let mut graph = b.finish();
        let runs = Rc::new(Cell::new(0));
        let mut pm = PassManager::new();

        pm.add_pass(CountingPass { runs: runs.clone() });
        pm.add_pass(CountingPass { runs: runs.clone() });

        let preserved = pm.run(&mut graph, &mut ctx);

        assert_eq!(pm.len(), 2);
        assert_eq!(runs.get(), 2);
        assert!(preserved.is_preserved::<BlockOrders>());
        assert!(!preserved.is_preserved::<DominatorTree>());
        assert_eq!(graph.block(entry).dominator(), Some(graph.graph_entry()));
    }
}
