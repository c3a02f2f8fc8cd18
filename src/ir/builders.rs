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
use crate::ir::*;

/// Builds a [`FlowGraph`] one block at a time.
///
/// The builder owns the graph until [`Self::finish`] is called, at which
/// point block orders and dominators are computed and the graph is handed
/// back. Every instruction built through [`Self::append`] gets a fresh
/// deoptimization id from the context.
///
/// Phi inputs are given in predecessor order, and predecessors are always
/// sorted by block id. A join with predecessors `B1` and `B3` takes the
/// input flowing from `B1` first.
///
/// ```
/// # use onyx::context::CompilationContext;
/// # use onyx::ir::*;
/// let mut ctx = CompilationContext::default();
/// let mut builder = GraphBuilder::new(&mut ctx);
/// let entry = builder.function_entry();
/// let three = builder.iconst(3);
/// let four = builder.iconst(4);
///
/// builder.switch_to(entry);
/// let sum = builder.append().iadd(three, four);
/// builder.append().ret(sum);
///
/// let graph = builder.finish();
/// assert_eq!(graph.reverse_postorder().count(), 2);
/// ```
pub struct GraphBuilder<'c> {
    graph: FlowGraph,
    ctx: &'c mut CompilationContext,
    current: Option<Block>,
}

impl<'c> GraphBuilder<'c> {
    /// Creates a builder for a graph with a graph entry and a function entry.
    pub fn new(ctx: &'c mut CompilationContext) -> Self {
        let mut graph = FlowGraph::new(ctx.options().word_size);
        let entry = graph.create_block(BlockKind::FunctionEntry, None);

        Self {
            graph,
            ctx,
            current: Some(entry),
        }
    }

    /// The function entry created by [`Self::new`].
    pub fn function_entry(&self) -> Block {
        match self.graph.function_entry() {
            Some(entry) => entry,
            None => unreachable!("builder always creates a function entry"),
        }
    }

    /// Gets the graph being built.
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    /// Gets mutable access to the graph being built.
    pub fn graph_mut(&mut self) -> &mut FlowGraph {
        &mut self.graph
    }

    /// Creates a new block outside of any try region.
    pub fn create_block(&mut self, kind: BlockKind) -> Block {
        self.graph.create_block(kind, None)
    }

    /// Creates a new block inside the try region `try_index`.
    pub fn create_block_in_try(&mut self, kind: BlockKind, try_index: u32) -> Block {
        self.graph.create_block(kind, Some(try_index))
    }

    /// Makes `block` the block that [`Self::append`] adds to.
    pub fn switch_to(&mut self, block: Block) {
        self.current = Some(block);
    }

    /// The block currently being appended to.
    pub fn current_block(&self) -> Option<Block> {
        self.current
    }

    /// Gets a builder that appends to the end of the current block.
    pub fn append(&mut self) -> AppendBuilder<'_> {
        let block = match self.current {
            Some(block) => block,
            None => panic!("cannot append without a current block"),
        };
        let deopt_id = self.ctx.next_deopt_id();

        AppendBuilder::new(&mut self.graph, block, Some(deopt_id))
    }

    /// Gets a builder that inserts directly after `inst`.
    pub fn insert_after(&mut self, inst: Inst) -> InsertBuilder<'_> {
        let deopt_id = self.ctx.next_deopt_id();

        InsertBuilder::new(&mut self.graph, inst, Some(deopt_id))
    }

    /// Adds parameter `index` to an entry block, with an unknown type.
    pub fn parameter(&mut self, block: Block, index: u32) -> Inst {
        self.graph
            .add_initial_definition(block, InstData::Parameter(index))
    }

    /// Adds parameter `index` to an entry block, with a known type.
    pub fn typed_parameter(&mut self, block: Block, index: u32, ty: CompileType) -> Inst {
        let param = self.parameter(block, index);

        self.graph.set_type(param, ty);

        param
    }

    /// Gets the constant node for `value`.
    pub fn constant(&mut self, value: ConstValue) -> Inst {
        self.graph.get_constant(value)
    }

    /// Gets the constant node for an integer.
    pub fn iconst(&mut self, value: i64) -> Inst {
        self.constant(ConstValue::Int(value))
    }

    /// Gets the constant node for a boolean.
    pub fn bconst(&mut self, value: bool) -> Inst {
        self.constant(ConstValue::Bool(value))
    }

    /// Gets the constant node for `null`.
    pub fn null(&mut self) -> Inst {
        self.constant(ConstValue::Null)
    }

    /// Adds a phi to a join. `inputs` are in predecessor order.
    pub fn phi(&mut self, block: Block, inputs: &[Inst]) -> Inst {
        self.graph.add_phi(block, inputs)
    }

    /// Replaces the input list of an existing phi. Loop phis are usually
    /// created before the back edge value exists.
    pub fn set_phi_inputs(&mut self, phi: Inst, inputs: &[Inst]) {
        debug_assert!(self.graph.data(phi).is_phi());

        self.graph.set_inputs(phi, inputs);
        self.graph.refine_type(phi);
    }

    /// Sets the deoptimization environment of an instruction.
    pub fn set_env(&mut self, inst: Inst, env: &[Inst]) {
        self.graph.set_env(inst, env);
    }

    /// Computes block orders and dominators and returns the finished graph.
    pub fn finish(mut self) -> FlowGraph {
        self.graph.discover_blocks();
        self.graph.compute_dominators();
        self.graph
    }
}
