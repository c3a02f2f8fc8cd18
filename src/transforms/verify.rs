//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis;
use crate::arena::SecondaryMap;
use crate::context::CompilationContext;
use crate::ir::*;
use crate::pass::*;
use smallvec::SmallVec;
use thiserror::Error;

/// A graph validity verification pass.
///
/// This scans every reachable block, and will do nothing if the graph is
/// valid. If the graph isn't valid, it will abort with an error.
pub struct VerifyGraphPass;

impl GraphTransformPass for VerifyGraphPass {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn run(&mut self, graph: &mut FlowGraph, _: &mut CompilationContext) -> PreservedAnalyses {
        verify_graph_panic(graph, self.name());

        PreservedAnalyses::all()
    }
}

/// A single problem found by [`verify_graph`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum VerifyError {
    /// A phi doesn't have exactly one input per predecessor.
    #[error("{phi} in {block} has {inputs} inputs, but the block has {preds} predecessors")]
    PhiInputCount {
        phi: Inst,
        block: Block,
        inputs: usize,
        preds: usize,
    },
    /// An input edge isn't recorded in the use list of the definition it reads.
    #[error("{user} reads {def}, but the use is missing from the use list of {def}")]
    MissingUse { def: Inst, user: Inst },
    /// A use list has an entry that the user doesn't agree with.
    #[error("the use list of {def} has a stale use by {user}")]
    StaleUse { def: Inst, user: Inst },
    /// An instruction reads a definition that was removed from the graph.
    #[error("{user} reads {def}, which is no longer in the graph")]
    DetachedInput { def: Inst, user: Inst },
    /// An instruction's idea of which block it is in is wrong.
    #[error("{inst} is listed in {expected} but is recorded as being in {actual:?}")]
    MisplacedInst {
        inst: Inst,
        expected: Block,
        actual: Option<Block>,
    },
    /// A reachable block doesn't end in a terminator.
    #[error("{block} does not end in a terminator")]
    MissingTerminator { block: Block },
    /// A terminator is followed by more instructions.
    #[error("terminator {inst} is in the middle of {block}")]
    TerminatorInMiddle { block: Block, inst: Inst },
    /// The recorded predecessors don't match the edges in the graph.
    #[error("{block} has predecessors {recorded:?}, but the edges into it come from {actual:?}")]
    PredecessorMismatch {
        block: Block,
        recorded: Vec<Block>,
        actual: Vec<Block>,
    },
    /// A definition is used somewhere it isn't available.
    #[error("{def} does not dominate its use in {user}")]
    DominanceViolation { def: Inst, user: Inst },
    /// A branch whose two sides are the same block.
    #[error("branch {inst} in {block} has {target} as both successors")]
    IdenticalSuccessors {
        block: Block,
        inst: Inst,
        target: Block,
    },
}

/// Verifies that every reachable part of a graph is well-formed.
///
/// This checks that use lists agree with input lists, that every phi matches
/// its block's predecessors, that every block ends in exactly one terminator,
/// that predecessors match the control-flow edges, and that every use is
/// dominated by its definition. The block orders and dominator tree must be
/// up to date.
pub fn verify_graph(graph: &FlowGraph) -> Result<(), Vec<VerifyError>> {
    let mut verifier = Verifier {
        graph,
        errors: Vec::default(),
        positions: SecondaryMap::new(),
    };

    verifier.walk();

    if verifier.errors.is_empty() {
        Ok(())
    } else {
        Err(verifier.errors)
    }
}

/// This is [`verify_graph`], except that it writes out the graph and any
/// errors and then panics on failure. `pass` names whatever ran last.
pub fn verify_graph_panic(graph: &FlowGraph, pass: &str) {
    if let Err(errors) = verify_graph(graph) {
        println!();
        analysis::print_graph(graph);
        println!();

        for error in errors.iter() {
            println!("error: {error}");
        }

        panic!("graph is invalid after `{pass}`, {} errors", errors.len());
    }
}

struct Verifier<'g> {
    graph: &'g FlowGraph,
    errors: Vec<VerifyError>,
    // position of each definition in its block. phis and initial
    // definitions come before everything else
    positions: SecondaryMap<Inst, usize>,
}

impl<'g> Verifier<'g> {
    fn walk(&mut self) {
        let graph = self.graph;

        for block in graph.preorder().iter().copied() {
            let data = graph.block(block);

            for inst in data.phis().iter().chain(data.initial_definitions()).copied() {
                self.positions.insert(inst, 0);
            }

            for (i, inst) in graph.insts_in_block(block).enumerate() {
                self.positions.insert(inst, i + 1);
            }
        }

        self.verify_predecessors();

        for block in graph.preorder().iter().copied() {
            self.verify_block(block);
        }
    }

    fn verify_predecessors(&mut self) {
        let graph = self.graph;
        let mut actual: SecondaryMap<Block, Vec<Block>> = SecondaryMap::new();

        for block in graph.preorder().iter().copied() {
            actual.get_or_insert_with(block, Vec::new);

            for succ in graph.successors(block) {
                actual.get_or_insert_with(succ, Vec::new).push(block);
            }
        }

        for block in graph.preorder().iter().copied() {
            let mut actual = actual.get(block).cloned().unwrap_or_default();

            actual.sort_unstable();
            actual.dedup();

            let recorded = graph.block(block).predecessors();

            if recorded != actual.as_slice() {
                self.errors.push(VerifyError::PredecessorMismatch {
                    block,
                    recorded: recorded.to_vec(),
                    actual,
                });
            }
        }
    }

    fn verify_block(&mut self, block: Block) {
        let graph = self.graph;
        let data = graph.block(block);
        let preds = data.predecessors();

        for phi in data.phis().iter().copied() {
            let inputs = graph.inst(phi).inputs();

            if inputs.len() != preds.len() {
                self.errors.push(VerifyError::PhiInputCount {
                    phi,
                    block,
                    inputs: inputs.len(),
                    preds: preds.len(),
                });
            }

            for (input, pred) in inputs.iter().zip(preds) {
                // a phi input only has to be available at the end of its predecessor
                if !self.is_available_at_end(*input, *pred) {
                    self.errors.push(VerifyError::DominanceViolation {
                        def: *input,
                        user: phi,
                    });
                }
            }

            self.verify_placement(phi, block);
            self.verify_uses(phi);
        }

        for def in data.initial_definitions().iter().copied() {
            self.verify_placement(def, block);
            self.verify_uses(def);
        }

        let mut last = None;

        for inst in graph.insts_in_block(block) {
            if graph.data(inst).is_terminator() && graph.inst_next(inst).is_some() {
                self.errors.push(VerifyError::TerminatorInMiddle { block, inst });
            }

            let node = graph.inst(inst);

            for def in node.inputs().iter().chain(node.env()).copied() {
                if graph.is_attached(def) && !self.dominates_use(def, inst, block) {
                    self.errors.push(VerifyError::DominanceViolation { def, user: inst });
                }
            }

            if let InstData::Branch {
                true_target,
                false_target,
                ..
            } = graph.data(inst)
            {
                if true_target == false_target {
                    self.errors.push(VerifyError::IdenticalSuccessors {
                        block,
                        inst,
                        target: *true_target,
                    });
                }
            }

            self.verify_placement(inst, block);
            self.verify_uses(inst);
            last = Some(inst);
        }

        // the graph entry is the only block without a terminator
        if block != graph.graph_entry() && !last.map_or(false, |inst| graph.data(inst).is_terminator()) {
            self.errors.push(VerifyError::MissingTerminator { block });
        }
    }

    fn verify_placement(&mut self, inst: Inst, expected: Block) {
        let actual = self.graph.inst_block(inst);

        if actual != Some(expected) {
            self.errors.push(VerifyError::MisplacedInst {
                inst,
                expected,
                actual,
            });
        }
    }

    // checks both directions of every edge touching `inst`: its inputs must
    // list it as a user, and its users must actually read it
    fn verify_uses(&mut self, inst: Inst) {
        let graph = self.graph;
        let node = graph.inst(inst);

        let inputs = node.inputs().iter().enumerate().map(|(i, def)| (*def, Use::input(inst, i)));
        let env = node.env().iter().enumerate().map(|(i, def)| (*def, Use::env(inst, i)));

        for (def, u) in inputs.chain(env) {
            if !graph.is_attached(def) {
                self.errors.push(VerifyError::DetachedInput { def, user: inst });
            }

            let def_node = graph.inst(def);
            let list = if u.is_env() {
                def_node.env_uses()
            } else {
                def_node.input_uses()
            };

            if !list.contains(&u) {
                self.errors.push(VerifyError::MissingUse { def, user: inst });
            }
        }

        let uses: SmallVec<[Use; 8]> = node
            .input_uses()
            .iter()
            .chain(node.env_uses())
            .copied()
            .collect();

        for u in uses {
            let user = graph.inst(u.user);
            let read = match u.slot {
                UseSlot::Input(i) => user.inputs().get(i as usize),
                UseSlot::Env(i) => user.env().get(i as usize),
            };

            if !graph.is_attached(u.user) || read != Some(&inst) {
                self.errors.push(VerifyError::StaleUse {
                    def: inst,
                    user: u.user,
                });
            }
        }
    }

    fn dominates_use(&self, def: Inst, user: Inst, block: Block) -> bool {
        let def_block = match self.graph.inst_block(def) {
            Some(def_block) => def_block,
            None => return false,
        };

        if def_block != block {
            return self.graph.dominates(def_block, block);
        }

        match (self.positions.get(def), self.positions.get(user)) {
            (Some(d), Some(u)) => d < u,
            _ => false,
        }
    }

    fn is_available_at_end(&self, def: Inst, block: Block) -> bool {
        match self.graph.inst_block(def) {
            Some(def_block) => self.graph.dominates(def_block, block),
            None => false,
        }
    }
}
