//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Sparse conditional constant propagation.
//!
//! This is the Wegman-Zadeck algorithm: an optimistic analysis that assumes
//! every block is unreachable and every value is unknown until proven
//! otherwise, run over SSA use edges instead of over the whole graph. Values
//! and reachability are solved together, so constants that only exist
//! because a branch is never taken are still found.
//!
//! Once the analysis reaches its fixpoint, the graph is rewritten: unreachable
//! blocks are removed, definitions with a constant value are replaced by the
//! constant, and branches with a single reachable side become jumps.

mod analysis;
mod branches;
mod lattice;
mod transform;

pub use lattice::LatticeValue;

use crate::analysis::{BlockOrders, DominatorTree};
use crate::context::CompilationContext;
use crate::ir::FlowGraph;
use crate::pass::{GraphTransformPass, PreservedAnalyses};
use analysis::Analyzer;

/// Entry points for constant propagation.
pub struct ConstantPropagator;

impl ConstantPropagator {
    /// Analyzes the graph and rewrites it with everything that was found.
    ///
    /// The graph must be well-formed and have up-to-date block orders. When
    /// this returns, block orders and dominators have been recomputed.
    ///
    /// # Panics
    /// Panics if the analysis fails to converge, see
    /// [`CompilerOptions::phi_visit_factor`](crate::context::CompilerOptions::phi_visit_factor).
    pub fn optimize(graph: &mut FlowGraph, ctx: &CompilationContext) {
        let fixpoint = Analyzer::new(graph, ctx.options()).analyze();

        transform::transform(graph, ctx.options(), &fixpoint);
    }

    /// Like [`Self::optimize`], but afterwards also replaces branches whose
    /// two sides lead to the same place with jumps.
    pub fn optimize_branches(graph: &mut FlowGraph, ctx: &CompilationContext) {
        Self::optimize(graph, ctx);

        branches::eliminate_redundant_branches(graph, ctx.options());
    }
}

fn recomputed_orders() -> PreservedAnalyses {
    let mut preserved = PreservedAnalyses::none();

    preserved.preserve::<BlockOrders>();
    preserved.preserve::<DominatorTree>();
    preserved
}

/// Runs [`ConstantPropagator::optimize`] over a graph.
pub struct ConstantPropagationPass;

impl GraphTransformPass for ConstantPropagationPass {
    fn name(&self) -> &'static str {
        "sccp"
    }

    fn run(&mut self, graph: &mut FlowGraph, ctx: &mut CompilationContext) -> PreservedAnalyses {
        ConstantPropagator::optimize(graph, ctx);

        recomputed_orders()
    }
}

/// Runs [`ConstantPropagator::optimize_branches`] over a graph.
pub struct BranchSimplificationPass;

impl GraphTransformPass for BranchSimplificationPass {
    fn name(&self) -> &'static str {
        "sccp-branches"
    }

    fn run(&mut self, graph: &mut FlowGraph, ctx: &mut CompilationContext) -> PreservedAnalyses {
        ConstantPropagator::optimize_branches(graph, ctx);

        recomputed_orders()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::GraphWriter;
    use crate::context::CompilerOptions;
    use crate::ir::*;
    use std::fmt::Write;
    use std::sync::mpsc;
    use threadpool::ThreadPool;

    fn assert_graph(graph: &FlowGraph, expected: &str) {
        let actual = GraphWriter::from(graph).graph().to_owned();

        if actual == expected {
            return;
        }

        let mut out = String::new();

        for line in diff::lines(expected, &actual) {
            let _ = match line {
                diff::Result::Left(l) => writeln!(out, "-{l}"),
                diff::Result::Both(l, _) => writeln!(out, " {l}"),
                diff::Result::Right(r) => writeln!(out, "+{r}"),
            };
        }

        panic!("graph does not match expected text:\n{out}");
    }

    fn optimize(graph: &mut FlowGraph) {
        ConstantPropagator::optimize(graph, &CompilationContext::default());
    }

    fn sum_of_constants() -> FlowGraph {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let three = b.iconst(3);
        let four = b.iconst(4);

        b.switch_to(entry);
        let sum = b.append().iadd(three, four);
        b.append().ret(sum);

        b.finish()
    }

    #[test]
    fn folds_integer_arithmetic() {
        let mut graph = sum_of_constants();

        optimize(&mut graph);

        assert_graph(
            &graph,
            "B0[graph entry]\n\
             \x20 v0 <- Constant(#3)\n\
             \x20 v1 <- Constant(#4)\n\
             \x20 v4 <- Constant(#7)\n\
             B1[function entry]\n\
             \x20 Return(v4)\n",
        );
    }

    #[test]
    fn multiplication_by_zero_ignores_other_side() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let zero = b.iconst(0);

        b.switch_to(entry);
        let product = b.append().imul(x, zero);
        let masked = b.append().iand(zero, x);
        let sum = b.append().iadd(product, masked);
        let ret = b.append().ret(sum);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(!graph.is_attached(product));
        assert!(!graph.is_attached(masked));
        assert!(!graph.is_attached(sum));
        assert_eq!(graph.inst(ret).inputs(), [zero]);
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let one = b.iconst(1);
        let zero = b.iconst(0);

        b.switch_to(entry);
        let quotient = b
            .append()
            .binary_int_op(BinaryOp::TruncDiv, Representation::Tagged, one, zero);
        let ret = b.append().ret(quotient);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(graph.is_attached(quotient));
        assert_eq!(graph.inst(ret).inputs(), [quotient]);
    }

    #[test]
    fn results_are_truncated_to_their_representation() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let max = b.iconst(i32::MAX as i64);
        let one = b.iconst(1);

        b.switch_to(entry);
        let sum = b
            .append()
            .binary_int_op(BinaryOp::Add, Representation::Int32, max, one);
        let ret = b.append().ret(sum);

        let mut graph = b.finish();

        optimize(&mut graph);

        let result = graph.input(ret, 0);

        assert_eq!(
            graph.data(result).as_constant(),
            Some(&ConstValue::Int(i32::MIN as i64))
        );
    }

    #[test]
    fn folds_doubles() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let a = b.constant(ConstValue::double(1.5));
        let two = b.constant(ConstValue::double(2.0));

        b.switch_to(entry);
        let product = b.append().binary_double_op(DoubleOp::Mul, a, two);
        let less = b.append().compare(ComparisonKind::Lt, product, two);
        let ret = b.append().ret(less);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(!graph.is_attached(product));
        assert_eq!(
            graph.data(graph.input(ret, 0)).as_constant(),
            Some(&ConstValue::Bool(false))
        );
    }

    #[test]
    fn loads_from_constants() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let array = b.constant(ConstValue::immutable_array(vec![
            ConstValue::Int(10),
            ConstValue::Int(20),
        ]));
        let string = b.constant(ConstValue::string("héllo"));
        let one = b.iconst(1);
        let five = b.iconst(5);

        b.switch_to(entry);
        let element = b.append().load_indexed(array, one);
        let out_of_bounds = b.append().load_indexed(array, five);
        let length = b.append().load_field(Slot::StringLength, string);
        let called = b
            .append()
            .static_call(CallTarget::Recognized(RecognizedKind::StringLength), &[string]);
        let sum = b.append().iadd(element, length);
        let total = b.append().iadd(sum, called);
        let ret = b.append().ret(total);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert_eq!(
            graph.data(graph.input(ret, 0)).as_constant(),
            Some(&ConstValue::Int(30))
        );
        assert!(graph.is_attached(out_of_bounds));
    }

    #[test]
    fn bounds_checks_are_never_removed() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let length = b.iconst(3);
        let index = b.iconst(1);

        b.switch_to(entry);
        let bound = b.append().check_array_bound(length, index);
        let generic = b.append().generic_check_bound(length, bound);
        let ret = b.append().ret(generic);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(graph.is_attached(bound));
        assert!(graph.is_attached(generic));
        assert_eq!(graph.inst(ret).inputs(), [generic]);
    }

    fn self_referential_loop() -> FlowGraph {
        //
        // B1: goto B2
        // B2: v2 <- phi(v0, v2)
        //     branch v2 === v0 ? B4 : B3
        // B3: goto B2
        // B4: return v2
        //
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let header = b.create_block(BlockKind::Join);
        let back = b.create_block(BlockKind::Target);
        let exit = b.create_block(BlockKind::Target);
        let zero = b.iconst(0);

        b.switch_to(entry);
        b.append().goto(header);

        let phi = b.phi(header, &[]);

        b.switch_to(header);
        let cond = b.append().strict_compare(StrictKind::Identical, phi, zero);
        b.append().branch(cond, exit, back);
        b.switch_to(back);
        b.append().goto(header);
        b.switch_to(exit);
        b.append().ret(phi);
        b.set_phi_inputs(phi, &[zero, phi]);

        b.finish()
    }

    #[test]
    fn loop_phi_compared_with_its_input_collapses() {
        let mut graph = self_referential_loop();

        optimize(&mut graph);

        assert_graph(
            &graph,
            "B0[graph entry]\n\
             \x20 v0 <- Constant(#0)\n\
             \x20 v7 <- Constant(#true)\n\
             B1[function entry]\n\
             \x20 Return(v0)\n",
        );
    }

    #[test]
    fn constant_branch_removes_dead_side() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let truthy = b.bconst(true);
        let taken = b.create_block(BlockKind::Target);
        let dead = b.create_block(BlockKind::Target);
        let join = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        let negated = b.append().boolean_negate(truthy);
        b.append().branch(negated, dead, taken);
        b.switch_to(dead);
        let call = b
            .append()
            .static_call(CallTarget::Function("effect".into()), &[x]);
        b.append().goto(join);
        b.switch_to(taken);
        b.append().goto(join);

        let phi = b.phi(join, &[x, call]);

        b.switch_to(join);
        let ret = b.append().ret(phi);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(!graph.is_attached(call));
        assert!(!graph.is_attached(phi));
        assert_eq!(graph.inst(ret).inputs(), [x]);
        assert_eq!(graph.reverse_postorder().count(), 2);
        assert_eq!(graph.inst_block(ret), Some(entry));
    }

    #[test]
    fn redundant_phi_removal_is_optional() {
        for remove in [true, false] {
            let mut ctx = CompilationContext::new(CompilerOptions {
                remove_redundant_phis: remove,
                ..CompilerOptions::default()
            });
            let mut b = GraphBuilder::new(&mut ctx);
            let entry = b.function_entry();
            let x = b.parameter(entry, 0);
            let y = b.parameter(entry, 1);
            let falsy = b.bconst(false);
            let left = b.create_block(BlockKind::Target);
            let right = b.create_block(BlockKind::Target);

            // a different try region keeps the join from being merged away
            let join = b.create_block_in_try(BlockKind::Join, 0);

            b.switch_to(entry);
            b.append().branch(falsy, left, right);
            b.switch_to(left);
            b.append().goto(join);
            b.switch_to(right);
            b.append().goto(join);

            let phi = b.phi(join, &[x, y]);

            b.switch_to(join);
            let ret = b.append().ret(phi);

            let mut graph = b.finish();

            ConstantPropagator::optimize(&mut graph, &ctx);

            assert_eq!(graph.is_attached(phi), !remove);
            assert_eq!(graph.block(join).predecessors().len(), 1);

            if remove {
                assert_eq!(graph.inst(ret).inputs(), [y]);
            } else {
                assert_eq!(graph.inst(phi).inputs(), [y]);
            }
        }
    }

    #[test]
    fn bool_tests_become_their_operand() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let flag = b.typed_parameter(entry, 0, CompileType::bool());
        let any = b.parameter(entry, 1);
        let truthy = b.bconst(true);
        let falsy = b.bconst(false);

        b.switch_to(entry);
        let is_true = b.append().strict_compare(StrictKind::Identical, flag, truthy);
        let not_false = b
            .append()
            .strict_compare(StrictKind::NotIdentical, falsy, is_true);
        let untyped = b.append().strict_compare(StrictKind::Identical, any, truthy);
        b.append().static_call(CallTarget::Function("use".into()), &[untyped]);
        let ret = b.append().ret(not_false);

        let mut graph = b.finish();

        optimize(&mut graph);

        assert!(!graph.is_attached(is_true));
        assert!(!graph.is_attached(not_false));
        assert!(graph.is_attached(untyped));
        assert_eq!(graph.inst(ret).inputs(), [flag]);
    }

    #[test]
    fn strict_compares_use_types() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let smi = b.typed_parameter(entry, 0, CompileType::smi());
        let string = b.typed_parameter(entry, 1, CompileType::string());
        let null = b.null();

        b.switch_to(entry);
        let mixed = b.append().strict_compare(StrictKind::Identical, smi, string);
        let with_null = b
            .append()
            .strict_compare(StrictKind::NotIdentical, null, string);
        let same = b.append().strict_compare(StrictKind::Identical, smi, smi);
        b.append().static_call(CallTarget::Function("use".into()), &[mixed, with_null, same]);
        b.append().ret(smi);

        let mut graph = b.finish();
        let fixpoint = Analyzer::new(&graph, ctx.options()).analyze();

        assert_eq!(*fixpoint.value(mixed), LatticeValue::Constant(ConstValue::Bool(false)));
        assert_eq!(*fixpoint.value(with_null), LatticeValue::Constant(ConstValue::Bool(true)));
        assert_eq!(*fixpoint.value(same), LatticeValue::Constant(ConstValue::Bool(true)));

        optimize(&mut graph);

        assert!(!graph.is_attached(mixed));
    }

    fn diamond(with_phi: bool) -> (FlowGraph, Block) {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let y = b.parameter(entry, 1);
        let left = b.create_block(BlockKind::Target);
        let right = b.create_block(BlockKind::Target);
        let join = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        let cond = b.append().strict_compare(StrictKind::Identical, x, y);
        b.append().branch(cond, left, right);
        b.switch_to(left);
        b.append().goto(join);
        b.switch_to(right);
        b.append().goto(join);
        b.switch_to(join);

        if with_phi {
            let phi = b.phi(join, &[x, y]);

            b.switch_to(join);
            b.append().ret(phi);
        } else {
            b.append().ret(x);
        }

        (b.finish(), entry)
    }

    #[test]
    fn redundant_branch_is_eliminated() {
        let (mut graph, _) = diamond(false);

        ConstantPropagator::optimize_branches(&mut graph, &CompilationContext::default());

        assert_graph(
            &graph,
            "B0[graph entry]\n\
             B1[function entry]\n\
             \x20 v0 <- Parameter(0)\n\
             \x20 v1 <- Parameter(1)\n\
             \x20 Return(v0)\n",
        );
    }

    #[test]
    fn branch_into_join_with_phis_is_kept() {
        let (mut graph, entry) = diamond(true);
        let before = GraphWriter::from(&graph).graph().to_owned();

        ConstantPropagator::optimize_branches(&mut graph, &CompilationContext::default());

        assert_graph(&graph, &before);
        assert!(graph
            .terminator(entry)
            .map_or(false, |term| graph.data(term).is_branch()));
    }

    #[test]
    fn second_run_changes_nothing() {
        for mut graph in [self_referential_loop(), sum_of_constants(), diamond(false).0] {
            let ctx = CompilationContext::default();

            ConstantPropagator::optimize_branches(&mut graph, &ctx);

            let once = GraphWriter::from(&graph).graph().to_owned();
            let count = graph.inst_count();

            ConstantPropagator::optimize_branches(&mut graph, &ctx);

            assert_graph(&graph, &once);
            assert_eq!(graph.inst_count(), count);
        }
    }

    fn join_with_predecessors(k: usize) -> (FlowGraph, Inst) {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let join = b.create_block(BlockKind::Join);
        let mut current = entry;

        // a chain of branches, every one of which jumps into the join on one side
        for _ in 1..k {
            let taken = b.create_block(BlockKind::Target);
            let next = b.create_block(BlockKind::Target);

            b.switch_to(current);
            b.append().branch(x, taken, next);
            b.switch_to(taken);
            b.append().goto(join);
            current = next;
        }

        b.switch_to(current);
        b.append().goto(join);

        let inputs: Vec<Inst> = (0..k as i64).map(|i| b.iconst(i)).collect();

        assert_eq!(b.graph().block(join).predecessors().len(), k);

        let phi = b.phi(join, &inputs);

        b.switch_to(join);
        b.append().ret(phi);

        (b.finish(), phi)
    }

    #[test]
    fn phi_visits_are_bounded() {
        let options = CompilerOptions::default();

        for k in [1, 2, 5, 20] {
            let (graph, phi) = join_with_predecessors(k);
            let fixpoint = Analyzer::new(&graph, &options).analyze();
            let visits = fixpoint.phi_visits[phi];

            assert!(visits <= options.phi_visit_factor * k, "{visits} visits for {k} inputs");

            let expected = match k {
                1 => LatticeValue::Constant(ConstValue::Int(0)),
                _ => LatticeValue::NonConstant,
            };

            assert_eq!(*fixpoint.value(phi), expected);
        }

        let graph = self_referential_loop();
        let fixpoint = Analyzer::new(&graph, &options).analyze();

        for (phi, visits) in fixpoint.phi_visits.iter() {
            assert!(*visits <= options.phi_visit_factor * graph.inst(phi).inputs().len());
        }
    }

    #[test]
    #[should_panic(expected = "does not converge")]
    fn phi_visit_guard_trips() {
        let (graph, _) = join_with_predecessors(1);
        let options = CompilerOptions {
            phi_visit_factor: 1,
            ..CompilerOptions::default()
        };

        Analyzer::new(&graph, &options).analyze();
    }

    #[test]
    fn reachable_definitions_are_visited() {
        let graph = self_referential_loop();
        let fixpoint = Analyzer::new(&graph, &CompilerOptions::default()).analyze();

        // everything in a reachable block was visited at least once
        for def in graph.definitions() {
            let reachable = graph
                .inst_block(def)
                .map_or(false, |block| fixpoint.reachable.contains(block));

            assert_eq!(reachable, !fixpoint.value(def).is_unknown(), "{def}");
        }
    }

    struct LatePredecessor {
        graph: FlowGraph,
        phi: Inst,
        compare: Inst,
        bad: Block,
    }

    fn late_predecessor() -> LatePredecessor {
        //
        // B1: goto B2
        // B2: v4 <- phi(#true, #false)
        //     v5 <- f()
        //     branch v4 ? B3 : B6
        // B3: branch v0 ? B4 : B5
        // B4: goto B2
        // B5: goto B7
        // B6: goto B7
        // B7: v6 <- phi(v5, v1)
        //     branch v6 === v5 ? B8 : B9
        //
        // B6 only becomes reachable once the loop has gone around once,
        // which is after v6 was seen with a single reachable input
        //
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let c = b.parameter(entry, 0);
        let y = b.parameter(entry, 1);
        let yes = b.bconst(true);
        let no = b.bconst(false);
        let one = b.iconst(1);
        let two = b.iconst(2);
        let loop_header = b.create_block(BlockKind::Join);
        let body = b.create_block(BlockKind::Target);
        let latch = b.create_block(BlockKind::Target);
        let exit = b.create_block(BlockKind::Target);
        let late = b.create_block(BlockKind::Target);
        let join = b.create_block(BlockKind::Join);
        let ok = b.create_block(BlockKind::Target);
        let bad = b.create_block(BlockKind::Target);

        b.switch_to(entry);
        b.append().goto(loop_header);

        let first = b.phi(loop_header, &[]);

        b.switch_to(loop_header);
        let x = b
            .append()
            .static_call(CallTarget::Function("f".into()), &[]);
        b.append().branch(first, body, late);
        b.switch_to(body);
        b.append().branch(c, latch, exit);
        b.switch_to(latch);
        b.append().goto(loop_header);
        b.switch_to(exit);
        b.append().goto(join);
        b.switch_to(late);
        b.append().goto(join);
        b.set_phi_inputs(first, &[yes, no]);

        let phi = b.phi(join, &[x, y]);

        b.switch_to(join);
        let compare = b.append().strict_compare(StrictKind::Identical, phi, x);
        b.append().branch(compare, ok, bad);
        b.switch_to(ok);
        b.append().ret(one);
        b.switch_to(bad);
        b.append().ret(two);

        LatePredecessor {
            graph: b.finish(),
            phi,
            compare,
            bad,
        }
    }

    #[test]
    fn late_predecessor_undoes_compare_through_phi() {
        let LatePredecessor {
            mut graph,
            phi,
            compare,
            bad,
        } = late_predecessor();
        let fixpoint = Analyzer::new(&graph, &CompilerOptions::default()).analyze();

        assert_eq!(*fixpoint.value(phi), LatticeValue::NonConstant);
        assert_eq!(*fixpoint.value(compare), LatticeValue::NonConstant);
        assert!(!fixpoint.unwrapped_phis.contains(phi));
        assert!(fixpoint.reachable.contains(bad));

        optimize(&mut graph);

        let text = GraphWriter::from(&graph).graph().to_owned();

        assert_eq!(text.matches("Return(").count(), 2, "{text}");
        assert!(graph.is_attached(phi));
        assert!(graph.is_attached(compare));
    }

    #[test]
    fn lattice_values_only_move_up() {
        let options = CompilerOptions::default();
        let mut graphs = vec![
            self_referential_loop(),
            diamond(true).0,
            late_predecessor().graph,
        ];

        graphs.extend([1, 2, 5, 20].into_iter().map(|k| join_with_predecessors(k).0));

        for graph in graphs {
            let fixpoint = Analyzer::new(&graph, &options).analyze();

            assert!(!fixpoint.transitions.is_empty());

            for (def, old, new) in fixpoint.transitions.iter() {
                assert!(old.is_below_or_equal(new), "{def} went from {old} to {new}");
            }

            for (def, _, new) in fixpoint.transitions.iter() {
                assert!(new.is_below_or_equal(fixpoint.value(*def)), "{def} ended below {new}");
            }
        }
    }

    #[test]
    fn independent_graphs_optimize_in_parallel() {
        let pool = ThreadPool::new(4);
        let (tx, rx) = mpsc::channel();
        let jobs = 16;

        for i in 0..jobs {
            let tx = tx.clone();

            pool.execute(move || {
                let mut graph = if i % 2 == 0 {
                    sum_of_constants()
                } else {
                    self_referential_loop()
                };

                optimize(&mut graph);

                let _ = tx.send((i, GraphWriter::from(&graph).graph().to_owned()));
            });
        }

        drop(tx);

        let mut results: Vec<(usize, String)> = rx.iter().take(jobs).collect();

        results.sort();

        assert_eq!(results.len(), jobs);

        for (i, text) in results {
            let expected = if i % 2 == 0 { "v4 <- Constant(#7)" } else { "Return(v0)" };

            assert!(text.contains(expected), "{text}");
        }
    }
}
