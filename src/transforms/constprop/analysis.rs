//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::format_inst;
use crate::arena::{SecondaryMap, SecondarySet};
use crate::context::CompilerOptions;
use crate::ir::*;
use crate::transforms::common::*;
use crate::transforms::constprop::LatticeValue;
use tracing::{debug, trace};

static UNKNOWN: LatticeValue = LatticeValue::Unknown;

/// The result of running the analysis to a fixpoint.
#[derive(Debug, Default)]
pub(super) struct Fixpoint {
    /// Every block that can execute.
    pub(super) reachable: SecondarySet<Block>,
    /// The value of every definition that was visited.
    pub(super) values: SecondaryMap<Inst, LatticeValue>,
    /// Phis that a strict compare was folded through, see [`unwrap_phi`].
    pub(super) unwrapped_phis: SecondarySet<Inst>,
    /// How many times each phi was visited.
    pub(super) phi_visits: SecondaryMap<Inst, usize>,
    /// Every value change, in order, as `(def, old, new)`.
    #[cfg(test)]
    pub(super) transitions: Vec<(Inst, LatticeValue, LatticeValue)>,
}

impl Fixpoint {
    /// Gets the value of a definition, definitions never visited are unknown.
    pub(super) fn value(&self, def: Inst) -> &LatticeValue {
        self.values.get(def).unwrap_or(&UNKNOWN)
    }
}

/// Computes the fixpoint of the sparse conditional constant propagation
/// lattice over a graph.
///
/// Two worklists drive the analysis. Blocks are visited once, when they
/// first become reachable. Definitions are put on the definition worklist
/// whenever their value changes, and every instruction reading them is
/// visited again.
pub(super) struct Analyzer<'g> {
    graph: &'g FlowGraph,
    options: CompilerOptions,
    fixpoint: Fixpoint,
    block_worklist: Vec<Block>,
    def_worklist: Vec<Inst>,
    in_def_worklist: SecondarySet<Inst>,
}

impl<'g> Analyzer<'g> {
    pub(super) fn new(graph: &'g FlowGraph, options: &CompilerOptions) -> Self {
        Self {
            graph,
            options: *options,
            fixpoint: Fixpoint::default(),
            block_worklist: Vec::new(),
            def_worklist: Vec::new(),
            in_def_worklist: SecondarySet::new(),
        }
    }

    /// Runs the analysis until both worklists are empty.
    pub(super) fn analyze(mut self) -> Fixpoint {
        let graph = self.graph;

        if self.options.trace_constant_propagation {
            debug!(
                blocks = graph.preorder().len(),
                insts = graph.inst_count(),
                "constant propagation: analyzing"
            );
        }

        self.set_reachable(graph.graph_entry());

        loop {
            while let Some(block) = self.block_worklist.pop() {
                self.visit_block(block);
            }

            match self.def_worklist.pop() {
                Some(def) => {
                    self.in_def_worklist.remove(def);
                    self.visit_uses(def);
                }
                None => break,
            }
        }

        if self.options.trace_constant_propagation {
            debug!(
                reachable = self.fixpoint.reachable.cardinality(),
                values = self.fixpoint.values.len(),
                "constant propagation: reached fixpoint"
            );
        }

        self.fixpoint
    }

    fn set_reachable(&mut self, block: Block) {
        if self.fixpoint.reachable.insert(block) {
            self.block_worklist.push(block);
        }
    }

    fn value(&self, def: Inst) -> LatticeValue {
        self.fixpoint.value(def).clone()
    }

    fn set_value(&mut self, def: Inst, value: LatticeValue) {
        {
            let old = self.fixpoint.value(def);

            if *old == value {
                return;
            }

            if self.options.trace_constant_propagation {
                trace!(%def, from = %old, to = %value, "lattice value changed");
            }

            #[cfg(test)]
            {
                let old = old.clone();

                self.fixpoint.transitions.push((def, old, value.clone()));
            }
        }

        self.fixpoint.values.insert(def, value);

        if !self.graph.inst(def).input_uses().is_empty() && self.in_def_worklist.insert(def) {
            self.def_worklist.push(def);
        }
    }

    fn visit_block(&mut self, block: Block) {
        let graph = self.graph;
        let data = graph.block(block);

        for phi in data.phis().iter().copied() {
            self.visit_phi(phi);
        }

        for def in data.initial_definitions().iter().copied() {
            self.visit_inst(def);
        }

        // the graph entry has no terminator, every entry is reachable from it
        if block == graph.graph_entry() {
            for succ in graph.successors(block) {
                self.set_reachable(succ);
            }
        }

        for inst in graph.insts_in_block(block) {
            self.visit_inst(inst);
        }
    }

    fn visit_uses(&mut self, def: Inst) {
        let graph = self.graph;

        for u in graph.inst(def).input_uses() {
            match graph.inst_block(u.user) {
                Some(block) if self.fixpoint.reachable.contains(block) => self.visit_inst(u.user),
                _ => {}
            }
        }
    }

    fn visit_phi(&mut self, phi: Inst) {
        let graph = self.graph;
        let inputs = graph.inst(phi).inputs();
        let limit = self.options.phi_visit_factor * inputs.len();
        let visits = {
            let count = self.fixpoint.phi_visits.get_or_insert_with(phi, || 0);

            *count += 1;
            *count
        };

        if visits > limit {
            panic!(
                "constant propagation does not converge: `{}` visited {visits} times, limit is {limit} for {} inputs",
                format_inst(graph, phi),
                inputs.len()
            );
        }

        let block = match graph.inst_block(phi) {
            Some(block) => block,
            None => return,
        };

        let mut value = LatticeValue::Unknown;

        for (pred, input) in graph.block(block).predecessors().iter().zip(inputs) {
            if self.fixpoint.reachable.contains(*pred) {
                value = value.join(self.fixpoint.value(*input));
            }
        }

        self.set_value(phi, value);
    }

    fn visit_inst(&mut self, inst: Inst) {
        let graph = self.graph;

        match graph.data(inst) {
            InstData::Phi => self.visit_phi(inst),
            InstData::Constant(value) => self.set_value(inst, LatticeValue::Constant(value.clone())),
            InstData::Redefinition => self.set_value(inst, self.value(graph.input(inst, 0))),
            InstData::BinaryIntegerOp { op, representation } => {
                self.visit_binary_integer_op(inst, *op, *representation)
            }
            InstData::UnaryIntegerOp { op, representation } => self.fold_unary(inst, |v| {
                let value = unary_integer_evaluate(*op, v.as_int()?, *representation);

                Some(ConstValue::Int(value))
            }),
            InstData::BinaryDoubleOp(op) => self.fold_binary(inst, |a, b| {
                let value = binary_double_evaluate(*op, a.as_double()?, b.as_double()?);

                Some(ConstValue::double(value))
            }),
            InstData::StrictCompare(kind) => self.visit_strict_compare(inst, *kind),
            InstData::Compare(kind) => {
                self.fold_binary(inst, |a, b| numeric_compare(*kind, a, b).map(ConstValue::Bool))
            }
            InstData::BooleanNegate => {
                self.fold_unary(inst, |v| Some(ConstValue::Bool(!v.as_bool()?)))
            }
            InstData::LoadField(slot) => self.fold_unary(inst, |v| load_field(*slot, v)),
            InstData::LoadIndexed => self.fold_binary(inst, load_indexed),
            InstData::LoadStaticField(field) => {
                let value = match &field.value {
                    Some(value) if field.is_final => LatticeValue::Constant(value.clone()),
                    _ => LatticeValue::NonConstant,
                };

                self.set_value(inst, value);
            }
            InstData::StaticCall(CallTarget::Recognized(kind)) => match kind {
                RecognizedKind::StringLength => self.fold_unary(inst, string_length),
                RecognizedKind::StringEquals => self.fold_binary(inst, |a, b| {
                    Some(ConstValue::Bool(a.as_str()? == b.as_str()?))
                }),
                RecognizedKind::IntegerAbs => {
                    self.fold_unary(inst, |v| Some(ConstValue::Int(v.as_int()?.wrapping_abs())))
                }
            },
            InstData::Goto(target) => self.visit_jump(*target),
            InstData::Branch {
                true_target,
                false_target,
                constant_target,
            } => {
                if let Some(target) = constant_target.expand() {
                    self.set_reachable(target);

                    return;
                }

                match self.value(graph.input(inst, 0)) {
                    LatticeValue::Unknown => {}
                    LatticeValue::Constant(ConstValue::Bool(true)) => {
                        self.set_reachable(*true_target)
                    }
                    LatticeValue::Constant(ConstValue::Bool(false)) => {
                        self.set_reachable(*false_target)
                    }
                    _ => {
                        self.set_reachable(*true_target);
                        self.set_reachable(*false_target);
                    }
                }
            }
            InstData::IndirectGoto(targets) => {
                for target in targets.iter().copied() {
                    self.visit_jump(target);
                }
            }
            // bounds and null checks are never folded away, even with constant
            // inputs. they have to stay where they are to throw or deoptimize
            data if data.has_result() => self.set_value(inst, LatticeValue::NonConstant),
            _ => {}
        }
    }

    // phis depend on which predecessors are reachable, so every jump into a
    // join has to re-evaluate them
    fn visit_jump(&mut self, target: Block) {
        self.set_reachable(target);

        for phi in self.graph.block(target).phis().iter().copied() {
            self.visit_phi(phi);
            self.check_unwrapped_phi(phi);
        }
    }

    // a compare folded through `phi` only holds while a single definition
    // flows into it. a new reachable predecessor can break that without
    // changing the phi's value, so the compares are re-evaluated here
    fn check_unwrapped_phi(&mut self, phi: Inst) {
        if !self.fixpoint.unwrapped_phis.contains(phi)
            || unwrap_phi(self.graph, &self.fixpoint.reachable, phi).is_some()
        {
            return;
        }

        if self.options.trace_constant_propagation {
            debug!(%phi, "phi no longer has a single input");
        }

        self.fixpoint.unwrapped_phis.remove(phi);
        self.revisit_through_redefinitions(phi);
    }

    fn revisit_through_redefinitions(&mut self, def: Inst) {
        let graph = self.graph;

        for u in graph.inst(def).input_uses() {
            if graph.data(u.user).is_redefinition() {
                self.revisit_through_redefinitions(u.user);

                continue;
            }

            match graph.inst_block(u.user) {
                Some(block) if self.fixpoint.reachable.contains(block) => self.visit_inst(u.user),
                _ => {}
            }
        }
    }

    fn fold_unary<F>(&mut self, inst: Inst, f: F)
    where
        F: FnOnce(&ConstValue) -> Option<ConstValue>,
    {
        let value = match self.value(self.graph.input(inst, 0)) {
            LatticeValue::Unknown => return,
            LatticeValue::Constant(v) => f(&v).map_or(LatticeValue::NonConstant, LatticeValue::Constant),
            LatticeValue::NonConstant => LatticeValue::NonConstant,
        };

        self.set_value(inst, value);
    }

    fn fold_binary<F>(&mut self, inst: Inst, f: F)
    where
        F: FnOnce(&ConstValue, &ConstValue) -> Option<ConstValue>,
    {
        let left = self.value(self.graph.input(inst, 0));
        let right = self.value(self.graph.input(inst, 1));

        let value = match (&left, &right) {
            (LatticeValue::Constant(a), LatticeValue::Constant(b)) => {
                f(a, b).map_or(LatticeValue::NonConstant, LatticeValue::Constant)
            }
            (LatticeValue::NonConstant, _) | (_, LatticeValue::NonConstant) => {
                LatticeValue::NonConstant
            }
            _ => return,
        };

        self.set_value(inst, value);
    }

    fn visit_binary_integer_op(&mut self, inst: Inst, op: BinaryOp, representation: Representation) {
        let graph = self.graph;
        let is_zero = |def: Inst| {
            let value = self.fixpoint.value(def);

            matches!(value.as_constant(), Some(ConstValue::Int(0)))
        };

        // `x * 0` and `x & 0` are zero no matter what `x` is
        if matches!(op, BinaryOp::Mul | BinaryOp::BitAnd)
            && (is_zero(graph.input(inst, 0)) || is_zero(graph.input(inst, 1)))
        {
            self.set_value(inst, LatticeValue::Constant(ConstValue::Int(0)));

            return;
        }

        self.fold_binary(inst, |a, b| {
            let value = binary_integer_evaluate(op, a.as_int()?, b.as_int()?, representation)?;

            Some(ConstValue::Int(value))
        });
    }

    fn visit_strict_compare(&mut self, inst: Inst, kind: StrictKind) {
        let graph = self.graph;
        let left = graph.input(inst, 0);
        let right = graph.input(inst, 1);
        let reachable = &self.fixpoint.reachable;

        if unwrap_definition(graph, reachable, left) == unwrap_definition(graph, reachable, right) {
            for def in [left, right] {
                let def = strip_redefinitions(graph, def);

                if unwrap_phi(graph, reachable, def).is_some() {
                    self.fixpoint.unwrapped_phis.insert(def);
                }
            }

            self.set_value(inst, LatticeValue::Constant(ConstValue::Bool(kind.result(true))));

            return;
        }

        if let Some(operand) = bool_test_operand(graph, inst) {
            self.set_value(inst, self.value(operand));

            return;
        }

        let (left_ty, right_ty) = (graph.ty(left), graph.ty(right));
        let decided = |identical: bool| LatticeValue::Constant(ConstValue::Bool(kind.result(identical)));

        let value = match (self.value(left), self.value(right)) {
            (LatticeValue::Constant(a), LatticeValue::Constant(b)) => decided(a.is_identical(&b)),
            _ if have_disjoint_classes(&left_ty, &right_ty) => decided(false),
            (LatticeValue::Constant(ConstValue::Null), LatticeValue::NonConstant)
                if right_ty.has_decidable_nullability() =>
            {
                decided(right_ty.is_nullable())
            }
            (LatticeValue::NonConstant, LatticeValue::Constant(ConstValue::Null))
                if left_ty.has_decidable_nullability() =>
            {
                decided(left_ty.is_nullable())
            }
            (LatticeValue::NonConstant, _) | (_, LatticeValue::NonConstant) => {
                LatticeValue::NonConstant
            }
            _ => return,
        };

        self.set_value(inst, value);
    }
}

/// Looks through redefinitions to the original definition.
pub(super) fn strip_redefinitions(graph: &FlowGraph, mut def: Inst) -> Inst {
    while graph.data(def).is_redefinition() {
        def = graph.input(def, 0);
    }

    def
}

/// If `phi` is a phi that can only ever produce one definition along the
/// reachable edges into its block (inputs that are the phi itself don't
/// count), gets that definition.
pub(super) fn unwrap_phi(graph: &FlowGraph, reachable: &SecondarySet<Block>, phi: Inst) -> Option<Inst> {
    if !graph.data(phi).is_phi() {
        return None;
    }

    let block = graph.inst_block(phi)?;
    let mut single = None;

    for (pred, input) in graph.block(block).predecessors().iter().zip(graph.inst(phi).inputs()) {
        if !reachable.contains(*pred) || *input == phi {
            continue;
        }

        match single {
            None => single = Some(*input),
            Some(existing) if existing == *input => {}
            Some(_) => return None,
        }
    }

    single
}

fn unwrap_definition(graph: &FlowGraph, reachable: &SecondarySet<Block>, def: Inst) -> Inst {
    let def = strip_redefinitions(graph, def);

    match unwrap_phi(graph, reachable, def) {
        Some(input) => strip_redefinitions(graph, input),
        None => def,
    }
}

/// For `x === true` and `x !== false` where `x` is a non-nullable bool,
/// gets `x`. The compare always produces the same value as `x` does.
pub(super) fn bool_test_operand(graph: &FlowGraph, inst: Inst) -> Option<Inst> {
    let needle = match graph.data(inst) {
        InstData::StrictCompare(StrictKind::Identical) => true,
        InstData::StrictCompare(StrictKind::NotIdentical) => false,
        _ => return None,
    };

    let left = graph.input(inst, 0);
    let right = graph.input(inst, 1);
    let is_needle = |def: Inst| {
        let literal = graph.data(def).as_constant().and_then(ConstValue::as_bool);

        literal == Some(needle)
    };

    if is_needle(right) && graph.ty(left).is_bool() {
        Some(left)
    } else if is_needle(left) && graph.ty(right).is_bool() {
        Some(right)
    } else {
        None
    }
}

// two values of different classes can never be the same object. if both
// can be null they might still both be null though
fn have_disjoint_classes(left: &CompileType, right: &CompileType) -> bool {
    let (left_cid, right_cid) = (left.to_nullable_cid(), right.to_nullable_cid());

    left_cid.is_concrete()
        && right_cid.is_concrete()
        && left_cid != right_cid
        && !(left.is_nullable() && right.is_nullable())
}

fn numeric_compare(kind: ComparisonKind, left: &ConstValue, right: &ConstValue) -> Option<bool> {
    let result = match (left, right) {
        (ConstValue::Int(a), ConstValue::Int(b)) => integer_compare(kind, *a, *b),
        (ConstValue::Double(a), ConstValue::Double(b)) => double_compare(kind, a.get(), b.get()),
        (ConstValue::Int(a), ConstValue::Double(b)) => double_compare(kind, *a as f64, b.get()),
        (ConstValue::Double(a), ConstValue::Int(b)) => double_compare(kind, a.get(), *b as f64),
        _ => return None,
    };

    Some(result)
}

// strings are indexed by UTF-16 code unit
fn string_length(value: &ConstValue) -> Option<ConstValue> {
    let length = value.as_str()?.encode_utf16().count();

    Some(ConstValue::Int(length as i64))
}

fn load_field(slot: Slot, receiver: &ConstValue) -> Option<ConstValue> {
    match (slot, receiver) {
        (Slot::ArrayLength, ConstValue::Array(array)) => {
            Some(ConstValue::Int(array.elements.len() as i64))
        }
        (Slot::StringLength, ConstValue::String(_)) => string_length(receiver),
        (
            Slot::Field {
                index,
                is_final: true,
            },
            ConstValue::Instance(instance),
        ) => instance.fields.get(index as usize).cloned(),
        _ => None,
    }
}

fn load_indexed(receiver: &ConstValue, index: &ConstValue) -> Option<ConstValue> {
    let index = usize::try_from(index.as_int()?).ok()?;

    match receiver {
        ConstValue::Array(array) if array.immutable => array.elements.get(index).cloned(),
        ConstValue::String(s) => s
            .encode_utf16()
            .nth(index)
            .map(|unit| ConstValue::Int(unit as i64)),
        _ => None,
    }
}
