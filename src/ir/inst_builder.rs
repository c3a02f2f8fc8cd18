//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::context::DeoptId;
use crate::ir::*;
use crate::utility::PackedOption;
use std::sync::Arc;

macro_rules! binary_int {
    ($name:ident, $op:ident) => {
        #[doc = concat!("Builds a tagged `", stringify!($op), "` integer operation.")]
        fn $name(self, lhs: Inst, rhs: Inst) -> Inst {
            self.binary_int_op(BinaryOp::$op, Representation::Tagged, lhs, rhs)
        }
    };
}

/// Helper trait for creating instructions. Implementors decide where the
/// instruction ends up, the provided methods decide what it looks like.
///
/// This is used for the append/insert builders, and anything else that
/// needs to create instructions in the graph.
pub trait InstBuilder<'g>: Sized {
    /// Gets the graph being built into.
    fn graph(&self) -> &FlowGraph;

    /// Creates an instruction with the given inputs and places it.
    fn build(self, data: InstData, inputs: &[Inst]) -> Inst;

    /// Builds a binary integer operation.
    fn binary_int_op(
        self,
        op: BinaryOp,
        representation: Representation,
        lhs: Inst,
        rhs: Inst,
    ) -> Inst {
        self.build(InstData::BinaryIntegerOp { op, representation }, &[lhs, rhs])
    }

    binary_int!(iadd, Add);
    binary_int!(isub, Sub);
    binary_int!(imul, Mul);
    binary_int!(iand, BitAnd);

    /// Builds a unary integer operation.
    fn unary_int_op(self, op: UnaryOp, representation: Representation, value: Inst) -> Inst {
        self.build(InstData::UnaryIntegerOp { op, representation }, &[value])
    }

    /// Builds a binary double operation.
    fn binary_double_op(self, op: DoubleOp, lhs: Inst, rhs: Inst) -> Inst {
        self.build(InstData::BinaryDoubleOp(op), &[lhs, rhs])
    }

    /// Builds an identity comparison.
    fn strict_compare(self, kind: StrictKind, lhs: Inst, rhs: Inst) -> Inst {
        self.build(InstData::StrictCompare(kind), &[lhs, rhs])
    }

    /// Builds a numeric comparison.
    fn compare(self, kind: ComparisonKind, lhs: Inst, rhs: Inst) -> Inst {
        self.build(InstData::Compare(kind), &[lhs, rhs])
    }

    /// Builds a boolean negation.
    fn boolean_negate(self, value: Inst) -> Inst {
        self.build(InstData::BooleanNegate, &[value])
    }

    /// Builds a redefinition of `value`.
    fn redefinition(self, value: Inst) -> Inst {
        self.build(InstData::Redefinition, &[value])
    }

    /// Builds a field load.
    fn load_field(self, slot: Slot, instance: Inst) -> Inst {
        self.build(InstData::LoadField(slot), &[instance])
    }

    /// Builds an array or string element load.
    fn load_indexed(self, array: Inst, index: Inst) -> Inst {
        self.build(InstData::LoadIndexed, &[array, index])
    }

    /// Builds a static field load.
    fn load_static_field(self, field: StaticField) -> Inst {
        self.build(InstData::LoadStaticField(field), &[])
    }

    /// Builds a null check.
    fn check_null(self, value: Inst) -> Inst {
        self.build(InstData::CheckNull, &[value])
    }

    /// Builds a deoptimizing bounds check.
    fn check_array_bound(self, length: Inst, index: Inst) -> Inst {
        self.build(InstData::CheckArrayBound, &[length, index])
    }

    /// Builds a throwing bounds check.
    fn generic_check_bound(self, length: Inst, index: Inst) -> Inst {
        self.build(InstData::GenericCheckBound, &[length, index])
    }

    /// Builds a static call.
    fn static_call(self, target: CallTarget, args: &[Inst]) -> Inst {
        self.build(InstData::StaticCall(target), args)
    }

    /// Builds a dynamically dispatched call, `args[0]` is the receiver.
    fn instance_call(self, selector: &str, args: &[Inst]) -> Inst {
        self.build(InstData::InstanceCall(Arc::from(selector)), args)
    }

    /// Builds an allocation.
    fn allocate_object(self, class_id: ClassId) -> Inst {
        self.build(InstData::AllocateObject(class_id), &[])
    }

    /// Builds a field store.
    fn store_field(self, slot: Slot, instance: Inst, value: Inst) -> Inst {
        self.build(InstData::StoreField(slot), &[instance, value])
    }

    /// Builds an array element store.
    fn store_indexed(self, array: Inst, index: Inst, value: Inst) -> Inst {
        self.build(InstData::StoreIndexed, &[array, index, value])
    }

    /// Builds a static field store.
    fn store_static_field(self, field: StaticField, value: Inst) -> Inst {
        self.build(InstData::StoreStaticField(field), &[value])
    }

    /// Builds an unconditional jump.
    fn goto(self, target: Block) -> Inst {
        self.build(InstData::Goto(target), &[])
    }

    /// Builds a two-way branch. Both targets must be distinct target blocks.
    fn branch(self, condition: Inst, if_true: Block, if_false: Block) -> Inst {
        debug_assert_ne!(if_true, if_false, "branch targets must be distinct");
        debug_assert_eq!(self.graph().block(if_true).kind(), BlockKind::Target);
        debug_assert_eq!(self.graph().block(if_false).kind(), BlockKind::Target);

        self.build(
            InstData::Branch {
                true_target: if_true,
                false_target: if_false,
                constant_target: PackedOption::none(),
            },
            &[condition],
        )
    }

    /// Builds a computed jump to one of `targets`.
    fn indirect_goto(self, offset: Inst, targets: &[Block]) -> Inst {
        self.build(InstData::IndirectGoto(targets.iter().copied().collect()), &[offset])
    }

    /// Builds a return.
    fn ret(self, value: Inst) -> Inst {
        self.build(InstData::Return, &[value])
    }

    /// Builds a throw.
    fn throw(self, exception: Inst) -> Inst {
        self.build(InstData::Throw, &[exception])
    }
}

/// Appends instructions to the end of a block. Terminators also register the
/// block as a predecessor of each of their successors.
pub struct AppendBuilder<'g> {
    graph: &'g mut FlowGraph,
    block: Block,
    deopt_id: Option<DeoptId>,
}

impl<'g> AppendBuilder<'g> {
    /// Creates a builder appending to `block`. Every instruction built gets
    /// `deopt_id`.
    pub fn new(graph: &'g mut FlowGraph, block: Block, deopt_id: Option<DeoptId>) -> Self {
        Self {
            graph,
            block,
            deopt_id,
        }
    }
}

impl<'g> InstBuilder<'g> for AppendBuilder<'g> {
    fn graph(&self) -> &FlowGraph {
        self.graph
    }

    fn build(self, data: InstData, inputs: &[Inst]) -> Inst {
        let successors = data.successors();
        let inst = self
            .graph
            .append_inst(self.block, data, inputs, self.deopt_id);

        for succ in successors {
            self.graph.add_predecessor(succ, self.block);
        }

        inst
    }
}

/// Inserts instructions directly after an existing one. Cannot be used for
/// terminators.
pub struct InsertBuilder<'g> {
    graph: &'g mut FlowGraph,
    after: Inst,
    deopt_id: Option<DeoptId>,
}

impl<'g> InsertBuilder<'g> {
    /// Creates a builder inserting after `after`.
    pub fn new(graph: &'g mut FlowGraph, after: Inst, deopt_id: Option<DeoptId>) -> Self {
        Self {
            graph,
            after,
            deopt_id,
        }
    }
}

impl<'g> InstBuilder<'g> for InsertBuilder<'g> {
    fn graph(&self) -> &FlowGraph {
        self.graph
    }

    fn build(self, data: InstData, inputs: &[Inst]) -> Inst {
        assert!(!data.is_terminator(), "cannot insert a terminator mid-block");

        self.graph
            .insert_inst_after(self.after, data, inputs, self.deopt_id)
    }
}
