//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{BinaryOp, CallTarget, FlowGraph, Inst, InstData};

/// Checks whether a given instruction possibly has a side effect, i.e.
/// whether it can be removed when nothing uses its result.
///
/// Throwing or deoptimizing counts as a side effect, so checks and integer
/// division by a possibly-zero value are never removable.
pub fn has_side_effect(graph: &FlowGraph, inst: Inst) -> bool {
    match graph.data(inst) {
        InstData::StaticCall(target) => !is_pure_call(target),
        InstData::InstanceCall(_)
        | InstData::CheckNull
        | InstData::CheckArrayBound
        | InstData::GenericCheckBound
        | InstData::StoreField(_)
        | InstData::StoreIndexed
        | InstData::StoreStaticField(_)
        | InstData::Goto(_)
        | InstData::Branch { .. }
        | InstData::IndirectGoto(_)
        | InstData::Return
        | InstData::Throw => true,
        InstData::BinaryIntegerOp { op, .. } => {
            let divisor = graph.data(graph.input(inst, 1)).as_constant();

            match op {
                BinaryOp::TruncDiv | BinaryOp::Mod => {
                    !matches!(divisor.and_then(|c| c.as_int()), Some(d) if d != 0)
                }
                BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr => {
                    !matches!(divisor.and_then(|c| c.as_int()), Some(d) if d >= 0)
                }
                _ => false,
            }
        }
        data => {
            // any instructions that do not have results should be covered above
            debug_assert!(data.has_result());

            false
        }
    }
}

/// Whether a static call has no observable effect besides its result.
pub fn is_pure_call(target: &CallTarget) -> bool {
    matches!(target, CallTarget::Recognized(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilationContext;
    use crate::ir::*;

    #[test]
    fn division_needs_a_known_divisor() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let two = b.iconst(2);
        let zero = b.iconst(0);

        b.switch_to(entry);
        let by_two = b
            .append()
            .binary_int_op(BinaryOp::TruncDiv, Representation::Tagged, x, two);
        let by_zero = b
            .append()
            .binary_int_op(BinaryOp::Mod, Representation::Tagged, x, zero);
        let by_x = b
            .append()
            .binary_int_op(BinaryOp::TruncDiv, Representation::Tagged, two, x);
        let sum = b.append().iadd(x, x);
        let check = b.append().check_null(x);
        let len = b
            .append()
            .static_call(CallTarget::Recognized(RecognizedKind::StringLength), &[x]);
        let call = b
            .append()
            .static_call(CallTarget::Function("print".into()), &[x]);
        b.append().ret(sum);

        let graph = b.finish();

        assert!(!has_side_effect(&graph, by_two));
        assert!(has_side_effect(&graph, by_zero));
        assert!(has_side_effect(&graph, by_x));
        assert!(!has_side_effect(&graph, sum));
        assert!(has_side_effect(&graph, check));
        assert!(!has_side_effect(&graph, len));
        assert!(has_side_effect(&graph, call));
    }
}
