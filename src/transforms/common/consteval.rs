//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Exact compile-time evaluation of arithmetic.
//!
//! Integer arithmetic is done in 64-bit two's complement and then truncated
//! to the representation of the instruction, so it behaves exactly like the
//! generated code would. Anything that would throw at runtime (division by
//! zero, negative shift counts) is not evaluated at all, so that the
//! exception is still raised by the generated code.

use crate::ir::{BinaryOp, ComparisonKind, DoubleOp, Representation, UnaryOp};

/// Truncates a 64-bit result to the width of `representation`, then sign
/// or zero extends it back out to 64 bits.
///
/// ```
/// # use onyx::ir::Representation;
/// # use onyx::transforms::common::truncate_to;
/// assert_eq!(truncate_to(1 << 32, Representation::Int32), 0);
/// assert_eq!(truncate_to(-1, Representation::Uint32), 0xFFFF_FFFF);
/// assert_eq!(truncate_to(-1, Representation::Tagged), -1);
/// ```
pub fn truncate_to(value: i64, representation: Representation) -> i64 {
    match representation {
        Representation::Tagged | Representation::Int64 => value,
        Representation::Int32 => value as i32 as i64,
        Representation::Uint32 => value as u32 as i64,
    }
}

/// Evaluates `left op right`. Returns `None` if the operation would throw
/// at runtime instead of producing a value.
pub fn binary_integer_evaluate(
    op: BinaryOp,
    left: i64,
    right: i64,
    representation: Representation,
) -> Option<i64> {
    let result = match op {
        BinaryOp::Add => left.wrapping_add(right),
        BinaryOp::Sub => left.wrapping_sub(right),
        BinaryOp::Mul => left.wrapping_mul(right),
        BinaryOp::TruncDiv if right == 0 => return None,
        BinaryOp::TruncDiv => left.wrapping_div(right),
        BinaryOp::Mod if right == 0 => return None,
        BinaryOp::Mod => left.wrapping_rem_euclid(right),
        BinaryOp::BitAnd => left & right,
        BinaryOp::BitOr => left | right,
        BinaryOp::BitXor => left ^ right,
        BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr if right < 0 => return None,
        BinaryOp::Shl if right >= 64 => 0,
        BinaryOp::Shl => left.wrapping_shl(right as u32),
        // every bit is shifted out, only the sign is left
        BinaryOp::Shr if right >= 64 => left >> 63,
        BinaryOp::Shr => left >> right,
        BinaryOp::UShr if right >= 64 => 0,
        BinaryOp::UShr => ((left as u64) >> right) as i64,
    };

    Some(truncate_to(result, representation))
}

/// Evaluates `op value`.
pub fn unary_integer_evaluate(op: UnaryOp, value: i64, representation: Representation) -> i64 {
    let result = match op {
        UnaryOp::Negate => value.wrapping_neg(),
        UnaryOp::BitNot => !value,
    };

    truncate_to(result, representation)
}

/// Evaluates `left op right` with IEEE semantics.
pub fn binary_double_evaluate(op: DoubleOp, left: f64, right: f64) -> f64 {
    match op {
        DoubleOp::Add => left + right,
        DoubleOp::Sub => left - right,
        DoubleOp::Mul => left * right,
        DoubleOp::Div => left / right,
    }
}

/// Evaluates an integer comparison.
pub fn integer_compare(kind: ComparisonKind, left: i64, right: i64) -> bool {
    match kind {
        ComparisonKind::Eq => left == right,
        ComparisonKind::Ne => left != right,
        ComparisonKind::Lt => left < right,
        ComparisonKind::Gt => left > right,
        ComparisonKind::Le => left <= right,
        ComparisonKind::Ge => left >= right,
    }
}

/// Evaluates a double comparison. Every comparison involving NaN is false,
/// except `!=`.
pub fn double_compare(kind: ComparisonKind, left: f64, right: f64) -> bool {
    match kind {
        ComparisonKind::Eq => left == right,
        ComparisonKind::Ne => left != right,
        ComparisonKind::Lt => left < right,
        ComparisonKind::Gt => left > right,
        ComparisonKind::Le => left <= right,
        ComparisonKind::Ge => left >= right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(op: BinaryOp, left: i64, right: i64) -> Option<i64> {
        binary_integer_evaluate(op, left, right, Representation::Tagged)
    }

    #[test]
    fn arithmetic_wraps() {
        assert_eq!(tagged(BinaryOp::Add, 3, 4), Some(7));
        assert_eq!(tagged(BinaryOp::Add, i64::MAX, 1), Some(i64::MIN));
        assert_eq!(tagged(BinaryOp::Sub, i64::MIN, 1), Some(i64::MAX));
        assert_eq!(tagged(BinaryOp::Mul, 1 << 62, 4), Some(0));
        assert_eq!(tagged(BinaryOp::TruncDiv, i64::MIN, -1), Some(i64::MIN));
    }

    #[test]
    fn division_rounds_toward_zero_and_mod_is_euclidean() {
        assert_eq!(tagged(BinaryOp::TruncDiv, -7, 2), Some(-3));
        assert_eq!(tagged(BinaryOp::Mod, -7, 2), Some(1));
        assert_eq!(tagged(BinaryOp::Mod, 7, -2), Some(1));
        assert_eq!(tagged(BinaryOp::Mod, i64::MIN, -1), Some(0));
    }

    #[test]
    fn throwing_operations_are_not_evaluated() {
        assert_eq!(tagged(BinaryOp::TruncDiv, 1, 0), None);
        assert_eq!(tagged(BinaryOp::Mod, 1, 0), None);
        assert_eq!(tagged(BinaryOp::Shl, 1, -1), None);
        assert_eq!(tagged(BinaryOp::Shr, 1, -1), None);
        assert_eq!(tagged(BinaryOp::UShr, 1, -1), None);
    }

    #[test]
    fn large_shifts() {
        assert_eq!(tagged(BinaryOp::Shl, 1, 63), Some(i64::MIN));
        assert_eq!(tagged(BinaryOp::Shl, 1, 64), Some(0));
        assert_eq!(tagged(BinaryOp::Shr, -8, 100), Some(-1));
        assert_eq!(tagged(BinaryOp::Shr, 8, 100), Some(0));
        assert_eq!(tagged(BinaryOp::Shr, -8, 1), Some(-4));
        assert_eq!(tagged(BinaryOp::UShr, -1, 60), Some(0xF));
        assert_eq!(tagged(BinaryOp::UShr, -1, 64), Some(0));
    }

    #[test]
    fn representations_truncate() {
        assert_eq!(
            binary_integer_evaluate(BinaryOp::Add, i32::MAX as i64, 1, Representation::Int32),
            Some(i32::MIN as i64)
        );
        assert_eq!(
            binary_integer_evaluate(BinaryOp::Sub, 0, 1, Representation::Uint32),
            Some(u32::MAX as i64)
        );
        assert_eq!(
            unary_integer_evaluate(UnaryOp::Negate, i64::MIN, Representation::Int64),
            i64::MIN
        );
        assert_eq!(
            unary_integer_evaluate(UnaryOp::BitNot, 0, Representation::Uint32),
            u32::MAX as i64
        );
    }

    #[test]
    fn comparisons() {
        assert!(integer_compare(ComparisonKind::Lt, -1, 0));
        assert!(!integer_compare(ComparisonKind::Ge, -1, 0));
        assert!(double_compare(ComparisonKind::Ne, f64::NAN, f64::NAN));
        assert!(!double_compare(ComparisonKind::Eq, f64::NAN, f64::NAN));
        assert_eq!(binary_double_evaluate(DoubleOp::Div, 1.0, 4.0), 0.25);
    }
}
