//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::ConstValue;
use std::fmt::{self, Display, Formatter};

/// The value the constant propagator associates with a definition.
///
/// The lattice is three levels high: `Unknown` at the bottom, one `Constant`
/// per value in the middle and `NonConstant` at the top. During analysis a
/// definition's value only ever moves up.
#[derive(Clone, Debug, Default)]
pub enum LatticeValue {
    /// No information yet, either the definition was never visited or all
    /// of its inputs are still unknown.
    #[default]
    Unknown,
    /// Always this exact value.
    Constant(ConstValue),
    /// Could be anything.
    NonConstant,
}

impl LatticeValue {
    /// Whether this is [`LatticeValue::Unknown`].
    #[inline]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether this is [`LatticeValue::NonConstant`].
    #[inline]
    pub fn is_non_constant(&self) -> bool {
        matches!(self, Self::NonConstant)
    }

    /// Gets the constant, if this is one.
    #[inline]
    pub fn as_constant(&self) -> Option<&ConstValue> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Computes the least upper bound of two values.
    ///
    /// ```
    /// # use onyx::ir::ConstValue;
    /// # use onyx::transforms::constprop::LatticeValue;
    /// let three = LatticeValue::Constant(ConstValue::Int(3));
    /// let four = LatticeValue::Constant(ConstValue::Int(4));
    ///
    /// assert_eq!(LatticeValue::Unknown.join(&three), three);
    /// assert_eq!(three.join(&three), three);
    /// assert_eq!(three.join(&four), LatticeValue::NonConstant);
    /// ```
    pub fn join(&self, other: &LatticeValue) -> LatticeValue {
        match (self, other) {
            (Self::Unknown, x) | (x, Self::Unknown) => x.clone(),
            (Self::NonConstant, _) | (_, Self::NonConstant) => Self::NonConstant,
            (Self::Constant(a), Self::Constant(b)) if a.is_identical(b) => self.clone(),
            _ => Self::NonConstant,
        }
    }

    /// Whether `self` is at or below `other` in the lattice.
    pub fn is_below_or_equal(&self, other: &LatticeValue) -> bool {
        self.join(other) == *other
    }
}

// constants compare by identity, not structurally
impl PartialEq for LatticeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unknown, Self::Unknown) | (Self::NonConstant, Self::NonConstant) => true,
            (Self::Constant(a), Self::Constant(b)) => a.is_identical(b),
            _ => false,
        }
    }
}

impl Display for LatticeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Constant(value) => write!(f, "{value}"),
            Self::NonConstant => f.write_str("non-constant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Vec<LatticeValue> {
        vec![
            LatticeValue::Unknown,
            LatticeValue::Constant(ConstValue::Int(0)),
            LatticeValue::Constant(ConstValue::Int(1)),
            LatticeValue::Constant(ConstValue::Bool(true)),
            LatticeValue::Constant(ConstValue::double(0.0)),
            LatticeValue::Constant(ConstValue::double(-0.0)),
            LatticeValue::Constant(ConstValue::Null),
            LatticeValue::NonConstant,
        ]
    }

    #[test]
    fn join_laws() {
        let values = values();

        for a in values.iter() {
            assert_eq!(a.join(a), *a, "join is idempotent for {a}");
            assert_eq!(a.join(&LatticeValue::Unknown), *a);
            assert_eq!(a.join(&LatticeValue::NonConstant), LatticeValue::NonConstant);

            for b in values.iter() {
                assert_eq!(a.join(b), b.join(a), "join is commutative for {a}, {b}");
                assert!(a.is_below_or_equal(&a.join(b)));
                assert!(b.is_below_or_equal(&a.join(b)));

                for c in values.iter() {
                    assert_eq!(a.join(b).join(c), a.join(&b.join(c)));
                }
            }
        }
    }

    #[test]
    fn distinct_constants_join_to_non_constant() {
        let zero = LatticeValue::Constant(ConstValue::double(0.0));
        let negative_zero = LatticeValue::Constant(ConstValue::double(-0.0));
        let nan = LatticeValue::Constant(ConstValue::double(f64::NAN));

        assert_eq!(zero.join(&negative_zero), LatticeValue::NonConstant);
        assert_eq!(nan.join(&nan), nan);
    }

    #[test]
    fn mutable_arrays_are_distinct_objects() {
        let a = LatticeValue::Constant(ConstValue::mutable_array(vec![]));
        let b = LatticeValue::Constant(ConstValue::mutable_array(vec![]));

        assert_eq!(a.join(&a.clone()), a);
        assert_eq!(a.join(&b), LatticeValue::NonConstant);
    }
}
