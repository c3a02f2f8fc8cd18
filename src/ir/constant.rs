//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::context::WordSize;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Identifies the concrete runtime class of a value.
///
/// A handful of ids are reserved for the builtin classes the optimizer knows
/// about, everything from [`ClassId::FIRST_USER`] upwards is a user class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ClassId(u32);

impl ClassId {
    /// "No class", the class of a value that cannot exist.
    pub const ILLEGAL: ClassId = ClassId(0);
    /// Any class, not statically known.
    pub const DYNAMIC: ClassId = ClassId(1);
    /// The class of `null`.
    pub const NULL: ClassId = ClassId(2);
    /// Booleans.
    pub const BOOL: ClassId = ClassId(3);
    /// Integers that fit into a tagged word.
    pub const SMI: ClassId = ClassId(4);
    /// Boxed 64-bit integers.
    pub const MINT: ClassId = ClassId(5);
    /// Boxed doubles.
    pub const DOUBLE: ClassId = ClassId(6);
    /// Strings.
    pub const STRING: ClassId = ClassId(7);
    /// Growable or fixed-length mutable arrays.
    pub const ARRAY: ClassId = ClassId(8);
    /// Arrays whose elements cannot change.
    pub const IMMUTABLE_ARRAY: ClassId = ClassId(9);
    /// The first id available for user-defined classes.
    pub const FIRST_USER: ClassId = ClassId(64);

    /// Gets the id of the `n`th user-defined class.
    #[inline]
    pub const fn user(n: u32) -> Self {
        Self(Self::FIRST_USER.0 + n)
    }

    /// Whether this names one specific class (not [`Self::ILLEGAL`] or [`Self::DYNAMIC`]).
    #[inline]
    pub fn is_concrete(self) -> bool {
        self != Self::ILLEGAL && self != Self::DYNAMIC
    }

    /// Whether this is one of the integer classes.
    #[inline]
    pub fn is_integer(self) -> bool {
        self == Self::SMI || self == Self::MINT
    }
}

impl Display for ClassId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::ILLEGAL => "<illegal>",
            Self::DYNAMIC => "dynamic",
            Self::NULL => "Null",
            Self::BOOL => "Bool",
            Self::SMI => "Smi",
            Self::MINT => "Mint",
            Self::DOUBLE => "Double",
            Self::STRING => "String",
            Self::ARRAY => "Array",
            Self::IMMUTABLE_ARRAY => "ImmutableArray",
            ClassId(n) => return write!(f, "Class{}", n - Self::FIRST_USER.0),
        };

        f.write_str(name)
    }
}

/// A double, stored by its bit pattern. Constants compare by identity, and
/// two doubles are identical exactly when their bits are (so `NaN` is
/// identical to itself and `0.0` is not identical to `-0.0`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct DoubleBits(u64);

impl DoubleBits {
    /// Wraps a double.
    #[inline]
    pub fn new(value: f64) -> Self {
        Self(value.to_bits())
    }

    /// Gets the double back out.
    #[inline]
    pub fn get(self) -> f64 {
        f64::from_bits(self.0)
    }
}

/// The contents of an array constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ConstArray {
    /// The elements of the array.
    pub elements: Vec<ConstValue>,
    /// Whether the elements can never change. Only immutable arrays are
    /// canonical, and only their elements can be read at compile time.
    pub immutable: bool,
}

/// An instance of a user-defined class known at compile time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ConstInstance {
    /// The class of the instance.
    pub class_id: ClassId,
    /// A snapshot of the fields, by field index.
    pub fields: Vec<ConstValue>,
    /// Whether the instance lives in the canonical constant table.
    pub canonical: bool,
}

/// A compile-time constant value.
///
/// Numbers, strings, booleans and `null` are always canonical: two equal
/// values are the same object. Arrays and instances are only canonical when
/// flagged as such, otherwise each one is a distinct object and identity is
/// decided by which allocation the value came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ConstValue {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool(bool),
    /// A 64-bit integer, which may or may not fit into a small integer.
    Int(i64),
    /// A double.
    Double(DoubleBits),
    /// A string.
    String(Arc<str>),
    /// An array.
    Array(Arc<ConstArray>),
    /// An instance of a user class.
    Instance(Arc<ConstInstance>),
}

impl ConstValue {
    /// Makes a double constant.
    #[inline]
    pub fn double(value: f64) -> Self {
        Self::Double(DoubleBits::new(value))
    }

    /// Makes a string constant.
    #[inline]
    pub fn string(value: &str) -> Self {
        Self::String(Arc::from(value))
    }

    /// Makes an immutable, canonical array constant.
    pub fn immutable_array(elements: Vec<ConstValue>) -> Self {
        Self::Array(Arc::new(ConstArray {
            elements,
            immutable: true,
        }))
    }

    /// Makes a mutable array constant. Every call creates a distinct object.
    pub fn mutable_array(elements: Vec<ConstValue>) -> Self {
        Self::Array(Arc::new(ConstArray {
            elements,
            immutable: false,
        }))
    }

    /// Makes an instance constant.
    pub fn instance(class_id: ClassId, fields: Vec<ConstValue>, canonical: bool) -> Self {
        Self::Instance(Arc::new(ConstInstance {
            class_id,
            fields,
            canonical,
        }))
    }

    /// The concrete class of the value. Integers are [`ClassId::SMI`] or
    /// [`ClassId::MINT`] depending on `word`.
    pub fn class_id(&self, word: WordSize) -> ClassId {
        match self {
            Self::Null => ClassId::NULL,
            Self::Bool(_) => ClassId::BOOL,
            Self::Int(v) if word.is_smi(*v) => ClassId::SMI,
            Self::Int(_) => ClassId::MINT,
            Self::Double(_) => ClassId::DOUBLE,
            Self::String(_) => ClassId::STRING,
            Self::Array(a) if a.immutable => ClassId::IMMUTABLE_ARRAY,
            Self::Array(_) => ClassId::ARRAY,
            Self::Instance(i) => i.class_id,
        }
    }

    /// Whether the value is a small integer for `word`.
    #[inline]
    pub fn is_smi(&self, word: WordSize) -> bool {
        matches!(self, Self::Int(v) if word.is_smi(*v))
    }

    /// Whether the value is already in canonical form, i.e. it can be
    /// referred to by a single shared constant node.
    pub fn is_canonical(&self) -> bool {
        match self {
            Self::Array(a) => a.immutable,
            Self::Instance(i) => i.canonical,
            _ => true,
        }
    }

    /// Whether `self` and `other` are the same object at runtime.
    pub fn is_identical(&self, other: &ConstValue) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) if !a.immutable || !b.immutable => Arc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) if !a.canonical || !b.canonical => {
                Arc::ptr_eq(a, b)
            }
            _ => self == other,
        }
    }

    /// Whether this is `null`.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Gets the boolean value, if this is a boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Gets the integer value, if this is an integer.
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Gets the double value, if this is a double.
    #[inline]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(d.get()),
            _ => None,
        }
    }

    /// Gets the string value, if this is a string.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "#null"),
            Self::Bool(b) => write!(f, "#{b}"),
            Self::Int(v) => write!(f, "#{v}"),
            Self::Double(d) => write!(f, "#{:?}", d.get()),
            Self::String(s) => write!(f, "#{s:?}"),
            Self::Array(a) => {
                write!(f, "#{}[", if a.immutable { "const " } else { "" })?;

                for (i, elem) in a.elements.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }

                    // elements print without their own `#`
                    write!(f, "{}", &elem.to_string()[1..])?;
                }

                write!(f, "]")
            }
            Self::Instance(i) => write!(f, "#<{} instance>", i.class_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_classes_depend_on_word_size() {
        let big = ConstValue::Int(1 << 40);

        assert_eq!(big.class_id(WordSize::W64), ClassId::SMI);
        assert_eq!(big.class_id(WordSize::W32), ClassId::MINT);
        assert!(!big.is_smi(WordSize::W32));
        assert!(ConstValue::Int(-5).is_smi(WordSize::W32));
    }

    #[test]
    fn mutable_objects_compare_by_allocation() {
        let a = ConstValue::mutable_array(vec![ConstValue::Int(1)]);
        let b = ConstValue::mutable_array(vec![ConstValue::Int(1)]);

        assert!(!a.is_identical(&b));
        assert!(a.is_identical(&a.clone()));
        assert!(!a.is_canonical());

        let c = ConstValue::immutable_array(vec![ConstValue::Int(1)]);
        let d = ConstValue::immutable_array(vec![ConstValue::Int(1)]);

        assert!(c.is_identical(&d));
        assert!(c.is_canonical());
    }

    #[test]
    fn doubles_are_identical_by_bits() {
        let nan = ConstValue::double(f64::NAN);

        assert!(nan.is_identical(&ConstValue::double(f64::NAN)));
        assert!(!ConstValue::double(0.0).is_identical(&ConstValue::double(-0.0)));
    }

    #[test]
    fn display() {
        assert_eq!(ConstValue::Int(7).to_string(), "#7");
        assert_eq!(ConstValue::string("hi").to_string(), "#\"hi\"");
        assert_eq!(
            ConstValue::immutable_array(vec![ConstValue::Int(1), ConstValue::Null]).to_string(),
            "#const [1, null]"
        );
        assert_eq!(ClassId::user(3).to_string(), "Class3");
    }
}
