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
use crate::ir::{ClassId, ConstValue};
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The shape of a static type, ignoring nullability.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum TypeKind {
    /// The bottom type, no values have this type.
    Never,
    /// Anything at all, checked at runtime.
    Dynamic,
    /// Any non-null object.
    Object,
    /// Integers and doubles.
    Num,
    /// Integers.
    Int,
    /// Doubles.
    Double,
    /// Booleans.
    Bool,
    /// Strings.
    String,
    /// Arrays.
    List,
    /// Exactly one user class.
    Class(ClassId),
}

impl TypeKind {
    /// The static type for values of class `cid`.
    pub fn for_cid(cid: ClassId) -> Self {
        match cid {
            ClassId::SMI | ClassId::MINT => Self::Int,
            ClassId::DOUBLE => Self::Double,
            ClassId::BOOL => Self::Bool,
            ClassId::STRING => Self::String,
            ClassId::ARRAY | ClassId::IMMUTABLE_ARRAY => Self::List,
            ClassId::NULL | ClassId::ILLEGAL => Self::Never,
            ClassId::DYNAMIC => Self::Dynamic,
            cid => Self::Class(cid),
        }
    }

    /// Checks `self <: other`, ignoring nullability.
    pub fn is_subtype_of(self, other: TypeKind) -> bool {
        match (self, other) {
            (Self::Never, _) => true,
            (a, b) if a == b => true,
            (_, Self::Dynamic) => true,
            (Self::Dynamic, _) => false,
            (_, Self::Object) => true,
            (Self::Int | Self::Double, Self::Num) => true,
            _ => false,
        }
    }

    /// The least upper bound of two kinds.
    pub fn join(self, other: TypeKind) -> TypeKind {
        if self.is_subtype_of(other) {
            other
        } else if other.is_subtype_of(self) {
            self
        } else if self.is_subtype_of(Self::Num) && other.is_subtype_of(Self::Num) {
            Self::Num
        } else if self == Self::Dynamic || other == Self::Dynamic {
            Self::Dynamic
        } else {
            Self::Object
        }
    }
}

/// A static type: a [`TypeKind`] plus whether `null` is a member.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct AbstractType {
    kind: TypeKind,
    nullable: bool,
}

impl AbstractType {
    /// Creates a type. [`TypeKind::Dynamic`] always includes `null`.
    pub fn new(kind: TypeKind, nullable: bool) -> Self {
        Self {
            kind,
            nullable: nullable || kind == TypeKind::Dynamic,
        }
    }

    /// A non-nullable type.
    pub fn non_nullable(kind: TypeKind) -> Self {
        Self::new(kind, false)
    }

    /// A nullable type.
    pub fn nullable(kind: TypeKind) -> Self {
        Self::new(kind, true)
    }

    /// The shape of the type.
    pub fn kind(self) -> TypeKind {
        self.kind
    }

    /// Whether `null` is a member of the type.
    pub fn is_nullable(self) -> bool {
        self.nullable
    }

    /// Checks `self <: other`.
    pub fn is_subtype_of(self, other: AbstractType) -> bool {
        (!self.nullable || other.nullable) && self.kind.is_subtype_of(other.kind)
    }
}

/// What the compiler statically knows about the values a definition can
/// produce: whether it can be `null`, which concrete class it has (if it is
/// known), and an abstract supertype.
///
/// These are computed by type propagation and only read by the constant
/// propagator.
///
/// ```
/// # use onyx::ir::{ClassId, CompileType};
/// let mut ty = CompileType::smi();
///
/// assert_eq!(ty.to_cid(), ClassId::SMI);
///
/// ty.union(&CompileType::null());
///
/// assert!(ty.is_nullable());
/// assert_eq!(ty.to_cid(), ClassId::DYNAMIC);
/// assert_eq!(ty.to_nullable_cid(), ClassId::SMI);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct CompileType {
    nullable: bool,
    // ILLEGAL here means "not exactly known", derive it from `kind`
    cid: ClassId,
    kind: TypeKind,
}

impl CompileType {
    fn new(nullable: bool, cid: ClassId, kind: TypeKind) -> Self {
        Self {
            nullable,
            cid,
            kind,
        }
    }

    /// Any value at all.
    pub fn dynamic() -> Self {
        Self::new(true, ClassId::DYNAMIC, TypeKind::Dynamic)
    }

    /// No values. This is the starting point for phis during type propagation.
    pub fn none() -> Self {
        Self::new(false, ClassId::ILLEGAL, TypeKind::Never)
    }

    /// Only `null`.
    pub fn null() -> Self {
        Self::new(true, ClassId::NULL, TypeKind::Never)
    }

    /// Non-null booleans.
    pub fn bool() -> Self {
        Self::new(false, ClassId::BOOL, TypeKind::Bool)
    }

    /// Non-null integers, small or boxed.
    pub fn int() -> Self {
        Self::new(false, ClassId::ILLEGAL, TypeKind::Int)
    }

    /// Non-null small integers.
    pub fn smi() -> Self {
        Self::new(false, ClassId::SMI, TypeKind::Int)
    }

    /// Non-null doubles.
    pub fn double() -> Self {
        Self::new(false, ClassId::DOUBLE, TypeKind::Double)
    }

    /// Non-null strings.
    pub fn string() -> Self {
        Self::new(false, ClassId::STRING, TypeKind::String)
    }

    /// Values of exactly class `cid`.
    pub fn from_cid(cid: ClassId) -> Self {
        match cid {
            ClassId::NULL => Self::null(),
            ClassId::DYNAMIC => Self::dynamic(),
            ClassId::ILLEGAL => Self::none(),
            cid => Self::new(false, cid, TypeKind::for_cid(cid)),
        }
    }

    /// The exact type of a constant.
    pub fn from_constant(value: &ConstValue, word: WordSize) -> Self {
        Self::from_cid(value.class_id(word))
    }

    /// Whether `null` is a possible value.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether `null` is the *only* possible value.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.nullable && self.kind == TypeKind::Never
    }

    /// Whether no value is possible.
    #[inline]
    pub fn is_none(&self) -> bool {
        !self.nullable && self.kind == TypeKind::Never
    }

    /// Whether "is this value `null`" can be answered statically.
    #[inline]
    pub fn has_decidable_nullability(&self) -> bool {
        !self.nullable || self.is_null()
    }

    /// Whether every value is a non-null boolean.
    #[inline]
    pub fn is_bool(&self) -> bool {
        !self.nullable && self.kind == TypeKind::Bool
    }

    /// The concrete class ignoring `null`, or [`ClassId::DYNAMIC`] if unknown.
    pub fn to_nullable_cid(&self) -> ClassId {
        if self.cid != ClassId::ILLEGAL {
            return self.cid;
        }

        match self.kind {
            TypeKind::Never if self.nullable => ClassId::NULL,
            TypeKind::Never => ClassId::ILLEGAL,
            TypeKind::Double => ClassId::DOUBLE,
            TypeKind::Bool => ClassId::BOOL,
            TypeKind::String => ClassId::STRING,
            _ => ClassId::DYNAMIC,
        }
    }

    /// The concrete class of every value, or [`ClassId::DYNAMIC`] if it is not
    /// one single class (including the case of "some class, or `null`").
    pub fn to_cid(&self) -> ClassId {
        if self.is_null() {
            ClassId::NULL
        } else if self.nullable {
            ClassId::DYNAMIC
        } else {
            self.to_nullable_cid()
        }
    }

    /// The abstract supertype.
    pub fn to_abstract_type(&self) -> AbstractType {
        AbstractType::new(self.kind, self.nullable)
    }

    /// Whether every possible value is a member of `other`.
    pub fn is_assignable_to(&self, other: AbstractType) -> bool {
        if self.is_none() {
            return true;
        }

        if self.is_null() {
            return other.nullable;
        }

        self.to_abstract_type().is_subtype_of(other)
    }

    /// Widens `self` to also describe every value `other` describes.
    pub fn union(&mut self, other: &CompileType) {
        if other.is_none() {
            return;
        }

        if self.is_none() {
            *self = *other;
            return;
        }

        if other.is_null() {
            self.nullable = true;
            return;
        }

        if self.is_null() {
            *self = *other;
            self.nullable = true;
            return;
        }

        self.nullable |= other.nullable;
        self.kind = self.kind.join(other.kind);

        if self.cid != other.cid {
            self.cid = match self.kind {
                TypeKind::Dynamic => ClassId::DYNAMIC,
                _ => ClassId::ILLEGAL,
            };
        }
    }

    /// The same type without `null`.
    pub fn without_null(&self) -> Self {
        if self.is_null() {
            Self::none()
        } else {
            Self {
                nullable: false,
                cid: if self.cid == ClassId::DYNAMIC {
                    ClassId::ILLEGAL
                } else {
                    self.cid
                },
                kind: if self.kind == TypeKind::Dynamic {
                    TypeKind::Object
                } else {
                    self.kind
                },
            }
        }
    }
}

impl Display for CompileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let q = if self.nullable { "?" } else { "" };

        match self.kind {
            TypeKind::Never if self.nullable => write!(f, "Null"),
            TypeKind::Never => write!(f, "<none>"),
            TypeKind::Dynamic => write!(f, "dynamic"),
            _ if self.cid.is_concrete() => write!(f, "{}{q}", self.cid),
            kind => write!(f, "{kind:?}{q}"),
        }
    }
}
