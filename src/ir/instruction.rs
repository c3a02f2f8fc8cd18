//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Block, ClassId, ConstValue};
use crate::utility::PackedOption;
use paste::paste;
use smallvec::SmallVec;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Integer binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `~/`, truncating division
    TruncDiv,
    /// `%`, Euclidean modulo (the result is never negative)
    Mod,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`, arithmetic
    Shr,
    /// `>>>`, logical
    UShr,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::TruncDiv => "~/",
            Self::Mod => "%",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::UShr => ">>>",
        })
    }
}

/// Integer unary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `~x`
    BitNot,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Negate => "-",
            Self::BitNot => "~",
        })
    }
}

/// Double binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum DoubleOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

impl Display for DoubleOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        })
    }
}

/// Numeric comparison operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ComparisonKind {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl Display for ComparisonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        })
    }
}

/// Identity comparison operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum StrictKind {
    /// `===`
    Identical,
    /// `!==`
    NotIdentical,
}

impl StrictKind {
    /// The result of the comparison if the operands are (`true`) or are
    /// not (`false`) identical.
    #[inline]
    pub fn result(self, identical: bool) -> bool {
        match self {
            Self::Identical => identical,
            Self::NotIdentical => !identical,
        }
    }
}

impl Display for StrictKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identical => "===",
            Self::NotIdentical => "!==",
        })
    }
}

/// How an integer value is represented in registers. Results of integer
/// operations are truncated to the width of their representation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Representation {
    /// A tagged object pointer, integers are full 64-bit values.
    Tagged,
    /// An unboxed 64-bit integer.
    Int64,
    /// An unboxed signed 32-bit integer.
    Int32,
    /// An unboxed unsigned 32-bit integer.
    Uint32,
}

/// A field that can be loaded from or stored into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Slot {
    /// The length of an array. Never changes once allocated.
    ArrayLength,
    /// The length of a string.
    StringLength,
    /// The `index`th instance field.
    Field {
        /// Which field.
        index: u32,
        /// Whether the field is never written after initialization.
        is_final: bool,
    },
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArrayLength => write!(f, "Array.length"),
            Self::StringLength => write!(f, "String.length"),
            Self::Field { index, is_final } => {
                write!(f, "{}field{index}", if *is_final { "final " } else { "" })
            }
        }
    }
}

/// A static (global) field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct StaticField {
    /// The field's name.
    pub name: Arc<str>,
    /// Whether the field is never written after initialization.
    pub is_final: bool,
    /// The value of the field, if it is already initialized at compile time.
    pub value: Option<ConstValue>,
}

/// Calls that the optimizer knows the semantics of.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum RecognizedKind {
    /// `String.length(s)`
    StringLength,
    /// `String.==(a, b)`
    StringEquals,
    /// `int.abs(x)`
    IntegerAbs,
}

/// The target of a static call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum CallTarget {
    /// A function with known, pure semantics.
    Recognized(RecognizedKind),
    /// Any other function.
    Function(Arc<str>),
}

impl Display for CallTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognized(kind) => write!(f, "{kind:?}"),
            Self::Function(name) => write!(f, "{name}"),
        }
    }
}

/// The closed set of instruction kinds.
///
/// Operands are not stored here, they live in the instruction's input list
/// inside the [`FlowGraph`](crate::ir::FlowGraph) so that use edges can be
/// maintained generically. The comment on each variant gives the meaning of
/// each input.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum InstData {
    /// A literal value. Canonical constants live in the graph entry.
    Constant(ConstValue),
    /// The `n`th incoming parameter of an entry block.
    Parameter(u32),
    /// One input per predecessor of the owning join block.
    Phi,
    /// `[value]`, the same value with refined type information.
    Redefinition,
    /// `[left, right]`
    BinaryIntegerOp {
        /// The operator.
        op: BinaryOp,
        /// The representation the result is truncated to.
        representation: Representation,
    },
    /// `[value]`
    UnaryIntegerOp {
        /// The operator.
        op: UnaryOp,
        /// The representation the result is truncated to.
        representation: Representation,
    },
    /// `[left, right]`
    BinaryDoubleOp(DoubleOp),
    /// `[left, right]`, identity comparison.
    StrictCompare(StrictKind),
    /// `[left, right]`, numeric comparison.
    Compare(ComparisonKind),
    /// `[value]`
    BooleanNegate,
    /// `[instance]`
    LoadField(Slot),
    /// `[array, index]`
    LoadIndexed,
    /// No inputs.
    LoadStaticField(StaticField),
    /// `[value]`, throws if `value` is null, otherwise produces `value`.
    CheckNull,
    /// `[length, index]`, deoptimizes if `index` is out of bounds, otherwise produces `index`.
    CheckArrayBound,
    /// `[length, index]`, throws if `index` is out of bounds, otherwise produces `index`.
    GenericCheckBound,
    /// `[args...]`
    StaticCall(CallTarget),
    /// `[receiver, args...]`, a dynamically dispatched call.
    InstanceCall(Arc<str>),
    /// No inputs.
    AllocateObject(ClassId),
    /// `[instance, value]`
    StoreField(Slot),
    /// `[array, index, value]`
    StoreIndexed,
    /// `[value]`
    StoreStaticField(StaticField),
    /// No inputs, unconditional jump.
    Goto(Block),
    /// `[condition]`
    Branch {
        /// Taken when the condition is `true`.
        true_target: Block,
        /// Taken when the condition is `false`.
        false_target: Block,
        /// Set when an earlier pass already proved which side is taken.
        constant_target: PackedOption<Block>,
    },
    /// `[offset]`, a computed jump to one of the targets.
    IndirectGoto(SmallVec<[Block; 4]>),
    /// `[value]`
    Return,
    /// `[exception]`
    Throw,
}

macro_rules! kind_predicates {
    ($($variant:ident),* $(,)?) => {
        paste! {
            impl InstData {
                $(
                    #[doc = "Checks if this is a `" $variant "` instruction."]
                    #[inline]
                    pub fn [<is_ $variant:snake>](&self) -> bool {
                        matches!(self, InstData::$variant { .. })
                    }
                )*
            }
        }
    };
}

kind_predicates!(
    Constant,
    Parameter,
    Phi,
    Redefinition,
    BinaryIntegerOp,
    StrictCompare,
    CheckNull,
    CheckArrayBound,
    GenericCheckBound,
    Goto,
    Branch,
    IndirectGoto,
    Return,
    Throw,
);

impl InstData {
    /// Whether the instruction produces a value.
    pub fn has_result(&self) -> bool {
        !matches!(
            self,
            Self::StoreField(_)
                | Self::StoreIndexed
                | Self::StoreStaticField(_)
                | Self::Goto(_)
                | Self::Branch { .. }
                | Self::IndirectGoto(_)
                | Self::Return
                | Self::Throw
        )
    }

    /// Whether the instruction ends a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Self::Goto(_) | Self::Branch { .. } | Self::IndirectGoto(_) | Self::Return | Self::Throw
        )
    }

    /// The blocks control can flow to after this instruction.
    pub fn successors(&self) -> SmallVec<[Block; 2]> {
        match self {
            Self::Goto(target) => smallvec::smallvec![*target],
            Self::Branch {
                true_target,
                false_target,
                ..
            } => smallvec::smallvec![*true_target, *false_target],
            Self::IndirectGoto(targets) => targets.iter().copied().collect(),
            _ => SmallVec::new(),
        }
    }

    /// Gets the constant, if this is a constant.
    #[inline]
    pub fn as_constant(&self) -> Option<&ConstValue> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// The name of the instruction kind, as it appears in printed graphs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Constant(_) => "Constant",
            Self::Parameter(_) => "Parameter",
            Self::Phi => "phi",
            Self::Redefinition => "Redefinition",
            Self::BinaryIntegerOp { .. } => "BinaryIntegerOp",
            Self::UnaryIntegerOp { .. } => "UnaryIntegerOp",
            Self::BinaryDoubleOp(_) => "BinaryDoubleOp",
            Self::StrictCompare(_) => "StrictCompare",
            Self::Compare(_) => "Compare",
            Self::BooleanNegate => "BooleanNegate",
            Self::LoadField(_) => "LoadField",
            Self::LoadIndexed => "LoadIndexed",
            Self::LoadStaticField(_) => "LoadStaticField",
            Self::CheckNull => "CheckNull",
            Self::CheckArrayBound => "CheckArrayBound",
            Self::GenericCheckBound => "GenericCheckBound",
            Self::StaticCall(_) => "StaticCall",
            Self::InstanceCall(_) => "InstanceCall",
            Self::AllocateObject(_) => "AllocateObject",
            Self::StoreField(_) => "StoreField",
            Self::StoreIndexed => "StoreIndexed",
            Self::StoreStaticField(_) => "StoreStaticField",
            Self::Goto(_) => "goto",
            Self::Branch { .. } => "Branch",
            Self::IndirectGoto(_) => "IndirectGoto",
            Self::Return => "Return",
            Self::Throw => "Throw",
        }
    }
}
