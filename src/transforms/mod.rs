//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Optimization passes over a [`crate::ir::FlowGraph`].
//!
//! Every pass comes in two forms: a plain function that does the work, and
//! a [`crate::pass::GraphTransformPass`] wrapper so it can be scheduled by
//! a [`crate::pass::PassManager`].

pub mod common;
pub mod constprop;

mod dce;
mod type_propagation;
mod verify;

pub use constprop::{BranchSimplificationPass, ConstantPropagationPass, ConstantPropagator};
pub use dce::*;
pub use type_propagation::*;
pub use verify::*;
