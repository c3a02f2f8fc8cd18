//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Provides the interfaces and the types required to properly
//! build and manipulate SSA flow graphs.
//!
//! This only contains the code for representing and transforming the graph
//! itself, the transforms done by optimizations are defined in
//! [`crate::transforms`].

mod block;
mod builders;
mod constant;
mod entities;
mod flow_graph;
mod inst_builder;
mod instruction;
mod layout;
mod types;

pub use block::*;
pub use builders::*;
pub use constant::*;
pub use entities::*;
pub use flow_graph::*;
pub use inst_builder::*;
pub use instruction::*;
pub use layout::*;
pub use types::*;
