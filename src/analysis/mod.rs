//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains the analyses that the flow graph and the optimizations rely on.
//!
//! These compute information *about* a graph (block orders, dominance, a
//! textual form) without changing it. The graph itself stores the results
//! of the first two, see [`FlowGraph::discover_blocks`] and
//! [`FlowGraph::compute_dominators`].
//!
//! [`FlowGraph::discover_blocks`]: crate::ir::FlowGraph::discover_blocks
//! [`FlowGraph::compute_dominators`]: crate::ir::FlowGraph::compute_dominators

mod discovery;
mod dominators;
mod writer;

pub use discovery::*;
pub use dominators::*;
pub use writer::*;
