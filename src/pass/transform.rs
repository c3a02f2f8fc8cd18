//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::context::CompilationContext;
use crate::ir::FlowGraph;
use crate::pass::PreservedAnalyses;

/// Defines a transformation over a single flow graph.
///
/// While the pass may not actually modify the graph, it has the ability to, and needs to
/// declare what it changed (if anything) through [`PreservedAnalyses`](crate::pass::PreservedAnalyses).
pub trait GraphTransformPass {
    /// A short name for the pass, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Performs the transformation over a given graph.
    ///
    /// This function is expected to act as-if it was pure, i.e. calling the same
    /// pass multiple times on the same graph should produce equivalent graphs each time.
    fn run(&mut self, graph: &mut FlowGraph, ctx: &mut CompilationContext) -> PreservedAnalyses;
}
