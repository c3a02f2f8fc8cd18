//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


#![deny(
    unreachable_pub,
    missing_docs,
    missing_abi,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Onyx
//!
//! An SSA optimizer core for a dynamic language JIT. Functions are modeled as
//! a [`ir::FlowGraph`] of basic blocks holding instructions with explicit
//! use lists, and are optimized by the passes in [`transforms`], most
//! importantly sparse conditional constant propagation.
//!
//! ```
//! # use onyx::context::CompilationContext;
//! # use onyx::ir::*;
//! let mut ctx = CompilationContext::default();
//! let mut b = GraphBuilder::new(&mut ctx);
//! let entry = b.function_entry();
//! let three = b.iconst(3);
//! let four = b.iconst(4);
//!
//! b.switch_to(entry);
//! let sum = b.append().iadd(three, four);
//! b.append().ret(sum);
//!
//! let mut graph = b.finish();
//!
//! onyx::run_passes(&mut graph, &mut ctx, &["sccp", "dce"]);
//!
//! let ret = graph.terminator(entry).unwrap();
//! let value = graph.input(ret, 0);
//!
//! assert_eq!(graph.data(value).as_constant().and_then(|c| c.as_int()), Some(7));
//! ```

pub mod analysis;
pub mod arena;
pub mod context;
pub mod ir;
pub mod pass;
pub mod transforms;
pub mod utility;

use crate::context::CompilationContext;
use crate::ir::FlowGraph;
use crate::pass::{GraphTransformPass, PassManager, PreservedAnalyses};
use crate::transforms::{
    BranchSimplificationPass, ConstantPropagationPass, DeadCodeEliminationPass,
    TypePropagationPass, VerifyGraphPass,
};

static_assertions::assert_impl_all!(FlowGraph: Send, Sync, Clone);
static_assertions::assert_impl_all!(CompilationContext: Send);

/// Runs a list of passes over `graph`, in order, by name.
///
/// The recognized names are `sccp`, `sccp-branches`, `dce`,
/// `type-propagation` and `verify`. Panics on any other name.
pub fn run_passes(
    graph: &mut FlowGraph,
    ctx: &mut CompilationContext,
    passes: &[&str],
) -> PreservedAnalyses {
    let mut pm = PassManager::new();

    for pass in passes {
        match *pass {
            "sccp" => pm.add_pass(ConstantPropagationPass),
            "sccp-branches" => pm.add_pass(BranchSimplificationPass),
            "dce" => pm.add_pass(DeadCodeEliminationPass),
            "type-propagation" => pm.add_pass(TypePropagationPass),
            "verify" => pm.add_pass(VerifyGraphPass),
            other => panic!("unknown pass `{other}`"),
        }
    }

    pm.run(graph, ctx)
}
