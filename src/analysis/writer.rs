//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena::SecondaryMap;
use crate::ir::*;
use std::fmt::Write;
use std::ops::Range;

/// A simple graph -> text writer that turns an entire graph into text, and
/// then maps each block and instruction to the range of text referring to it.
///
/// Blocks are written in reverse postorder, each block header lists its kind
/// and (for non-entries) its predecessors:
///
/// ```text
/// B2[join] pred(B1, B3)
///   v2 <- phi(v0, v2)
///   v3 <- StrictCompare(===, v2, v0)
///   Branch if v3 goto (B4, B3)
/// ```
#[derive(Debug, Clone)]
pub struct GraphWriter {
    whole: String,
    inst_ranges: SecondaryMap<Inst, Range<usize>>,
    block_ranges: SecondaryMap<Block, Range<usize>>,
}

impl GraphWriter {
    /// Stringifies every reachable block of `graph`.
    pub fn from(graph: &FlowGraph) -> Self {
        let mut state = Self {
            whole: String::default(),
            inst_ranges: SecondaryMap::new(),
            block_ranges: SecondaryMap::new(),
        };

        let blocks: Vec<Block> = if graph.postorder().is_empty() {
            graph.all_blocks().collect()
        } else {
            graph.reverse_postorder().collect()
        };

        for block in blocks {
            state.write_block(graph, block);
        }

        state
    }

    fn write_block(&mut self, graph: &FlowGraph, block: Block) {
        let start = self.whole.len();
        let data = graph.block(block);

        self.whole.push_str(&format!("{block}[{}]", data.kind()));

        if !data.kind().is_entry_like() && !data.predecessors().is_empty() {
            self.whole.push_str(" pred(");
            self.whole.push_str(&comma_separated(data.predecessors()));
            self.whole.push(')');
        }

        self.whole.push('\n');

        let insts = data
            .initial_definitions()
            .iter()
            .chain(data.phis().iter())
            .copied()
            .chain(graph.insts_in_block(block));

        for inst in insts {
            self.whole.push_str("  ");

            let inst_start = self.whole.len();

            self.whole.push_str(&format_inst(graph, inst));
            self.inst_ranges.insert(inst, inst_start..self.whole.len());
            self.whole.push('\n');
        }

        self.block_ranges.insert(block, start..self.whole.len());
    }

    /// Stringifies a single instruction, including the result if it has one.
    pub fn inst(&self, inst: Inst) -> &str {
        &self.whole[self.inst_ranges[inst].clone()]
    }

    /// Stringifies a whole block, header and instructions.
    pub fn block(&self, block: Block) -> &str {
        &self.whole[self.block_ranges[block].clone()]
    }

    /// Returns the entire graph as a string.
    pub fn graph(&self) -> &str {
        &self.whole
    }
}

/// Prints an entire graph to `stdout`.
///
/// Wrapper for when building a [`GraphWriter`] and querying it is too much.
pub fn print_graph(graph: &FlowGraph) {
    println!("{}", GraphWriter::from(graph).graph());
}

/// Stringifies a single instruction, e.g. `v3 <- BinaryIntegerOp(+, v1, v2)`.
pub fn format_inst(graph: &FlowGraph, inst: Inst) -> String {
    let node = graph.inst(inst);
    let inputs = comma_separated(node.inputs());
    let mut out = String::new();

    if node.data().has_result() {
        let _ = write!(out, "{inst} <- ");
    }

    // writing into a `String` cannot fail
    let _ = match node.data() {
        InstData::Constant(value) => write!(out, "Constant({value})"),
        InstData::Parameter(index) => write!(out, "Parameter({index})"),
        InstData::BinaryIntegerOp { op, representation } => {
            write!(out, "BinaryIntegerOp({op}, {inputs})")
                .and_then(|_| write_representation(&mut out, *representation))
        }
        InstData::UnaryIntegerOp { op, representation } => {
            write!(out, "UnaryIntegerOp({op}, {inputs})")
                .and_then(|_| write_representation(&mut out, *representation))
        }
        InstData::BinaryDoubleOp(op) => write!(out, "BinaryDoubleOp({op}, {inputs})"),
        InstData::StrictCompare(kind) => write!(out, "StrictCompare({kind}, {inputs})"),
        InstData::Compare(kind) => write!(out, "Compare({kind}, {inputs})"),
        InstData::LoadField(slot) => write!(out, "LoadField({slot}, {inputs})"),
        InstData::StoreField(slot) => write!(out, "StoreField({slot}, {inputs})"),
        InstData::LoadStaticField(field) => write!(out, "LoadStaticField({})", field.name),
        InstData::StoreStaticField(field) => {
            write!(out, "StoreStaticField({}, {inputs})", field.name)
        }
        InstData::StaticCall(target) if inputs.is_empty() => write!(out, "StaticCall({target})"),
        InstData::StaticCall(target) => write!(out, "StaticCall({target}, {inputs})"),
        InstData::InstanceCall(selector) => write!(out, "InstanceCall({selector}, {inputs})"),
        InstData::AllocateObject(cid) => write!(out, "AllocateObject({cid})"),
        InstData::Goto(target) => write!(out, "goto {target}"),
        InstData::Branch {
            true_target,
            false_target,
            constant_target,
        } => {
            write!(
                out,
                "Branch if {inputs} goto ({true_target}, {false_target})"
            )
            .and_then(|_| match constant_target.expand() {
                Some(target) => write!(out, " always {target}"),
                None => Ok(()),
            })
        }
        InstData::IndirectGoto(targets) => {
            write!(out, "IndirectGoto({inputs}) ({})", comma_separated(targets))
        }
        data => write!(out, "{}({inputs})", data.name()),
    };

    out
}

fn write_representation(out: &mut String, representation: Representation) -> std::fmt::Result {
    match representation {
        Representation::Tagged => Ok(()),
        other => write!(out, " [{other:?}]"),
    }
}

fn comma_separated<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilationContext;

    #[test]
    fn writes_blocks_in_reverse_postorder() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let one = b.iconst(1);
        let join = b.create_block(BlockKind::Join);

        b.switch_to(entry);
        let sum = b.append().iadd(x, one);
        b.append().goto(join);
        b.switch_to(join);
        b.append().ret(sum);

        let graph = b.finish();
        let writer = GraphWriter::from(&graph);

        assert_eq!(
            writer.graph(),
            "B0[graph entry]\n\
             \x20 v1 <- Constant(#1)\n\
             B1[function entry]\n\
             \x20 v0 <- Parameter(0)\n\
             \x20 v2 <- BinaryIntegerOp(+, v0, v1)\n\
             \x20 goto B2\n\
             B2[join] pred(B1)\n\
             \x20 Return(v2)\n"
        );
        assert_eq!(writer.inst(sum), "v2 <- BinaryIntegerOp(+, v0, v1)");
        assert_eq!(writer.block(join), "B2[join] pred(B1)\n  Return(v2)\n");
    }

    #[test]
    fn branches_and_unboxed_ops() {
        let mut ctx = CompilationContext::default();
        let mut b = GraphBuilder::new(&mut ctx);
        let entry = b.function_entry();
        let x = b.parameter(entry, 0);
        let left = b.create_block(BlockKind::Target);
        let right = b.create_block(BlockKind::Target);

        b.switch_to(entry);
        let masked = b
            .append()
            .binary_int_op(BinaryOp::BitAnd, Representation::Int32, x, x);
        let cond = b.append().strict_compare(StrictKind::Identical, masked, x);
        let br = b.append().branch(cond, left, right);
        b.switch_to(left);
        b.append().ret(x);
        b.switch_to(right);
        b.append().throw(x);

        let graph = b.finish();
        let writer = GraphWriter::from(&graph);

        assert_eq!(writer.inst(masked), "v1 <- BinaryIntegerOp(&, v0, v0) [Int32]");
        assert_eq!(writer.inst(cond), "v2 <- StrictCompare(===, v1, v0)");
        assert_eq!(writer.inst(br), "Branch if v2 goto (B2, B3)");
    }
}
