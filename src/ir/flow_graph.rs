//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{compute_block_orders, DominatorTree};
use crate::arena::{ArenaMap, SecondarySet};
use crate::context::{DeoptId, WordSize};
use crate::ir::*;
use crate::utility::{PackedOption, SaHashMap};
use smallvec::SmallVec;
use std::mem;

/// Where an instruction currently lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Placement {
    /// Removed from the graph (or never inserted).
    Detached,
    /// In the normal instruction list of some block.
    Listed,
    /// In the phi list of a block.
    Phi(Block),
    /// In the initial definition list of a block.
    Initial(Block),
}

/// Everything the graph knows about a single instruction.
#[derive(Clone, Debug)]
pub struct InstNode {
    data: InstData,
    inputs: SmallVec<[Inst; 2]>,
    env: Vec<Inst>,
    input_uses: Vec<Use>,
    env_uses: Vec<Use>,
    ty: CompileType,
    deopt_id: Option<DeoptId>,
    placement: Placement,
}

impl InstNode {
    /// The kind of the instruction.
    #[inline]
    pub fn data(&self) -> &InstData {
        &self.data
    }

    /// The definitions read as data inputs, in order.
    #[inline]
    pub fn inputs(&self) -> &[Inst] {
        &self.inputs
    }

    /// The definitions captured by the deoptimization environment.
    #[inline]
    pub fn env(&self) -> &[Inst] {
        &self.env
    }

    /// Every use of this definition as a data input.
    #[inline]
    pub fn input_uses(&self) -> &[Use] {
        &self.input_uses
    }

    /// Every use of this definition in an environment.
    #[inline]
    pub fn env_uses(&self) -> &[Use] {
        &self.env_uses
    }

    /// Whether anything at all uses this definition.
    #[inline]
    pub fn has_uses(&self) -> bool {
        !self.input_uses.is_empty() || !self.env_uses.is_empty()
    }

    /// The static type of the value produced.
    #[inline]
    pub fn ty(&self) -> CompileType {
        self.ty
    }

    /// The deoptimization id of the instruction, if it has one.
    #[inline]
    pub fn deopt_id(&self) -> Option<DeoptId> {
        self.deopt_id
    }
}

/// A function's control-flow graph in SSA form.
///
/// The graph owns every block and instruction. Blocks and instructions refer
/// to each other by key, and every use edge is recorded on both ends: in the
/// input (or environment) list of the user, and in the use list of the
/// definition being read. Every mutating operation here keeps both ends
/// consistent.
///
/// The block orderings and the dominator tree are *not* updated
/// automatically. After changing control flow, call [`Self::discover_blocks`]
/// and [`Self::compute_dominators`].
#[derive(Clone, Debug)]
pub struct FlowGraph {
    blocks: ArenaMap<Block, BlockData>,
    insts: ArenaMap<Inst, InstNode>,
    layout: Layout,
    graph_entry: Block,
    function_entry: PackedOption<Block>,
    osr_entry: PackedOption<Block>,
    catch_entries: Vec<Block>,
    constants: SaHashMap<ConstValue, Inst>,
    preorder: Vec<Block>,
    postorder: Vec<Block>,
    word_size: WordSize,
}

impl FlowGraph {
    /// Creates a graph containing only a graph entry block.
    pub fn new(word_size: WordSize) -> Self {
        let mut blocks = ArenaMap::new();
        let graph_entry = blocks.insert(BlockData::new(BlockKind::GraphEntry, None));

        Self {
            blocks,
            insts: ArenaMap::new(),
            layout: Layout::new(),
            graph_entry,
            function_entry: PackedOption::none(),
            osr_entry: PackedOption::none(),
            catch_entries: Vec::new(),
            constants: SaHashMap::default(),
            preorder: Vec::new(),
            postorder: Vec::new(),
            word_size,
        }
    }

    /// The word size the graph is being compiled for.
    #[inline]
    pub fn word_size(&self) -> WordSize {
        self.word_size
    }

    /// The root block of the graph.
    #[inline]
    pub fn graph_entry(&self) -> Block {
        self.graph_entry
    }

    /// The normal function entry, if one has been created.
    #[inline]
    pub fn function_entry(&self) -> Option<Block> {
        self.function_entry.expand()
    }

    /// The on-stack-replacement entry, if there is one.
    #[inline]
    pub fn osr_entry(&self) -> Option<Block> {
        self.osr_entry.expand()
    }

    /// Every exception handler entry.
    #[inline]
    pub fn catch_entries(&self) -> &[Block] {
        &self.catch_entries
    }

    /// Creates a new block that is not connected to anything yet.
    ///
    /// Entry kinds are registered as successors of the graph entry.
    pub fn create_block(&mut self, kind: BlockKind, try_index: Option<u32>) -> Block {
        let block = self.blocks.insert(BlockData::new(kind, try_index));

        match kind {
            BlockKind::GraphEntry => panic!("a graph can only have one graph entry"),
            BlockKind::FunctionEntry => {
                assert!(self.function_entry.is_none(), "duplicate function entry");

                self.function_entry = PackedOption::some(block);
            }
            BlockKind::OsrEntry => {
                assert!(self.osr_entry.is_none(), "duplicate osr entry");

                self.osr_entry = PackedOption::some(block);
            }
            BlockKind::CatchEntry => self.catch_entries.push(block),
            _ => {}
        }

        block
    }

    /// Gets the data for a block.
    #[inline]
    pub fn block(&self, block: Block) -> &BlockData {
        &self.blocks[block]
    }

    /// Every block ever created, including unreachable ones.
    pub fn all_blocks(&self) -> impl Iterator<Item = Block> {
        self.blocks.keys()
    }

    /// Gets the node for an instruction.
    #[inline]
    pub fn inst(&self, inst: Inst) -> &InstNode {
        &self.insts[inst]
    }

    /// Gets the kind of an instruction.
    #[inline]
    pub fn data(&self, inst: Inst) -> &InstData {
        &self.insts[inst].data
    }

    /// Gets input `index` of `inst`.
    #[inline]
    pub fn input(&self, inst: Inst, index: usize) -> Inst {
        self.insts[inst].inputs[index]
    }

    /// The static type of a definition.
    #[inline]
    pub fn ty(&self, inst: Inst) -> CompileType {
        self.insts[inst].ty
    }

    /// Overwrites the static type of a definition.
    pub fn set_type(&mut self, inst: Inst, ty: CompileType) {
        self.insts[inst].ty = ty;
    }

    /// The next SSA index that will be handed out.
    #[inline]
    pub fn next_inst(&self) -> Inst {
        self.insts.next_key()
    }

    /// The number of instructions ever created, attached or not.
    #[inline]
    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    /// Gets the block an instruction is in, if it is in one.
    pub fn inst_block(&self, inst: Inst) -> Option<Block> {
        match self.insts[inst].placement {
            Placement::Detached => None,
            Placement::Listed => self.layout.inst_block(inst),
            Placement::Phi(block) | Placement::Initial(block) => Some(block),
        }
    }

    /// Whether the instruction is currently part of the graph.
    #[inline]
    pub fn is_attached(&self, inst: Inst) -> bool {
        self.insts[inst].placement != Placement::Detached
    }

    /// Iterates over the normal instructions of a block (no phis or initial definitions).
    pub fn insts_in_block(&self, block: Block) -> InstIter<'_> {
        self.layout.insts_in_block(block)
    }

    /// The instruction after `inst` in its block.
    #[inline]
    pub fn inst_next(&self, inst: Inst) -> Option<Inst> {
        self.layout.inst_next(inst)
    }

    /// The first normal instruction of a block.
    #[inline]
    pub fn block_first_inst(&self, block: Block) -> Option<Inst> {
        self.layout.block_first_inst(block)
    }

    /// The terminator of a block, if the block has one.
    pub fn terminator(&self, block: Block) -> Option<Inst> {
        self.layout
            .block_last_inst(block)
            .filter(|inst| self.insts[*inst].data.is_terminator())
    }

    /// The successors of a block, in terminator order.
    pub fn successors(&self, block: Block) -> SmallVec<[Block; 2]> {
        if block == self.graph_entry {
            let mut succs = SmallVec::new();

            succs.extend(self.function_entry.expand());
            succs.extend(self.osr_entry.expand());
            succs.extend(self.catch_entries.iter().copied());

            return succs;
        }

        match self.terminator(block) {
            Some(term) => self.insts[term].data.successors(),
            None => SmallVec::new(),
        }
    }

    fn create_inst(&mut self, data: InstData, inputs: &[Inst], deopt_id: Option<DeoptId>) -> Inst {
        let inst = self.insts.insert(InstNode {
            data,
            inputs: SmallVec::from_slice(inputs),
            env: Vec::new(),
            input_uses: Vec::new(),
            env_uses: Vec::new(),
            ty: CompileType::dynamic(),
            deopt_id,
            placement: Placement::Detached,
        });

        for (i, input) in inputs.iter().copied().enumerate() {
            self.add_use(input, Use::input(inst, i));
        }

        self.insts[inst].ty = self.compute_type(inst);

        inst
    }

    /// Creates an instruction and appends it to the end of `block`.
    pub fn append_inst(
        &mut self,
        block: Block,
        data: InstData,
        inputs: &[Inst],
        deopt_id: Option<DeoptId>,
    ) -> Inst {
        debug_assert!(
            self.terminator(block).is_none(),
            "cannot append after the terminator of {block}"
        );

        let inst = self.create_inst(data, inputs, deopt_id);

        self.layout.append_inst(inst, block);
        self.insts[inst].placement = Placement::Listed;

        inst
    }

    /// Creates an instruction and inserts it directly after `after`.
    pub fn insert_inst_after(
        &mut self,
        after: Inst,
        data: InstData,
        inputs: &[Inst],
        deopt_id: Option<DeoptId>,
    ) -> Inst {
        assert_eq!(self.insts[after].placement, Placement::Listed);

        let inst = self.create_inst(data, inputs, deopt_id);

        self.layout.insert_inst_after(inst, after);
        self.insts[inst].placement = Placement::Listed;

        inst
    }

    /// Creates an instruction and inserts it directly before `before`.
    pub fn insert_inst_before(
        &mut self,
        before: Inst,
        data: InstData,
        inputs: &[Inst],
        deopt_id: Option<DeoptId>,
    ) -> Inst {
        assert_eq!(self.insts[before].placement, Placement::Listed);

        let inst = self.create_inst(data, inputs, deopt_id);

        self.layout.insert_inst_before(inst, before);
        self.insts[inst].placement = Placement::Listed;

        inst
    }

    /// Adds a phi to a join-like block. There must be one input per predecessor.
    pub fn add_phi(&mut self, block: Block, inputs: &[Inst]) -> Inst {
        assert!(
            self.blocks[block].kind.is_join_like(),
            "phis can only be added to joins, not {}",
            self.blocks[block].kind
        );

        let phi = self.create_inst(InstData::Phi, inputs, None);

        self.insts[phi].placement = Placement::Phi(block);
        self.blocks[block].phis.push(phi);

        phi
    }

    /// Adds an initial definition (a parameter or constant) to an entry-like block.
    pub fn add_initial_definition(&mut self, block: Block, data: InstData) -> Inst {
        assert!(
            self.blocks[block].kind.is_entry_like(),
            "initial definitions can only be added to entries, not {}",
            self.blocks[block].kind
        );
        debug_assert!(matches!(
            data,
            InstData::Parameter(_) | InstData::Constant(_)
        ));

        let def = self.create_inst(data, &[], None);

        self.insts[def].placement = Placement::Initial(block);
        self.blocks[block].initial_defs.push(def);

        def
    }

    /// Gets the canonical constant node for `value`, creating it in the graph
    /// entry if it doesn't exist yet. Non-canonical values get a fresh node
    /// every time, they cannot be shared.
    pub fn get_constant(&mut self, value: ConstValue) -> Inst {
        if let Some(existing) = self.constants.get(&value) {
            return *existing;
        }

        let canonical = value.is_canonical();
        let def = self.add_initial_definition(self.graph_entry, InstData::Constant(value.clone()));

        if canonical {
            self.constants.insert(value, def);
        }

        def
    }

    /// Adds a predecessor edge to a block, keeping the predecessor list sorted
    /// by block id. Used while building graphs, after the graph is built
    /// predecessors are recomputed by [`Self::discover_blocks`].
    pub fn add_predecessor(&mut self, block: Block, pred: Block) -> usize {
        let preds = &mut self.blocks[block].predecessors;
        let index = preds.partition_point(|p| *p < pred);

        debug_assert!(preds.get(index) != Some(&pred), "duplicate predecessor {pred}");

        preds.insert(index, pred);

        index
    }

    /// Drops every predecessor of `block` that `is_live` rejects, along with
    /// the matching input of every phi. Surviving inputs keep their order.
    /// Returns the number of predecessors left.
    pub fn retain_predecessors<F>(&mut self, block: Block, mut is_live: F) -> usize
    where
        F: FnMut(Block) -> bool,
    {
        let preds = self.blocks[block].predecessors.clone();
        let keep: SmallVec<[bool; 4]> = preds.iter().map(|p| is_live(*p)).collect();

        if keep.iter().all(|k| *k) {
            return preds.len();
        }

        for phi in self.blocks[block].phis.clone() {
            let inputs: SmallVec<[Inst; 4]> = self.insts[phi]
                .inputs
                .iter()
                .zip(keep.iter())
                .filter_map(|(input, k)| k.then_some(*input))
                .collect();

            self.set_inputs(phi, &inputs);
        }

        let live: SmallVec<[Block; 2]> = preds
            .iter()
            .zip(keep.iter())
            .filter_map(|(pred, k)| k.then_some(*pred))
            .collect();
        let count = live.len();

        self.blocks[block].predecessors = live;

        count
    }

    /// Replaces the deoptimization environment of `inst`.
    pub fn set_env(&mut self, inst: Inst, env: &[Inst]) {
        let old = mem::take(&mut self.insts[inst].env);

        for (i, def) in old.into_iter().enumerate() {
            self.remove_use(def, Use::env(inst, i));
        }

        for (i, def) in env.iter().copied().enumerate() {
            self.add_use(def, Use::env(inst, i));
        }

        self.insts[inst].env = env.to_vec();
    }

    /// Points input `index` of `inst` at `def`.
    pub fn set_input(&mut self, inst: Inst, index: usize, def: Inst) {
        let old = self.insts[inst].inputs[index];

        if old == def {
            return;
        }

        self.remove_use(old, Use::input(inst, index));
        self.add_use(def, Use::input(inst, index));
        self.insts[inst].inputs[index] = def;
    }

    /// Replaces every input of `inst` at once. Input count may change, this
    /// is how phis drop inputs for dead predecessors.
    pub fn set_inputs(&mut self, inst: Inst, inputs: &[Inst]) {
        self.unuse_inputs(inst);

        for (i, def) in inputs.iter().copied().enumerate() {
            self.add_use(def, Use::input(inst, i));
        }

        self.insts[inst].inputs = SmallVec::from_slice(inputs);
    }

    /// Redirects every use of `def` to `other`, leaving `def` with no uses.
    pub fn replace_uses_with(&mut self, def: Inst, other: Inst) {
        if def == other {
            return;
        }

        let input_uses = mem::take(&mut self.insts[def].input_uses);
        let env_uses = mem::take(&mut self.insts[def].env_uses);

        for u in input_uses.iter().chain(env_uses.iter()) {
            match u.slot {
                UseSlot::Input(i) => self.insts[u.user].inputs[i as usize] = other,
                UseSlot::Env(i) => self.insts[u.user].env[i as usize] = other,
            }
        }

        let node = &mut self.insts[other];

        node.input_uses.extend(input_uses);
        node.env_uses.extend(env_uses);

        self.refine_type(other);
    }

    /// Removes a normal instruction from its block and from the use lists of
    /// everything it reads. Terminators cannot be removed this way.
    pub fn remove_inst(&mut self, inst: Inst) {
        assert!(
            !self.insts[inst].data.is_terminator(),
            "cannot remove terminator {inst} from the graph, replace it instead"
        );
        assert_eq!(
            self.insts[inst].placement,
            Placement::Listed,
            "{inst} is not a normal instruction"
        );

        self.detach(inst);
    }

    /// Removes a phi from its block and from the use lists of its inputs.
    pub fn remove_phi(&mut self, phi: Inst) {
        let block = match self.insts[phi].placement {
            Placement::Phi(block) => block,
            _ => panic!("{phi} is not an attached phi"),
        };

        self.blocks[block].phis.retain(|p| *p != phi);
        self.detach(phi);
    }

    /// Replaces the terminator of a block with a `goto`, the new instruction
    /// inherits the old one's deoptimization id.
    pub fn replace_terminator_with_goto(&mut self, block: Block, target: Block) -> Inst {
        let old = match self.terminator(block) {
            Some(term) => term,
            None => panic!("{block} has no terminator to replace"),
        };

        let deopt_id = self.insts[old].deopt_id;
        let goto = self.insert_inst_after(old, InstData::Goto(target), &[], deopt_id);

        self.detach(old);

        goto
    }

    /// Changes the kind of a block. Used when a branch target becomes the
    /// target of a `goto` and turns into a join.
    pub fn set_block_kind(&mut self, block: Block, kind: BlockKind) {
        debug_assert!(
            !self.blocks[block].kind.is_entry_like() && !kind.is_entry_like(),
            "cannot change the kind of entry blocks"
        );

        self.blocks[block].kind = kind;
    }

    /// Detaches every phi, initial definition and instruction of `block`
    /// from the graph. Used for blocks that are statically unreachable.
    pub fn clear_block(&mut self, block: Block) {
        assert_ne!(block, self.graph_entry, "cannot clear the graph entry");

        let phis = mem::take(&mut self.blocks[block].phis);
        let defs = mem::take(&mut self.blocks[block].initial_defs);

        for inst in phis.into_iter().chain(defs) {
            self.detach(inst);
        }

        while let Some(inst) = self.layout.block_first_inst(block) {
            self.detach(inst);
        }
    }

    fn detach(&mut self, inst: Inst) {
        self.unuse_inputs(inst);
        self.set_env(inst, &[]);

        if self.insts[inst].placement == Placement::Listed {
            self.layout.remove_inst(inst);
        }

        self.insts[inst].placement = Placement::Detached;
    }

    fn unuse_inputs(&mut self, inst: Inst) {
        let inputs = mem::take(&mut self.insts[inst].inputs);

        for (i, def) in inputs.iter().copied().enumerate() {
            self.remove_use(def, Use::input(inst, i));
        }
    }

    fn add_use(&mut self, def: Inst, u: Use) {
        debug_assert!(
            self.insts[def].data.has_result(),
            "{def} produces no value and cannot be used"
        );

        let node = &mut self.insts[def];

        if u.is_env() {
            node.env_uses.push(u);
        } else {
            node.input_uses.push(u);
        }
    }

    fn remove_use(&mut self, def: Inst, u: Use) {
        let node = &mut self.insts[def];
        let list = if u.is_env() {
            &mut node.env_uses
        } else {
            &mut node.input_uses
        };

        match list.iter().position(|x| *x == u) {
            Some(pos) => {
                list.swap_remove(pos);
            }
            None => panic!("use {u:?} is missing from the use list of {def}"),
        }
    }

    /// Recomputes the type of `inst` from its inputs.
    pub fn refine_type(&mut self, inst: Inst) {
        self.insts[inst].ty = self.compute_type(inst);
    }

    /// Computes the static type of a definition from its kind and the
    /// current types of its inputs.
    pub fn compute_type(&self, inst: Inst) -> CompileType {
        let node = &self.insts[inst];
        let input_ty = |i: usize| self.insts[node.inputs[i]].ty;

        match &node.data {
            InstData::Constant(value) => CompileType::from_constant(value, self.word_size),
            InstData::Parameter(_) => node.ty,
            InstData::Phi => {
                let mut ty = CompileType::none();

                for input in node.inputs.iter().copied() {
                    // a loop phi reading itself adds nothing
                    if input != inst {
                        ty.union(&self.insts[input].ty);
                    }
                }

                ty
            }
            InstData::Redefinition => input_ty(0),
            InstData::BinaryIntegerOp { .. } | InstData::UnaryIntegerOp { .. } => {
                CompileType::int()
            }
            InstData::BinaryDoubleOp(_) => CompileType::double(),
            InstData::StrictCompare(_) | InstData::Compare(_) | InstData::BooleanNegate => {
                CompileType::bool()
            }
            InstData::LoadField(Slot::ArrayLength | Slot::StringLength) => CompileType::smi(),
            InstData::LoadStaticField(field) => match &field.value {
                Some(value) if field.is_final => {
                    CompileType::from_constant(value, self.word_size)
                }
                _ => CompileType::dynamic(),
            },
            InstData::CheckNull => input_ty(0).without_null(),
            InstData::CheckArrayBound | InstData::GenericCheckBound => CompileType::smi(),
            InstData::StaticCall(CallTarget::Recognized(kind)) => match kind {
                RecognizedKind::StringLength => CompileType::smi(),
                RecognizedKind::StringEquals => CompileType::bool(),
                RecognizedKind::IntegerAbs => CompileType::int(),
            },
            InstData::AllocateObject(cid) => CompileType::from_cid(*cid),
            data if !data.has_result() => CompileType::none(),
            _ => CompileType::dynamic(),
        }
    }

    /// The reachable blocks in preorder, as of the last [`Self::discover_blocks`].
    #[inline]
    pub fn preorder(&self) -> &[Block] {
        &self.preorder
    }

    /// The reachable blocks in postorder, as of the last [`Self::discover_blocks`].
    #[inline]
    pub fn postorder(&self) -> &[Block] {
        &self.postorder
    }

    /// The reachable blocks in reverse postorder.
    pub fn reverse_postorder(&self) -> impl DoubleEndedIterator<Item = Block> + '_ {
        self.postorder.iter().rev().copied()
    }

    /// Recomputes the block orderings and predecessor lists from the current
    /// control-flow edges. Blocks that are no longer reachable from the graph
    /// entry drop out of the orderings.
    ///
    /// Predecessors are sorted by block id, and phi inputs are permuted to
    /// match. A join gaining a predecessor it has no phi input for is a bug.
    pub fn discover_blocks(&mut self) {
        let orders = compute_block_orders(self);

        for (_, data) in self.blocks.iter_mut() {
            data.preorder_number = None;
            data.postorder_number = None;
        }

        for (i, block) in orders.preorder.iter().copied().enumerate() {
            self.blocks[block].preorder_number = Some(i as u32);
        }

        for (i, block) in orders.postorder.iter().copied().enumerate() {
            self.blocks[block].postorder_number = Some(i as u32);
        }

        for block in orders.preorder.iter().copied() {
            let new_preds = &orders.predecessors[block];
            let old_preds = mem::replace(&mut self.blocks[block].predecessors, new_preds.clone());

            if old_preds == *new_preds {
                continue;
            }

            let phis = self.blocks[block].phis.clone();

            for phi in phis {
                let inputs: SmallVec<[Inst; 4]> = new_preds
                    .iter()
                    .map(|pred| match old_preds.iter().position(|p| p == pred) {
                        Some(pos) => self.insts[phi].inputs[pos],
                        None => panic!("{block} gained predecessor {pred} without a phi input"),
                    })
                    .collect();

                self.set_inputs(phi, &inputs);
            }
        }

        self.preorder = orders.preorder;
        self.postorder = orders.postorder;
    }

    /// Recomputes the dominator tree over the current block ordering.
    pub fn compute_dominators(&mut self) {
        let tree = DominatorTree::compute(self);

        for (_, data) in self.blocks.iter_mut() {
            data.dominator = PackedOption::none();
            data.dominated.clear();
        }

        // dominated lists end up in preorder
        for block in self.preorder.clone() {
            if let Some(idom) = tree.idom(block) {
                self.blocks[block].dominator = PackedOption::some(idom);
                self.blocks[idom].dominated.push(block);
            }
        }
    }

    /// Checks whether `dominator` dominates `block`, using the dominator tree
    /// from the last [`Self::compute_dominators`]. Every block dominates itself.
    pub fn dominates(&self, dominator: Block, block: Block) -> bool {
        let mut curr = Some(block);

        while let Some(b) = curr {
            if b == dominator {
                return true;
            }

            curr = self.blocks[b].dominator.expand();
        }

        false
    }

    /// Merges chains of blocks connected by a `goto` into a block with only
    /// that one predecessor. Phis of the merged block are replaced by their
    /// single input. Returns whether anything changed, and rediscovers the
    /// blocks if it did.
    pub fn merge_blocks(&mut self) -> bool {
        let mut merged = SecondarySet::with_primary(&self.blocks);
        let mut changed = false;
        let rpo: Vec<Block> = self.reverse_postorder().collect();

        for block in rpo {
            if block == self.graph_entry || merged.contains(block) {
                continue;
            }

            while let Some(term) = self.terminator(block) {
                let successor = match self.insts[term].data {
                    InstData::Goto(successor) => successor,
                    _ => break,
                };

                let succ_data = &self.blocks[successor];

                if successor == block
                    || succ_data.predecessors.len() != 1
                    || succ_data.kind.is_entry_like()
                    || succ_data.kind == BlockKind::IndirectEntry
                    || succ_data.try_index != self.blocks[block].try_index
                {
                    break;
                }

                for phi in self.blocks[successor].phis.clone() {
                    let input = self.insts[phi].inputs[0];

                    self.replace_uses_with(phi, input);
                    self.remove_phi(phi);
                }

                self.detach(term);
                self.layout.splice_block(successor, block);

                // edges out of `successor` now leave from `block`, the phi
                // input order is fixed up by rediscovery
                for next in self.successors(block) {
                    for pred in self.blocks[next].predecessors.iter_mut() {
                        if *pred == successor {
                            *pred = block;
                        }
                    }
                }

                self.blocks[successor].predecessors.clear();
                merged.insert(successor);
                changed = true;
            }
        }

        if changed {
            self.discover_blocks();
        }

        changed
    }

    /// Gets every reachable definition, in reverse postorder. Phis and initial
    /// definitions come before the normal instructions of their block.
    pub fn definitions(&self) -> Vec<Inst> {
        let mut defs = Vec::new();

        for block in self.reverse_postorder() {
            let data = &self.blocks[block];

            defs.extend(data.initial_defs.iter().copied());
            defs.extend(data.phis.iter().copied());
            defs.extend(
                self.insts_in_block(block)
                    .filter(|inst| self.insts[*inst].data.has_result()),
            );
        }

        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CompilationContext;

    #[test]
    fn append_registers_uses() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let entry = graph.create_block(BlockKind::FunctionEntry, None);
        let x = graph.add_initial_definition(entry, InstData::Parameter(0));
        let one = graph.get_constant(ConstValue::Int(1));
        let add = graph.append_inst(
            entry,
            InstData::BinaryIntegerOp {
                op: BinaryOp::Add,
                representation: Representation::Tagged,
            },
            &[x, one],
            None,
        );
        let ret = graph.append_inst(entry, InstData::Return, &[add], None);

        assert_eq!(graph.inst(x).input_uses(), [Use::input(add, 0)]);
        assert_eq!(graph.inst(one).input_uses(), [Use::input(add, 1)]);
        assert_eq!(graph.inst(add).input_uses(), [Use::input(ret, 0)]);
        assert_eq!(graph.ty(add), CompileType::int());
        assert_eq!(graph.terminator(entry), Some(ret));
        assert_eq!(graph.inst_block(one), Some(graph.graph_entry()));
    }

    #[test]
    fn constants_are_pooled() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let a = graph.get_constant(ConstValue::Int(1));
        let b = graph.get_constant(ConstValue::Int(1));
        let c = graph.get_constant(ConstValue::Bool(true));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let arr = ConstValue::mutable_array(vec![]);
        let d = graph.get_constant(arr.clone());
        let e = graph.get_constant(arr);

        assert_ne!(d, e);
        assert_eq!(
            graph.block(graph.graph_entry()).initial_definitions(),
            [a, c, d, e]
        );
    }

    #[test]
    fn replace_uses_moves_both_lists() {
        let mut ctx = CompilationContext::default();
        let mut graph = FlowGraph::new(WordSize::W64);
        let entry = graph.create_block(BlockKind::FunctionEntry, None);
        let x = graph.add_initial_definition(entry, InstData::Parameter(0));
        let y = graph.add_initial_definition(entry, InstData::Parameter(1));
        let check = graph.append_inst(entry, InstData::CheckNull, &[x], Some(ctx.next_deopt_id()));
        let ret = graph.append_inst(entry, InstData::Return, &[x], None);

        graph.set_env(check, &[x, x]);
        graph.replace_uses_with(x, y);

        assert!(!graph.inst(x).has_uses());
        assert_eq!(graph.inst(y).input_uses().len(), 2);
        assert_eq!(graph.inst(y).env_uses().len(), 2);
        assert_eq!(graph.inst(check).env(), [y, y]);
        assert_eq!(graph.inst(ret).inputs(), [y]);
    }

    #[test]
    fn remove_unregisters_uses() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let entry = graph.create_block(BlockKind::FunctionEntry, None);
        let x = graph.add_initial_definition(entry, InstData::Parameter(0));
        let neg = graph.append_inst(entry, InstData::BooleanNegate, &[x], None);

        graph.set_env(neg, &[x]);
        graph.remove_inst(neg);

        assert!(!graph.inst(x).has_uses());
        assert!(!graph.is_attached(neg));
        assert_eq!(graph.insts_in_block(entry).count(), 0);
    }

    #[test]
    #[should_panic(expected = "cannot remove terminator")]
    fn removing_terminator_panics() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let entry = graph.create_block(BlockKind::FunctionEntry, None);
        let zero = graph.get_constant(ConstValue::Int(0));
        let ret = graph.append_inst(entry, InstData::Return, &[zero], None);

        graph.remove_inst(ret);
    }

    #[test]
    #[should_panic(expected = "phis can only be added to joins")]
    fn phi_in_target_panics() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let target = graph.create_block(BlockKind::Target, None);

        graph.add_phi(target, &[]);
    }

    #[test]
    fn predecessors_stay_sorted() {
        let mut graph = FlowGraph::new(WordSize::W64);
        let a = graph.create_block(BlockKind::Target, None);
        let b = graph.create_block(BlockKind::Target, None);
        let c = graph.create_block(BlockKind::Target, None);
        let join = graph.create_block(BlockKind::Join, None);

        assert_eq!(graph.add_predecessor(join, c), 0);
        assert_eq!(graph.add_predecessor(join, a), 0);
        assert_eq!(graph.add_predecessor(join, b), 1);
        assert_eq!(graph.block(join).predecessors(), [a, b, c]);
    }
}
