//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::arena::ArenaMap;
use crate::codegen::CompileInputs;
use crate::ir::{Block, BlockData, Index, Instr};
use crate::utility::FastSet;

/// The root of a single compilation: every block of the program plus the
/// counters and flags that passes share.
///
/// Blocks are stored in program order, the first block created is the entry.
#[derive(Clone, Debug)]
pub struct Shader {
    blocks: ArenaMap<Block, BlockData>,
    /// Number of SSA values handed out so far.
    pub ssa_alloc: u32,
    /// Number of virtual registers handed out so far.
    pub reg_alloc: u32,
    pub(crate) liveness_valid: bool,
    /// Everything about the compile that isn't the program itself.
    pub inputs: CompileInputs,
    /// Number of spill stores inserted by register allocation.
    pub spills: u32,
    /// Number of fill loads inserted by register allocation.
    pub fills: u32,
    /// Number of loops in the program.
    pub loop_count: u32,
    /// Bytes of thread-local storage needed, including spill space.
    pub tls_size: u32,
    /// Number of registers the allocation ended up needing.
    pub work_reg_count: u32,
}

impl Shader {
    /// Creates an empty shader.
    pub fn new(inputs: CompileInputs) -> Self {
        Self {
            blocks: ArenaMap::new(),
            ssa_alloc: 0,
            reg_alloc: 0,
            liveness_valid: false,
            inputs,
            spills: 0,
            fills: 0,
            loop_count: 0,
            tls_size: 0,
            work_reg_count: 0,
        }
    }

    /// Appends a new, empty block to the end of the program.
    pub fn create_block(&mut self) -> Block {
        self.liveness_valid = false;
        self.blocks.insert(BlockData::new())
    }

    /// Gets a block.
    #[inline]
    pub fn block(&self, block: Block) -> &BlockData {
        &self.blocks[block]
    }

    /// Gets a block mutably. This does not invalidate liveness.
    #[inline]
    pub fn block_mut(&mut self, block: Block) -> &mut BlockData {
        &mut self.blocks[block]
    }

    /// Every block in program order. The iterator does not borrow the shader.
    pub fn blocks(&self) -> impl DoubleEndedIterator<Item = Block> + ExactSizeIterator {
        self.blocks.keys()
    }

    /// The number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Every instruction of every unscheduled block, in program order.
    pub fn instrs(&self) -> impl Iterator<Item = &Instr> + '_ {
        self.blocks.values().flat_map(|block| block.instrs.iter())
    }

    /// Mutable access to every instruction of every unscheduled block.
    pub fn instrs_mut(&mut self) -> impl Iterator<Item = &mut Instr> + '_ {
        self.blocks
            .values_mut()
            .flat_map(|block| block.instrs.iter_mut())
    }

    /// Gets the successors of a block.
    pub fn successors(&self, block: Block) -> [Option<Block>; 2] {
        self.blocks[block].successors
    }

    /// Gets the predecessors of a block.
    pub fn predecessors(&self, block: Block) -> &[Block] {
        &self.blocks[block].predecessors
    }

    /// Adds an edge `block -> succ`, also recording `block` as a predecessor of `succ`.
    ///
    /// Panics if the edge already exists or `block` already has two successors.
    pub fn add_successor(&mut self, block: Block, succ: Block) {
        let data = &mut self.blocks[block];

        assert!(
            !data.successors.contains(&Some(succ)),
            "{block:?} -> {succ:?} already exists"
        );

        let slot = data
            .successors
            .iter_mut()
            .find(|slot| slot.is_none())
            .unwrap_or_else(|| panic!("{block:?} already has two successors"));

        *slot = Some(succ);
        self.blocks[succ].predecessors.push(block);
        self.liveness_valid = false;
    }

    /// The entry block, the first block in program order.
    pub fn entry_block(&self) -> Option<Block> {
        self.blocks.keys().next()
    }

    /// The exit block: the last block in program order with no successors,
    /// or the last block if every block has a successor.
    pub fn exit_block(&self) -> Option<Block> {
        self.blocks
            .iter()
            .rev()
            .find(|(_, data)| data.successors().next().is_none())
            .map(|(block, _)| block)
            .or_else(|| self.blocks.keys().next_back())
    }

    /// Checks if reaching `block` ends the shader, i.e. if `block` and everything
    /// reachable from it is empty.
    pub fn is_terminal_block(&self, block: Block) -> bool {
        let mut visited = FastSet::default();
        let mut stack = vec![block];

        while let Some(block) = stack.pop() {
            if !visited.insert(block) {
                continue;
            }

            let data = &self.blocks[block];

            if data.instr_count() != 0 {
                return false;
            }

            stack.extend(data.successors());
        }

        true
    }

    /// Marks a block as a loop header.
    pub fn mark_loop_header(&mut self, block: Block) {
        if !self.blocks[block].loop_header {
            self.blocks[block].loop_header = true;
            self.loop_count += 1;
        }
    }

    /// Allocates a fresh SSA value.
    pub fn new_ssa(&mut self) -> Index {
        let index = Index::ssa(self.ssa_alloc);

        self.ssa_alloc += 1;
        index
    }

    /// Allocates a fresh virtual register.
    pub fn new_vreg(&mut self) -> Index {
        let index = Index::vreg(self.reg_alloc);

        self.reg_alloc += 1;
        index
    }

    /// The number of liveness/allocation nodes, `(max(reg_alloc, ssa_alloc) + 2) << 1`.
    pub fn max_temp(&self) -> usize {
        ((self.reg_alloc.max(self.ssa_alloc) as usize) + 2) << 1
    }

    /// Checks if the cached liveness is still valid.
    pub fn liveness_valid(&self) -> bool {
        self.liveness_valid
    }

    /// Marks liveness as stale. Must be called after any change to the
    /// operands or the instruction lists of any block.
    pub fn invalidate_liveness(&mut self) {
        self.liveness_valid = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader() -> Shader {
        Shader::new(CompileInputs::default())
    }

    #[test]
    fn successors_record_predecessors() {
        let mut shader = shader();
        let a = shader.create_block();
        let b = shader.create_block();
        let c = shader.create_block();

        shader.add_successor(a, b);
        shader.add_successor(a, c);
        shader.add_successor(b, c);

        assert_eq!(shader.successors(a), [Some(b), Some(c)]);
        assert_eq!(shader.predecessors(c), &[a, b]);
        assert_eq!(shader.entry_block(), Some(a));
        assert_eq!(shader.exit_block(), Some(c));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn duplicate_edges_are_rejected() {
        let mut shader = shader();
        let a = shader.create_block();
        let b = shader.create_block();

        shader.add_successor(a, b);
        shader.add_successor(a, b);
    }

    #[test]
    fn exit_falls_back_to_last_block() {
        let mut shader = shader();
        let a = shader.create_block();
        let b = shader.create_block();

        shader.add_successor(a, b);
        shader.add_successor(b, a);

        assert_eq!(shader.exit_block(), Some(b));
    }

    #[test]
    fn terminal_blocks_are_empty_all_the_way_down() {
        let mut shader = shader();
        let a = shader.create_block();
        let b = shader.create_block();
        let c = shader.create_block();

        shader.add_successor(a, b);
        shader.add_successor(b, c);
        shader.add_successor(c, b);

        assert!(shader.is_terminal_block(b));

        shader.block_mut(a).instrs.push(Instr::mov(Index::ssa(0), Index::zero()));

        assert!(!shader.is_terminal_block(a));
    }

    #[test]
    fn max_temp_leaves_headroom() {
        let mut shader = shader();

        shader.new_ssa();
        shader.new_ssa();
        shader.new_vreg();

        assert_eq!(shader.max_temp(), (2 + 2) << 1);
    }
}
