//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Liveness of physical registers, once every operand has been allocated.

use crate::analysis::worklist::solve_backward;
use crate::ir::{Block, Instr, Shader};
use crate::utility::mask_u64;

fn registers(base: u32, count: u32) -> u64 {
    mask_u64(count).checked_shl(base).unwrap_or(0)
}

/// Applies a single instruction to a register mask, walking backwards.
pub fn postra_ins_update(mut live: u64, instr: &Instr) -> u64 {
    for (d, dest) in instr.dest.iter().enumerate() {
        if let Some(reg) = dest.as_register() {
            live &= !registers(reg, instr.count_write_registers(d));
        }
    }

    for (s, src) in instr.src.iter().enumerate() {
        if let Some(reg) = src.as_register() {
            live |= registers(reg, instr.count_read_registers(s));
        }
    }

    live
}

fn postra_block_update(shader: &mut Shader, block: Block) -> bool {
    let live_out = shader
        .block(block)
        .successors()
        .fold(0, |live, succ| live | shader.block(succ).reg_live_in);

    let live = shader
        .block(block)
        .instrs
        .iter()
        .rev()
        .fold(live_out, postra_ins_update);

    let data = shader.block_mut(block);
    let progress = data.reg_live_in != live;

    data.reg_live_in = live;
    data.reg_live_out = live_out;

    progress
}

/// Computes `reg_live_in` and `reg_live_out` of every block.
///
/// This is never memoized, it is cheap and only run a couple of times.
pub fn compute_postra_liveness(shader: &mut Shader) {
    for block in shader.blocks() {
        let data = shader.block_mut(block);

        data.reg_live_in = 0;
        data.reg_live_out = 0;
    }

    solve_backward(shader, postra_block_update);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;

    #[test]
    fn vectors_cover_consecutive_registers() {
        // STORE.i128 R4, #0x0, #0x0
        let store = Instr::store_tl(128, Index::register(4), 0);

        assert_eq!(postra_ins_update(0, &store), 0b1111_0000);

        // R4 = LOAD.i64 #0x0, #0x0
        let load = Instr::load_tl(64, Index::register(4), 0);

        assert_eq!(postra_ins_update(0b1111_0000, &load), 0b1100_0000);
    }

    #[test]
    fn high_registers_do_not_overflow() {
        let store = Instr::store_tl(128, Index::register(62), 0);

        assert_eq!(postra_ins_update(0, &store), 0b11 << 62);
    }

    #[test]
    fn across_blocks() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let b = shader.create_block();

        shader.add_successor(a, b);

        shader
            .block_mut(a)
            .instrs
            .push(Instr::mov(Index::register(1), Index::imm_u32(3)));
        shader
            .block_mut(b)
            .instrs
            .push(Instr::store_tl(32, Index::register(1), 0));

        compute_postra_liveness(&mut shader);

        assert_eq!(shader.block(b).reg_live_in, 0b10);
        assert_eq!(shader.block(a).reg_live_out, 0b10);
        assert_eq!(shader.block(a).reg_live_in, 0);
    }
}
