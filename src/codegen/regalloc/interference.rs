//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use super::Lcra;
use crate::analysis::{compute_liveness, compute_postra_liveness, ins_update, postra_ins_update};
use crate::ir::{Block, Opcode, Shader};
use crate::utility::mask_u64;
use log::trace;

/// Every even register, for values that must start on a register pair.
pub const EVEN_BITS_MASK: u64 = 0x5555_5555_5555_5555;

/// The registers a blend shader may clobber: `r0`-`r15` and `r48`.
pub const BLEND_CLOBBER: u64 = mask_u64(16) | (1 << 48);

/// The registers a value of `count` registers may start in, given the
/// physical registers `clobber` that are live at the same time.
///
/// A value may not start in any register that would make it cover a live
/// register, nor so close to the end of the file (or the end of the low
/// half, when the file is split) that it would run past it. A split file
/// also loses `r16`-`r47` entirely.
pub fn make_affinity(clobber: u64, count: u32, split_file: bool) -> u64 {
    let mut clobbered = (0..count).fold(0, |acc, i| acc | (clobber >> i));

    if count > 1 {
        let excess = count - 1;
        let mask = mask_u64(excess);

        clobbered |= mask << (64 - excess);

        if split_file {
            clobbered |= mask << (16 - excess);
        }
    }

    if split_file {
        clobbered |= mask_u64(32) << 16;
    }

    !clobbered
}

fn mark_interference(shader: &Shader, block: Block, lcra: &mut Lcra, split_file: bool) {
    let node_count = lcra.node_count();
    let is_blend = shader.inputs.is_blend;
    let aligned_sr = shader.inputs.arch >= 9;
    let data = shader.block(block);
    let mut live = data.live_out.clone();
    let mut preload_live = data.reg_live_out;

    for instr in data.instrs.iter().rev() {
        for (d, dest) in instr.dest.iter().enumerate() {
            let node = match dest.node() {
                Some(node) if node < node_count => node,
                _ => continue,
            };

            let count = instr.count_write_registers(d);
            let mut affinity = make_affinity(preload_live, count, split_file);

            if aligned_sr && count >= 2 {
                affinity &= EVEN_BITS_MASK;
            }

            lcra.restrict_affinity(node, affinity >> dest.offset);

            let writemask = instr.writemask(d);

            for (other, lanes) in live.live_nodes() {
                lcra.add_node_interference(node, writemask, other, lanes);
            }
        }

        if aligned_sr {
            for (s, src) in instr.src.iter().enumerate() {
                match src.node() {
                    Some(node) if node < node_count && instr.count_read_registers(s) >= 2 => {
                        lcra.restrict_affinity(node, EVEN_BITS_MASK);
                    }
                    _ => {}
                }
            }
        }

        if !is_blend && instr.op == Opcode::Blend {
            for (other, _) in live.live_nodes() {
                lcra.restrict_affinity(other, !BLEND_CLOBBER);
            }
        }

        preload_live = postra_ins_update(preload_live, instr);
        ins_update(&mut live, instr);
    }
}

/// Builds the constraints of every node from fresh liveness, narrowing the
/// affinities already seeded in `lcra`.
///
/// Physical registers already in the program (pre-colored operands) are
/// tracked alongside, and values are kept out of them while they are live.
pub fn compute_interference(shader: &mut Shader, lcra: &mut Lcra, full_regs: bool) {
    compute_liveness(shader);

    compute_postra_liveness(shader);

    for block in shader.blocks().rev() {
        trace!("marking interference in {block:?}");

        mark_interference(shader, block, lcra, !full_regs);
    }
}
