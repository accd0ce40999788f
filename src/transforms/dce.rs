//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::analysis::{compute_liveness, compute_postra_liveness, ins_update, postra_ins_update, LiveSet};
use crate::ir::{Index, Opcode, Shader};
use crate::pass::ShaderPass;
use crate::utility::mask_u64;
use log::debug;

/// Dead code elimination over SSA values and virtual registers.
pub struct DeadCodeEliminationPass;

impl ShaderPass for DeadCodeEliminationPass {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run(&mut self, shader: &mut Shader) {
        dead_code_eliminate(shader);
    }
}

/// Removes writes to physical registers that are never read.
pub struct PostRaDeadCodeEliminationPass;

impl ShaderPass for PostRaDeadCodeEliminationPass {
    fn name(&self) -> &'static str {
        "dce-post-ra"
    }

    fn run(&mut self, shader: &mut Shader) {
        dead_code_eliminate_post_ra(shader);
    }
}

/// Nulls out every destination whose lanes are never read, and removes
/// instructions left without destinations that have no side effects.
///
/// Liveness is recomputed first. Walking each block backwards, the running
/// live set is stored as the new `live_in` of the block, but the shader's
/// liveness is left invalid since other blocks' `live_out` are now stale.
///
/// Returns whether anything changed.
pub fn dead_code_eliminate(shader: &mut Shader) -> bool {
    shader.invalidate_liveness();
    compute_liveness(shader);

    let max = shader.max_temp();
    let mut progress = false;

    for block in shader.blocks().rev() {
        let mut live = LiveSet::new(max);

        for succ in shader.block(block).successors() {
            live.union_with(&shader.block(succ).live_in);
        }

        let instrs = std::mem::take(&mut shader.block_mut(block).instrs);
        let mut kept = Vec::with_capacity(instrs.len());

        for mut instr in instrs.into_iter().rev() {
            let mut all_null = true;

            for d in 0..instr.dest.len() {
                if let Some(node) = instr.dest[d].node() {
                    if node < max && live.lanes(node) & instr.writemask(d) == 0 {
                        instr.dest[d] = Index::null();
                        progress = true;
                    }
                }

                all_null &= instr.dest[d].is_null();
            }

            if all_null && !instr.has_side_effects() {
                progress = true;
                continue;
            }

            ins_update(&mut live, &instr);
            kept.push(instr);
        }

        kept.reverse();

        let data = shader.block_mut(block);

        data.instrs = kept;
        data.live_in = live;
    }

    debug!("dce: progress={progress}");

    shader.invalidate_liveness();

    progress
}

/// Nulls out register writes that are never read, using post-allocation
/// liveness. Instructions are never removed.
///
/// `BLEND` and staging writes are kept since the hardware writes them
/// regardless, and `DTSEL_IMM` never needs its destination.
pub fn dead_code_eliminate_post_ra(shader: &mut Shader) {
    compute_postra_liveness(shader);

    for block in shader.blocks().rev() {
        let data = shader.block_mut(block);
        let mut live = data.reg_live_out;

        for instr in data.instrs.iter_mut().rev() {
            if instr.op == Opcode::DtselImm {
                instr.dest[0] = Index::null();
            }

            let cullable = instr.op != Opcode::Blend && !instr.props().sr_write;

            for d in 0..instr.dest.len() {
                let reg = match instr.dest[d].as_register() {
                    Some(reg) => reg,
                    None => continue,
                };

                let mask = mask_u64(instr.count_write_registers(d))
                    .checked_shl(reg)
                    .unwrap_or(0);

                if live & mask == 0 && cullable {
                    instr.dest[d] = Index::null();
                }
            }

            live = postra_ins_update(live, instr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;

    fn shader() -> (Shader, Block) {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();

        (shader, block)
    }

    #[test]
    fn unused_values_are_removed() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        // 0 = MOV.i32 #0x1     <- dead
        // 1 = MOV.i32 #0x2
        // 2 = IADD.u32 1, 1    <- dead
        // STORE.i32 1, #0x0, #0x0
        b.mov_i32(Index::imm_u32(1));
        let y = b.mov_i32(Index::imm_u32(2));
        b.iadd_u32(y, y);
        b.store(32, y, Index::zero(), Index::zero());

        assert!(dead_code_eliminate(&mut shader));

        let ops: Vec<_> = shader.block(block).instrs.iter().map(|i| i.op).collect();

        assert_eq!(ops, vec![Opcode::MovI32, Opcode::StoreI32]);
        assert_eq!(shader.block(block).instrs[0].dest[0], y);
    }

    #[test]
    fn side_effects_survive_without_destinations() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        // 0 = ATOM_RETURN.i32 #0x1, #0x0, #0x0   <- result unused
        b.atom_return_i32(Index::imm_u32(1), Index::zero(), Index::zero());
        b.barrier();

        dead_code_eliminate(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs.len(), 2);
        assert!(instrs[0].dest[0].is_null());
    }

    #[test]
    fn values_live_across_blocks_survive() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let c = shader.create_block();

        shader.add_successor(a, c);

        let mut b = Builder::at(&mut shader, Cursor::End(a));
        let x = b.ld_var(Index::fau(0));
        b.ld_var(Index::fau(1));
        b.set_cursor(Cursor::End(c));
        b.store(32, x, Index::zero(), Index::zero());

        dead_code_eliminate(&mut shader);

        assert_eq!(shader.block(a).instrs.len(), 1);
        assert_eq!(shader.block(a).instrs[0].dest[0], x);
        assert_eq!(shader.block(c).live_in.lanes(x.node().unwrap()), 1);
    }

    #[test]
    fn idempotent() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let x = b.ld_var(Index::fau(0));
        let y = b.iadd_u32(x, x);
        b.imul_i32(y, x);
        let z = b.isub_u32(y, x);
        b.store(32, z, Index::zero(), Index::zero());

        assert!(dead_code_eliminate(&mut shader));

        let once = shader.block(block).instrs.clone();

        assert!(!dead_code_eliminate(&mut shader));
        assert_eq!(once, shader.block(block).instrs);
    }

    #[test]
    fn partially_dead_vectors_keep_their_instruction() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let v = b.temp();
        b.load_to(64, v, Index::zero(), Index::zero());
        b.store(32, v.word(1), Index::zero(), Index::zero());

        dead_code_eliminate(&mut shader);

        assert_eq!(shader.block(block).instrs.len(), 2);
        assert_eq!(shader.block(block).instrs[0].dest[0], v);
    }

    #[test]
    fn post_ra_nulls_dead_register_writes() {
        let (mut shader, block) = shader();
        let instrs = &mut shader.block_mut(block).instrs;

        // R0 = MOV.i32 #0x1   <- dead
        // R1 = MOV.i32 #0x2
        // R4 = BLEND R8, ...  <- dead but kept
        // R2 = DTSEL_IMM u0   <- always nulled
        // STORE.i32 R1, #0x0, #0x0
        instrs.push(Instr::mov(Index::register(0), Index::imm_u32(1)));
        instrs.push(Instr::mov(Index::register(1), Index::imm_u32(2)));

        let mut blend = Instr::new(Opcode::Blend);
        blend.dest[0] = Index::register(4);
        blend.src[0] = Index::register(8);
        instrs.push(blend);

        let mut dtsel = Instr::new(Opcode::DtselImm);
        dtsel.dest[0] = Index::register(2);
        dtsel.src[0] = Index::fau(0);
        instrs.push(dtsel);

        instrs.push(Instr::store_tl(32, Index::register(1), 0));

        dead_code_eliminate_post_ra(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs.len(), 5);
        assert!(instrs[0].dest[0].is_null());
        assert_eq!(instrs[1].dest[0], Index::register(1));
        assert_eq!(instrs[2].dest[0], Index::register(4));
        assert!(instrs[3].dest[0].is_null());
    }
}
