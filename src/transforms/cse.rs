//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Index, IndexKind, Instr, Message, Modifiers, Opcode, Shader, Swizzle};
use crate::pass::ShaderPass;
use crate::utility::FastMap;

/// Local common subexpression elimination.
///
/// Redundant instructions are not removed, their users are redirected to
/// the first equivalent instruction and dead code elimination does the rest.
pub struct CommonSubexpressionEliminationPass;

impl ShaderPass for CommonSubexpressionEliminationPass {
    fn name(&self) -> &'static str {
        "cse"
    }

    fn run(&mut self, shader: &mut Shader) {
        cse(shader);
    }
}

/// The parts of an instruction that decide what it computes.
///
/// Destinations, branch targets, message payload shape, spill flags and
/// scheduling hints are deliberately absent.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
struct CseKey {
    op: Opcode,
    src: [Index; 4],
    modifiers: Modifiers,
    dest_swizzles: [Swizzle; 2],
}

impl CseKey {
    fn of(instr: &Instr) -> Self {
        Self {
            op: instr.op,
            src: instr.src,
            modifiers: instr.modifiers,
            dest_swizzles: [instr.dest[0].swizzle, instr.dest[1].swizzle],
        }
    }
}

fn can_cse(instr: &Instr) -> bool {
    if matches!(instr.op, Opcode::DtselImm | Opcode::DiscardF32) {
        return false;
    }

    if instr.op.message() != Message::None || instr.branch_target.is_some() {
        return false;
    }

    // tracking non-SSA data flow would need a real dataflow analysis
    if instr.dest.iter().any(|dest| !dest.is_null() && !dest.is_ssa()) {
        return false;
    }

    !instr.src.iter().any(|src| {
        matches!(
            src.kind,
            IndexKind::Normal { reg: true, .. } | IndexKind::Register(_)
        )
    })
}

/// Runs common subexpression elimination inside of every block.
///
/// Sources are rewritten with earlier replacements before an instruction is
/// looked up, so chains of redundant instructions are handled in one run.
pub fn cse(shader: &mut Shader) {
    let words = (shader.ssa_alloc as usize + 1) << 2;

    for block in shader.blocks() {
        let mut replacement = vec![Index::null(); words];
        let mut seen = FastMap::<CseKey, [Index; 2]>::default();

        for instr in shader.block_mut(block).instrs.iter_mut() {
            let sr_read = instr.props().sr_read;

            for (s, src) in instr.src.iter_mut().enumerate() {
                if s == 0 && sr_read {
                    continue;
                }

                if let Some(node) = src.word_node() {
                    let repl = replacement[node];

                    if !repl.is_null() {
                        *src = Index::replace(*src, repl);
                    }
                }
            }

            if !can_cse(instr) {
                continue;
            }

            match seen.get(&CseKey::of(instr)) {
                Some(original) => {
                    for (dest, original) in instr.dest.iter().zip(original.iter()) {
                        if let Some(node) = dest.word_node() {
                            replacement[node] = *original;
                        }
                    }
                }
                None => {
                    seen.insert(CseKey::of(instr), instr.dest);
                }
            }
        }
    }

    shader.invalidate_liveness();
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
    fn identical_instructions_merge() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        // 0 = LD_VAR u0
        // 1 = IADD.u32 0, #0x1
        // 2 = IADD.u32 0, #0x1
        // 3 = IMUL.i32 2, 2
        let x = b.ld_var(Index::fau(0));
        let first = b.iadd_u32(x, Index::imm_u32(1));
        let second = b.iadd_u32(x, Index::imm_u32(1));
        let user = b.imul_i32(second, second);
        b.store(32, user, Index::zero(), Index::zero());

        cse(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs[3].src[0], first);
        assert_eq!(instrs[3].src[1], first);
        assert_eq!(instrs[2].dest[0], second);
    }

    #[test]
    fn chains_merge_in_one_run() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let x = b.ld_var(Index::fau(0));
        let a1 = b.iadd_u32(x, x);
        let b1 = b.imul_i32(a1, a1);
        let a2 = b.iadd_u32(x, x);
        let b2 = b.imul_i32(a2, a2);
        let sum = b.isub_u32(b1, b2);
        b.store(32, sum, Index::zero(), Index::zero());

        cse(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs[4].src[0], a1);
        assert_eq!(instrs[5].src[1], b1);
    }

    #[test]
    fn messages_and_registers_never_merge() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let v1 = b.ld_var(Index::fau(0));
        let v2 = b.ld_var(Index::fau(0));
        let r = b.vreg();
        b.mov_i32_to(r, v1);
        let m1 = b.iadd_u32(r, v2);
        let m2 = b.iadd_u32(r, v2);
        let sum = b.iadd_u32(m1, m2);
        b.store(32, sum, Index::zero(), Index::zero());

        let before = shader.block(block).instrs.clone();

        cse(&mut shader);

        assert_eq!(before, shader.block(block).instrs);
    }

    #[test]
    fn different_modifiers_do_not_merge() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let x = b.ld_var(Index::fau(0));
        let y = b.fadd_f32(x, x);
        let z = b.fadd_f32(x, x);
        let sum = b.fadd_f32(y, z);
        b.store(32, sum, Index::zero(), Index::zero());

        shader.block_mut(block).instrs[1].modifiers = Modifiers::Float {
            round: Round::Rtz,
            clamp: Clamp::None,
        };

        let before = shader.block(block).instrs.clone();

        cse(&mut shader);

        assert_eq!(before, shader.block(block).instrs);
    }

    #[test]
    fn blocks_do_not_share_tables() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let c = shader.create_block();

        shader.add_successor(a, c);

        let mut b = Builder::at(&mut shader, Cursor::End(a));
        let x = b.ld_var(Index::fau(0));
        let first = b.iadd_u32(x, x);
        b.set_cursor(Cursor::End(c));
        let second = b.iadd_u32(x, x);
        let sum = b.iadd_u32(first, second);
        b.store(32, sum, Index::zero(), Index::zero());

        cse(&mut shader);

        assert_eq!(shader.block(c).instrs[1].src[1], second);
    }
}
