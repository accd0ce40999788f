//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Index, Instr, IndexKind, Opcode, Shader};
use crate::pass::ShaderPass;

/// Forwards the sources of SSA moves into their users.
///
/// The moves themselves are left behind for dead code elimination.
pub struct CopyPropagationPass;

impl ShaderPass for CopyPropagationPass {
    fn name(&self) -> &'static str {
        "copy-prop"
    }

    fn run(&mut self, shader: &mut Shader) {
        copy_prop(shader);
    }
}

fn is_copy(instr: &Instr) -> bool {
    instr.op == Opcode::MovI32
        && instr.dest[0].is_ssa()
        && (instr.src[0].is_ssa() || instr.src[0].is_fau() || instr.src[0].is_constant())
}

/// Runs copy propagation over every block, in program order.
///
/// Replacements are tracked per 32-bit word of every SSA value. A move from
/// a value that was itself a copy records the original source, so chains of
/// moves collapse in a single run. Staging reads are never rewritten, and a
/// constant is never forwarded into an instruction that also reads the
/// uniform bank.
pub fn copy_prop(shader: &mut Shader) {
    let mut replacement = vec![Index::null(); (shader.ssa_alloc as usize + 1) << 2];

    for instr in shader.instrs_mut() {
        if is_copy(instr) {
            let mut replace = instr.src[0];

            // peek through one layer so chained moves converge in one run
            if let Some(chained) = replace.word_node().map(|node| replacement[node]) {
                if !chained.is_null() {
                    replace = chained;
                }
            }

            if let Some(node) = instr.dest[0].word_node() {
                replacement[node] = replace;
            }
        }

        let reads_fau = instr.reads_fau();
        let sr_read = instr.props().sr_read;

        for (s, src) in instr.src.iter_mut().enumerate() {
            if !matches!(src.kind, IndexKind::Normal { reg: false, .. }) {
                continue;
            }

            if s == 0 && sr_read {
                continue;
            }

            let repl = match src.word_node() {
                Some(node) => replacement[node],
                None => continue,
            };

            if repl.is_null() || (repl.is_constant() && reads_fau) {
                continue;
            }

            *src = Index::replace(*src, repl);
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
    fn chains_collapse_in_one_run() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        // 0 = LD_VAR u0
        // 1 = MOV.i32 0
        // 2 = MOV.i32 1
        // 3 = MOV.i32 2
        // 4 = IADD.u32 3, 3
        let a = b.ld_var(Index::fau(0));
        let c1 = b.mov_i32(a);
        let c2 = b.mov_i32(c1);
        let c3 = b.mov_i32(c2);
        let sum = b.iadd_u32(c3, c3);
        b.store(32, sum, Index::zero(), Index::zero());

        copy_prop(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs[4].src[0], a);
        assert_eq!(instrs[4].src[1], a);
        assert_eq!(instrs[2].src[0], a);
        assert_eq!(instrs[3].src[0], a);
    }

    #[test]
    fn modifiers_of_the_use_survive() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let a = b.ld_var(Index::fau(0));
        let c = b.mov_i32(a);
        let sum = b.fadd_f32(c.neg().swz(Swizzle::H11), a);
        b.store(32, sum, Index::zero(), Index::zero());

        copy_prop(&mut shader);

        let src = shader.block(block).instrs[2].src[0];

        assert!(src.is_equiv(a));
        assert!(src.neg);
        assert_eq!(src.swizzle, Swizzle::H11);
    }

    #[test]
    fn staging_reads_are_not_rewritten() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let a = b.ld_var(Index::fau(0));
        let c = b.mov_i32(a);
        b.store(32, c, c, Index::zero());

        copy_prop(&mut shader);

        let store = &shader.block(block).instrs[2];

        assert_eq!(store.src[0], c);
        assert_eq!(store.src[1], a);
    }

    #[test]
    fn constants_do_not_meet_uniforms() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let k = b.mov_i32(Index::imm_u32(7));
        let with_fau = b.iadd_u32(k, Index::fau(1));
        let without_fau = b.iadd_u32(k, with_fau);
        b.store(32, without_fau, Index::zero(), Index::zero());

        copy_prop(&mut shader);

        let instrs = &shader.block(block).instrs;

        assert_eq!(instrs[1].src[0], k);
        assert_eq!(instrs[2].src[0], Index::imm_u32(7));
    }

    #[test]
    fn idempotent() {
        let (mut shader, block) = shader();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let a = b.ld_var(Index::fau(0));
        let c = b.mov_i32(a);
        let d = b.imul_i32(c, Index::imm_u32(3));
        b.store(32, d, Index::zero(), Index::zero());

        copy_prop(&mut shader);
        let once = shader.block(block).instrs.clone();
        copy_prop(&mut shader);

        assert_eq!(once, shader.block(block).instrs);
    }
}
