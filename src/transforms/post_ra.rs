//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Opcode, Shader};
use crate::pass::ShaderPass;

/// Removes moves from a register into itself, which register allocation
/// leaves behind whenever a copy's source and destination share a color.
pub struct SelfMoveEliminationPass;

impl ShaderPass for SelfMoveEliminationPass {
    fn name(&self) -> &'static str {
        "self-move"
    }

    fn run(&mut self, shader: &mut Shader) {
        remove_self_moves(shader);
    }
}

/// Deletes every `MOV.i32` whose source is the same value as its destination.
///
/// Returns how many were removed.
pub fn remove_self_moves(shader: &mut Shader) -> usize {
    let mut removed = 0;

    for block in shader.blocks() {
        let instrs = &mut shader.block_mut(block).instrs;
        let before = instrs.len();

        instrs.retain(|instr| {
            !(instr.op == Opcode::MovI32 && instr.dest[0].is_equiv(instr.src[0]))
        });

        removed += before - instrs.len();
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;

    #[test]
    fn only_self_moves_are_removed() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();
        let instrs = &mut shader.block_mut(block).instrs;

        // R0 = MOV.i32 R0
        // R1 = MOV.i32 R0
        // R2 = MOV.i32 #0x2
        // R3 = IADD.u32 R3, R3
        instrs.push(Instr::mov(Index::register(0), Index::register(0)));
        instrs.push(Instr::mov(Index::register(1), Index::register(0)));
        instrs.push(Instr::mov(Index::register(2), Index::imm_u32(2)));

        let mut add = Instr::new(Opcode::IaddU32);
        add.dest[0] = Index::register(3);
        add.src[0] = Index::register(3);
        add.src[1] = Index::register(3);
        instrs.push(add);

        assert_eq!(remove_self_moves(&mut shader), 1);

        let dests: Vec<_> = shader
            .block(block)
            .instrs
            .iter()
            .map(|i| i.dest[0])
            .collect();

        assert_eq!(
            dests,
            vec![Index::register(1), Index::register(2), Index::register(3)]
        );
    }
}
