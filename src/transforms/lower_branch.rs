//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Block, Opcode, Shader};
use crate::pass::ShaderPass;
use crate::utility::FastSet;

/// Cleans up control flow right before register allocation.
pub struct LowerBranchPass;

impl ShaderPass for LowerBranchPass {
    fn name(&self) -> &'static str {
        "lower-branch"
    }

    fn run(&mut self, shader: &mut Shader) {
        lower_branches(shader);
    }
}

/// Lowers the branches of every block.
///
/// Only the first branch of a block is meaningful, any after it must be
/// unconditional jumps and are dropped. On architectures that end the
/// shader implicitly, a branch into a terminal block has its target
/// cleared since falling off the end does the same thing.
pub fn lower_branches(shader: &mut Shader) {
    let terminal: FastSet<Block> = if shader.inputs.arch <= 8 {
        shader
            .blocks()
            .filter(|&block| shader.is_terminal_block(block))
            .collect()
    } else {
        FastSet::default()
    };

    for block in shader.blocks() {
        let instrs = std::mem::take(&mut shader.block_mut(block).instrs);
        let mut kept = Vec::with_capacity(instrs.len());
        let mut branched = false;

        for mut instr in instrs {
            let target = match instr.branch_target {
                Some(target) => target,
                None => {
                    kept.push(instr);
                    continue;
                }
            };

            if branched {
                assert_eq!(
                    instr.op,
                    Opcode::Jump,
                    "only jumps may follow the first branch of {block:?}"
                );

                continue;
            }

            branched = true;

            if terminal.contains(&target) {
                instr.branch_target = None;
            }

            kept.push(instr);
        }

        shader.block_mut(block).instrs = kept;
    }
}
