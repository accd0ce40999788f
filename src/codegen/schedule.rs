//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Clause, Instr, Message, Shader};
use crate::pass::ShaderPass;
use log::{debug, info};

/// The most instructions a single clause may hold.
pub const MAX_CLAUSE_INSTRS: usize = 8;

/// Bundles the instructions of every block into clauses.
pub struct SchedulePass;

impl ShaderPass for SchedulePass {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn run(&mut self, shader: &mut Shader) {
        schedule(shader);
    }
}

fn close_clause(clause: &mut Clause, clauses: &mut Vec<Clause>) {
    if !clause.instrs.is_empty() {
        clauses.push(std::mem::take(clause));
    }
}

fn bundle(instrs: Vec<Instr>, max_instrs: usize) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut clause = Clause::default();

    for instr in instrs {
        let message = instr.op.message() != Message::None;

        if clause.instrs.len() == max_instrs || (message && clause.message.is_some()) {
            close_clause(&mut clause, &mut clauses);
        }

        if message {
            clause.message = Some(clause.instrs.len());
        }

        clause.instrs.push(instr);

        if instr.is_branch() {
            close_clause(&mut clause, &mut clauses);
        }
    }

    close_clause(&mut clause, &mut clauses);

    clauses
}

/// Groups instructions into clauses in program order, never reordering.
///
/// A clause holds at most [`MAX_CLAUSE_INSTRS`] instructions and at most one
/// message, and a branch always ends its clause. With the `nosched` flag
/// every instruction gets a clause of its own, and with the `msgs` flag
/// every message is logged along with the clause it landed in.
pub fn schedule(shader: &mut Shader) {
    let max_instrs = if shader.inputs.debug.nosched {
        1
    } else {
        MAX_CLAUSE_INSTRS
    };
    let msgs = shader.inputs.debug.msgs;

    for block in shader.blocks() {
        let data = shader.block_mut(block);
        let instrs = std::mem::take(&mut data.instrs);

        data.clauses = bundle(instrs, max_instrs);
        data.scheduled = true;

        debug!("{block:?}: {} clauses", data.clauses.len());

        if msgs {
            for (n, clause) in data.clauses.iter().enumerate() {
                if let Some(message) = clause.message_instr() {
                    info!("{block:?} clause {n}: {message}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{CompileInputs, DebugFlags};
    use crate::ir::*;

    fn mov(reg: u32) -> Instr {
        Instr::mov(Index::register(reg), Index::imm_u32(reg))
    }

    fn store(reg: u32) -> Instr {
        Instr::store_tl(32, Index::register(reg), 4 * reg)
    }

    fn scheduled(inputs: CompileInputs, instrs: Vec<Instr>) -> Vec<Clause> {
        let mut shader = Shader::new(inputs);
        let block = shader.create_block();

        shader.block_mut(block).instrs = instrs;

        schedule(&mut shader);

        assert!(shader.block(block).scheduled);
        assert!(shader.block(block).instrs.is_empty());

        shader.block(block).clauses.clone()
    }

    #[test]
    fn clauses_are_capped() {
        let clauses = scheduled(CompileInputs::default(), (0..10).map(mov).collect());
        let sizes: Vec<_> = clauses.iter().map(|c| c.instrs.len()).collect();

        assert_eq!(sizes, vec![8, 2]);
        assert!(clauses.iter().all(|c| c.message.is_none()));
    }

    #[test]
    fn one_message_per_clause() {
        let clauses = scheduled(
            CompileInputs::default(),
            vec![mov(0), store(0), mov(1), store(1)],
        );

        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].message, Some(1));
        assert_eq!(clauses[1].message, Some(0));
        assert_eq!(clauses[1].message_kind(), Message::Store);
    }

    #[test]
    fn branches_end_clauses() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let b = shader.create_block();

        shader.add_successor(a, b);

        let mut jump = Instr::new(Opcode::Jump);
        jump.branch_target = Some(b);

        shader.block_mut(a).instrs = vec![mov(0), jump, mov(1)];
        shader.block_mut(b).instrs = vec![store(1)];

        schedule(&mut shader);

        let sizes: Vec<_> = shader.block(a).clauses.iter().map(|c| c.instrs.len()).collect();

        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(shader.block(b).clauses.len(), 1);
    }

    #[test]
    fn nosched_isolates_instructions() {
        let inputs = CompileInputs {
            debug: DebugFlags {
                nosched: true,
                ..DebugFlags::default()
            },
            ..CompileInputs::default()
        };
        let clauses = scheduled(inputs, vec![mov(0), mov(1), store(1)]);

        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[2].message, Some(0));
    }

    #[test]
    fn empty_blocks_have_no_clauses() {
        assert!(scheduled(CompileInputs::default(), vec![]).is_empty());
    }
}
