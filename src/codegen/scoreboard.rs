//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Instr, Opcode, Shader};
use crate::pass::ShaderPass;

/// The number of scoreboard slots the hardware tracks.
pub const NUM_SLOTS: u8 = 8;

/// Assigns scoreboard slots to every clause.
pub struct ScoreboardPass;

impl ShaderPass for ScoreboardPass {
    fn name(&self) -> &'static str {
        "scoreboard"
    }

    fn run(&mut self, shader: &mut Shader) {
        assign_scoreboard(shader);
    }
}

/// The slot a message is tracked in.
///
/// `ATEST` and `ZS_EMIT` must use slot 0 and `BARRIER` must use slot 7.
/// Everything else goes in slot 0, slots are never reused smartly.
pub fn choose_scoreboard_slot(message: &Instr) -> u8 {
    match message.op {
        Opcode::Atest | Opcode::ZsEmit => 0,
        Opcode::Barrier => NUM_SLOTS - 1,
        _ => 0,
    }
}

/// Walks every clause in program order once, giving each clause a slot and
/// making the clause after it wait on that slot. Clauses without a message
/// use slot 0.
///
/// The clause after the last clause of a block is the first clause of the
/// next block in program order that has any.
pub fn assign_scoreboard(shader: &mut Shader) {
    let positions: Vec<_> = shader
        .blocks()
        .flat_map(|block| (0..shader.block(block).clauses.len()).map(move |i| (block, i)))
        .collect();

    for (n, &(block, i)) in positions.iter().enumerate() {
        let slot = {
            let clause = &mut shader.block_mut(block).clauses[i];
            let slot = clause.message_instr().map_or(0, choose_scoreboard_slot);

            clause.scoreboard_id = slot;
            slot
        };

        if let Some(&(next_block, j)) = positions.get(n + 1) {
            shader.block_mut(next_block).clauses[j].dependencies |= 1 << slot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;

    fn clause(op: Option<Opcode>) -> Clause {
        let mut clause = Clause::default();

        clause
            .instrs
            .push(Instr::mov(Index::register(0), Index::imm_u32(0)));

        if let Some(op) = op {
            clause.message = Some(1);
            clause.instrs.push(Instr::new(op));
        }

        clause
    }

    #[test]
    fn pinned_slots() {
        assert_eq!(choose_scoreboard_slot(&Instr::new(Opcode::Atest)), 0);
        assert_eq!(choose_scoreboard_slot(&Instr::new(Opcode::ZsEmit)), 0);
        assert_eq!(choose_scoreboard_slot(&Instr::new(Opcode::Barrier)), 7);
        assert_eq!(choose_scoreboard_slot(&Instr::new(Opcode::LoadI32)), 0);
    }

    #[test]
    fn next_clause_waits_across_blocks() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let empty = shader.create_block();
        let c = shader.create_block();

        shader.add_successor(a, empty);
        shader.add_successor(empty, c);

        shader.block_mut(a).clauses = vec![clause(None), clause(Some(Opcode::Barrier))];
        shader.block_mut(c).clauses = vec![clause(Some(Opcode::LoadI32)), clause(None)];

        assign_scoreboard(&mut shader);

        let a = &shader.block(a).clauses;
        let c = &shader.block(c).clauses;

        assert_eq!(a[0].dependencies, 0);
        assert_eq!(a[0].scoreboard_id, 0);
        assert_eq!(a[1].scoreboard_id, 7);
        assert_eq!(a[1].dependencies, 1 << 0);
        assert_eq!(c[0].dependencies, 1 << 7);
        assert_eq!(c[0].scoreboard_id, 0);
        assert_eq!(c[1].dependencies, 1 << 0);
    }

    #[test]
    fn clauses_without_messages_still_chain() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();

        shader.block_mut(a).clauses = vec![clause(None), clause(None)];

        assign_scoreboard(&mut shader);

        let clauses = &shader.block(a).clauses;

        assert_eq!(clauses[0].scoreboard_id, 0);
        assert_eq!(clauses[0].dependencies, 0);
        assert_eq!(clauses[1].dependencies, 1);
    }

    #[test]
    fn last_clause_has_no_successor() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();

        shader.block_mut(a).clauses = vec![clause(Some(Opcode::Atest))];

        assign_scoreboard(&mut shader);

        assert_eq!(shader.block(a).clauses[0].dependencies, 0);
    }
}
