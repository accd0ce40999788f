//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::analysis::LiveSet;
use crate::arena_key;
use crate::ir::{Instr, Message};
use smallvec::SmallVec;

arena_key! {
    /// References a single basic block of a [`Shader`](crate::ir::Shader).
    ///
    /// Blocks are created in program order, so comparing two keys compares
    /// their position in the final program.
    pub struct Block;
}

/// A group of instructions issued together by the hardware.
///
/// At most one instruction of a clause may issue a message, and that
/// message is what the clause's scoreboard slot tracks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clause {
    /// The instructions, in issue order.
    pub instrs: Vec<Instr>,
    /// Index into `instrs` of the message-issuing instruction.
    pub message: Option<usize>,
    /// The scoreboard slot this clause's message signals.
    pub scoreboard_id: u8,
    /// Bitmask of scoreboard slots that must be waited on before issuing.
    pub dependencies: u8,
}

impl Clause {
    /// Gets the message-issuing instruction, if there is one.
    pub fn message_instr(&self) -> Option<&Instr> {
        self.message.map(|i| &self.instrs[i])
    }

    /// The message class of the clause.
    pub fn message_kind(&self) -> Message {
        self.message_instr()
            .map_or(Message::None, |instr| instr.op.message())
    }
}

/// The data of a single basic block.
///
/// A block is either instruction-level (`instrs` is used) or scheduled
/// (`clauses` is used), never both at once.
#[derive(Clone, Debug, Default)]
pub struct BlockData {
    /// The instructions, before scheduling.
    pub instrs: Vec<Instr>,
    /// The clauses, after scheduling.
    pub clauses: Vec<Clause>,
    /// Up to two successors. The first is the fallthrough or the only target.
    pub successors: [Option<Block>; 2],
    /// Every block with this block as a successor. Non-owning.
    pub predecessors: SmallVec<[Block; 4]>,
    /// Lanes of each node live on entry.
    pub live_in: LiveSet,
    /// Lanes of each node live on exit.
    pub live_out: LiveSet,
    /// Physical registers live on entry, after allocation.
    pub reg_live_in: u64,
    /// Physical registers live on exit, after allocation.
    pub reg_live_out: u64,
    /// Whether the block is the header of a loop.
    pub loop_header: bool,
    /// Whether the block has been bundled into clauses.
    pub scheduled: bool,
}

impl BlockData {
    /// Creates an empty, unscheduled block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the successors that exist.
    pub fn successors(&self) -> impl Iterator<Item = Block> + '_ {
        self.successors.iter().flatten().copied()
    }

    /// Iterates over every instruction, whether the block is scheduled or not.
    pub fn all_instrs(&self) -> impl Iterator<Item = &Instr> + '_ {
        self.instrs
            .iter()
            .chain(self.clauses.iter().flat_map(|clause| clause.instrs.iter()))
    }

    /// The number of instructions in the block, scheduled or not.
    pub fn instr_count(&self) -> usize {
        self.instrs.len() + self.clauses.iter().map(|c| c.instrs.len()).sum::<usize>()
    }
}
