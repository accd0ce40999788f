//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Clause, Instr, Message, RegisterFormat, Shader};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Shader-db style statistics about a compiled shader.
///
/// The cycle estimates assume 24 arithmetic instructions, 2 texture
/// messages, 16 16-bit varying channels and 1 load/store message per cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    /// Label of the shader.
    pub label: String,
    /// Stage name, or `BLEND` for blend shaders.
    pub stage: String,
    /// Total instructions.
    pub instrs: u32,
    /// Total clauses, zero if the shader was not scheduled.
    pub clauses: u32,
    /// Arithmetic instructions.
    pub arith: u32,
    /// Texture messages.
    pub texture: u32,
    /// 16-bit varying channels interpolated.
    pub varying: u32,
    /// Load/store messages.
    pub ldst: u32,
    /// Registers the allocation ended up needing.
    pub work_regs: u32,
    /// Threads per core the register usage allows.
    pub threads: u32,
    /// Loops in the program.
    pub loops: u32,
    /// Spill stores.
    pub spills: u32,
    /// Fill loads.
    pub fills: u32,
}

impl Stats {
    /// Gathers statistics from a shader.
    pub fn collect(shader: &Shader) -> Self {
        let inputs = &shader.inputs;
        let mut stats = Self {
            label: inputs.label.clone(),
            stage: if inputs.is_blend {
                "BLEND".to_owned()
            } else {
                inputs.stage.to_string()
            },
            work_regs: shader.work_reg_count,
            threads: if inputs.arch == 7 && shader.work_reg_count <= 32 {
                2
            } else {
                1
            },
            loops: shader.loop_count,
            spills: shader.spills,
            fills: shader.fills,
            ..Self::default()
        };

        for block in shader.blocks() {
            let data = shader.block(block);

            for clause in data.clauses.iter() {
                stats.count_clause(clause);
            }

            for instr in data.instrs.iter() {
                stats.count_instr(instr, instr.op.message());
            }
        }

        stats
    }

    fn count_clause(&mut self, clause: &Clause) {
        self.clauses += 1;

        for (i, instr) in clause.instrs.iter().enumerate() {
            if clause.message == Some(i) {
                self.count_instr(instr, clause.message_kind());
            } else {
                self.count_instr(instr, Message::None);
            }
        }
    }

    fn count_instr(&mut self, instr: &Instr, message: Message) {
        self.instrs += 1;

        match message {
            Message::None => self.arith += 1,
            Message::Varying => {
                let per_channel = match instr.register_format {
                    RegisterFormat::F16 => 1,
                    _ => 2,
                };

                self.varying += (instr.vecsize as u32 + 1) * per_channel;
            }
            Message::VarTex => {
                self.varying += 2 * 2;
                self.texture += 1;
            }
            Message::Tex => self.texture += 1,
            Message::Attribute | Message::Load | Message::Store | Message::Atomic => {
                self.ldst += 1
            }
            Message::Barrier
            | Message::Blend
            | Message::Tile
            | Message::ZStencil
            | Message::Atest
            | Message::Job
            | Message::SixtyFourBit => {}
        }
    }

    /// Estimated arithmetic cycles.
    pub fn cycles_arith(&self) -> f32 {
        self.arith as f32 / 24.0
    }

    /// Estimated texture cycles.
    pub fn cycles_texture(&self) -> f32 {
        self.texture as f32 / 2.0
    }

    /// Estimated varying cycles.
    pub fn cycles_varying(&self) -> f32 {
        self.varying as f32 / 16.0
    }

    /// Estimated load/store cycles.
    pub fn cycles_ldst(&self) -> f32 {
        self.ldst as f32
    }

    /// The bound on cycles, whichever unit is the bottleneck.
    pub fn cycles_bound(&self) -> f32 {
        let message = self
            .cycles_texture()
            .max(self.cycles_varying())
            .max(self.cycles_ldst());

        self.cycles_arith().max(message)
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} shader: {} inst, {} clauses, {:.6} cycles, {:.6} arith, {:.6} texture, \
             {:.6} vary, {:.6} ldst, {} threads, {} loops, {}:{} spills:fills",
            self.label,
            self.stage,
            self.instrs,
            self.clauses,
            self.cycles_bound(),
            self.cycles_arith(),
            self.cycles_texture(),
            self.cycles_varying(),
            self.cycles_ldst(),
            self.threads,
            self.loops,
            self.spills,
            self.fills
        )
    }
}
