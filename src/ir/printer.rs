//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Textual form of the IR, used for debugging dumps and the validator.
//!
//! ```other
//! block0 {
//!     0 = MOV.i32 #0x5
//!     STORE.i32.tl 0, #0x0, #0x0
//! } -> block1
//! ```

use crate::arena::ArenaKey;
use crate::ir::*;
use std::fmt;
use std::fmt::{Display, Formatter, Write};

fn round_suffix(round: Round) -> &'static str {
    match round {
        Round::None => "",
        Round::Rtp => ".rtp",
        Round::Rtn => ".rtn",
        Round::Rtz => ".rtz",
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Modifiers::None => Ok(()),
            Modifiers::Float { round, clamp } => {
                let clamp = match clamp {
                    Clamp::None => "",
                    Clamp::Clamp0Inf => ".clamp_0_inf",
                    Clamp::ClampM1To1 => ".clamp_m1_1",
                    Clamp::Clamp0To1 => ".clamp_0_1",
                };

                write!(f, "{}{clamp}", round_suffix(round))
            }
            Modifiers::Compare { cond, result } => {
                let cond = match cond {
                    Cmpf::Eq => ".eq",
                    Cmpf::Gt => ".gt",
                    Cmpf::Ge => ".ge",
                    Cmpf::Ne => ".ne",
                    Cmpf::Lt => ".lt",
                    Cmpf::Le => ".le",
                };
                let result = match result {
                    ResultType::I1 => "",
                    ResultType::F1 => ".f1",
                    ResultType::M1 => ".m1",
                };

                write!(f, "{cond}{result}")
            }
            Modifiers::Mux(mode) => match mode {
                MuxMode::Neg => write!(f, ".neg"),
                MuxMode::IntZero => write!(f, ".int_zero"),
                MuxMode::FpZero => write!(f, ".fp_zero"),
                MuxMode::Bit => Ok(()),
            },
            Modifiers::Shift { not_result: true } => write!(f, ".not_result"),
            Modifiers::Shift { not_result: false } => Ok(()),
            Modifiers::Convert { round } => write!(f, "{}", round_suffix(round)),
            Modifiers::Memory { segment } => match segment {
                Segment::None => Ok(()),
                Segment::Wls => write!(f, ".wls"),
                Segment::Tl => write!(f, ".tl"),
                Segment::Ubo => write!(f, ".ubo"),
            },
            Modifiers::Blend { target } => write!(f, ".rt{target}"),
        }
    }
}

fn join(f: &mut Formatter<'_>, operands: &[Index]) -> fmt::Result {
    for (i, operand) in operands.iter().enumerate() {
        if i != 0 {
            write!(f, ", ")?;
        }

        write!(f, "{operand}")?;
    }

    Ok(())
}

impl Display for Instr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let props = self.props();
        let dests = &self.dest[..props.dests as usize];
        let srcs = &self.src[..props.srcs as usize];

        if !dests.is_empty() {
            join(f, dests)?;
            write!(f, " = ")?;
        }

        write!(f, "{}{}", self.op, self.modifiers)?;

        if props.staging == Staging::Vecsize {
            write!(f, ".v{}", self.vecsize as u32 + 1)?;
        }

        if !srcs.is_empty() {
            write!(f, " ")?;
            join(f, srcs)?;
        }

        if let Some(target) = self.branch_target {
            write!(f, " -> block{}", target.index())?;
        }

        Ok(())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "clause id({})", self.scoreboard_id)?;

        if self.dependencies != 0 {
            write!(f, " wait(")?;

            for slot in (0..8).filter(|slot| self.dependencies & (1 << slot) != 0) {
                write!(f, "{slot} ")?;
            }

            write!(f, ")")?;
        }

        writeln!(f, " {{")?;

        for instr in self.instrs.iter() {
            writeln!(f, "        {instr}")?;
        }

        write!(f, "    }}")
    }
}

/// Writes a single block, with its successor and predecessor lists.
pub fn write_block(out: &mut String, shader: &Shader, block: Block) -> fmt::Result {
    let data = shader.block(block);

    write!(out, "block{}", block.index())?;

    if data.loop_header {
        write!(out, " /* loop header */")?;
    }

    writeln!(out, " {{")?;

    if data.scheduled {
        for clause in data.clauses.iter() {
            writeln!(out, "    {clause}")?;
        }
    } else {
        for instr in data.instrs.iter() {
            writeln!(out, "    {instr}")?;
        }
    }

    write!(out, "}}")?;

    if data.successors().next().is_some() {
        write!(out, " ->")?;

        for succ in data.successors() {
            write!(out, " block{}", succ.index())?;
        }
    }

    if !data.predecessors.is_empty() {
        write!(out, " from")?;

        for pred in data.predecessors.iter() {
            write!(out, " block{}", pred.index())?;
        }
    }

    writeln!(out)
}

impl Display for Shader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut out = String::default();

        for block in self.blocks() {
            write_block(&mut out, self, block)?;
        }

        write!(f, "{out}")
    }
}
