//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Block, Index, ModifierClass, Opcode, OpcodeProps, Staging};
use crate::utility::mask_u8;

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// Rounding mode of a float operation or conversion.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Round {
    #[default]
    None,
    Rtp,
    Rtn,
    Rtz,
}

/// Output clamp of a float operation.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Clamp {
    #[default]
    None,
    Clamp0Inf,
    ClampM1To1,
    Clamp0To1,
}

/// Comparison predicate.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Cmpf {
    #[default]
    Eq,
    Gt,
    Ge,
    Ne,
    Lt,
    Le,
}

/// How a comparison encodes its boolean result.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ResultType {
    /// `1` or `0`.
    #[default]
    I1,
    /// `1.0` or `0.0`.
    F1,
    /// All ones or zero.
    M1,
}

/// How `MUX` decides between its inputs.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum MuxMode {
    /// Select `src0` where `src2` is negative.
    Neg,
    /// Select `src0` where `src2` is integer zero.
    IntZero,
    /// Select `src0` where `src2` is float zero.
    FpZero,
    /// Bitwise select, `src0` where the bits of `src2` are set.
    #[default]
    Bit,
}

/// The memory segment a load or store addresses.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Segment {
    /// Global memory.
    #[default]
    None,
    /// Workgroup-local storage.
    Wls,
    /// Thread-local storage, used for spilling.
    Tl,
    /// Uniform buffers.
    Ubo,
}

/// Register format of a message payload.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum RegisterFormat {
    #[default]
    Auto,
    F16,
    F32,
    S32,
    U32,
}

/// Opcode-specific modifiers, one variant per [`ModifierClass`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Modifiers {
    None,
    Float { round: Round, clamp: Clamp },
    Compare { cond: Cmpf, result: ResultType },
    Mux(MuxMode),
    Shift { not_result: bool },
    Convert { round: Round },
    Memory { segment: Segment },
    Blend { target: u8 },
}

impl Modifiers {
    /// The default modifiers for an opcode.
    pub fn for_opcode(op: Opcode) -> Self {
        match op.props().modifiers {
            ModifierClass::None => Modifiers::None,
            ModifierClass::Float => Modifiers::Float {
                round: Round::None,
                clamp: Clamp::None,
            },
            ModifierClass::Compare => Modifiers::Compare {
                cond: Cmpf::Eq,
                result: ResultType::I1,
            },
            ModifierClass::Mux => Modifiers::Mux(MuxMode::Bit),
            ModifierClass::Shift => Modifiers::Shift { not_result: false },
            ModifierClass::Convert => Modifiers::Convert { round: Round::None },
            ModifierClass::Memory => Modifiers::Memory {
                segment: Segment::None,
            },
            ModifierClass::Blend => Modifiers::Blend { target: 0 },
        }
    }
}

/// Hints consumed by the scheduler and the packer.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct SchedHints {
    /// The texture operation may skip derivative computation.
    pub tdd: bool,
    /// Index of a descriptor table.
    pub table: u8,
}

/// A single instruction.
///
/// Every instruction is owned by exactly one block (or one clause after
/// scheduling), and is only ever moved by removing it and inserting it
/// elsewhere.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Instr {
    /// The opcode.
    pub op: Opcode,
    /// Destination slots, unused ones are null.
    pub dest: [Index; 2],
    /// Source slots, unused ones are null.
    pub src: [Index; 4],
    /// Target block of a branch.
    pub branch_target: Option<Block>,
    /// Opcode-specific modifiers.
    pub modifiers: Modifiers,
    /// Number of components of a message payload, minus one.
    pub vecsize: u8,
    /// Format of a message payload.
    pub register_format: RegisterFormat,
    /// Set on spill and fill code so that it is never chosen for spilling again.
    pub no_spill: bool,
    /// Scheduler hints.
    pub hints: SchedHints,
}

impl Instr {
    /// Creates an instruction with all operands null and the default modifiers.
    pub fn new(op: Opcode) -> Self {
        Self {
            op,
            dest: [Index::null(); 2],
            src: [Index::null(); 4],
            branch_target: None,
            modifiers: Modifiers::for_opcode(op),
            vecsize: 0,
            register_format: RegisterFormat::Auto,
            no_spill: false,
            hints: SchedHints::default(),
        }
    }

    /// `dest = MOV.i32 src`
    pub fn mov(dest: Index, src: Index) -> Self {
        let mut instr = Self::new(Opcode::MovI32);

        instr.dest[0] = dest;
        instr.src[0] = src;
        instr
    }

    /// A thread-local load of `bits` bits from byte `offset` into `dest`.
    pub fn load_tl(bits: u32, dest: Index, offset: u32) -> Self {
        let mut instr = Self::new(Opcode::load(bits));

        instr.dest[0] = dest;
        instr.src[0] = Index::imm_u32(offset);
        instr.src[1] = Index::zero();
        instr.modifiers = Modifiers::Memory {
            segment: Segment::Tl,
        };
        instr
    }

    /// A thread-local store of `bits` bits of `value` to byte `offset`.
    pub fn store_tl(bits: u32, value: Index, offset: u32) -> Self {
        let mut instr = Self::new(Opcode::store(bits));

        instr.src[0] = value;
        instr.src[1] = Index::imm_u32(offset);
        instr.src[2] = Index::zero();
        instr.modifiers = Modifiers::Memory {
            segment: Segment::Tl,
        };
        instr
    }

    /// The static properties of the opcode.
    #[inline]
    pub fn props(&self) -> OpcodeProps {
        self.op.props()
    }

    fn staging_count(&self) -> u32 {
        match self.props().staging {
            Staging::None => 1,
            Staging::Fixed(n) => n as u32,
            Staging::Vecsize => self.vecsize as u32 + 1,
        }
    }

    /// How many consecutive registers source `s` reads.
    pub fn count_read_registers(&self, s: usize) -> u32 {
        if s == 0 && self.props().sr_read {
            self.staging_count()
        } else {
            1
        }
    }

    /// How many consecutive registers destination `d` writes.
    pub fn count_write_registers(&self, d: usize) -> u32 {
        if d == 0 && self.props().sr_write {
            self.staging_count()
        } else {
            1
        }
    }

    /// The lanes of its node that destination `d` writes.
    pub fn writemask(&self, d: usize) -> u8 {
        mask_u8(self.count_write_registers(d)) << self.dest[d].offset
    }

    /// Checks if any source reads the uniform bank.
    pub fn reads_fau(&self) -> bool {
        self.src.iter().any(|src| src.is_fau())
    }

    /// Checks if any source refers to the same value as `arg`.
    pub fn has_arg(&self, arg: Index) -> bool {
        self.src.iter().any(|src| src.is_equiv(arg))
    }

    /// Checks if this is a branch.
    #[inline]
    pub fn is_branch(&self) -> bool {
        self.props().branch
    }

    /// Checks if the instruction does anything beyond writing its destinations.
    #[inline]
    pub fn has_side_effects(&self) -> bool {
        self.op.has_side_effects()
    }

    /// Checks if every destination is null.
    pub fn all_dests_null(&self) -> bool {
        self.dest.iter().all(|dest| dest.is_null())
    }
}
