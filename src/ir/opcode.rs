//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! The opcode table and the static properties of every opcode.

use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// The hardware message an opcode issues, if any.
///
/// Message-passing instructions are asynchronous and are tracked by the
/// scoreboard, there can be at most one of them in a clause.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Message {
    None,
    Varying,
    Attribute,
    Tex,
    VarTex,
    Load,
    Store,
    Atomic,
    Barrier,
    Blend,
    Tile,
    ZStencil,
    Atest,
    Job,
    SixtyFourBit,
}

/// How many consecutive registers a staging operand occupies.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Staging {
    /// The opcode has no staging operand.
    None,
    /// Always this many registers.
    Fixed(u8),
    /// Determined by the `vecsize` of the instruction.
    Vecsize,
}

/// Which family of modifiers an opcode carries.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum ModifierClass {
    None,
    Float,
    Compare,
    Mux,
    Shift,
    Convert,
    Memory,
    Blend,
}

/// Static properties of an opcode.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct OpcodeProps {
    /// Printable name of the opcode.
    pub name: &'static str,
    /// Number of destination slots used.
    pub dests: u8,
    /// Number of source slots used.
    pub srcs: u8,
    /// The message class this opcode issues.
    pub message: Message,
    /// Source 0 is a staging register read.
    pub sr_read: bool,
    /// Destination 0 is a staging register write.
    pub sr_write: bool,
    /// Size of the staging operands.
    pub staging: Staging,
    /// Whether this opcode is a branch.
    pub branch: bool,
    /// The modifiers the opcode takes.
    pub modifiers: ModifierClass,
}

impl OpcodeProps {
    const fn new(name: &'static str, dests: u8, srcs: u8) -> Self {
        Self {
            name,
            dests,
            srcs,
            message: Message::None,
            sr_read: false,
            sr_write: false,
            staging: Staging::None,
            branch: false,
            modifiers: ModifierClass::None,
        }
    }

    const fn message(self, message: Message) -> Self {
        Self { message, ..self }
    }

    const fn reads_staging(self, staging: Staging) -> Self {
        Self {
            sr_read: true,
            staging,
            ..self
        }
    }

    const fn writes_staging(self, staging: Staging) -> Self {
        Self {
            sr_write: true,
            staging,
            ..self
        }
    }

    const fn branch(self) -> Self {
        Self {
            branch: true,
            ..self
        }
    }

    const fn mods(self, modifiers: ModifierClass) -> Self {
        Self { modifiers, ..self }
    }
}

macro_rules! define_opcodes {
    ( $( $(#[$meta:meta])* $variant:ident => $props:expr; )* ) => {
        /// Every opcode the backend knows about.
        #[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
        #[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
        #[allow(missing_docs)]
        pub enum Opcode {
            $( $(#[$meta])* $variant, )*
        }

        impl Opcode {
            /// Every opcode, in declaration order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$variant, )* ];

            /// Gets the static properties of the opcode.
            pub const fn props(self) -> OpcodeProps {
                match self {
                    $( Opcode::$variant => $props, )*
                }
            }
        }
    };
}

use ModifierClass as M;
use OpcodeProps as P;

define_opcodes! {
    /// `dest = src0`
    MovI32 => P::new("MOV.i32", 1, 1);
    /// Does nothing.
    Nop => P::new("NOP", 0, 0);
    /// `dest = src0 + src1`
    FaddF32 => P::new("FADD.f32", 1, 2).mods(M::Float);
    /// `dest = src0 * src1 + src2`
    FmaF32 => P::new("FMA.f32", 1, 3).mods(M::Float);
    /// `dest = src0 * src1`
    FmulF32 => P::new("FMUL.f32", 1, 2).mods(M::Float);
    /// `dest = src0 + src1`
    IaddU32 => P::new("IADD.u32", 1, 2);
    /// `dest = src0 - src1`
    IsubU32 => P::new("ISUB.u32", 1, 2);
    /// `dest = src0 * src1`
    ImulI32 => P::new("IMUL.i32", 1, 2);
    /// `dest = (src0 << src2) | src1`
    LshiftOrI32 => P::new("LSHIFT_OR.i32", 1, 3).mods(M::Shift);
    /// `dest = (src0 >> src2) & src1`
    RshiftAndI32 => P::new("RSHIFT_AND.i32", 1, 3).mods(M::Shift);
    /// `dest = (src0 << src2) & src1`
    LshiftAndI32 => P::new("LSHIFT_AND.i32", 1, 3).mods(M::Shift);
    /// Selects between `src0` and `src1` based on `src2`.
    MuxI32 => P::new("MUX.i32", 1, 3).mods(M::Mux);
    /// `dest = cmp(src0, src1) ? src2 : src3`
    CselI32 => P::new("CSEL.i32", 1, 4).mods(M::Compare);
    /// Integer comparison.
    IcmpI32 => P::new("ICMP.i32", 1, 2).mods(M::Compare);
    /// Float comparison.
    FcmpF32 => P::new("FCMP.f32", 1, 2).mods(M::Compare);
    /// Packs two 16-bit halves.
    MkvecV2i16 => P::new("MKVEC.v2i16", 1, 2);
    /// Packs four bytes.
    MkvecV4i8 => P::new("MKVEC.v4i8", 1, 4);
    /// Packs two bytes and a high half.
    MkvecV2i8 => P::new("MKVEC.v2i8", 1, 3);
    /// Swizzles two 16-bit halves.
    SwzV2i16 => P::new("SWZ.v2i16", 1, 1);
    /// Float to unsigned integer conversion.
    F32ToU32 => P::new("F32_TO_U32", 1, 1).mods(M::Convert);
    /// Float to signed integer conversion.
    F32ToS32 => P::new("F32_TO_S32", 1, 1).mods(M::Convert);
    /// Unsigned integer to float conversion.
    U32ToF32 => P::new("U32_TO_F32", 1, 1).mods(M::Convert);
    /// Signed integer to float conversion.
    S32ToF32 => P::new("S32_TO_F32", 1, 1).mods(M::Convert);
    /// Loads one word from `(src0, src1)`.
    LoadI32 => P::new("LOAD.i32", 1, 2)
        .message(Message::Load).writes_staging(Staging::Fixed(1)).mods(M::Memory);
    /// Loads two words from `(src0, src1)`.
    LoadI64 => P::new("LOAD.i64", 1, 2)
        .message(Message::Load).writes_staging(Staging::Fixed(2)).mods(M::Memory);
    /// Loads three words from `(src0, src1)`.
    LoadI96 => P::new("LOAD.i96", 1, 2)
        .message(Message::Load).writes_staging(Staging::Fixed(3)).mods(M::Memory);
    /// Loads four words from `(src0, src1)`.
    LoadI128 => P::new("LOAD.i128", 1, 2)
        .message(Message::Load).writes_staging(Staging::Fixed(4)).mods(M::Memory);
    /// Stores one word of `src0` to `(src1, src2)`.
    StoreI32 => P::new("STORE.i32", 0, 3)
        .message(Message::Store).reads_staging(Staging::Fixed(1)).mods(M::Memory);
    /// Stores two words of `src0` to `(src1, src2)`.
    StoreI64 => P::new("STORE.i64", 0, 3)
        .message(Message::Store).reads_staging(Staging::Fixed(2)).mods(M::Memory);
    /// Stores three words of `src0` to `(src1, src2)`.
    StoreI96 => P::new("STORE.i96", 0, 3)
        .message(Message::Store).reads_staging(Staging::Fixed(3)).mods(M::Memory);
    /// Stores four words of `src0` to `(src1, src2)`.
    StoreI128 => P::new("STORE.i128", 0, 3)
        .message(Message::Store).reads_staging(Staging::Fixed(4)).mods(M::Memory);
    /// Interpolates a varying.
    LdVar => P::new("LD_VAR", 1, 1)
        .message(Message::Varying).writes_staging(Staging::Vecsize);
    /// Loads a vertex attribute.
    LdAttr => P::new("LD_ATTR", 1, 2)
        .message(Message::Attribute).writes_staging(Staging::Vecsize);
    /// Simple 2D texture sample.
    Texs2dF32 => P::new("TEXS_2D.f32", 1, 2)
        .message(Message::Tex).writes_staging(Staging::Fixed(4));
    /// Atomic add returning the old value.
    AtomReturnI32 => P::new("ATOM_RETURN.i32", 1, 3)
        .message(Message::Atomic).reads_staging(Staging::Fixed(1)).writes_staging(Staging::Fixed(1));
    /// Atomic exchange.
    AxchgI32 => P::new("AXCHG.i32", 1, 3)
        .message(Message::Atomic).reads_staging(Staging::Fixed(1)).writes_staging(Staging::Fixed(1));
    /// Loads from the tile buffer.
    LdTile => P::new("LD_TILE", 1, 3)
        .message(Message::Tile).writes_staging(Staging::Vecsize);
    /// Stores to the tile buffer.
    StTile => P::new("ST_TILE", 0, 4)
        .message(Message::Tile).reads_staging(Staging::Vecsize);
    /// Calls the blend shader or fixed-function blending for a render target.
    Blend => P::new("BLEND", 1, 4)
        .message(Message::Blend).reads_staging(Staging::Fixed(4)).writes_staging(Staging::Fixed(4))
        .mods(M::Blend);
    /// Alpha test.
    Atest => P::new("ATEST", 1, 3).message(Message::Atest);
    /// Emits depth and stencil.
    ZsEmit => P::new("ZS_EMIT", 1, 3).message(Message::ZStencil);
    /// Workgroup barrier.
    Barrier => P::new("BARRIER", 0, 0).message(Message::Barrier);
    /// Kills the fragment if the comparison holds.
    DiscardF32 => P::new("DISCARD.f32", 0, 2).mods(M::Compare);
    /// Selects a descriptor table.
    DtselImm => P::new("DTSEL_IMM", 1, 1);
    /// Unconditional branch.
    Jump => P::new("JUMP", 0, 1).branch();
    /// Branch if `src0` is zero.
    BranchzI32 => P::new("BRANCHZ.i32", 0, 1).branch();
}

impl Opcode {
    /// Gets the printable name of the opcode.
    #[inline]
    pub const fn name(self) -> &'static str {
        self.props().name
    }

    /// The message this opcode issues.
    #[inline]
    pub const fn message(self) -> Message {
        self.props().message
    }

    /// Checks if the opcode does anything beyond writing its destinations.
    ///
    /// ```
    /// # use bir::ir::Opcode;
    /// assert!(Opcode::StoreI32.has_side_effects());
    /// assert!(Opcode::Jump.has_side_effects());
    /// assert!(!Opcode::LdTile.has_side_effects());
    /// assert!(!Opcode::LoadI32.has_side_effects());
    /// ```
    pub fn has_side_effects(self) -> bool {
        let props = self.props();

        if props.branch || self == Opcode::DiscardF32 {
            return true;
        }

        match props.message {
            Message::None
            | Message::Varying
            | Message::Attribute
            | Message::Tex
            | Message::VarTex
            | Message::Load
            | Message::SixtyFourBit => false,
            Message::Store
            | Message::Atomic
            | Message::Barrier
            | Message::Blend
            | Message::ZStencil
            | Message::Atest
            | Message::Job => true,
            Message::Tile => self != Opcode::LdTile,
        }
    }

    /// The load opcode moving `bits` bits.
    pub fn load(bits: u32) -> Opcode {
        match bits {
            32 => Opcode::LoadI32,
            64 => Opcode::LoadI64,
            96 => Opcode::LoadI96,
            128 => Opcode::LoadI128,
            _ => unreachable!("invalid load size {bits}"),
        }
    }

    /// The store opcode moving `bits` bits.
    pub fn store(bits: u32) -> Opcode {
        match bits {
            32 => Opcode::StoreI32,
            64 => Opcode::StoreI64,
            96 => Opcode::StoreI96,
            128 => Opcode::StoreI128,
            _ => unreachable!("invalid store size {bits}"),
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_props_are_consistent() {
        for &op in Opcode::ALL {
            let props = op.props();

            if props.sr_read || props.sr_write {
                assert_ne!(props.staging, Staging::None, "{op} has no staging size");
            }

            if props.sr_write {
                assert!(props.dests >= 1, "{op} writes staging without a destination");
            }

            if props.sr_read {
                assert!(props.srcs >= 1, "{op} reads staging without a source");
            }

            assert!(props.dests <= 2 && props.srcs <= 4);
        }
    }

    #[test]
    fn message_side_effects() {
        let effectful = [
            Opcode::StoreI128,
            Opcode::AtomReturnI32,
            Opcode::AxchgI32,
            Opcode::Barrier,
            Opcode::Blend,
            Opcode::ZsEmit,
            Opcode::Atest,
            Opcode::StTile,
            Opcode::DiscardF32,
            Opcode::BranchzI32,
        ];

        let pure = [
            Opcode::MovI32,
            Opcode::FmaF32,
            Opcode::LdVar,
            Opcode::LdAttr,
            Opcode::Texs2dF32,
            Opcode::LoadI64,
            Opcode::LdTile,
            Opcode::DtselImm,
        ];

        assert!(effectful.iter().all(|op| op.has_side_effects()));
        assert!(pure.iter().all(|op| !op.has_side_effects()));
    }

    #[test]
    fn memory_opcodes_by_size() {
        assert_eq!(Opcode::load(96), Opcode::LoadI96);
        assert_eq!(Opcode::store(64), Opcode::StoreI64);
        assert_eq!(Opcode::store(64).props().staging, Staging::Fixed(2));
    }
}
