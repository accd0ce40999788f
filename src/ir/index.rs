//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::utility::mask_u8;
use static_assertions::assert_eq_size;
use std::fmt;
use std::fmt::{Display, Formatter};

#[cfg(feature = "enable-serde")]
use serde::{Deserialize, Serialize};

/// A micro-architectural passthrough, reading a result of the previous tuple
/// without going through the register file.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Passthrough {
    /// Result of the FMA unit in the previous tuple.
    Fma,
    /// Result of the ADD unit in the previous tuple.
    Add,
    /// The staging register of the current clause.
    Stage,
}

/// Which kind of value an [`Index`] refers to.
///
/// Exactly one of these is ever active, the modifier fields of [`Index`] are
/// only meaningful for `Normal`, `Register` and `Fau` (and the swizzle for
/// `Constant`).
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum IndexKind {
    /// Unused operand slot.
    Null,
    /// An SSA value (`reg == false`) or a pre-allocation virtual register.
    Normal {
        /// The value or virtual register number.
        value: u32,
        /// Whether this is a virtual register rather than an SSA value.
        reg: bool,
    },
    /// A physical register, only present after register allocation.
    Register(u32),
    /// An inline 32-bit immediate.
    Constant(u32),
    /// A passthrough from the previous tuple.
    Pass(Passthrough),
    /// A slot in the fast-access uniform bank.
    Fau(u32),
}

/// Lane selector applied to a 32-bit operand, either over 16-bit halves or over bytes.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
#[allow(missing_docs)]
pub enum Swizzle {
    #[default]
    H01,
    H00,
    H10,
    H11,
    B0000,
    B1111,
    B2222,
    B3333,
    B0011,
    B2233,
    B1032,
    B3210,
    B0022,
    B1133,
}

impl Swizzle {
    /// Applies the swizzle to a 32-bit constant, producing the value that the
    /// hardware would actually read.
    ///
    /// ```
    /// # use bir::ir::Swizzle;
    /// assert_eq!(Swizzle::H10.apply(0x1111_2222), 0x2222_1111);
    /// assert_eq!(Swizzle::B3210.apply(0x4433_2211), 0x1122_3344);
    /// assert_eq!(Swizzle::H01.apply(0xDEAD_BEEF), 0xDEAD_BEEF);
    /// ```
    pub fn apply(self, value: u32) -> u32 {
        let h = |i: u32| (value >> (16 * i)) & 0xFFFF;
        let b = |i: u32| (value >> (8 * i)) & 0xFF;
        let halves = |lo, hi| h(lo) | (h(hi) << 16);
        let bytes = |b0, b1, b2, b3| b(b0) | (b(b1) << 8) | (b(b2) << 16) | (b(b3) << 24);

        match self {
            Swizzle::H01 => halves(0, 1),
            Swizzle::H00 => halves(0, 0),
            Swizzle::H10 => halves(1, 0),
            Swizzle::H11 => halves(1, 1),
            Swizzle::B0000 => bytes(0, 0, 0, 0),
            Swizzle::B1111 => bytes(1, 1, 1, 1),
            Swizzle::B2222 => bytes(2, 2, 2, 2),
            Swizzle::B3333 => bytes(3, 3, 3, 3),
            Swizzle::B0011 => bytes(0, 0, 1, 1),
            Swizzle::B2233 => bytes(2, 2, 3, 3),
            Swizzle::B1032 => bytes(1, 0, 3, 2),
            Swizzle::B3210 => bytes(3, 2, 1, 0),
            Swizzle::B0022 => bytes(0, 0, 2, 2),
            Swizzle::B1133 => bytes(1, 1, 3, 3),
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Swizzle::H01 => "",
            Swizzle::H00 => ".h00",
            Swizzle::H10 => ".h10",
            Swizzle::H11 => ".h11",
            Swizzle::B0000 => ".b0000",
            Swizzle::B1111 => ".b1111",
            Swizzle::B2222 => ".b2222",
            Swizzle::B3333 => ".b3333",
            Swizzle::B0011 => ".b0011",
            Swizzle::B2233 => ".b2233",
            Swizzle::B1032 => ".b1032",
            Swizzle::B3210 => ".b3210",
            Swizzle::B0022 => ".b0022",
            Swizzle::B1133 => ".b1133",
        }
    }
}

/// An operand of an instruction.
///
/// This is a small `Copy` type, instructions store their destinations and
/// sources inline as fixed arrays of these.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Index {
    /// What the operand refers to.
    pub kind: IndexKind,
    /// Offset in 32-bit words into a vector node.
    pub offset: u8,
    /// Lane selector.
    pub swizzle: Swizzle,
    /// Absolute value modifier.
    pub abs: bool,
    /// Negation modifier.
    pub neg: bool,
}

assert_eq_size!(Index, [u32; 3]);

impl Default for Index {
    fn default() -> Self {
        Self::null()
    }
}

impl Index {
    const fn of(kind: IndexKind) -> Self {
        Self {
            kind,
            offset: 0,
            swizzle: Swizzle::H01,
            abs: false,
            neg: false,
        }
    }

    /// An unused operand.
    pub const fn null() -> Self {
        Self::of(IndexKind::Null)
    }

    /// The SSA value numbered `value`.
    pub const fn ssa(value: u32) -> Self {
        Self::of(IndexKind::Normal { value, reg: false })
    }

    /// The virtual register numbered `value`.
    pub const fn vreg(value: u32) -> Self {
        Self::of(IndexKind::Normal { value, reg: true })
    }

    /// The physical register `reg`.
    pub const fn register(reg: u32) -> Self {
        Self::of(IndexKind::Register(reg))
    }

    /// A 32-bit immediate.
    pub const fn imm_u32(value: u32) -> Self {
        Self::of(IndexKind::Constant(value))
    }

    /// A 32-bit float immediate, stored as its bit pattern.
    pub fn imm_f32(value: f32) -> Self {
        Self::imm_u32(value.to_bits())
    }

    /// The immediate `0`.
    pub const fn zero() -> Self {
        Self::imm_u32(0)
    }

    /// A fast-access uniform slot.
    pub const fn fau(slot: u32) -> Self {
        Self::of(IndexKind::Fau(slot))
    }

    /// A passthrough operand.
    pub const fn passthrough(pass: Passthrough) -> Self {
        Self::of(IndexKind::Pass(pass))
    }

    /// Checks if this is an unused slot.
    #[inline]
    pub fn is_null(self) -> bool {
        matches!(self.kind, IndexKind::Null)
    }

    /// Checks if this is an SSA value.
    #[inline]
    pub fn is_ssa(self) -> bool {
        matches!(self.kind, IndexKind::Normal { reg: false, .. })
    }

    /// Checks if this is an SSA value or a virtual register.
    #[inline]
    pub fn is_normal(self) -> bool {
        matches!(self.kind, IndexKind::Normal { .. })
    }

    /// Checks if this is an inline immediate.
    #[inline]
    pub fn is_constant(self) -> bool {
        matches!(self.kind, IndexKind::Constant(_))
    }

    /// Checks if this reads the uniform bank.
    #[inline]
    pub fn is_fau(self) -> bool {
        matches!(self.kind, IndexKind::Fau(_))
    }

    /// Gets the physical register, if this is one.
    #[inline]
    pub fn as_register(self) -> Option<u32> {
        match self.kind {
            IndexKind::Register(reg) => Some(reg),
            _ => None,
        }
    }

    /// Gets the constant after applying the swizzle, if this is a constant.
    pub fn as_constant(self) -> Option<u32> {
        match self.kind {
            IndexKind::Constant(value) => Some(self.swizzle.apply(value)),
            _ => None,
        }
    }

    /// Checks if two operands refer to the same underlying value, ignoring
    /// modifiers and the word offset.
    #[inline]
    pub fn is_equiv(self, other: Index) -> bool {
        self.kind == other.kind
    }

    /// Returns `self` with all modifiers stripped, but with the same word offset.
    pub fn without_modifiers(self) -> Self {
        Self {
            swizzle: Swizzle::H01,
            abs: false,
            neg: false,
            ..self
        }
    }

    /// Gets the `offset`th 32-bit word of a vector operand.
    pub fn word(self, offset: u8) -> Self {
        Self { offset, ..self }
    }

    /// Substitutes `new` for `old`, keeping the modifiers that were applied to `old`.
    ///
    /// ```
    /// # use bir::ir::{Index, Swizzle};
    /// let old = Index::ssa(3).neg().swz(Swizzle::H11);
    /// let new = Index::ssa(1);
    /// let replaced = Index::replace(old, new);
    ///
    /// assert!(replaced.is_equiv(new));
    /// assert!(replaced.neg);
    /// assert_eq!(replaced.swizzle, Swizzle::H11);
    /// ```
    pub fn replace(old: Index, new: Index) -> Self {
        Self {
            abs: old.abs,
            neg: old.neg,
            swizzle: old.swizzle,
            ..new
        }
    }

    /// Toggles negation.
    pub fn neg(self) -> Self {
        Self {
            neg: !self.neg,
            ..self
        }
    }

    /// Applies the absolute value modifier, clearing any negation.
    pub fn abs(self) -> Self {
        Self {
            abs: true,
            neg: false,
            ..self
        }
    }

    /// Applies a swizzle.
    pub fn swz(self, swizzle: Swizzle) -> Self {
        Self { swizzle, ..self }
    }

    /// The liveness/allocation node of this operand, `value << 1 | reg`.
    ///
    /// Only `Normal` operands are tracked, everything else is `None`.
    #[inline]
    pub fn node(self) -> Option<usize> {
        match self.kind {
            IndexKind::Normal { value, reg } => Some(((value as usize) << 1) | reg as usize),
            _ => None,
        }
    }

    /// A per-word numbering of SSA values, `value << 2 | offset`.
    #[inline]
    pub fn word_node(self) -> Option<usize> {
        match self.kind {
            IndexKind::Normal { value, reg: false } => {
                Some(((value as usize) << 2) | (self.offset as usize & 3))
            }
            _ => None,
        }
    }

    /// The inverse of [`Self::node`].
    pub fn from_node(node: usize) -> Self {
        let value = u32::try_from(node >> 1).expect("node is not representable as a value");

        if node & 1 != 0 {
            Self::vreg(value)
        } else {
            Self::ssa(value)
        }
    }

    /// The lane mask this operand touches when it spans `count` words.
    #[inline]
    pub fn lane_mask(self, count: u32) -> u8 {
        mask_u8(count) << self.offset
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.neg {
            write!(f, "-")?;
        }

        match self.kind {
            IndexKind::Null => return write!(f, "_"),
            IndexKind::Normal { value, reg: false } => write!(f, "{value}")?,
            IndexKind::Normal { value, reg: true } => write!(f, "r{value}")?,
            IndexKind::Register(reg) => write!(f, "R{reg}")?,
            IndexKind::Constant(value) => write!(f, "#0x{value:x}")?,
            IndexKind::Fau(slot) => write!(f, "u{slot}")?,
            IndexKind::Pass(Passthrough::Fma) => write!(f, "t0")?,
            IndexKind::Pass(Passthrough::Add) => write!(f, "t1")?,
            IndexKind::Pass(Passthrough::Stage) => write!(f, "t")?,
        }

        if self.offset != 0 {
            write!(f, "[{}]", self.offset)?;
        }

        write!(f, "{}", self.swizzle.suffix())?;

        if self.abs {
            write!(f, ".abs")?;
        }

        Ok(())
    }
}
