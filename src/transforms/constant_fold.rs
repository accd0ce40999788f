//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Index, Instr, Modifiers, MuxMode, Opcode, Round, Shader};
use crate::pass::ShaderPass;
use log::trace;

/// Evaluates instructions whose sources are all constants.
pub struct ConstantFoldingPass;

impl ShaderPass for ConstantFoldingPass {
    fn name(&self) -> &'static str {
        "constant-fold"
    }

    fn run(&mut self, shader: &mut Shader) {
        constant_fold(shader);
    }
}

/// Evaluates `instr` if every source is a constant or unused and the opcode
/// is one that can be folded bit-exactly. Returns `None` otherwise.
///
/// ```
/// # use bir::ir::*;
/// # use bir::transforms::fold_constant;
/// let mut instr = Instr::new(Opcode::MkvecV4i8);
///
/// instr.dest[0] = Index::ssa(4);
/// instr.src = [0x11, 0x22, 0x33, 0x44].map(Index::imm_u32);
///
/// assert_eq!(fold_constant(&instr), Some(0x4433_2211));
/// ```
pub fn fold_constant(instr: &Instr) -> Option<u32> {
    if !instr.src.iter().all(|src| src.is_null() || src.is_constant()) {
        return None;
    }

    // none of the opcodes below account for float modifiers on their inputs
    if instr.src.iter().any(|src| src.abs || src.neg) {
        return None;
    }

    let value = |s: usize| instr.src[s].as_constant().unwrap_or(0);
    let (a, b, c, d) = (value(0), value(1), value(2), value(3));

    match (instr.op, instr.modifiers) {
        (Opcode::SwzV2i16, _) => Some(a),
        (Opcode::MkvecV2i16, _) => Some((b << 16) | (a & 0xFFFF)),
        (Opcode::MkvecV4i8, _) => {
            Some((d << 24) | ((c & 0xFF) << 16) | ((b & 0xFF) << 8) | (a & 0xFF))
        }
        (Opcode::MkvecV2i8, _) => Some((c << 16) | ((b & 0xFF) << 8) | (a & 0xFF)),
        (Opcode::LshiftOrI32, Modifiers::Shift { not_result: false }) => {
            Some(a.wrapping_shl(c) | b)
        }
        (Opcode::MuxI32, Modifiers::Mux(mode)) => {
            let pick = |first: bool| if first { a } else { b };

            match mode {
                MuxMode::Neg => Some(pick((c as i32) < 0)),
                MuxMode::IntZero => Some(pick(c == 0)),
                MuxMode::FpZero => Some(pick(f32::from_bits(c) == 0.0)),
                MuxMode::Bit => Some((a & c) | (b & !c)),
            }
        }
        (Opcode::F32ToU32, Modifiers::Convert { round: Round::None }) => {
            // negative and NaN inputs clamp to zero
            Some(f32::from_bits(a).max(0.0) as u32)
        }
        _ => None,
    }
}

/// Replaces every foldable instruction with a move of the folded constant.
///
/// The moves are cleaned up by later copy propagation and dead code elimination.
pub fn constant_fold(shader: &mut Shader) {
    let mut changed = false;

    for instr in shader.instrs_mut() {
        if let Some(value) = fold_constant(instr) {
            trace!("folded '{instr}' to {value:#x}");

            *instr = Instr::mov(instr.dest[0], Index::imm_u32(value));
            changed = true;
        }
    }

    if changed {
        shader.invalidate_liveness();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Swizzle;

    fn instr(op: Opcode, srcs: &[Index]) -> Instr {
        let mut instr = Instr::new(op);

        instr.dest[0] = Index::ssa(0);
        instr.src[..srcs.len()].copy_from_slice(srcs);
        instr
    }

    fn imm(value: u32) -> Index {
        Index::imm_u32(value)
    }

    #[test]
    fn byte_packing_is_exact() {
        let v4 = instr(
            Opcode::MkvecV4i8,
            &[imm(0x11), imm(0x22), imm(0x33), imm(0x44)],
        );
        let v2 = instr(Opcode::MkvecV2i8, &[imm(0xAB), imm(0x1CD), imm(0xBEEF)]);
        let h2 = instr(Opcode::MkvecV2i16, &[imm(0x1_2345), imm(0x6789)]);

        assert_eq!(fold_constant(&v4), Some(0x4433_2211));
        assert_eq!(fold_constant(&v2), Some(0xBEEF_CDAB));
        assert_eq!(fold_constant(&h2), Some(0x6789_2345));
    }

    #[test]
    fn swizzles_apply_before_folding() {
        let swz = instr(Opcode::SwzV2i16, &[imm(0x1234_5678).swz(Swizzle::H10)]);
        let packed = instr(
            Opcode::MkvecV2i16,
            &[imm(0x1111_2222).swz(Swizzle::H11), imm(0x3333)],
        );

        assert_eq!(fold_constant(&swz), Some(0x5678_1234));
        assert_eq!(fold_constant(&packed), Some(0x3333_1111));
    }

    #[test]
    fn shifts() {
        let ok = instr(Opcode::LshiftOrI32, &[imm(5), imm(7), imm(2)]);
        let mut not = ok;
        not.modifiers = Modifiers::Shift { not_result: true };
        let neg = instr(Opcode::LshiftOrI32, &[imm(5).neg(), imm(7), imm(2)]);
        let wide = instr(Opcode::LshiftOrI32, &[imm(1), imm(0), imm(33)]);

        assert_eq!(fold_constant(&ok), Some(23));
        assert_eq!(fold_constant(&not), None);
        assert_eq!(fold_constant(&neg), None);
        assert_eq!(fold_constant(&wide), Some(2));
    }

    #[test]
    fn mux_modes() {
        let mux = |mode, sel| {
            let mut i = instr(Opcode::MuxI32, &[imm(0xAAAA_AAAA), imm(0x5555_5555), imm(sel)]);
            i.modifiers = Modifiers::Mux(mode);
            fold_constant(&i)
        };

        assert_eq!(mux(MuxMode::Bit, 0xFFFF_0000), Some(0xAAAA_5555));
        assert_eq!(mux(MuxMode::IntZero, 0), Some(0xAAAA_AAAA));
        assert_eq!(mux(MuxMode::IntZero, 1), Some(0x5555_5555));
        assert_eq!(mux(MuxMode::Neg, 0x8000_0000), Some(0xAAAA_AAAA));
        assert_eq!(mux(MuxMode::Neg, 1), Some(0x5555_5555));
        assert_eq!(mux(MuxMode::FpZero, (-0.0f32).to_bits()), Some(0xAAAA_AAAA));
        assert_eq!(mux(MuxMode::FpZero, 1.0f32.to_bits()), Some(0x5555_5555));
    }

    #[test]
    fn float_to_unsigned_clamps() {
        let conv = |f: f32| fold_constant(&instr(Opcode::F32ToU32, &[Index::imm_f32(f)]));

        assert_eq!(conv(-5.0), Some(0));
        assert_eq!(conv(f32::NAN), Some(0));
        assert_eq!(conv(42.9), Some(42));
        assert_eq!(conv(1e20), Some(u32::MAX));

        let mut rounded = instr(Opcode::F32ToU32, &[Index::imm_f32(1.0)]);
        rounded.modifiers = Modifiers::Convert { round: Round::Rtz };

        assert_eq!(fold_constant(&rounded), None);
    }

    #[test]
    fn refusals() {
        let add = instr(Opcode::IaddU32, &[imm(1), imm(2)]);
        let partial = instr(Opcode::MkvecV2i16, &[imm(1), Index::ssa(5)]);
        let fau = instr(Opcode::SwzV2i16, &[Index::fau(0)]);

        assert_eq!(fold_constant(&add), None);
        assert_eq!(fold_constant(&partial), None);
        assert_eq!(fold_constant(&fau), None);
    }
}
