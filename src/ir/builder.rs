//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::{Block, Index, Instr, Modifiers, MuxMode, Opcode, Shader};
use paste::paste;

/// A position inside of a block where new instructions get inserted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cursor {
    /// Before the first instruction of the block.
    Start(Block),
    /// After the last instruction of the block.
    End(Block),
    /// Before the instruction at the given position.
    Before(Block, usize),
    /// After the instruction at the given position.
    After(Block, usize),
}

impl Cursor {
    /// The block the cursor points into.
    pub fn block(self) -> Block {
        match self {
            Cursor::Start(block)
            | Cursor::End(block)
            | Cursor::Before(block, _)
            | Cursor::After(block, _) => block,
        }
    }
}

/// Emits instructions at a [`Cursor`].
///
/// After every insertion the cursor moves to right after the new instruction,
/// so consecutive calls emit code in order.
///
/// ```
/// # use bir::codegen::CompileInputs;
/// # use bir::ir::*;
/// let mut shader = Shader::new(CompileInputs::default());
/// let block = shader.create_block();
/// let mut b = Builder::at(&mut shader, Cursor::End(block));
///
/// let x = b.mov_i32(Index::imm_u32(5));
/// let y = b.iadd_u32(x, Index::imm_u32(1));
/// b.store(32, y, Index::zero(), Index::zero());
///
/// assert_eq!(shader.block(block).instrs.len(), 3);
/// ```
pub struct Builder<'s> {
    shader: &'s mut Shader,
    cursor: Cursor,
}

macro_rules! alu_helper {
    ($name:ident, $op:ident, $str:literal, $($src:ident),*) => {
        paste! {
            #[doc = concat!("Emits `", $str, "` into a fresh SSA value and returns it.")]
            pub fn [< $name >](&mut self, $($src: Index),*) -> Index {
                let dest = self.temp();

                self.[< $name _to >](dest, $($src),*);
                dest
            }

            #[doc = concat!("Emits `", $str, "` writing to `dest`.")]
            pub fn [< $name _to >](&mut self, dest: Index, $($src: Index),*) -> &mut Instr {
                let mut instr = Instr::new(Opcode::$op);
                let srcs = [$($src),*];

                instr.dest[0] = dest;
                instr.src[..srcs.len()].copy_from_slice(&srcs);
                self.insert(instr)
            }
        }
    };
}

impl<'s> Builder<'s> {
    /// Creates a builder inserting at `cursor`.
    pub fn at(shader: &'s mut Shader, cursor: Cursor) -> Self {
        Self { shader, cursor }
    }

    /// The current insertion point.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Moves the insertion point.
    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// The shader being built.
    pub fn shader(&mut self) -> &mut Shader {
        self.shader
    }

    /// A fresh SSA value.
    pub fn temp(&mut self) -> Index {
        self.shader.new_ssa()
    }

    /// A fresh virtual register.
    pub fn vreg(&mut self) -> Index {
        self.shader.new_vreg()
    }

    /// Inserts an instruction at the cursor, moves the cursor after it and
    /// returns it for further tweaking.
    pub fn insert(&mut self, instr: Instr) -> &mut Instr {
        let block = self.cursor.block();
        let instrs = &mut self.shader.block_mut(block).instrs;

        let position = match self.cursor {
            Cursor::Start(_) => 0,
            Cursor::End(_) => instrs.len(),
            Cursor::Before(_, i) => i,
            Cursor::After(_, i) => i + 1,
        };

        instrs.insert(position, instr);
        self.cursor = Cursor::After(block, position);
        self.shader.invalidate_liveness();

        &mut self.shader.block_mut(block).instrs[position]
    }

    alu_helper!(mov_i32, MovI32, "MOV.i32", a);
    alu_helper!(fadd_f32, FaddF32, "FADD.f32", a, b);
    alu_helper!(fma_f32, FmaF32, "FMA.f32", a, b, c);
    alu_helper!(fmul_f32, FmulF32, "FMUL.f32", a, b);
    alu_helper!(iadd_u32, IaddU32, "IADD.u32", a, b);
    alu_helper!(isub_u32, IsubU32, "ISUB.u32", a, b);
    alu_helper!(imul_i32, ImulI32, "IMUL.i32", a, b);
    alu_helper!(lshift_or_i32, LshiftOrI32, "LSHIFT_OR.i32", a, b, shift);
    alu_helper!(rshift_and_i32, RshiftAndI32, "RSHIFT_AND.i32", a, b, shift);
    alu_helper!(lshift_and_i32, LshiftAndI32, "LSHIFT_AND.i32", a, b, shift);
    alu_helper!(csel_i32, CselI32, "CSEL.i32", a, b, t, f);
    alu_helper!(icmp_i32, IcmpI32, "ICMP.i32", a, b);
    alu_helper!(fcmp_f32, FcmpF32, "FCMP.f32", a, b);
    alu_helper!(mkvec_v2i16, MkvecV2i16, "MKVEC.v2i16", a, b);
    alu_helper!(mkvec_v4i8, MkvecV4i8, "MKVEC.v4i8", a, b, c, d);
    alu_helper!(mkvec_v2i8, MkvecV2i8, "MKVEC.v2i8", a, b, c);
    alu_helper!(swz_v2i16, SwzV2i16, "SWZ.v2i16", a);
    alu_helper!(f32_to_u32, F32ToU32, "F32_TO_U32", a);
    alu_helper!(f32_to_s32, F32ToS32, "F32_TO_S32", a);
    alu_helper!(u32_to_f32, U32ToF32, "U32_TO_F32", a);
    alu_helper!(s32_to_f32, S32ToF32, "S32_TO_F32", a);
    alu_helper!(dtsel_imm, DtselImm, "DTSEL_IMM", a);
    alu_helper!(ld_var, LdVar, "LD_VAR", index);
    alu_helper!(ld_attr, LdAttr, "LD_ATTR", vertex, instance);
    alu_helper!(texs_2d_f32, Texs2dF32, "TEXS_2D.f32", s, t);
    alu_helper!(ld_tile, LdTile, "LD_TILE", pixel, coverage, conversion);
    alu_helper!(atom_return_i32, AtomReturnI32, "ATOM_RETURN.i32", value, lo, hi);
    alu_helper!(axchg_i32, AxchgI32, "AXCHG.i32", value, lo, hi);
    alu_helper!(atest, Atest, "ATEST", coverage, alpha, datum);
    alu_helper!(zs_emit, ZsEmit, "ZS_EMIT", depth, stencil, coverage);

    /// Emits `MUX.i32` with the given mode into a fresh SSA value.
    pub fn mux_i32(&mut self, a: Index, b: Index, select: Index, mode: MuxMode) -> Index {
        let dest = self.temp();
        let mut instr = Instr::new(Opcode::MuxI32);

        instr.dest[0] = dest;
        instr.src[..3].copy_from_slice(&[a, b, select]);
        instr.modifiers = Modifiers::Mux(mode);
        self.insert(instr);

        dest
    }

    /// Emits a `bits`-bit load from `(lo, hi)` into `dest`.
    pub fn load_to(&mut self, bits: u32, dest: Index, lo: Index, hi: Index) -> &mut Instr {
        let mut instr = Instr::new(Opcode::load(bits));

        instr.dest[0] = dest;
        instr.src[0] = lo;
        instr.src[1] = hi;
        self.insert(instr)
    }

    /// Emits a `bits`-bit store of `value` to `(lo, hi)`.
    pub fn store(&mut self, bits: u32, value: Index, lo: Index, hi: Index) -> &mut Instr {
        let mut instr = Instr::new(Opcode::store(bits));

        instr.src[0] = value;
        instr.src[1] = lo;
        instr.src[2] = hi;
        self.insert(instr)
    }

    /// Emits `ST_TILE` of `vecsize + 1` words starting at `value`.
    pub fn st_tile(
        &mut self,
        value: Index,
        pixel: Index,
        coverage: Index,
        conversion: Index,
        vecsize: u8,
    ) -> &mut Instr {
        let mut instr = Instr::new(Opcode::StTile);

        instr.src = [value, pixel, coverage, conversion];
        instr.vecsize = vecsize;
        self.insert(instr)
    }

    /// Emits a `BLEND` of `color` for render target `target`.
    pub fn blend(
        &mut self,
        dest: Index,
        color: Index,
        coverage: Index,
        lo: Index,
        hi: Index,
        target: u8,
    ) -> &mut Instr {
        let mut instr = Instr::new(Opcode::Blend);

        instr.dest[0] = dest;
        instr.src = [color, coverage, lo, hi];
        instr.modifiers = Modifiers::Blend { target };
        self.insert(instr)
    }

    /// Emits a `BARRIER`.
    pub fn barrier(&mut self) -> &mut Instr {
        self.insert(Instr::new(Opcode::Barrier))
    }

    /// Emits a `DISCARD.f32` killing the fragment when `a == b`.
    pub fn discard_f32(&mut self, a: Index, b: Index) -> &mut Instr {
        let mut instr = Instr::new(Opcode::DiscardF32);

        instr.src[0] = a;
        instr.src[1] = b;
        self.insert(instr)
    }

    /// Emits an unconditional `JUMP` to `target`.
    pub fn jump(&mut self, target: Block) -> &mut Instr {
        let mut instr = Instr::new(Opcode::Jump);

        instr.branch_target = Some(target);
        self.insert(instr)
    }

    /// Emits `BRANCHZ.i32`, branching to `target` when `cond` is zero.
    pub fn branchz_i32(&mut self, cond: Index, target: Block) -> &mut Instr {
        let mut instr = Instr::new(Opcode::BranchzI32);

        instr.src[0] = cond;
        instr.branch_target = Some(target);
        self.insert(instr)
    }

    /// Emits a `NOP`.
    pub fn nop(&mut self) -> &mut Instr {
        self.insert(Instr::new(Opcode::Nop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;

    #[test]
    fn cursor_advances_after_insert() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let x = b.mov_i32(Index::imm_u32(1));
        let y = b.mov_i32(Index::imm_u32(2));

        // insert between the two moves
        b.set_cursor(Cursor::Before(block, 1));
        let z = b.iadd_u32(x, x);
        let w = b.iadd_u32(z, z);

        let dests: Vec<_> = shader.block(block).instrs.iter().map(|i| i.dest[0]).collect();

        assert_eq!(dests, vec![x, z, w, y]);
    }

    #[test]
    fn helpers_fill_sources_in_order() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();
        let mut b = Builder::at(&mut shader, Cursor::Start(block));

        let v = b.mkvec_v4i8(
            Index::imm_u32(1),
            Index::imm_u32(2),
            Index::imm_u32(3),
            Index::imm_u32(4),
        );

        let instr = &shader.block(block).instrs[0];

        assert_eq!(instr.op, Opcode::MkvecV4i8);
        assert_eq!(instr.dest[0], v);
        assert_eq!(instr.src[3], Index::imm_u32(4));
        assert_eq!(shader.ssa_alloc, 1);
    }
}
