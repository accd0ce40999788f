//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use super::Lcra;
use crate::ir::{Index, Instr, Shader};
use log::debug;
use smallbitvec::SmallBitVec;
use smallvec::SmallVec;

/// Picks the node to spill after `lcra` failed to solve.
///
/// Only nodes that constrain the node that failed are worth spilling, and
/// nodes defined by spill or fill code are never picked again. Among the
/// rest, the one with the most constraint bits wins, ties going to the
/// lowest node.
pub fn choose_spill_node(shader: &Shader, lcra: &Lcra) -> Option<usize> {
    let failed = lcra.spill_node()?;
    let node_count = lcra.node_count();
    let mut no_spill = SmallBitVec::from_elem(node_count, false);

    for instr in shader.instrs().filter(|instr| instr.no_spill) {
        for node in instr.dest.iter().filter_map(|dest| dest.node()) {
            if node < node_count {
                no_spill.set(node, true);
            }
        }
    }

    let mut best: Option<(usize, u32)> = None;

    for node in 0..node_count {
        if no_spill[node] || lcra.constraint(failed, node) == 0 {
            continue;
        }

        let benefit = lcra.count_constraints(node);

        if best.map_or(benefit > 0, |(_, best)| benefit > best) {
            best = Some((node, benefit));
        }
    }

    best.map(|(node, _)| node)
}

/// The most registers any read of `index` by `instr` covers, counting from
/// the base of the node.
fn count_read_index(instr: &Instr, index: Index) -> u32 {
    instr
        .src
        .iter()
        .enumerate()
        .filter(|(_, src)| src.is_equiv(index))
        .map(|(s, src)| instr.count_read_registers(s) + src.offset as u32)
        .max()
        .unwrap_or(0)
}

/// Moves every definition and use of `index` through thread-local storage
/// at byte `offset`.
///
/// Each definition writes a fresh value that is stored right after it, and
/// each instruction reading `index` gets a fresh value loaded right before
/// it. Everything introduced is marked `no_spill`. Returns the number of
/// bytes of storage used.
pub fn spill_register(shader: &mut Shader, index: Index, offset: u32) -> u32 {
    let mut channels = 0;

    for block in shader.blocks() {
        let mut i = 0;

        while i < shader.block(block).instrs.len() {
            let mut instr = shader.block(block).instrs[i];
            let mut stores = SmallVec::<[Instr; 2]>::new();

            for d in 0..instr.dest.len() {
                if !instr.dest[d].is_equiv(index) {
                    continue;
                }

                let extra = instr.dest[d].offset as u32;
                let count = instr.count_write_registers(d);
                let tmp = shader.new_ssa();

                instr.dest[d] = Index::replace(instr.dest[d], tmp);
                instr.no_spill = true;

                let mut store = Instr::store_tl(count * 32, tmp, offset + 4 * extra);

                store.no_spill = true;
                stores.push(store);

                shader.spills += 1;
                channels = channels.max(extra + count);
            }

            let mut fill = None;

            if instr.has_arg(index) {
                let tmp = shader.new_ssa();
                let bits = count_read_index(&instr, index) * 32;

                for src in instr.src.iter_mut().filter(|src| src.is_equiv(index)) {
                    src.kind = tmp.kind;
                }

                let mut load = Instr::load_tl(bits, tmp, offset);

                load.no_spill = true;
                fill = Some(load);

                shader.fills += 1;
            }

            let instrs = &mut shader.block_mut(block).instrs;

            instrs[i] = instr;

            if let Some(load) = fill {
                instrs.insert(i, load);
                i += 1;
            }

            for (k, store) in stores.iter().enumerate() {
                instrs.insert(i + 1 + k, *store);
            }

            i += 1 + stores.len();
        }
    }

    shader.invalidate_liveness();

    debug!("spilled {index} to {offset} ({channels} registers)");

    channels * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;

    #[test]
    fn vectors_spill_their_full_width() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        // 0 = LOAD.i64 #0x0, #0x0
        // 1 = IADD.u32 0[1], 0[1]
        // STORE.i64 0, #0x0, #0x0
        let v = b.temp();
        b.load_to(64, v, Index::zero(), Index::zero());
        let sum = b.iadd_u32(v.word(1), v.word(1));
        b.store(64, v, Index::zero(), Index::zero());
        b.store(32, sum, Index::zero(), Index::zero());

        assert_eq!(spill_register(&mut shader, v, 16), 8);
        assert_eq!((shader.spills, shader.fills), (1, 2));

        let ops: Vec<_> = shader.block(block).instrs.iter().map(|i| i.op).collect();

        assert_eq!(
            ops,
            vec![
                Opcode::LoadI64,
                Opcode::StoreI64,
                Opcode::LoadI64,
                Opcode::IaddU32,
                Opcode::LoadI64,
                Opcode::StoreI64,
                Opcode::StoreI32,
            ]
        );

        let instrs = &shader.block(block).instrs;

        // the spill stores the new definition at the slot
        assert_eq!(instrs[1].src[0], instrs[0].dest[0]);
        assert_eq!(instrs[1].src[1], Index::imm_u32(16));
        // fills cover everything read, including the offset
        assert_eq!(instrs[2].src[0], Index::imm_u32(16));
        assert!(instrs[3].src[0].is_equiv(instrs[2].dest[0]));
        assert_eq!(instrs[3].src[0].offset, 1);

        assert!([0, 1, 2, 4].iter().all(|&i| instrs[i].no_spill));
        assert!(!instrs[3].no_spill);
        assert!(!instrs.iter().any(|instr| instr.has_arg(v)));
        assert!(!instrs.iter().any(|instr| instr.dest[0].is_equiv(v)));
    }

    #[test]
    fn spill_candidates_must_interfere_with_the_failure() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();
        let mut b = Builder::at(&mut shader, Cursor::End(block));

        let x = b.mov_i32(Index::imm_u32(1));
        let y = b.mov_i32(Index::imm_u32(2));
        b.shader().block_mut(block).instrs[1].no_spill = true;

        let (x, y) = (x.node().unwrap(), y.node().unwrap());
        let mut lcra = Lcra::new(shader.max_temp());

        for node in 0..lcra.node_count() {
            lcra.set_affinity(node, 0b1);
        }

        // the failing node is 4, it interferes with both, but y can't be spilled
        lcra.add_node_interference(4, 0b1, x, 0b1);
        lcra.add_node_interference(4, 0b1, y, 0b1);
        lcra.add_node_interference(y, 0b1, 6, 0b1);

        assert_eq!(lcra.solve(), Err(4));
        assert_eq!(choose_spill_node(&shader, &lcra), Some(x));
    }

    #[test]
    fn heaviest_candidate_wins() {
        let shader = Shader::new(CompileInputs::default());
        let mut lcra = Lcra::new(6);

        for node in 0..6 {
            lcra.set_affinity(node, 0b1);
        }

        lcra.add_node_interference(0, 0b1, 2, 0b1);
        lcra.add_node_interference(0, 0b1, 1, 0b1);
        lcra.add_node_interference(1, 0b1, 3, 0b11);
        lcra.add_node_interference(3, 0b1, 5, 0b1);

        assert_eq!(lcra.solve(), Err(1));
        assert_eq!(choose_spill_node(&shader, &lcra), Some(3));
    }
}
