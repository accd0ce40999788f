//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use super::{choose_spill_node, compute_interference, spill_register, Lcra};
use crate::ir::{Index, Opcode, Shader};
use crate::pass::ShaderPass;
use crate::utility::mask_u64;
use log::debug;

/// How many spill-and-retry rounds are attempted before giving up.
pub const MAX_ITERATIONS: usize = 1000;

/// Assigns a physical register to every value in the shader.
pub struct RegisterAllocationPass;

impl ShaderPass for RegisterAllocationPass {
    fn name(&self) -> &'static str {
        "regalloc"
    }

    fn run(&mut self, shader: &mut Shader) {
        register_allocate(shader);
    }
}

/// The registers any value may be placed in before interference is known.
fn default_affinity(shader: &Shader, full_regs: bool) -> u64 {
    let is_blend = shader.inputs.is_blend;
    let mut affinity = if is_blend {
        mask_u64(16)
    } else if full_regs {
        u64::MAX
    } else {
        mask_u64(16) | (mask_u64(16) << 48)
    };

    // mimic a smaller file to exercise spilling
    if shader.inputs.debug.spill && !is_blend {
        affinity &= mask_u64(48) << 8;
    }

    affinity
}

/// Sets up and builds the allocation problem for the current program.
pub(crate) fn build_problem(shader: &mut Shader, full_regs: bool) -> Lcra {
    let node_count = shader.max_temp();
    let affinity = default_affinity(shader, full_regs);
    let mut lcra = Lcra::new(node_count);

    for instr in shader.instrs() {
        for node in instr.dest.iter().filter_map(|dest| dest.node()) {
            if node < node_count {
                lcra.set_affinity(node, affinity);
            }
        }

        // a blend shader expects its input colour in r0-r3
        if instr.op == Opcode::Blend && !shader.inputs.is_blend {
            match instr.src[0].node() {
                Some(node) if node < node_count => lcra.fix(node, 0),
                _ => panic!("blend colour {} is not an allocatable value", instr.src[0]),
            }
        }
    }

    compute_interference(shader, &mut lcra, full_regs);

    lcra
}

fn reg_from_index(lcra: &Lcra, index: Index) -> Index {
    let node = match index.node() {
        Some(node) if node < lcra.node_count() => node,
        _ => return index,
    };

    match lcra.solution(node) {
        Some(reg) => Index {
            offset: 0,
            ..Index::replace(index, Index::register(reg + index.offset as u32))
        },
        None => index,
    }
}

/// Rewrites every allocated operand into its physical register.
fn install_registers(shader: &mut Shader, lcra: &Lcra) {
    for instr in shader.instrs_mut() {
        for dest in instr.dest.iter_mut() {
            *dest = reg_from_index(lcra, *dest);
        }

        for src in instr.src.iter_mut() {
            *src = reg_from_index(lcra, *src);
        }
    }
}

/// Allocates registers for the whole shader, spilling to thread-local
/// storage until the problem is solvable.
///
/// On v7 the split register file is tried first since it allows twice the
/// threads, falling back to the full file with spilling. `work_reg_count`
/// and `tls_size` are updated to match what succeeded.
///
/// # Panics
///
/// Panics if allocation does not succeed within [`MAX_ITERATIONS`] rounds,
/// or if no spill candidate exists for a failed round.
pub fn register_allocate(shader: &mut Shader) {
    allocate_with_ceiling(shader, MAX_ITERATIONS);
}

pub(crate) fn allocate_with_ceiling(shader: &mut Shader, ceiling: usize) {
    let mut spill_count = shader.tls_size;
    let mut solved = None;

    if shader.inputs.arch == 7 {
        shader.invalidate_liveness();

        let mut lcra = build_problem(shader, false);

        match lcra.solve() {
            Ok(()) => {
                debug!("allocated with the split register file");

                shader.work_reg_count = 32;
                solved = Some(lcra);
            }
            Err(node) => debug!("split register file failed at node {node}"),
        }
    }

    let mut remaining = ceiling;

    let lcra = loop {
        if let Some(lcra) = solved.take() {
            break lcra;
        }

        if remaining == 0 {
            panic!("register allocation did not converge after {ceiling} iterations");
        }

        remaining -= 1;
        shader.invalidate_liveness();

        let mut lcra = build_problem(shader, true);

        match lcra.solve() {
            Ok(()) => {
                shader.work_reg_count = 64;
                solved = Some(lcra);
            }
            Err(failed) => {
                let node = choose_spill_node(shader, &lcra)
                    .unwrap_or_else(|| panic!("no spill candidate for node {failed}"));

                debug!("node {failed} failed, spilling node {node}");

                spill_count += spill_register(shader, Index::from_node(node), spill_count);
            }
        }
    };

    shader.tls_size = spill_count;

    install_registers(shader, &lcra);
    shader.invalidate_liveness();
}
