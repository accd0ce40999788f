//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


#![deny(
    unreachable_pub,
    missing_docs,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links
)]

//! # Bir
//!
//! The backend of a compiler for Bifrost-family GPUs. A front end lowers
//! a shader into the IR in [`ir`], and [`compile`] takes it the rest of the
//! way: local optimizations, register allocation with spilling, bundling
//! into clauses and scoreboarding.
//!
//! Debugging behavior is controlled with [`codegen::DebugFlags`], usually
//! read from the `BIR_DEBUG` environment variable.

pub mod analysis;
pub mod arena;
pub mod codegen;
pub mod ir;
pub mod pass;
pub mod transforms;
pub mod utility;

use crate::codegen::{RegisterAllocationPass, SchedulePass, ScoreboardPass};
use crate::ir::{Shader, Stats};
use crate::pass::{PassManager, ShaderPass};
use crate::transforms::{
    CommonSubexpressionEliminationPass, ConstantFoldingPass, CopyPropagationPass,
    DeadCodeEliminationPass, LowerBranchPass, PostRaDeadCodeEliminationPass,
    SelfMoveEliminationPass, ShaderWriterPass, ValidatePass,
};

/// The result of running the backend over a shader.
#[derive(Debug)]
pub struct CompiledShader {
    /// The final program, allocated and (on v6-v8) scheduled.
    pub shader: Shader,
    /// Statistics about the final program.
    pub stats: Stats,
    /// Whether the first clause must wait on scoreboard slot 6.
    pub wait_6: bool,
    /// Whether the first clause must wait on scoreboard slot 7.
    pub wait_7: bool,
}

/// Builds the standard pipeline for a shader with the given options.
fn pipeline(shader: &Shader) -> PassManager {
    let mut pm = PassManager::new();

    pm.add_pass(ValidatePass::new("front end"));

    if shader.inputs.optimize() {
        pm.add_pass(CopyPropagationPass);
        pm.add_pass(ConstantFoldingPass);
        pm.add_pass(CopyPropagationPass);
        pm.add_pass(DeadCodeEliminationPass);
        pm.add_pass(CommonSubexpressionEliminationPass);
        pm.add_pass(DeadCodeEliminationPass);
        pm.add_pass(ValidatePass::new("optimization passes"));
    }

    pm.add_pass(LowerBranchPass);
    pm.add_pass(ValidatePass::new("late lowering"));
    pm.add_pass(RegisterAllocationPass);

    if shader.inputs.optimize() {
        pm.add_pass(SelfMoveEliminationPass);
        pm.add_pass(PostRaDeadCodeEliminationPass);
    }

    if shader.inputs.arch <= 8 {
        pm.add_pass(SchedulePass);
        pm.add_pass(ScoreboardPass);
    }

    pm
}

/// Compiles a shader produced by a front end.
///
/// Every value must be defined before it is read on every path. In debug
/// builds this is checked after the front end and after optimization, and
/// a violation dumps the program and exits the process.
///
/// # Panics
///
/// Panics if register allocation cannot converge, which only happens for
/// malformed programs.
pub fn compile(mut shader: Shader) -> CompiledShader {
    let mut pm = pipeline(&shader);

    pm.run(&mut shader);

    let stats = Stats::collect(&shader);

    if shader.inputs.debug.shaderdb {
        eprintln!("{stats}");
    }

    let dependencies = shader
        .blocks()
        .find_map(|block| shader.block(block).clauses.first())
        .map_or(0, |clause| clause.dependencies);

    CompiledShader {
        wait_6: dependencies & (1 << 6) != 0,
        wait_7: dependencies & (1 << 7) != 0,
        shader,
        stats,
    }
}

/// Runs a list of passes named by the user over a shader, in order.
///
/// This is meant for tools and tests that want to poke at single passes,
/// not for building real pipelines. If `validate` is set, the program is
/// validated after every pass.
///
/// # Panics
///
/// Panics if a pass name is not recognized.
pub fn run_passes(shader: &mut Shader, validate: bool, passes: &[&str]) {
    let mut pm = PassManager::new();

    for &pass in passes {
        match pass {
            "copy-prop" => pm.add_pass(CopyPropagationPass),
            "constant-fold" => pm.add_pass(ConstantFoldingPass),
            "cse" => pm.add_pass(CommonSubexpressionEliminationPass),
            "dce" => pm.add_pass(DeadCodeEliminationPass),
            "lower-branch" => pm.add_pass(LowerBranchPass),
            "regalloc" => pm.add_pass(RegisterAllocationPass),
            "self-move" => pm.add_pass(SelfMoveEliminationPass),
            "dce-post-ra" => pm.add_pass(PostRaDeadCodeEliminationPass),
            "schedule" => pm.add_pass(SchedulePass),
            "scoreboard" => pm.add_pass(ScoreboardPass),
            "print-stdout" => pm.add_pass(ShaderWriterPass::stdout()),
            "print-stderr" => pm.add_pass(ShaderWriterPass::stderr()),
            _ => panic!("unknown pass '{pass}'"),
        }

        if validate {
            pm.add_pass(ValidatePass::new(pass));
        }
    }

    pm.run(shader);
}
