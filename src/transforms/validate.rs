//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::analysis::compute_liveness;
use crate::ir::Shader;
use crate::pass::ShaderPass;
use std::process;

/// Checks the program for reads of uninitialized values, aborting the
/// process with a dump of the program if any are found.
pub struct ValidatePass {
    after: String,
}

impl ValidatePass {
    /// Creates a validation pass, `after` names what ran before it and is
    /// used in the diagnostic.
    pub fn new(after: impl Into<String>) -> Self {
        Self {
            after: after.into(),
        }
    }
}

impl ShaderPass for ValidatePass {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn run(&mut self, shader: &mut Shader) {
        validate(shader, &self.after);
    }
}

/// Returns every node that is live on entry to the shader, i.e. read
/// somewhere without being written first on some path.
pub fn validate_initialization(shader: &mut Shader) -> Result<(), Vec<usize>> {
    shader.invalidate_liveness();
    compute_liveness(shader);

    let entry = match shader.entry_block() {
        Some(entry) => entry,
        None => return Ok(()),
    };

    let live: Vec<usize> = shader
        .block(entry)
        .live_in
        .live_nodes()
        .map(|(node, _)| node)
        .collect();

    if live.is_empty() {
        Ok(())
    } else {
        Err(live)
    }
}

/// Validates the program in debug builds.
///
/// On failure every offending value is printed, followed by the program,
/// and the process exits with status 1. Does nothing in release builds or
/// when the `novalidate` flag is set.
pub fn validate(shader: &mut Shader, after: &str) {
    if !cfg!(debug_assertions) || shader.inputs.debug.novalidate {
        return;
    }

    if let Err(nodes) = validate_initialization(shader) {
        for node in nodes {
            let prefix = if node & 1 != 0 { "r" } else { "" };

            eprintln!("{prefix}{}", node >> 1);
        }

        eprintln!("Uninitialized data read after {after}");
        eprintln!("{shader}");

        process::exit(1);
    }
}
