//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::ir::Shader;
use crate::pass::ShaderPass;
use log::debug;

/// Manages running a set of passes over a shader, in order.
///
/// An important note is that this is actually a pass itself, it's a pass
/// that simply runs other passes. When the `shaders` debug flag is set the
/// program is dumped to stderr after every pass.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn ShaderPass>>,
}

impl PassManager {
    /// Creates a new, empty, pass manager.
    pub fn new() -> Self {
        Self {
            passes: Vec::default(),
        }
    }

    /// Adds a pass to the pass manager. This pass's order is defined
    /// relative to other calls to [`Self::add_pass`].
    pub fn add_pass<T: ShaderPass + 'static>(&mut self, pass: T) {
        self.passes.push(Box::new(pass));
    }

    /// The number of passes that will run.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Checks if no passes have been added.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl ShaderPass for PassManager {
    fn name(&self) -> &'static str {
        "pass-manager"
    }

    fn run(&mut self, shader: &mut Shader) {
        for pass in self.passes.iter_mut() {
            debug!("running pass '{}'", pass.name());

            pass.run(shader);

            if shader.inputs.debug.shaders {
                eprintln!("after {}:\n{shader}", pass.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Record(&'static str, Rc<RefCell<Vec<&'static str>>>);

    impl ShaderPass for Record {
        fn name(&self) -> &'static str {
            self.0
        }

        fn run(&mut self, _: &mut Shader) {
            self.1.borrow_mut().push(self.0);
        }
    }

    #[test]
    fn passes_run_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut pm = PassManager::new();

        pm.add_pass(Record("first", log.clone()));
        pm.add_pass(Record("second", log.clone()));
        pm.add_pass(Record("first", log.clone()));

        pm.run(&mut Shader::new(CompileInputs::default()));

        assert_eq!(pm.len(), 3);
        assert_eq!(*log.borrow(), vec!["first", "second", "first"]);
    }
}
