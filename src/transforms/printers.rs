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
use std::io::{self, Write};

/// This is a pass that writes out a textual representation of a shader
/// to a given stream.
pub struct ShaderWriterPass {
    out: Box<dyn io::Write>,
}

impl ShaderWriterPass {
    /// Shorthand for a writer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a writer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    ///
    /// This writer will be where the shader is printed out every time
    /// the pass is run.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl ShaderPass for ShaderWriterPass {
    fn name(&self) -> &'static str {
        "print"
    }

    fn run(&mut self, shader: &mut Shader) {
        write!(self.out, "{shader}").expect("unable to write shader to writer");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;
    use crate::ir::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);

            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_the_printed_shader() {
        let mut shader = Shader::new(CompileInputs::default());
        let block = shader.create_block();

        Builder::at(&mut shader, Cursor::End(block)).mov_i32(Index::imm_u32(5));

        let out = Shared::default();
        let mut pass = ShaderWriterPass::with_writer(out.clone());

        pass.run(&mut shader);

        let text = String::from_utf8(out.0.borrow().clone()).unwrap();

        assert_eq!(text, shader.to_string());
        assert!(text.contains("MOV.i32"));
    }
}
