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

/// Models a pass that possibly performs a transformation over a shader.
pub trait ShaderPass {
    /// A short name for the pass, used in logs and debug dumps.
    fn name(&self) -> &'static str;

    /// Performs the transformation over a given shader.
    fn run(&mut self, shader: &mut Shader);
}
