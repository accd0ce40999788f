//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Defines the pass infrastructure used to drive the backend.
//!
//! Passes at their core are just objects that take in a shader and
//! transform it in place:
//!
//! ```
//! # use bir::ir::Shader;
//! # use bir::pass::ShaderPass;
//! struct Pass;
//!
//! impl ShaderPass for Pass {
//!     fn name(&self) -> &'static str {
//!         "pass"
//!     }
//!
//!     fn run(&mut self, shader: &mut Shader) { /* ... */ }
//! }
//! ```
//!
//! There is no analysis caching here, the only analysis the backend has is
//! liveness and that is memoized on the shader itself.

mod manager;
mod transform;

pub use manager::*;
pub use transform::*;
