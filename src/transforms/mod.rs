//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Defines the passes that rewrite the backend IR.
//!
//! Every pass here works on a whole [`Shader`](crate::ir::Shader) and is
//! available both as a free function and as a [`ShaderPass`](crate::pass::ShaderPass)
//! so that it can be scheduled with a [`PassManager`](crate::pass::PassManager).
//! Some of these are not really transformations (validation only ever reads
//! the IR), but they all run in the same slots of the pipeline.

mod constant_fold;
mod copy_prop;
mod cse;
mod dce;
mod lower_branch;
mod post_ra;
mod printers;
mod validate;

pub use constant_fold::*;
pub use copy_prop::*;
pub use cse::*;
pub use dce::*;
pub use lower_branch::*;
pub use post_ra::*;
pub use printers::*;
pub use validate::*;
