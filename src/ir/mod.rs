//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Provides the interfaces and the types required to properly
//! manipulate the backend IR.
//!
//! This only contains the code for representing and building the IR itself,
//! the transforms done by optimizations and whatnot are defined in other places.

mod block;
mod builder;
mod index;
mod instruction;
mod opcode;
mod printer;
mod shader;
mod stats;

pub use block::*;
pub use builder::*;
pub use index::*;
pub use instruction::*;
pub use opcode::*;
pub use printer::*;
pub use shader::*;
pub use stats::*;
