//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! APIs for the machine-facing half of the compiler.
//!
//! Everything here runs after the program has been optimized: register
//! allocation, bundling into clauses and scoreboarding. The compile
//! options that steer the whole pipeline also live here.

mod options;
pub mod regalloc;
mod schedule;
mod scoreboard;

pub use options::*;
pub use regalloc::{register_allocate, RegisterAllocationPass};
pub use schedule::*;
pub use scoreboard::*;
