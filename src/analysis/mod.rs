//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Dataflow analyses over the backend IR.
//!
//! Both analyses here are backwards "may" problems solved with the same
//! worklist driver, one over per-node lane masks before register allocation
//! and one over physical register masks after it.

mod liveness;
mod postra;
mod worklist;

pub use liveness::*;
pub use postra::*;
