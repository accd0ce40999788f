//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Register allocation for the backend IR.
//!
//! The allocator is a linearly constrained register allocator (LCRA).
//! Rather than an interference graph, every pair of values that are live
//! at the same time records which relative placements would make their
//! registers overlap, which handles vectors of different widths with a
//! single byte per pair.
//!
//! # Flow
//!
//! 1. Every value gets a default affinity based on the register file in use.
//! 2. Interference is built from fresh liveness, narrowing affinities and
//!    filling in the constraint matrix ([`compute_interference`]).
//! 3. Values are solved first-fit in index order ([`Lcra::solve`]).
//! 4. On failure, a value is picked ([`choose_spill_node`]) and moved
//!    through thread-local storage ([`spill_register`]), and everything is
//!    rebuilt from scratch.
//!
//! [`register_allocate`] drives the whole thing and installs the result.

mod allocate;
mod interference;
mod lcra;
mod spill;

pub use allocate::*;
pub use interference::*;
pub use lcra::*;
pub use spill::*;
