//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


//! Liveness of SSA values and virtual registers, tracked per 32-bit lane.
//!
//! Every [`Index::node`](crate::ir::Index::node) gets a `u8` mask where bit `i`
//! means "word `i` of this node is live". Vector values (staging registers,
//! multi-word loads) are therefore tracked word by word.

use crate::analysis::worklist::solve_backward;
use crate::ir::{Block, Instr, Shader};
use log::debug;

/// Lane masks for every node of a shader.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct LiveSet {
    lanes: Vec<u8>,
}

impl LiveSet {
    /// An empty set able to hold `len` nodes.
    pub fn new(len: usize) -> Self {
        Self {
            lanes: vec![0; len],
        }
    }

    /// The number of nodes the set can hold.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Checks if the set holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// The live lanes of `node`. Nodes past the end are never live.
    #[inline]
    pub fn lanes(&self, node: usize) -> u8 {
        self.lanes.get(node).copied().unwrap_or(0)
    }

    /// Marks `mask` lanes of `node` dead.
    #[inline]
    pub fn kill(&mut self, node: usize, mask: u8) {
        if let Some(lanes) = self.lanes.get_mut(node) {
            *lanes &= !mask;
        }
    }

    /// Marks `mask` lanes of `node` live.
    #[inline]
    pub fn gen(&mut self, node: usize, mask: u8) {
        if let Some(lanes) = self.lanes.get_mut(node) {
            *lanes |= mask;
        }
    }

    /// Adds every live lane of `other` to `self`.
    pub fn union_with(&mut self, other: &LiveSet) {
        if self.lanes.len() < other.lanes.len() {
            self.lanes.resize(other.lanes.len(), 0);
        }

        for (lanes, other) in self.lanes.iter_mut().zip(other.lanes.iter()) {
            *lanes |= *other;
        }
    }

    /// Checks if no lane of any node is live.
    pub fn is_zero(&self) -> bool {
        self.lanes.iter().all(|&lanes| lanes == 0)
    }

    /// Every `(node, lanes)` pair with at least one live lane, in node order.
    pub fn live_nodes(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        self.lanes
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, lanes)| lanes != 0)
    }
}

/// Applies a single instruction to `live`, walking backwards.
///
/// Destinations are killed before sources are added, so an instruction that
/// reads its own destination keeps that value live above it.
pub fn ins_update(live: &mut LiveSet, instr: &Instr) {
    for (d, dest) in instr.dest.iter().enumerate() {
        if let Some(node) = dest.node() {
            live.kill(node, instr.writemask(d));
        }
    }

    for (s, src) in instr.src.iter().enumerate() {
        if let Some(node) = src.node() {
            live.gen(node, src.lane_mask(instr.count_read_registers(s)));
        }
    }
}

/// Recomputes `live_out` and `live_in` of a single block from the `live_in`
/// of its successors. Returns whether `live_in` changed.
pub fn block_update(shader: &mut Shader, block: Block) -> bool {
    let max = shader.max_temp();
    let mut live_out = LiveSet::new(max);

    for succ in shader.block(block).successors() {
        live_out.union_with(&shader.block(succ).live_in);
    }

    let mut live = live_out.clone();

    for instr in shader.block(block).instrs.iter().rev() {
        ins_update(&mut live, instr);
    }

    let data = shader.block_mut(block);
    let progress = data.live_in != live;

    data.live_in = live;
    data.live_out = live_out;

    progress
}

/// Computes `live_in` and `live_out` of every block, unless the shader's
/// liveness is still valid from a previous call.
pub fn compute_liveness(shader: &mut Shader) {
    if shader.liveness_valid {
        return;
    }

    let max = shader.max_temp();

    for block in shader.blocks() {
        let data = shader.block_mut(block);

        data.live_in = LiveSet::new(max);
        data.live_out = LiveSet::new(max);
    }

    debug!("computing liveness over {max} nodes");

    solve_backward(shader, block_update);

    shader.liveness_valid = true;
}

/// Marks the liveness of `shader` as stale.
pub fn invalidate_liveness(shader: &mut Shader) {
    shader.invalidate_liveness();
}
