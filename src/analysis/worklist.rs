//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::arena::ArenaKey;
use crate::ir::{Block, Shader};
use smallbitvec::{sbvec, SmallBitVec};
use std::collections::VecDeque;

/// A FIFO of blocks where each block is queued at most once.
struct Worklist {
    queue: VecDeque<Block>,
    queued: SmallBitVec,
}

impl Worklist {
    fn new(len: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(len),
            queued: sbvec![false; len],
        }
    }

    fn push(&mut self, block: Block) {
        if !self.queued.get(block.index()).unwrap_or(false) {
            self.queued.set(block.index(), true);
            self.queue.push_back(block);
        }
    }

    fn pop(&mut self) -> Option<Block> {
        let block = self.queue.pop_front()?;

        self.queued.set(block.index(), false);

        Some(block)
    }
}

/// Drives a backwards dataflow problem to a fixed point.
///
/// Starts from the exit block. `update` recomputes one block and returns whether
/// its input set changed, the predecessors of a block are queued whenever that
/// happens or when the block is seen for the first time. Blocks that cannot
/// reach the exit are never visited.
pub(crate) fn solve_backward<F>(shader: &mut Shader, mut update: F)
where
    F: FnMut(&mut Shader, Block) -> bool,
{
    let exit = match shader.exit_block() {
        Some(exit) => exit,
        None => return,
    };

    let mut visited = sbvec![false; shader.block_count()];
    let mut work = Worklist::new(shader.block_count());

    work.push(exit);

    while let Some(block) = work.pop() {
        let progress = update(shader, block);
        let first_visit = !visited.get(block.index()).unwrap_or(false);

        log::trace!("dataflow: {block:?} progress={progress} first={first_visit}");

        if progress || first_visit {
            for &pred in shader.predecessors(block) {
                work.push(pred);
            }
        }

        visited.set(block.index(), true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::CompileInputs;

    #[test]
    fn every_block_reaching_the_exit_is_visited() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let b = shader.create_block();
        let c = shader.create_block();
        let orphan = shader.create_block();
        let d = shader.create_block();

        shader.add_successor(a, b);
        shader.add_successor(a, c);
        shader.add_successor(b, d);
        shader.add_successor(c, d);
        shader.add_successor(orphan, a);
        shader.add_successor(d, b);

        // d loops back into b, so the exit is the last block without successors
        let exit = shader.create_block();
        shader.block_mut(d).successors[1] = Some(exit);
        shader.block_mut(exit).predecessors.push(d);

        let mut seen = Vec::new();

        solve_backward(&mut shader, |_, block| {
            seen.push(block);
            false
        });

        seen.sort();
        seen.dedup();

        assert_eq!(seen, vec![a, b, c, orphan, d, exit]);
    }

    #[test]
    fn progress_requeues_predecessors() {
        let mut shader = Shader::new(CompileInputs::default());
        let a = shader.create_block();
        let b = shader.create_block();

        shader.add_successor(a, b);

        let mut budget = 3;
        let mut count = 0;

        solve_backward(&mut shader, |_, _| {
            count += 1;
            budget -= 1;
            budget > 0
        });

        // a has no predecessors, so nothing is queued after it
        assert_eq!(count, 2);
    }
}
