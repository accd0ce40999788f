//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//


use crate::utility::set_bits;

/// How far apart, in registers, two constrained nodes can be for the
/// constraint to matter. Vectors span at most four registers.
const MAX_DISTANCE: i64 = 3;

/// The equations of a linearly constrained register allocation problem.
///
/// Every node has an affinity (the registers it may be placed in) and a
/// row of constraints against every other node. `linear[i * n + j]` holds
/// the forbidden values of `solution(j) - solution(i)`, with bit `3 + d`
/// standing for a distance of `d` in `-3..=3`.
#[derive(Clone, Debug)]
pub struct Lcra {
    node_count: usize,
    affinity: Vec<u64>,
    linear: Vec<u8>,
    solutions: Vec<Option<u32>>,
    spill_node: Option<usize>,
}

impl Lcra {
    /// Creates an unconstrained problem over `node_count` nodes, all of
    /// which start with no legal registers.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            affinity: vec![0; node_count],
            linear: vec![0; node_count * node_count],
            solutions: vec![None; node_count],
            spill_node: None,
        }
    }

    /// The number of nodes in the problem.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The registers `node` may still be placed in.
    #[inline]
    pub fn affinity(&self, node: usize) -> u64 {
        self.affinity[node]
    }

    /// Overwrites the affinity of `node`.
    pub fn set_affinity(&mut self, node: usize, affinity: u64) {
        self.affinity[node] = affinity;
    }

    /// Narrows the affinity of `node` to the registers in `mask`.
    pub fn restrict_affinity(&mut self, node: usize, mask: u64) {
        self.affinity[node] &= mask;
    }

    /// Pins `node` to `reg`. Pinned nodes are never solved for.
    pub fn fix(&mut self, node: usize, reg: u32) {
        self.solutions[node] = Some(reg);
    }

    /// The register chosen for `node`, if it has been solved.
    #[inline]
    pub fn solution(&self, node: usize) -> Option<u32> {
        self.solutions[node]
    }

    /// The node that could not be solved by the last call to [`Self::solve`].
    pub fn spill_node(&self) -> Option<usize> {
        self.spill_node
    }

    /// The raw constraint byte of `j` relative to `i`.
    #[inline]
    pub fn constraint(&self, i: usize, j: usize) -> u8 {
        self.linear[i * self.node_count + j]
    }

    /// Records that nodes `i` and `j` are live at the same time, with lane
    /// masks `cmask_i` and `cmask_j` relative to each node's base register.
    ///
    /// Every relative placement that would overlap a lane of `i` with a lane
    /// of `j` is forbidden, in both rows.
    pub fn add_node_interference(&mut self, i: usize, cmask_i: u8, j: usize, cmask_j: u8) {
        if i == j {
            return;
        }

        let (cmask_i, cmask_j) = (cmask_i as u32, cmask_j as u32);
        let mut constraint_fw = 0u8;
        let mut constraint_bw = 0u8;

        for d in 0..=MAX_DISTANCE as u32 {
            if cmask_i & (cmask_j << d) != 0 {
                constraint_bw |= 1 << (3 + d);
                constraint_fw |= 1 << (3 - d);
            }

            if cmask_i & (cmask_j >> d) != 0 {
                constraint_fw |= 1 << (3 + d);
                constraint_bw |= 1 << (3 - d);
            }
        }

        self.linear[j * self.node_count + i] |= constraint_fw;
        self.linear[i * self.node_count + j] |= constraint_bw;
    }

    /// Checks the current solution of `i` against every solved node.
    fn test_linear(&self, i: usize, reg: u32) -> bool {
        let row = &self.linear[i * self.node_count..(i + 1) * self.node_count];

        row.iter().zip(self.solutions.iter()).all(|(&constraint, solution)| {
            let other = match solution {
                Some(other) => *other,
                None => return true,
            };

            let distance = other as i64 - reg as i64;

            if !(-MAX_DISTANCE..=MAX_DISTANCE).contains(&distance) {
                return true;
            }

            constraint & (1 << (distance + MAX_DISTANCE)) == 0
        })
    }

    /// Solves every node in index order, placing each in the lowest register
    /// of its affinity that satisfies its constraints.
    ///
    /// There is no backtracking. The first node that cannot be placed is
    /// returned as the error and remembered as [`Self::spill_node`].
    pub fn solve(&mut self) -> Result<(), usize> {
        for node in 0..self.node_count {
            if self.solutions[node].is_some() || self.affinity[node] == 0 {
                continue;
            }

            match set_bits(self.affinity[node]).find(|&reg| self.test_linear(node, reg)) {
                Some(reg) => self.solutions[node] = Some(reg),
                None => {
                    self.spill_node = Some(node);

                    return Err(node);
                }
            }
        }

        Ok(())
    }

    /// The number of constraint bits in the row of `node`, a measure of
    /// how much pressure the node puts on the rest of the program.
    pub fn count_constraints(&self, node: usize) -> u32 {
        self.linear[node * self.node_count..(node + 1) * self.node_count]
            .iter()
            .map(|c| c.count_ones())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::mask_u64;

    #[test]
    fn interfering_scalars_get_distinct_registers() {
        let mut lcra = Lcra::new(3);

        for node in 0..3 {
            lcra.set_affinity(node, mask_u64(4));
        }

        lcra.add_node_interference(0, 0b1, 1, 0b1);
        lcra.add_node_interference(1, 0b1, 2, 0b1);

        assert_eq!(lcra.solve(), Ok(()));
        assert_eq!(lcra.solution(0), Some(0));
        assert_eq!(lcra.solution(1), Some(1));
        // 0 and 2 never interfere, so they share
        assert_eq!(lcra.solution(2), Some(0));
    }

    #[test]
    fn vectors_do_not_overlap_neighbours() {
        let mut lcra = Lcra::new(2);

        lcra.set_affinity(0, u64::MAX);
        lcra.set_affinity(1, u64::MAX);
        lcra.add_node_interference(1, 0b0001, 0, 0b1111);

        assert_eq!(lcra.solve(), Ok(()));
        assert_eq!(lcra.solution(0), Some(0));
        assert_eq!(lcra.solution(1), Some(4));
    }

    #[test]
    fn constraints_are_mirrored() {
        let mut lcra = Lcra::new(2);

        lcra.add_node_interference(0, 0b11, 1, 0b1);

        // 1 may not sit at 0 or +1 relative to 0
        assert_eq!(lcra.constraint(0, 1), 0b0001_1000);
        // 0 may not sit at 0 or -1 relative to 1
        assert_eq!(lcra.constraint(1, 0), 0b0000_1100);
        assert_eq!(lcra.count_constraints(0), 2);
    }

    #[test]
    fn fixed_nodes_are_respected() {
        let mut lcra = Lcra::new(2);

        lcra.fix(0, 0);
        lcra.set_affinity(1, mask_u64(8));
        lcra.add_node_interference(1, 0b1, 0, 0b1111);

        assert_eq!(lcra.solve(), Ok(()));
        assert_eq!(lcra.solution(0), Some(0));
        assert_eq!(lcra.solution(1), Some(4));
    }

    #[test]
    fn failure_records_the_spill_node() {
        let mut lcra = Lcra::new(3);

        for node in 0..3 {
            lcra.set_affinity(node, mask_u64(2));
        }

        lcra.add_node_interference(0, 0b1, 1, 0b1);
        lcra.add_node_interference(0, 0b1, 2, 0b1);
        lcra.add_node_interference(1, 0b1, 2, 0b1);

        assert_eq!(lcra.solve(), Err(2));
        assert_eq!(lcra.spill_node(), Some(2));
    }

    #[test]
    fn nodes_without_affinity_are_skipped() {
        let mut lcra = Lcra::new(2);

        lcra.set_affinity(1, 0b100);

        assert_eq!(lcra.solve(), Ok(()));
        assert_eq!(lcra.solution(0), None);
        assert_eq!(lcra.solution(1), Some(2));
    }
}
