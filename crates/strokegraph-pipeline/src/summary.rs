//! Branch summarization: list the raw branches of a thinned skeleton.
//!
//! A branch is reported only by its two endpoint pixels. Reduction
//! works purely on these endpoint pairs and recovers the pixels in
//! between afterwards with [`crate::trace`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::mask::BinaryMask;
use crate::neighborhood::m_neighbors;
use crate::types::Pixel;

/// A raw skeleton branch, known by its endpoints.
///
/// `start == end` marks a self-loop: a branch that leaves a node and
/// returns to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Branch {
    /// First endpoint.
    pub start: Pixel,
    /// Second endpoint.
    pub end: Pixel,
}

impl Branch {
    /// Create a branch between two endpoints.
    #[must_use]
    pub const fn new(start: Pixel, end: Pixel) -> Self {
        Self { start, end }
    }

    /// Whether both endpoints are the same pixel.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pixel` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, pixel: Pixel) -> bool {
        self.start == pixel || self.end == pixel
    }

    /// The endpoint opposite `pixel`, or `None` if `pixel` is not an
    /// endpoint.
    #[must_use]
    pub fn opposite(&self, pixel: Pixel) -> Option<Pixel> {
        if self.start == pixel {
            Some(self.end)
        } else if self.end == pixel {
            Some(self.start)
        } else {
            None
        }
    }
}

/// Trait for skeleton-to-branch summarization.
///
/// Input: a thinned skeleton mask. Output: one [`Branch`] per maximal
/// pixel chain between topologically significant pixels.
pub trait BranchSummarizer {
    /// List the branches of the skeleton.
    fn summarize(&self, skeleton: &BinaryMask) -> Vec<Branch>;
}

/// Summarizes a skeleton from its pixel adjacency graph.
///
/// Pixels whose minimal-adjacency degree (see
/// [`m_neighbors`]) is not 2 are nodes: tips have degree 1, junctions
/// degree 3 or more. Every walk from a node through degree-2 pixels to
/// the next node is one branch; two adjacent nodes form a branch with
/// no interior. Closed cycles with no node on them yield nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelGraphSummarizer;

impl BranchSummarizer for PixelGraphSummarizer {
    fn summarize(&self, skeleton: &BinaryMask) -> Vec<Branch> {
        let adjacency: HashMap<Pixel, Vec<Pixel>> = skeleton
            .pixels()
            .map(|p| (p, m_neighbors(p, skeleton)))
            .collect();
        let is_node = |p: &Pixel| adjacency.get(p).is_some_and(|n| n.len() != 2);
        let step_limit = adjacency.len();

        // (node, first pixel) pairs whose walk has already been taken,
        // from either direction.
        let mut walked: HashSet<(Pixel, Pixel)> = HashSet::new();
        let mut branches = Vec::new();

        for node in skeleton.pixels().filter(|p| is_node(p)) {
            for &first in adjacency.get(&node).map_or(&[][..], Vec::as_slice) {
                if !walked.insert((node, first)) {
                    continue;
                }
                let mut previous = node;
                let mut current = first;
                let mut steps = 0;
                while !is_node(&current) && steps <= step_limit {
                    let next = adjacency
                        .get(&current)
                        .and_then(|n| n.iter().copied().find(|&q| q != previous));
                    let Some(next) = next else { break };
                    previous = current;
                    current = next;
                    steps += 1;
                }
                if !is_node(&current) {
                    continue;
                }
                walked.insert((current, previous));
                branches.push(Branch::new(node, current));
            }
        }

        branches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summarize(rows: &[&str]) -> Vec<Branch> {
        PixelGraphSummarizer.summarize(&BinaryMask::from_ascii(rows))
    }

    fn has_branch(branches: &[Branch], a: Pixel, b: Pixel) -> bool {
        branches
            .iter()
            .any(|br| (br.start == a && br.end == b) || (br.start == b && br.end == a))
    }

    #[test]
    fn straight_line_is_one_branch() {
        let branches = summarize(&["######"]);
        assert_eq!(branches, vec![Branch::new(Pixel::new(0, 0), Pixel::new(0, 5))]);
    }

    #[test]
    fn t_junction_has_three_branches() {
        let branches = summarize(&[
            "#######", //
            "...#...", //
            "...#...", //
            "...#...",
        ]);
        let junction = Pixel::new(0, 3);
        assert_eq!(branches.len(), 3);
        assert!(has_branch(&branches, junction, Pixel::new(0, 0)));
        assert!(has_branch(&branches, junction, Pixel::new(0, 6)));
        assert!(has_branch(&branches, junction, Pixel::new(3, 3)));
    }

    #[test]
    fn staircase_is_a_single_chain() {
        let branches = summarize(&[
            "##....", //
            ".##...", //
            "..##..", //
            "...##.",
        ]);
        assert_eq!(branches, vec![Branch::new(Pixel::new(0, 0), Pixel::new(3, 4))]);
    }

    #[test]
    fn loop_on_a_node_is_a_self_loop() {
        let branches = summarize(&[
            "..###", //
            "..#.#", //
            "#####",
        ]);
        let node = Pixel::new(2, 2);
        assert!(branches.iter().any(|b| b.is_self_loop() && b.start == node));
        assert!(has_branch(&branches, node, Pixel::new(2, 0)));
        assert_eq!(branches.len(), 2);
    }

    #[test]
    fn closed_ring_without_nodes_yields_nothing() {
        let branches = summarize(&["###", "#.#", "###"]);
        assert!(branches.is_empty());
    }

    #[test]
    fn branch_helpers() {
        let b = Branch::new(Pixel::new(0, 0), Pixel::new(0, 5));
        assert!(b.touches(Pixel::new(0, 5)));
        assert_eq!(b.opposite(Pixel::new(0, 0)), Some(Pixel::new(0, 5)));
        assert_eq!(b.opposite(Pixel::new(1, 1)), None);
        assert!(!b.is_self_loop());
    }
}
