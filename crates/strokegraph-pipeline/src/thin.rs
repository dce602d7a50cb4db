//! Thinning: reduce a binary mask to a one-pixel-wide skeleton.
//!
//! Reduction re-thins its working mask at the start of every iteration
//! because pruning dead-end branches can leave small blobs where a
//! branch used to join the rest of the graph. The [`Thinner`] trait keeps
//! the algorithm pluggable and [`ThinnerKind`] selects one at runtime.

use serde::{Deserialize, Serialize};

use crate::mask::BinaryMask;
use crate::types::Pixel;

/// Selects which thinning algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThinnerKind {
    /// Zhang & Suen (1984) two-subiteration parallel thinning.
    ///
    /// Preserves 8-connectivity and leaves one-pixel-wide lines,
    /// crossings and T-junctions untouched.
    #[default]
    ZhangSuen,
}

/// Trait for thinning strategies.
///
/// Input: any binary mask. Output: a mask whose foreground is a subset
/// of the input's and is (close to) one pixel wide.
pub trait Thinner {
    /// Thin the given mask.
    fn thin(&self, mask: &BinaryMask) -> BinaryMask;
}

impl Thinner for ThinnerKind {
    fn thin(&self, mask: &BinaryMask) -> BinaryMask {
        match *self {
            Self::ZhangSuen => zhang_suen(mask),
        }
    }
}

/// Clockwise neighbour offsets `P2..P9`, starting due north.
const RING: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

#[derive(Debug, Clone, Copy)]
enum SubIteration {
    First,
    Second,
}

/// Zhang-Suen thinning. Each pass deletes the pixels marked by both
/// sub-iterations until a pass deletes nothing.
fn zhang_suen(mask: &BinaryMask) -> BinaryMask {
    let mut out = mask.clone();
    loop {
        let mut changed = false;
        for step in [SubIteration::First, SubIteration::Second] {
            let marked: Vec<Pixel> = out.pixels().filter(|&p| deletable(&out, p, step)).collect();
            changed |= !marked.is_empty();
            for p in marked {
                out.set(p, false);
            }
        }
        if !changed {
            return out;
        }
    }
}

/// The Zhang-Suen deletion test for one foreground pixel.
fn deletable(mask: &BinaryMask, pixel: Pixel, step: SubIteration) -> bool {
    let ring = RING.map(|(dr, dc)| pixel.offset(dr, dc).is_some_and(|p| mask.get(p)));
    let [p2, _, p4, _, p6, _, p8, _] = ring;

    let occupied = ring.iter().filter(|set| **set).count();
    if !(2..=6).contains(&occupied) {
        return false;
    }

    let transitions = (0..8).filter(|&i| !ring[i] && ring[(i + 1) % 8]).count();
    if transitions != 1 {
        return false;
    }

    match step {
        SubIteration::First => !(p2 && p4 && p6) && !(p4 && p6 && p8),
        SubIteration::Second => !(p2 && p4 && p8) && !(p2 && p6 && p8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_zhang_suen() {
        assert_eq!(ThinnerKind::default(), ThinnerKind::ZhangSuen);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let mask = BinaryMask::new(8, 8);
        assert!(ThinnerKind::ZhangSuen.thin(&mask).is_blank());
    }

    #[test]
    fn one_pixel_plus_is_stable() {
        let mask = BinaryMask::from_ascii(&[
            "...#...", //
            "...#...", //
            "...#...", //
            "#######", //
            "...#...", //
            "...#...", //
            "...#...",
        ]);
        assert_eq!(ThinnerKind::ZhangSuen.thin(&mask), mask);
    }

    #[test]
    fn thick_bar_becomes_one_pixel_wide() {
        let mask =
            BinaryMask::from_fn(20, 7, |p| (2..=4).contains(&p.row) && (2..18).contains(&p.col));
        let thin = ThinnerKind::ZhangSuen.thin(&mask);
        assert!(!thin.is_blank());
        assert!(thin.count() < mask.count());
        for p in thin.pixels() {
            assert!(mask.get(p), "thinning added pixel {p}");
        }
        // No column of the result is more than one pixel thick.
        for col in 0..20 {
            let thickness = (0..7).filter(|&row| thin.get(Pixel::new(row, col))).count();
            assert!(thickness <= 1, "column {col} is {thickness} pixels thick");
        }
    }
}
