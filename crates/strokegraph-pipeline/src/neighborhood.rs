//! 8-connected neighbourhood sampling on a [`BinaryMask`].

use crate::mask::BinaryMask;
use crate::types::Pixel;

/// Relative `(d_row, d_col)` offsets of the eight surrounding pixels.
///
/// Orthogonal offsets come first, which makes breadth-first traces
/// prefer straight steps when two routes are equally short.
pub const EIGHT_CONNECTED: [(isize, isize); 8] = [
    (1, 0),
    (0, 1),
    (-1, 0),
    (0, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
    (1, -1),
];

/// The 8-connected neighbours of `pixel` that are foreground in `mask`.
///
/// Candidates that fall outside the grid are skipped, so border pixels
/// are handled like any other.
#[must_use]
pub fn neighbors(pixel: Pixel, mask: &BinaryMask) -> Vec<Pixel> {
    EIGHT_CONNECTED
        .iter()
        .filter_map(|&(dr, dc)| pixel.offset(dr, dc))
        .filter(|&p| mask.get(p))
        .collect()
}

/// Minimal-adjacency neighbours of `pixel`.
///
/// Orthogonal neighbours always count. A diagonal neighbour counts only
/// when neither of the two pixels at the shared corner is foreground,
/// so an L-shaped step is seen as one two-pixel hop instead of a
/// triangle. This keeps staircase lines and the pixels around a
/// junction at degree 2.
#[must_use]
pub fn m_neighbors(pixel: Pixel, mask: &BinaryMask) -> Vec<Pixel> {
    neighbors(pixel, mask)
        .into_iter()
        .filter(|&q| {
            q.row == pixel.row
                || q.col == pixel.col
                || !(mask.get(Pixel::new(pixel.row, q.col))
                    || mask.get(Pixel::new(q.row, pixel.col)))
        })
        .collect()
}
