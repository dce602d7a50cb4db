//! Path reconstruction: recover the pixel chain of one graph edge.
//!
//! Edges are known only by their two endpoint pixels. [`trace`] runs a
//! breadth-first search over the 8-connected foreground of a working
//! mask, stopping the moment the far endpoint is discovered, and walks
//! the recorded predecessors back to the start.
//!
//! During reduction every vertex neighbourhood is cleared from the
//! working mask so a search cannot leak through a junction into a
//! sibling branch. [`OpenedEndpoints`] re-enables the two endpoint
//! neighbourhoods of the edge being traced for exactly as long as the
//! guard lives.

use std::collections::{HashMap, VecDeque};

use crate::mask::BinaryMask;
use crate::neighborhood::neighbors;
use crate::types::Pixel;

/// The two endpoints could not be connected in the working mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no pixel path from {start} to {end} in the working mask")]
pub struct TraceError {
    /// Where the search started.
    pub start: Pixel,
    /// The endpoint that was never reached.
    pub end: Pixel,
}

/// Find a shortest 8-connected pixel path from `start` to `end`.
///
/// The returned path begins with `start`, ends with `end`, and contains
/// no repeated pixel. Callers must not pass `start == end`.
///
/// The search is bounded by the number of foreground pixels, so it
/// always terminates, though a large disconnected mask is explored in
/// full before failing.
///
/// # Errors
///
/// Returns [`TraceError`] when `end` is unreachable from `start`.
pub fn trace(start: Pixel, end: Pixel, mask: &BinaryMask) -> Result<Vec<Pixel>, TraceError> {
    let mut came_from: HashMap<Pixel, Pixel> = HashMap::new();
    came_from.insert(start, start);
    let mut queue = VecDeque::from([start]);

    'search: while let Some(current) = queue.pop_front() {
        for next in neighbors(current, mask) {
            if came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, current);
            if next == end {
                break 'search;
            }
            queue.push_back(next);
        }
    }

    let mut path = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) if previous != current => {
                path.push(previous);
                current = previous;
            }
            _ => return Err(TraceError { start, end }),
        }
    }
    path.reverse();
    Ok(path)
}

/// Scoped re-enabling of edge endpoints in a disconnected working mask.
///
/// Opening sets each endpoint and its foreground neighbours (taken from
/// the `reference` mask) to `true`; dropping the guard writes back the
/// values those pixels held before, on success and failure paths alike.
pub struct OpenedEndpoints<'a> {
    mask: &'a mut BinaryMask,
    previous: Vec<(Pixel, bool)>,
}

impl<'a> OpenedEndpoints<'a> {
    /// Re-enable `endpoints` and their `reference` neighbourhoods in `mask`.
    pub fn open(mask: &'a mut BinaryMask, reference: &BinaryMask, endpoints: &[Pixel]) -> Self {
        let mut previous = Vec::with_capacity(endpoints.len() * 9);
        for &endpoint in endpoints {
            for p in std::iter::once(endpoint).chain(neighbors(endpoint, reference)) {
                previous.push((p, mask.get(p)));
            }
        }
        for &(p, _) in &previous {
            mask.set(p, true);
        }
        Self { mask, previous }
    }

    /// The working mask with the endpoints currently open.
    #[must_use]
    pub fn mask(&self) -> &BinaryMask {
        self.mask
    }
}

impl Drop for OpenedEndpoints<'_> {
    fn drop(&mut self) {
        // Reverse order so a pixel opened twice ends on its first value.
        for &(p, value) in self.previous.iter().rev() {
            self.mask.set(p, value);
        }
    }
}

/// Trace the edge `start`–`end` through a disconnected working mask.
///
/// Opens both endpoint neighbourhoods, traces, and closes them again
/// before returning, so `work` is left exactly as it was found.
///
/// # Errors
///
/// Returns [`TraceError`] when the endpoints are not connected even
/// with their neighbourhoods open.
pub fn trace_edge(
    work: &mut BinaryMask,
    reference: &BinaryMask,
    start: Pixel,
    end: Pixel,
) -> Result<Vec<Pixel>, TraceError> {
    let guard = OpenedEndpoints::open(work, reference, &[start, end]);
    trace(start, end, guard.mask())
}
