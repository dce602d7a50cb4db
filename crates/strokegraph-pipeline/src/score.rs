//! Junction triple scoring.
//!
//! At a junction `v` with an incoming neighbour `u` and two further
//! neighbours `w1`, `w2`, each of the three edges is scored for how well
//! it fits the role of bridge. A bridge's two flanking edges meet it at
//! right angles while the two link edges continue straight through the
//! junction, so the score for edge `X` with flanking edges `A`, `B` is
//!
//! ```text
//! |π - angle(A, v, B)| + |π/2 - angle(X, v, A)| + |π/2 - angle(X, v, B)|
//! ```
//!
//! Lower is more bridge-like. The [`JunctionScorer`] trait keeps the
//! direction estimate pluggable and [`JunctionScorerKind`] selects one at
//! runtime.

use std::f64::consts::{FRAC_PI_2, PI};

use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::angle::angle;
use crate::graph::{Edge, EdgeDictionary};
use crate::types::Pixel;

/// Selects how edge directions at a junction are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JunctionScorerKind {
    /// Consider both the far endpoint and a sample on the ring of
    /// pixels `ring_radius` away from the junction for every edge, and
    /// keep the best-fitting combination per hypothesis.
    ///
    /// Robust to edges that curve away from the junction.
    #[default]
    Global,

    /// Use the exact far endpoints only.
    ///
    /// Cheaper, and exact for straight edges.
    Local,
}

/// A junction `v` seen from incoming neighbour `u`, paired with two of
/// its other neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// The incoming neighbour.
    pub u: Pixel,
    /// The junction.
    pub v: Pixel,
    /// First other neighbour.
    pub w1: Pixel,
    /// Second other neighbour.
    pub w2: Pixel,
}

impl Triple {
    /// The three edges in `(u, v)`, `(v, w1)`, `(v, w2)` order.
    #[must_use]
    pub const fn edges(&self) -> [Edge; 3] {
        [
            Edge::new(self.u, self.v),
            Edge::new(self.v, self.w1),
            Edge::new(self.v, self.w2),
        ]
    }
}

/// Bridge scores for the three edges of one triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    /// The scored triple.
    pub triple: Triple,
    /// `(edge, score)` for `(u, v)`, `(v, w1)`, `(v, w2)` in that order.
    pub scores: [(Edge, f64); 3],
}

impl ScoreEntry {
    /// Index of the lowest score; the first one wins a tie.
    #[must_use]
    pub fn best_index(&self) -> usize {
        let mut best = 0;
        for (i, (_, score)) in self.scores.iter().enumerate().skip(1) {
            if score.total_cmp(&self.scores[best].1).is_lt() {
                best = i;
            }
        }
        best
    }

    /// The lowest-scoring `(edge, score)` pair.
    #[must_use]
    pub fn best(&self) -> (Edge, f64) {
        self.scores[self.best_index()]
    }

    /// The two edges other than the best one, in entry order.
    #[must_use]
    pub fn others(&self) -> [Edge; 2] {
        let [a, b, c] = self.scores.map(|(edge, _)| edge);
        match self.best_index() {
            0 => [b, c],
            1 => [a, c],
            _ => [a, b],
        }
    }
}

/// Trait for junction triple scorers.
pub trait JunctionScorer {
    /// Score one triple against the edge paths in `edges`.
    fn score(&self, triple: Triple, edges: &EdgeDictionary, ring_radius: usize) -> ScoreEntry;
}

impl JunctionScorer for JunctionScorerKind {
    fn score(&self, triple: Triple, edges: &EdgeDictionary, ring_radius: usize) -> ScoreEntry {
        let [uv, vw1, vw2] = match *self {
            Self::Global => score_global(triple, edges, ring_radius),
            Self::Local => bridge_scores(triple.u, triple.v, triple.w1, triple.w2),
        };
        let [e_uv, e_vw1, e_vw2] = triple.edges();
        ScoreEntry {
            triple,
            scores: [(e_uv, uv), (e_vw1, vw1), (e_vw2, vw2)],
        }
    }
}

/// Bridge scores for `(u, v)`, `(v, w1)`, `(v, w2)` from direction points.
fn bridge_scores(u: Pixel, v: Pixel, w1: Pixel, w2: Pixel) -> [f64; 3] {
    let u_w1 = angle(u, v, w1);
    let u_w2 = angle(u, v, w2);
    let w1_w2 = angle(w1, v, w2);
    [
        (PI - w1_w2).abs() + (FRAC_PI_2 - u_w1).abs() + (FRAC_PI_2 - u_w2).abs(),
        (PI - u_w2).abs() + (FRAC_PI_2 - u_w1).abs() + (FRAC_PI_2 - w1_w2).abs(),
        (PI - u_w1).abs() + (FRAC_PI_2 - u_w2).abs() + (FRAC_PI_2 - w1_w2).abs(),
    ]
}

/// Best of the eight endpoint/ring-sample combinations, per hypothesis.
///
/// Each neighbour contributes one direction point to all three angles of
/// a combination, so the angles within a score are mutually consistent.
/// The angles are not minimised independently of each other, which would
/// allow a neighbour to sit at its endpoint for one angle and at its ring
/// sample for another.
fn score_global(triple: Triple, edges: &EdgeDictionary, ring_radius: usize) -> [f64; 3] {
    let Triple { u, v, w1, w2 } = triple;
    let sample = |far: Pixel| {
        let path = edges.path(Edge::new(v, far)).unwrap_or(&[]);
        nearby_sample(v, far, path, ring_radius)
    };
    let us = [u, sample(u)];
    let w1s = [w1, sample(w1)];
    let w2s = [w2, sample(w2)];

    let mut best = [f64::INFINITY; 3];
    for &a in &us {
        for &b in &w1s {
            for &c in &w2s {
                let scores = bridge_scores(a, v, b, c);
                for (slot, score) in best.iter_mut().zip(scores) {
                    *slot = slot.min(score);
                }
            }
        }
    }
    best
}

/// Pixels at Chebyshev distance `radius` from `centre`, in scan order:
/// top row, bottom row, left column, right column, each left-to-right or
/// top-to-bottom. Positions with a negative coordinate are skipped;
/// corners appear twice.
pub fn ring(centre: Pixel, radius: usize) -> impl Iterator<Item = Pixel> {
    let r = isize::try_from(radius).unwrap_or(isize::MAX);
    let span = -r..=r;
    let rows = [-r, r]
        .into_iter()
        .flat_map(move |dr| span.clone().map(move |dc| (dr, dc)));
    let cols = [-r, r]
        .into_iter()
        .flat_map(move |dc| (-r..=r).map(move |dr| (dr, dc)));
    rows.chain(cols)
        .filter_map(move |(dr, dc)| centre.offset(dr, dc))
}

/// The first ring pixel around `junction` that lies on `path`, or `far`
/// when the path never reaches the ring.
#[must_use]
pub fn nearby_sample(junction: Pixel, far: Pixel, path: &[Pixel], ring_radius: usize) -> Pixel {
    ring(junction, ring_radius)
        .find(|p| path.contains(p))
        .unwrap_or(far)
}

/// Score every triple at `junction` seen from `incoming`.
///
/// Pairs `{w1, w2}` are drawn from the junction's other neighbours in
/// adjacency order.
pub fn score_junction<S: JunctionScorer + ?Sized>(
    scorer: &S,
    incoming: Pixel,
    junction: Pixel,
    edges: &EdgeDictionary,
    adjacency: &UnGraphMap<Pixel, ()>,
    ring_radius: usize,
) -> Vec<ScoreEntry> {
    let others: Vec<Pixel> = adjacency
        .neighbors(junction)
        .filter(|&n| n != incoming)
        .collect();
    let mut entries = Vec::new();
    for (i, &w1) in others.iter().enumerate() {
        for &w2 in &others[i + 1..] {
            let triple = Triple {
                u: incoming,
                v: junction,
                w1,
                w2,
            };
            entries.push(scorer.score(triple, edges, ring_radius));
        }
    }
    entries
}

/// Build the global score pool.
///
/// For every edge `(a, b)` in dictionary order, `b` is scored as a
/// junction entered from `a`, then `a` as a junction entered from `b`.
/// Vertices with fewer than three neighbours contribute nothing.
pub fn score_all<S: JunctionScorer + ?Sized>(
    scorer: &S,
    edges: &EdgeDictionary,
    ring_radius: usize,
) -> Vec<ScoreEntry> {
    let adjacency = edges.adjacency();
    let mut pool = Vec::new();
    for edge in edges.edges() {
        pool.extend(score_junction(scorer, edge.u, edge.v, edges, &adjacency, ring_radius));
        pool.extend(score_junction(scorer, edge.v, edge.u, edges, &adjacency, ring_radius));
    }
    pool
}
