//! Greedy bridge/link assignment over every scored junction triple.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::graph::{Edge, EdgeDictionary};
use crate::score::{ScoreEntry, score_all};
use crate::types::{Label, PipelineConfig};

/// Bridge and link labels for the edges of an [`EdgeDictionary`].
///
/// Edges are stored in the orientation used as dictionary keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Edges committed as bridges.
    pub bridges: BTreeSet<Edge>,
    /// Edges committed as links.
    pub links: BTreeSet<Edge>,
    /// Number of triples in the score pool.
    pub triples_scored: usize,
}

impl Classification {
    /// The label of `edge`, in either orientation.
    ///
    /// An edge committed both ways reads as a link.
    #[must_use]
    pub fn label(&self, edge: Edge) -> Label {
        let either =
            |set: &BTreeSet<Edge>| set.contains(&edge) || set.contains(&edge.reversed());
        if either(&self.links) {
            Label::Link
        } else if either(&self.bridges) {
            Label::Bridge
        } else {
            Label::Unlabeled
        }
    }

    /// Every dictionary edge with its label, in dictionary order.
    pub fn labels<'a>(
        &'a self,
        edges: &'a EdgeDictionary,
    ) -> impl Iterator<Item = (Edge, Label)> + 'a {
        edges.edges().map(move |edge| (edge, self.label(edge)))
    }

    /// Dictionary edges that were never committed.
    #[must_use]
    pub fn unlabeled(&self, edges: &EdgeDictionary) -> Vec<Edge> {
        self.labels(edges)
            .filter(|&(_, label)| label == Label::Unlabeled)
            .map(|(edge, _)| edge)
            .collect()
    }

    /// Edge counts per label over `edges`: `(bridges, links, unlabeled)`.
    #[must_use]
    pub fn counts(&self, edges: &EdgeDictionary) -> (usize, usize, usize) {
        self.labels(edges)
            .fold((0, 0, 0), |(b, l, u), (_, label)| match label {
                Label::Bridge => (b + 1, l, u),
                Label::Link => (b, l + 1, u),
                Label::Unlabeled => (b, l, u + 1),
            })
    }
}

/// Score every junction in `edges` and assign bridge/link labels.
#[must_use]
pub fn classify(edges: &EdgeDictionary, config: &PipelineConfig) -> Classification {
    let pool = score_all(&config.scorer, edges, config.ring_radius);
    let classification = assign(pool, edges);
    let (bridges, links, unlabeled) = classification.counts(edges);
    info!(
        triples = classification.triples_scored,
        bridges, links, unlabeled, "classified junction edges"
    );
    classification
}

/// Commit score entries greedily, lowest best score first.
///
/// Each entry's best edge becomes a bridge unless it is already a link,
/// in which case the entry commits nothing. Otherwise its two other
/// edges become links unconditionally. Scores never change once
/// computed, so a single stable sort by best score visits entries in
/// the same order as repeatedly taking the global minimum; equal scores
/// keep pool order.
#[must_use]
pub fn assign(pool: Vec<ScoreEntry>, edges: &EdgeDictionary) -> Classification {
    let triples_scored = pool.len();
    let mut ranked: Vec<(f64, ScoreEntry)> = pool.into_iter().map(|e| (e.best().1, e)).collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let oriented = |edge: Edge| edges.oriented(edge).unwrap_or(edge);
    let mut classification = Classification {
        triples_scored,
        ..Classification::default()
    };

    for (score, entry) in ranked {
        let bridge = oriented(entry.best().0);
        if classification.links.contains(&bridge) {
            debug!(u = %bridge.u, v = %bridge.v, score, "bridge blocked by an existing link");
            continue;
        }
        classification.bridges.insert(bridge);
        for link in entry.others() {
            classification.links.insert(oriented(link));
        }
    }

    classification
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::score::{JunctionScorerKind, Triple};
    use crate::types::Pixel;

    fn p(row: usize, col: usize) -> Pixel {
        Pixel::new(row, col)
    }

    fn line(from: Pixel, to: Pixel) -> Vec<Pixel> {
        // Axis-aligned only.
        if from.row == to.row {
            let cols: Vec<usize> = if from.col <= to.col {
                (from.col..=to.col).collect()
            } else {
                (to.col..=from.col).rev().collect()
            };
            cols.into_iter().map(|c| p(from.row, c)).collect()
        } else {
            let rows: Vec<usize> = if from.row <= to.row {
                (from.row..=to.row).collect()
            } else {
                (to.row..=from.row).rev().collect()
            };
            rows.into_iter().map(|r| p(r, from.col)).collect()
        }
    }

    fn t_dictionary() -> (EdgeDictionary, Edge, Edge, Edge) {
        let v = p(10, 10);
        let stem = Edge::new(p(20, 10), v);
        let left = Edge::new(v, p(10, 0));
        let right = Edge::new(v, p(10, 20));
        let mut edges = EdgeDictionary::new();
        for edge in [stem, left, right] {
            edges.insert(edge, line(edge.u, edge.v)).unwrap();
        }
        (edges, stem, left, right)
    }

    #[test]
    fn t_junction_stem_is_bridge_and_bar_is_links() {
        let (edges, stem, left, right) = t_dictionary();
        for scorer in [JunctionScorerKind::Global, JunctionScorerKind::Local] {
            let config = PipelineConfig {
                scorer,
                ..PipelineConfig::default()
            };
            let result = classify(&edges, &config);
            assert_eq!(result.bridges, BTreeSet::from([stem]));
            assert_eq!(result.links, BTreeSet::from([left, right]));
            assert_eq!(result.label(stem.reversed()), Label::Bridge);
            assert!(result.unlabeled(&edges).is_empty());
            assert_eq!(result.triples_scored, 3);
        }
    }

    #[test]
    fn committed_link_blocks_a_later_bridge() {
        let (edges, stem, left, right) = t_dictionary();
        let v = p(10, 10);
        let entry = |u: Pixel, w1: Pixel, w2: Pixel, scores: [f64; 3]| {
            let triple = Triple { u, v, w1, w2 };
            let [a, b, c] = triple.edges();
            ScoreEntry {
                triple,
                scores: [(a, scores[0]), (b, scores[1]), (c, scores[2])],
            }
        };
        // The stem is committed first, making both bar arms links; the
        // second entry then wants the left arm as its bridge.
        let pool = vec![
            entry(p(20, 10), p(10, 20), p(10, 0), [2.0, 3.0, 0.5]),
            entry(p(20, 10), p(10, 0), p(10, 20), [0.0, 2.0, 3.0]),
        ];
        let result = assign(pool, &edges);
        assert_eq!(result.bridges, BTreeSet::from([stem]));
        assert_eq!(result.links, BTreeSet::from([left, right]));
        assert_eq!(result.label(left), Label::Link);
    }

    #[test]
    fn later_entry_links_an_edge_already_committed_as_bridge() {
        let v = p(10, 10);
        let (u, up, down, left) = (p(20, 10), p(10, 0), p(10, 20), p(0, 10));
        let mut edges = EdgeDictionary::new();
        for w in [up, down, left] {
            edges.insert(Edge::new(v, w), line(v, w)).unwrap();
        }
        let stem = Edge::new(u, v);
        edges.insert(stem, line(u, v)).unwrap();
        let entry = |w1: Pixel, w2: Pixel, scores: [f64; 3]| {
            let triple = Triple { u, v, w1, w2 };
            let [a, b, c] = triple.edges();
            ScoreEntry {
                triple,
                scores: [(a, scores[0]), (b, scores[1]), (c, scores[2])],
            }
        };
        // The first entry makes the stem a bridge; the second picks a
        // different bridge and takes the stem along as one of its links.
        let pool = vec![
            entry(left, up, [1.0, 0.2, 2.0]),
            entry(up, down, [0.0, 1.0, 1.0]),
        ];
        let result = assign(pool, &edges);
        assert_eq!(result.bridges, BTreeSet::from([stem, Edge::new(v, left)]));
        assert!(result.links.contains(&stem));
        assert_eq!(
            result.links,
            BTreeSet::from([stem, Edge::new(v, up), Edge::new(v, down)])
        );
        assert_eq!(result.label(stem), Label::Link);
    }

    #[test]
    fn assignment_is_repeatable() {
        let (edges, ..) = t_dictionary();
        let pool = score_all(&JunctionScorerKind::Global, &edges, 7);
        let first = assign(pool.clone(), &edges);
        let second = assign(pool, &edges);
        assert_eq!(first, second);
    }

    #[test]
    fn link_wins_when_an_edge_is_committed_both_ways() {
        let (edges, stem, left, _) = t_dictionary();
        let result = Classification {
            bridges: BTreeSet::from([stem, left]),
            links: BTreeSet::from([left]),
            triples_scored: 0,
        };
        assert_eq!(result.label(left), Label::Link);
        assert_eq!(result.counts(&edges), (1, 1, 1));
    }

    #[test]
    fn empty_pool_leaves_everything_unlabeled() {
        let (edges, ..) = t_dictionary();
        let result = assign(Vec::new(), &edges);
        assert_eq!(result.unlabeled(&edges).len(), 3);
    }
}
