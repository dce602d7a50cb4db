//! The reduced skeleton graph: edges keyed by endpoint pair, each with
//! the pixel path that realises it.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graphmap::UnGraphMap;
use serde::{Deserialize, Serialize};

use crate::types::Pixel;

/// An edge between two distinct vertices.
///
/// Edges are unordered in meaning but stored with one fixed orientation;
/// see [`EdgeDictionary::oriented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// First endpoint.
    pub u: Pixel,
    /// Second endpoint.
    pub v: Pixel,
}

impl Edge {
    /// Create an edge from `u` to `v`.
    #[must_use]
    pub const fn new(u: Pixel, v: Pixel) -> Self {
        Self { u, v }
    }

    /// The same edge with its endpoints swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            u: self.v,
            v: self.u,
        }
    }
}

/// Why an edge was refused by [`EdgeDictionary::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    /// Both endpoints are the same pixel.
    #[error("edge joins a vertex to itself")]
    SelfLoop,
    /// The edge (in either orientation) is already present.
    #[error("edge is already present in the dictionary")]
    Duplicate,
    /// The path is empty, i.e. the edge could not be traced.
    #[error("edge has an empty pixel path")]
    EmptyPath,
}

/// Mapping from [`Edge`] to its pixel path, ordered by edge.
///
/// Each path runs from the key's `u` to its `v` inclusive. Only one
/// orientation of any vertex pair is ever stored, so lookups by a pair
/// of vertices go through [`oriented`](Self::oriented) or
/// [`path`](Self::path), which try both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeDictionary {
    paths: BTreeMap<Edge, Vec<Pixel>>,
}

impl EdgeDictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge with its path.
    ///
    /// # Errors
    ///
    /// Returns the reason the edge was refused: a self-loop, a pair
    /// already present in either orientation, or an empty path.
    pub fn insert(&mut self, edge: Edge, path: Vec<Pixel>) -> Result<(), Rejected> {
        if edge.u == edge.v {
            return Err(Rejected::SelfLoop);
        }
        if path.is_empty() {
            return Err(Rejected::EmptyPath);
        }
        if self.oriented(edge).is_some() {
            return Err(Rejected::Duplicate);
        }
        self.paths.insert(edge, path);
        Ok(())
    }

    /// The stored orientation of `edge`, if either orientation is present.
    #[must_use]
    pub fn oriented(&self, edge: Edge) -> Option<Edge> {
        if self.paths.contains_key(&edge) {
            Some(edge)
        } else if self.paths.contains_key(&edge.reversed()) {
            Some(edge.reversed())
        } else {
            None
        }
    }

    /// The path of `edge` in either orientation, as stored.
    #[must_use]
    pub fn path(&self, edge: Edge) -> Option<&[Pixel]> {
        self.paths
            .get(&edge)
            .or_else(|| self.paths.get(&edge.reversed()))
            .map(Vec::as_slice)
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over edges and their paths in edge order.
    pub fn iter(&self) -> impl Iterator<Item = (&Edge, &[Pixel])> {
        self.paths.iter().map(|(e, p)| (e, p.as_slice()))
    }

    /// Iterate over the stored edges in order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.paths.keys().copied()
    }

    /// Every edge endpoint.
    #[must_use]
    pub fn vertices(&self) -> BTreeSet<Pixel> {
        self.paths.keys().flat_map(|e| [e.u, e.v]).collect()
    }

    /// Number of edges incident to `vertex`.
    #[must_use]
    pub fn degree(&self, vertex: Pixel) -> usize {
        self.paths
            .keys()
            .filter(|e| e.u == vertex || e.v == vertex)
            .count()
    }

    /// Vertices of degree 3 or more.
    #[must_use]
    pub fn junctions(&self) -> Vec<Pixel> {
        self.vertices()
            .into_iter()
            .filter(|&vertex| self.degree(vertex) >= 3)
            .collect()
    }

    /// Vertex adjacency as an undirected graph.
    ///
    /// Nodes and their neighbour lists follow edge order, so neighbour
    /// iteration is deterministic.
    #[must_use]
    pub fn adjacency(&self) -> UnGraphMap<Pixel, ()> {
        let mut graph = UnGraphMap::with_capacity(self.len() * 2, self.len());
        for edge in self.paths.keys() {
            graph.add_edge(edge.u, edge.v, ());
        }
        graph
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Pixel {
        Pixel::new(row, col)
    }

    #[test]
    fn lookups_try_both_orientations() {
        let mut dict = EdgeDictionary::new();
        let edge = Edge::new(p(0, 0), p(0, 2));
        dict.insert(edge, vec![p(0, 0), p(0, 1), p(0, 2)]).unwrap();

        assert_eq!(dict.oriented(edge.reversed()), Some(edge));
        assert_eq!(dict.path(edge.reversed()).map(<[Pixel]>::len), Some(3));
        assert_eq!(dict.oriented(Edge::new(p(0, 0), p(5, 5))), None);
    }

    #[test]
    fn rejects_self_loops_duplicates_and_empty_paths() {
        let mut dict = EdgeDictionary::new();
        let edge = Edge::new(p(1, 1), p(1, 3));
        dict.insert(edge, vec![p(1, 1), p(1, 2), p(1, 3)]).unwrap();

        assert_eq!(
            dict.insert(edge.reversed(), vec![p(1, 3), p(1, 2), p(1, 1)]),
            Err(Rejected::Duplicate)
        );
        assert_eq!(
            dict.insert(Edge::new(p(2, 2), p(2, 2)), vec![p(2, 2)]),
            Err(Rejected::SelfLoop)
        );
        assert_eq!(
            dict.insert(Edge::new(p(4, 4), p(4, 6)), Vec::new()),
            Err(Rejected::EmptyPath)
        );
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn rejections_describe_themselves() {
        assert_eq!(Rejected::SelfLoop.to_string(), "edge joins a vertex to itself");
        assert_eq!(
            Rejected::Duplicate.to_string(),
            "edge is already present in the dictionary"
        );
        let err: Box<dyn std::error::Error> = Box::new(Rejected::EmptyPath);
        assert_eq!(err.to_string(), "edge has an empty pixel path");
    }

    #[test]
    fn degree_and_junctions() {
        let center = p(5, 5);
        let mut dict = EdgeDictionary::new();
        for end in [p(0, 5), p(10, 5), p(5, 0)] {
            dict.insert(Edge::new(center, end), vec![center, end]).unwrap();
        }
        assert_eq!(dict.degree(center), 3);
        assert_eq!(dict.degree(p(0, 5)), 1);
        assert_eq!(dict.junctions(), vec![center]);
        assert_eq!(dict.vertices().len(), 4);
    }
}
