//! Graph degree reduction.
//!
//! Turns a thinned skeleton into a graph whose vertices all have degree
//! three or more. Each outer iteration:
//!
//! 1. re-thins the working mask,
//! 2. summarizes it into raw branches,
//! 3. drops dead ends and merges pass-through vertices
//!    ([`simplify_branches`]),
//! 4. disconnects every surviving vertex neighbourhood in a working copy,
//! 5. traces one pixel path per surviving branch.
//!
//! The union of the traced paths becomes the next iteration's mask.
//! Iterations stop once a pass leaves the branch count unchanged.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::graph::{Edge, EdgeDictionary, Rejected};
use crate::mask::BinaryMask;
use crate::neighborhood::neighbors;
use crate::summary::{Branch, BranchSummarizer, PixelGraphSummarizer};
use crate::thin::Thinner;
use crate::trace::trace_edge;
use crate::types::{Pixel, PipelineConfig, PipelineError};

/// A surviving branch together with the pixels that realise it.
///
/// `path` is empty when tracing failed or the branch is a self-loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedBranch {
    /// The branch endpoints after simplification.
    pub branch: Branch,
    /// Pixel chain from `branch.start` to `branch.end`.
    pub path: Vec<Pixel>,
}

/// Everything one outer reduction iteration saw and produced.
#[derive(Debug, Clone)]
pub struct ReductionSnapshot {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// The re-thinned mask the iteration started from.
    pub skeleton: BinaryMask,
    /// `skeleton` with every surviving vertex neighbourhood cleared.
    pub disconnected: BinaryMask,
    /// Raw branch count reported by the summarizer.
    pub branches_before: usize,
    /// Surviving branches with their traced paths.
    pub traced: Vec<TracedBranch>,
    /// Whether simplification changed the branch count.
    pub changed: bool,
}

impl ReductionSnapshot {
    /// Branch count after simplification.
    #[must_use]
    pub fn branches_after(&self) -> usize {
        self.traced.len()
    }

    /// Branches whose trace came back empty (failed or self-loop).
    #[must_use]
    pub fn failed_traces(&self) -> usize {
        self.traced.iter().filter(|t| t.path.is_empty()).count()
    }

    /// Mask of every pixel on a traced path.
    #[must_use]
    pub fn traced_mask(&self) -> BinaryMask {
        let mut mask = BinaryMask::new(self.skeleton.width(), self.skeleton.height());
        for pixel in self.traced.iter().flat_map(|t| &t.path) {
            mask.set(*pixel, true);
        }
        mask
    }
}

/// Result of a full reduction run.
#[derive(Debug, Clone)]
pub struct ReductionOutcome {
    /// Union of the final iteration's traced paths.
    pub skeleton: BinaryMask,
    /// Final edges keyed by endpoint pair.
    pub edges: EdgeDictionary,
    /// One snapshot per outer iteration, in order.
    pub snapshots: Vec<ReductionSnapshot>,
    /// `false` when the iteration cap stopped the run.
    pub converged: bool,
}

/// Drop dead ends and merge pass-through vertices until neither applies.
///
/// A vertex's degree is the number of branch endpoints on it, so a
/// self-loop counts twice. Degree-1 vertices lose their branch. A
/// degree-2 vertex with two distinct branches to two distinct far
/// endpoints is replaced by a single branch between those far endpoints.
/// Any other degree-2 configuration is deferred: left as it is unless a
/// later change touches it again.
///
/// Vertices are visited smallest first, and a vertex is revisited only
/// when one of its branches changes, so the result is the same as
/// rescanning every vertex in order after each modification.
#[must_use]
pub fn simplify_branches(branches: Vec<Branch>) -> Vec<Branch> {
    let mut reducer = DegreeReducer::new(branches);
    reducer.run();
    reducer.into_branches()
}

/// Branch set with an incrementally maintained vertex incidence map.
struct DegreeReducer {
    slots: Vec<Option<Branch>>,
    incidence: BTreeMap<Pixel, Vec<usize>>,
}

impl DegreeReducer {
    fn new(branches: Vec<Branch>) -> Self {
        let mut reducer = Self {
            slots: Vec::with_capacity(branches.len()),
            incidence: BTreeMap::new(),
        };
        for branch in branches {
            reducer.attach(branch);
        }
        reducer
    }

    fn attach(&mut self, branch: Branch) {
        let index = self.slots.len();
        self.slots.push(Some(branch));
        self.incidence.entry(branch.start).or_default().push(index);
        self.incidence.entry(branch.end).or_default().push(index);
    }

    fn detach(&mut self, index: usize) -> Option<Branch> {
        let branch = self.slots.get_mut(index)?.take()?;
        for endpoint in [branch.start, branch.end] {
            if let Some(incident) = self.incidence.get_mut(&endpoint) {
                if let Some(pos) = incident.iter().position(|&i| i == index) {
                    incident.swap_remove(pos);
                }
                if incident.is_empty() {
                    self.incidence.remove(&endpoint);
                }
            }
        }
        Some(branch)
    }

    fn branch(&self, index: usize) -> Option<Branch> {
        self.slots.get(index).copied().flatten()
    }

    fn run(&mut self) {
        let mut pending: BTreeSet<Pixel> = self
            .incidence
            .iter()
            .filter(|(_, incident)| incident.len() <= 2)
            .map(|(&vertex, _)| vertex)
            .collect();

        while let Some(vertex) = pending.pop_first() {
            let incident = match self.incidence.get(&vertex) {
                Some(incident) => incident.clone(),
                None => continue,
            };
            match incident.as_slice() {
                &[index] => {
                    if let Some(removed) = self.detach(index) {
                        debug!(vertex = %vertex, "dropping dead-end branch");
                        if let Some(far) = removed.opposite(vertex) {
                            pending.insert(far);
                        }
                    }
                }
                &[first, second] => {
                    if let Some(merged) = self.merge_at(vertex, first, second) {
                        pending.insert(merged.start);
                        pending.insert(merged.end);
                    }
                }
                _ => {}
            }
        }
    }

    /// Merge the two branches meeting at `vertex`, or defer.
    fn merge_at(&mut self, vertex: Pixel, first: usize, second: usize) -> Option<Branch> {
        let far = |index| {
            self.branch(index)
                .filter(|b| !b.is_self_loop())
                .and_then(|b| b.opposite(vertex))
        };
        let (p, q) = match (first != second, far(first), far(second)) {
            (true, Some(p), Some(q)) if p != q => (p, q),
            _ => {
                warn!(
                    vertex = %vertex,
                    "deferring merge: branches do not join two distinct endpoints"
                );
                return None;
            }
        };
        self.detach(first);
        self.detach(second);
        let merged = Branch::new(p, q);
        debug!(vertex = %vertex, start = %p, end = %q, "merging pass-through vertex");
        self.attach(merged);
        Some(merged)
    }

    fn into_branches(self) -> Vec<Branch> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Clear every branch endpoint and its skeleton neighbours from a copy
/// of `skeleton`.
#[must_use]
pub fn disconnect_vertices(skeleton: &BinaryMask, branches: &[Branch]) -> BinaryMask {
    let mut work = skeleton.clone();
    for endpoint in branches.iter().flat_map(|b| [b.start, b.end]) {
        work.set(endpoint, false);
        for neighbour in neighbors(endpoint, skeleton) {
            work.set(neighbour, false);
        }
    }
    work
}

/// Run one outer reduction iteration on `mask`.
pub fn reduce_once<T, S>(
    mask: &BinaryMask,
    thinner: &T,
    summarizer: &S,
    iteration: usize,
) -> ReductionSnapshot
where
    T: Thinner + ?Sized,
    S: BranchSummarizer + ?Sized,
{
    let skeleton = thinner.thin(mask);
    let raw = summarizer.summarize(&skeleton);
    let branches_before = raw.len();
    let branches = simplify_branches(raw);
    let changed = branches_before != branches.len();

    let disconnected = disconnect_vertices(&skeleton, &branches);
    let mut work = disconnected.clone();
    let traced = branches
        .into_iter()
        .map(|branch| {
            let path = if branch.is_self_loop() {
                warn!(vertex = %branch.start, "skipping self-loop branch");
                Vec::new()
            } else {
                match trace_edge(&mut work, &skeleton, branch.start, branch.end) {
                    Ok(path) => path,
                    Err(err) => {
                        warn!(%err, "trace failed; recording empty path");
                        Vec::new()
                    }
                }
            };
            TracedBranch { branch, path }
        })
        .collect();

    ReductionSnapshot {
        iteration,
        skeleton,
        disconnected,
        branches_before,
        traced,
        changed,
    }
}

/// Build the edge dictionary from traced branches.
///
/// Self-loops, failed traces and repeated endpoint pairs are left out;
/// the first branch for a pair wins.
#[must_use]
pub fn edge_dictionary(traced: &[TracedBranch]) -> EdgeDictionary {
    let mut edges = EdgeDictionary::new();
    for TracedBranch { branch, path } in traced {
        let edge = Edge::new(branch.start, branch.end);
        match edges.insert(edge, path.clone()) {
            Ok(()) => {}
            Err(Rejected::SelfLoop) => {
                warn!(vertex = %branch.start, "excluding self-loop edge");
            }
            Err(Rejected::EmptyPath) => {
                debug!(start = %branch.start, end = %branch.end, "excluding untraced edge");
            }
            Err(Rejected::Duplicate) => {
                debug!(start = %branch.start, end = %branch.end, "excluding duplicate edge");
            }
        }
    }
    edges
}

/// Reduce `skeleton` with the configured thinner and the default
/// summarizer.
///
/// # Errors
///
/// Returns [`PipelineError::NoBranches`] when the skeleton is blank,
/// summarizes to no branches, or reduces to no traceable edges.
pub fn reduce(
    skeleton: &BinaryMask,
    config: &PipelineConfig,
) -> Result<ReductionOutcome, PipelineError> {
    reduce_with(
        skeleton,
        &config.thinner,
        &PixelGraphSummarizer,
        config.max_reduction_iterations,
    )
}

/// Reduce `skeleton` with explicit collaborators.
///
/// # Errors
///
/// See [`reduce`].
pub fn reduce_with<T, S>(
    skeleton: &BinaryMask,
    thinner: &T,
    summarizer: &S,
    max_iterations: usize,
) -> Result<ReductionOutcome, PipelineError>
where
    T: Thinner + ?Sized,
    S: BranchSummarizer + ?Sized,
{
    if skeleton.is_blank() {
        return Err(PipelineError::NoBranches);
    }

    let mut mask = skeleton.clone();
    let mut snapshots: Vec<ReductionSnapshot> = Vec::new();
    let mut converged = false;

    for iteration in 0..max_iterations {
        let snapshot = reduce_once(&mask, thinner, summarizer, iteration);
        info!(
            iteration,
            before = snapshot.branches_before,
            after = snapshot.branches_after(),
            failed = snapshot.failed_traces(),
            "reduction pass"
        );
        if iteration == 0 && snapshot.branches_before == 0 {
            return Err(PipelineError::NoBranches);
        }

        let next = snapshot.traced_mask();
        let changed = snapshot.changed;
        snapshots.push(snapshot);

        if !changed {
            converged = true;
            break;
        }
        if next == mask {
            debug!(iteration, "traced paths reproduce the input mask; stopping");
            converged = true;
            break;
        }
        mask = next;
    }

    if !converged {
        warn!(max_iterations, "reduction stopped at the iteration cap");
    }

    let Some(last) = snapshots.last() else {
        return Err(PipelineError::NoBranches);
    };
    let edges = edge_dictionary(&last.traced);
    if edges.is_empty() {
        return Err(PipelineError::NoBranches);
    }

    Ok(ReductionOutcome {
        skeleton: last.traced_mask(),
        edges,
        snapshots,
        converged,
    })
}
