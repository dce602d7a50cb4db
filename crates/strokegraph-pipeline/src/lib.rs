//! strokegraph-pipeline: Pure document-graph pipeline (sans-IO).
//!
//! Turns a scanned document into a graph of stroke segments and labels
//! every edge at a junction as either a *bridge* (two strokes merely
//! touch) or a *link* (one stroke continues through):
//! decode -> binarize -> ridge extraction -> iterative graph reduction
//! -> junction scoring -> greedy label assignment.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! byte slices and returns structured data; file handling and rendering
//! live in `strokegraph-export` and `strokegraph-bench`.

pub mod angle;
pub mod classify;
pub mod diagnostics;
pub mod graph;
pub mod mask;
pub mod neighborhood;
pub mod pipeline;
pub mod preprocess;
pub mod reduce;
pub mod score;
pub mod summary;
pub mod thin;
pub mod trace;
pub mod types;

pub use classify::Classification;
pub use graph::{Edge, EdgeDictionary};
pub use mask::BinaryMask;
pub use pipeline::{Pipeline, PipelineStage, StagedResult};
pub use reduce::{ReductionOutcome, ReductionSnapshot};
pub use score::{JunctionScorer, JunctionScorerKind};
pub use summary::{Branch, BranchSummarizer, PixelGraphSummarizer};
pub use thin::{Thinner, ThinnerKind};
pub use types::{
    Dimensions, GrayImage, Label, Pixel, PipelineConfig, PipelineError, ProcessResult, RgbImage,
};

/// Run the full pipeline on an encoded document image.
///
/// Edge coordinates in the result refer to the padded working frame
/// described by [`ProcessResult::dimensions`].
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an unusable config,
/// [`PipelineError::EmptyInput`] or [`PipelineError::ImageDecode`] for
/// unreadable input, and [`PipelineError::NoBranches`] when the document
/// yields no classifiable graph.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    let staged = process_staged(image_bytes, config)?;
    Ok(ProcessResult {
        edges: staged.reduction.edges,
        classification: staged.classification,
        dimensions: staged.dimensions,
    })
}

/// Run the full pipeline and keep every intermediate.
///
/// # Errors
///
/// See [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    Pipeline::new(image_bytes.to_vec(), config.clone()).complete()
}

/// Reduce and classify an already thinned skeleton mask.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] for an unusable config and
/// [`PipelineError::NoBranches`] when the skeleton reduces to nothing.
pub fn classify_skeleton(
    skeleton: &BinaryMask,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let outcome = reduce::reduce(skeleton, config)?;
    let classification = classify::classify(&outcome.edges, config);
    Ok(ProcessResult {
        edges: outcome.edges,
        classification,
        dimensions: skeleton.dimensions(),
    })
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::grid_document_png;

    fn framed_cross() -> BinaryMask {
        BinaryMask::from_fn(30, 30, |p| {
            let on_line = |v: usize| v == 2 || v == 12 || v == 22;
            let in_span = |v: usize| (2..=22).contains(&v);
            (on_line(p.row) && in_span(p.col)) || (on_line(p.col) && in_span(p.row))
        })
    }

    #[test]
    fn process_empty_input() {
        let result = process(&[], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn process_corrupt_input() {
        let result = process(&[0xFF, 0x00], &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::ImageDecode(_))));
    }

    #[test]
    fn process_grid_document_labels_junction_edges() {
        let result = process(&grid_document_png(), &PipelineConfig::default()).unwrap();
        assert!(!result.edges.is_empty());
        assert!(!result.edges.junctions().is_empty());
        assert!(!result.classification.bridges.is_empty());
        let pad = 2 * (PipelineConfig::DEFAULT_BORDER_PADDING + 1);
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 49 + pad,
                height: 49 + pad,
            }
        );
    }

    #[test]
    fn classify_skeleton_labels_a_framed_cross() {
        let result = classify_skeleton(&framed_cross(), &PipelineConfig::default()).unwrap();
        assert_eq!(result.edges.len(), 8);
        assert_eq!(result.edges.junctions().len(), 5);
        assert!(result.classification.triples_scored > 0);
        assert!(!result.classification.bridges.is_empty());
        let (bridges, links, unlabeled) = result.classification.counts(&result.edges);
        assert_eq!(bridges + links + unlabeled, 8);
    }

    #[test]
    fn classify_skeleton_validates_config() {
        let config = PipelineConfig {
            ring_radius: 0,
            ..PipelineConfig::default()
        };
        let result = classify_skeleton(&framed_cross(), &config);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn classify_skeleton_rejects_blank_mask() {
        let result = classify_skeleton(&BinaryMask::new(10, 10), &PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::NoBranches)));
    }
}
