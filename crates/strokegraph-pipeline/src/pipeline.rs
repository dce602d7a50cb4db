//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! ```rust
//! # use strokegraph_pipeline::{Pipeline, PipelineConfig, PipelineError};
//! # fn run(png: Vec<u8>) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(png, PipelineConfig::default())
//!     .decode()?
//!     .extract_ridges()?
//!     .reduce()?
//!     .classify()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next state (or a
//! `Result` for fallible stages), carrying every earlier intermediate
//! along. Coordinates from [`Decoded`] onward refer to the padded
//! working frame, not the source image.

use crate::classify::Classification;
use crate::diagnostics::{IterationMetrics, StageMetrics};
use crate::graph::EdgeDictionary;
use crate::mask::BinaryMask;
use crate::preprocess::{self, Ridges};
use crate::reduce::ReductionOutcome;
use crate::types::{Dimensions, GrayImage, PipelineConfig, PipelineError};

/// Every intermediate of a completed pipeline run.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Decoded grayscale source image.
    pub grayscale: GrayImage,
    /// Binarized document with border padding (`true` is paper).
    pub binary: BinaryMask,
    /// Ridge maxima and the thinned skeleton.
    pub ridges: Ridges,
    /// Reduction snapshots and the final edge dictionary.
    pub reduction: ReductionOutcome,
    /// Bridge/link labels.
    pub classification: Classification,
    /// Size of the padded working frame.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// The final edge dictionary.
    #[must_use]
    pub const fn edges(&self) -> &EdgeDictionary {
        &self.reduction.edges
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing, call .decode() to continue"]
pub struct Pending {
    config: PipelineConfig,
    source: Vec<u8>,
}

impl Pending {
    /// Validate the config, decode, binarize and pad the document.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for an unusable config,
    /// [`PipelineError::EmptyInput`] if the source bytes are empty, and
    /// [`PipelineError::ImageDecode`] if they are not a decodable image.
    pub fn decode(self) -> Result<Decoded, PipelineError> {
        self.config.validate()?;
        let grayscale = preprocess::decode(&self.source)?;
        let binary = preprocess::pad(&preprocess::binarize(&grayscale), self.config.border_padding);
        Ok(Decoded {
            config: self.config,
            source_len: self.source.len(),
            grayscale,
            binary,
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding and binarization.
#[must_use = "pipeline stages are consumed by advancing, call .extract_ridges() to continue"]
pub struct Decoded {
    config: PipelineConfig,
    source_len: usize,
    grayscale: GrayImage,
    binary: BinaryMask,
}

impl Decoded {
    /// The decoded grayscale image.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// The padded binary document.
    #[must_use]
    pub const fn binary(&self) -> &BinaryMask {
        &self.binary
    }

    /// Extract the ridge skeleton.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoBranches`] when the document has no
    /// ridges at all.
    pub fn extract_ridges(self) -> Result<RidgesExtracted, PipelineError> {
        let ridges = preprocess::extract_ridges(&self.binary, &self.config.thinner);
        if ridges.skeleton.is_blank() {
            return Err(PipelineError::NoBranches);
        }
        Ok(RidgesExtracted {
            config: self.config,
            grayscale: self.grayscale,
            binary: self.binary,
            ridges,
        })
    }
}

// ───────────────────────── Stage 2: RidgesExtracted ──────────────────

/// Pipeline state after ridge extraction and thinning.
#[must_use = "pipeline stages are consumed by advancing, call .reduce() to continue"]
pub struct RidgesExtracted {
    config: PipelineConfig,
    grayscale: GrayImage,
    binary: BinaryMask,
    ridges: Ridges,
}

impl RidgesExtracted {
    /// The extracted ridges.
    #[must_use]
    pub const fn ridges(&self) -> &Ridges {
        &self.ridges
    }

    /// Reduce the skeleton to a graph of junctions.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoBranches`] when the skeleton has no
    /// branches or none survive reduction.
    pub fn reduce(self) -> Result<Reduced, PipelineError> {
        let reduction = crate::reduce::reduce(&self.ridges.skeleton, &self.config)?;
        Ok(Reduced {
            config: self.config,
            grayscale: self.grayscale,
            binary: self.binary,
            ridges: self.ridges,
            reduction,
        })
    }
}

// ───────────────────────── Stage 3: Reduced ──────────────────────────

/// Pipeline state after graph reduction.
#[must_use = "pipeline stages are consumed by advancing, call .classify() to continue"]
pub struct Reduced {
    config: PipelineConfig,
    grayscale: GrayImage,
    binary: BinaryMask,
    ridges: Ridges,
    reduction: ReductionOutcome,
}

impl Reduced {
    /// The reduction outcome, including per-iteration snapshots.
    #[must_use]
    pub const fn reduction(&self) -> &ReductionOutcome {
        &self.reduction
    }

    /// Score every junction and assign bridge/link labels.
    pub fn classify(self) -> Classified {
        let classification = crate::classify::classify(&self.reduction.edges, &self.config);
        Classified {
            config: self.config,
            grayscale: self.grayscale,
            binary: self.binary,
            ridges: self.ridges,
            reduction: self.reduction,
            classification,
        }
    }
}

// ───────────────────────── Stage 4: Classified ───────────────────────

/// Final pipeline state.
#[must_use = "call .into_result() to take the staged result"]
pub struct Classified {
    config: PipelineConfig,
    grayscale: GrayImage,
    binary: BinaryMask,
    ridges: Ridges,
    reduction: ReductionOutcome,
    classification: Classification,
}

impl Classified {
    /// The bridge/link labels.
    #[must_use]
    pub const fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Consume the pipeline and return every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = self.binary.dimensions();
        StagedResult {
            grayscale: self.grayscale,
            binary: self.binary,
            ridges: self.ridges,
            reduction: self.reduction,
            classification: self.classification,
            dimensions,
        }
    }
}

// ───────────────────────── Uniform stage access ──────────────────────

/// Number of pipeline stages, including [`Pending`].
pub const STAGE_COUNT: usize = 5;

/// Trait implemented by every pipeline stage.
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage.
    const NAME: &str;

    /// Zero-based index of this stage.
    const INDEX: usize;

    /// Stage-specific metrics, or `None` for [`Pending`].
    fn metrics(&self) -> Option<StageMetrics>;

    /// Run all remaining stages and return the [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    fn complete(self) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.decode()?.complete()
    }
}

impl PipelineStage for Decoded {
    const NAME: &str = "decode";
    const INDEX: usize = 1;

    fn metrics(&self) -> Option<StageMetrics> {
        let padded = self.binary.dimensions();
        Some(StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.grayscale.width(),
            height: self.grayscale.height(),
            padded_width: padded.width,
            padded_height: padded.height,
            paper_pixels: self.binary.count(),
        })
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.extract_ridges()?.complete()
    }
}

impl PipelineStage for RidgesExtracted {
    const NAME: &str = "ridges";
    const INDEX: usize = 2;

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::RidgeExtraction {
            maxima_pixels: self.ridges.maxima.count(),
            skeleton_pixels: self.ridges.skeleton.count(),
        })
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.reduce()?.complete()
    }
}

impl PipelineStage for Reduced {
    const NAME: &str = "reduce";
    const INDEX: usize = 3;

    fn metrics(&self) -> Option<StageMetrics> {
        let edges = &self.reduction.edges;
        Some(StageMetrics::Reduction {
            iterations: self
                .reduction
                .snapshots
                .iter()
                .map(|s| IterationMetrics {
                    iteration: s.iteration,
                    branches_before: s.branches_before,
                    branches_after: s.branches_after(),
                    failed_traces: s.failed_traces(),
                })
                .collect(),
            converged: self.reduction.converged,
            edge_count: edges.len(),
            vertex_count: edges.vertices().len(),
            junction_count: edges.junctions().len(),
        })
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.classify().into_result())
    }
}

impl PipelineStage for Classified {
    const NAME: &str = "classify";
    const INDEX: usize = 4;

    fn metrics(&self) -> Option<StageMetrics> {
        let (bridges, links, unlabeled) = self.classification.counts(&self.reduction.edges);
        Some(StageMetrics::Classification {
            scorer: format!("{:?}", self.config.scorer),
            triples_scored: self.classification.triples_scored,
            bridges,
            links,
            unlabeled,
        })
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Entry point for the staged pipeline.
pub struct Pipeline;

impl Pipeline {
    /// Store the source bytes and config; no processing happens until
    /// [`Pending::decode`].
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image_bytes: Vec<u8>, config: PipelineConfig) -> Pending {
        Pending {
            config,
            source: image_bytes,
        }
    }
}
