//! Shared types for the strokegraph pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Classification;
use crate::graph::EdgeDictionary;
use crate::score::JunctionScorerKind;
use crate::thin::ThinnerKind;

/// Re-export `GrayImage` so downstream crates can reference decoded
/// raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` for overlay rendering in downstream crates.
pub use image::RgbImage;

/// An integer `(row, col)` coordinate into a mask.
///
/// Ordering is row-major, which is the order every scan in the pipeline
/// follows. Serializes as a two-element `[row, col]` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Pixel {
    /// Row index (pixels from the top edge).
    pub row: usize,
    /// Column index (pixels from the left edge).
    pub col: usize,
}

impl Pixel {
    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The pixel at a signed offset from this one, or `None` if the
    /// offset would leave the non-negative quadrant.
    #[must_use]
    pub const fn offset(self, d_row: isize, d_col: isize) -> Option<Self> {
        match (
            self.row.checked_add_signed(d_row),
            self.col.checked_add_signed(d_col),
        ) {
            (Some(row), Some(col)) => Some(Self { row, col }),
            _ => None,
        }
    }

    /// Signed displacement `self - origin` as `(d_row, d_col)`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn delta_from(self, origin: Self) -> (i64, i64) {
        (
            self.row as i64 - origin.row as i64,
            self.col as i64 - origin.col as i64,
        )
    }

    /// Chebyshev (chessboard) distance to another pixel.
    #[must_use]
    pub const fn chebyshev(self, other: Self) -> usize {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        if dr > dc { dr } else { dc }
    }

    /// Whether `other` is one of the eight pixels surrounding `self`.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.chebyshev(other) == 1
    }
}

impl From<(usize, usize)> for Pixel {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl From<Pixel> for (usize, usize) {
    fn from(p: Pixel) -> Self {
        (p.row, p.col)
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels (number of columns).
    pub width: u32,
    /// Height in pixels (number of rows).
    pub height: u32,
}

/// Output of a pipeline run: the reduced graph and its edge labels.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// Final edges with their traced pixel paths.
    pub edges: EdgeDictionary,
    /// Bridge/link labels for `edges`.
    pub classification: Classification,
    /// Size of the frame the edge coordinates refer to.
    pub dimensions: Dimensions,
}

/// The role an edge plays at the junctions it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Two otherwise separate strokes merely touch through this edge.
    Bridge,
    /// A single stroke continues through the junction along this edge.
    Link,
    /// Never selected by any committed junction triple.
    Unlabeled,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bridge => "bridge",
            Self::Link => "link",
            Self::Unlabeled => "unlabeled",
        })
    }
}

/// Configuration for the graph reduction and junction classification
/// pipeline.
///
/// Call [`validate`](Self::validate) before use when the values come
/// from user input; the staged pipeline does so on its first fallible
/// step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Chebyshev radius of the square ring around a junction on which
    /// nearby direction samples are taken.
    pub ring_radius: usize,

    /// Which junction scoring strategy to use.
    pub scorer: JunctionScorerKind,

    /// Which thinning algorithm re-thins the mask at the start of each
    /// reduction iteration.
    pub thinner: ThinnerKind,

    /// Upper bound on outer reduction iterations.
    ///
    /// Reduction normally stops on its own when an iteration changes
    /// nothing; the cap only guards pathological inputs.
    pub max_reduction_iterations: usize,

    /// Width of the background border added around a decoded document
    /// before ridge extraction.
    pub border_padding: u32,
}

impl PipelineConfig {
    /// Default [`ring_radius`](Self::ring_radius).
    pub const DEFAULT_RING_RADIUS: usize = 7;
    /// Default [`max_reduction_iterations`](Self::max_reduction_iterations).
    pub const DEFAULT_MAX_REDUCTION_ITERATIONS: usize = 64;
    /// Default [`border_padding`](Self::border_padding).
    pub const DEFAULT_BORDER_PADDING: u32 = 29;

    /// Check that every field holds a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `ring_radius` or
    /// `max_reduction_iterations` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ring_radius == 0 {
            return Err(PipelineError::InvalidConfig(
                "ring_radius must be at least 1".to_string(),
            ));
        }
        if self.max_reduction_iterations == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_reduction_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ring_radius: Self::DEFAULT_RING_RADIUS,
            scorer: JunctionScorerKind::default(),
            thinner: ThinnerKind::default(),
            max_reduction_iterations: Self::DEFAULT_MAX_REDUCTION_ITERATIONS,
            border_padding: Self::DEFAULT_BORDER_PADDING,
        }
    }
}

/// Errors that abort a pipeline run for one image.
///
/// Per-branch anomalies (failed traces, self-loops, deferred merges) are
/// recovered inside the pipeline and only logged; they never surface
/// here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The skeleton is empty or reduces to a graph with no edges.
    #[error("nothing to classify: the skeleton has no branches")]
    NoBranches,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn offset_rejects_negative_coordinates() {
        let p = Pixel::new(0, 3);
        assert_eq!(p.offset(-1, 0), None);
        assert_eq!(p.offset(1, -3), Some(Pixel::new(1, 0)));
    }

    #[test]
    fn chebyshev_and_adjacency() {
        let p = Pixel::new(5, 5);
        assert_eq!(p.chebyshev(Pixel::new(8, 4)), 3);
        assert!(p.is_adjacent(Pixel::new(6, 6)));
        assert!(!p.is_adjacent(p));
        assert!(!p.is_adjacent(Pixel::new(7, 5)));
    }

    #[test]
    fn pixel_serializes_as_pair() {
        let json = serde_json::to_string(&Pixel::new(3, 9)).unwrap();
        assert_eq!(json, "[3,9]");
        let back: Pixel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Pixel::new(3, 9));
    }

    #[test]
    fn label_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Label::Bridge).unwrap(), "\"bridge\"");
        assert_eq!(Label::Unlabeled.to_string(), "unlabeled");
    }

    #[test]
    fn default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ring_radius_is_rejected() {
        let config = PipelineConfig {
            ring_radius: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_json_fills_missing_fields_with_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"ring_radius": 4}"#).unwrap();
        assert_eq!(config.ring_radius, 4);
        assert_eq!(
            config.max_reduction_iterations,
            PipelineConfig::DEFAULT_MAX_REDUCTION_ITERATIONS
        );
    }
}
