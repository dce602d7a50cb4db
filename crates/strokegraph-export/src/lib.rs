//! strokegraph-export: Pure serializers for classified stroke graphs (sans-IO)
//!
//! Converts an [`EdgeDictionary`](strokegraph_pipeline::EdgeDictionary)
//! and its [`Classification`](strokegraph_pipeline::Classification) into
//! a JSON document, an SVG overlay, or RGB rasters encoded as PNG.
//! Reduction snapshots render to per-iteration rasters.

pub mod json;
pub mod raster;
pub mod svg;

pub use json::to_json;
pub use raster::{
    SnapshotImages, encode_png, render_classification, render_edges, render_mask, render_overlay,
    render_snapshot,
};
pub use svg::{SvgMetadata, to_svg};

use strokegraph_pipeline::Label;

/// Errors raised while serializing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),

    /// JSON serialization failed.
    #[error("failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Drawing colour for an edge label as RGB.
#[must_use]
pub const fn label_rgb(label: Label) -> [u8; 3] {
    match label {
        Label::Bridge => [255, 0, 0],
        Label::Link => [0, 255, 0],
        Label::Unlabeled => [0, 0, 255],
    }
}

/// Drawing colour for an edge label as an SVG hex string.
#[must_use]
pub const fn label_hex(label: Label) -> &'static str {
    match label {
        Label::Bridge => "#ff0000",
        Label::Link => "#00ff00",
        Label::Unlabeled => "#0000ff",
    }
}

/// Labels in drawing order.
pub const DRAW_ORDER: [Label; 3] = [Label::Bridge, Label::Link, Label::Unlabeled];
