//! JSON export of the final edge dictionary and its labels.

use serde::Serialize;
use strokegraph_pipeline::{Classification, Dimensions, EdgeDictionary, Label, Pixel};

use crate::ExportError;

#[derive(Serialize)]
struct EdgeDocument<'a> {
    width: u32,
    height: u32,
    edges: Vec<EdgeRecord<'a>>,
}

#[derive(Serialize)]
struct EdgeRecord<'a> {
    u: Pixel,
    v: Pixel,
    label: Label,
    path: &'a [Pixel],
}

/// Serialize every edge with its endpoints, label, and traced path.
///
/// Pixels are written as `[row, col]` pairs. Edges appear in dictionary
/// order.
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(
    edges: &EdgeDictionary,
    classification: &Classification,
    dimensions: Dimensions,
) -> Result<String, ExportError> {
    let document = EdgeDocument {
        width: dimensions.width,
        height: dimensions.height,
        edges: edges
            .iter()
            .map(|(edge, path)| EdgeRecord {
                u: edge.u,
                v: edge.v,
                label: classification.label(*edge),
                path,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}
