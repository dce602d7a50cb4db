//! SVG export serializer.
//!
//! Draws every edge of the reduced graph as a `<path>` coloured by its
//! label, on a black background, with vertices as white dots. Document
//! construction, XML escaping and path data formatting are handled by
//! the [`svg`] crate.
//!
//! Pixel `(row, col)` maps to SVG `(x, y) = (col, row)`.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Rectangle, Title};
use svg::node::{Node, Text, Value};

use strokegraph_pipeline::{Classification, Dimensions, EdgeDictionary, Label, Pixel};

use crate::{DRAW_ORDER, label_hex};

/// Radius of the vertex dots, in pixels.
const VERTEX_RADIUS: f64 = 1.5;

/// Metadata to embed in the SVG document.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized pipeline configuration, embedded inside `<metadata>`
    /// so exported files record the settings that produced them.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a pixel path.
///
/// Returns an empty string for paths with fewer than 2 pixels.
///
/// # Examples
///
/// ```
/// use strokegraph_pipeline::Pixel;
/// use strokegraph_export::svg::build_path_data;
///
/// let d = build_path_data(&[Pixel::new(2, 1), Pixel::new(3, 2)]);
/// assert_eq!(d, "M1,2 L2,3");
/// ```
#[must_use]
pub fn build_path_data(path: &[Pixel]) -> String {
    let Some((first, rest)) = path.split_first() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(xy(*first));
    for &p in rest {
        data = data.line_to(xy(p));
    }
    String::from(Value::from(data))
}

#[allow(clippy::cast_precision_loss)]
fn xy(p: Pixel) -> (f64, f64) {
    (p.col as f64, p.row as f64)
}

/// Serialize a classified edge dictionary into an SVG document string.
///
/// Edges are grouped by label and drawn bridges first, then links, then
/// unlabeled edges, so later groups paint over earlier ones where paths
/// overlap. Vertices are drawn last.
#[must_use]
pub fn to_svg(
    edges: &EdgeDictionary,
    classification: &Classification,
    dimensions: Dimensions,
    metadata: &SvgMetadata<'_>,
) -> String {
    let Dimensions { width, height } = dimensions;
    let mut doc = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0, 0, width, height));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("strokegraph:config");
        config_el.assign("xmlns:strokegraph", "https://github.com/strokegraph/strokegraph");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    doc = doc.add(
        Rectangle::new()
            .set("width", width)
            .set("height", height)
            .set("fill", "black"),
    );

    for label in DRAW_ORDER {
        let mut group = Group::new().set("id", group_id(label));
        for (edge, path) in edges.iter() {
            if classification.label(*edge) != label {
                continue;
            }
            let d = build_path_data(path);
            if d.is_empty() {
                continue;
            }
            group = group.add(
                Path::new()
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke", label_hex(label))
                    .set("stroke-width", 1),
            );
        }
        doc = doc.add(group);
    }

    let mut vertices = Group::new().set("id", "vertices").set("fill", "white");
    for vertex in edges.vertices() {
        let (cx, cy) = xy(vertex);
        vertices = vertices.add(
            Circle::new()
                .set("cx", cx)
                .set("cy", cy)
                .set("r", VERTEX_RADIUS),
        );
    }
    doc = doc.add(vertices);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

const fn group_id(label: Label) -> &'static str {
    match label {
        Label::Bridge => "bridges",
        Label::Link => "links",
        Label::Unlabeled => "unlabeled",
    }
}
