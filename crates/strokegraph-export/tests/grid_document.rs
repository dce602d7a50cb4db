//! Integration test: run a synthetic document through the full pipeline
//! and every exporter.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{GrayImage, Luma};
use strokegraph_pipeline::{Label, PipelineConfig};

/// White page with four black squares in a 2x2 layout.
fn grid_document_png() -> Vec<u8> {
    let ink = |v: u32| (6..20).contains(&v) || (29..43).contains(&v);
    let img = GrayImage::from_fn(49, 49, |x, y| {
        if ink(x) && ink(y) { Luma([0]) } else { Luma([255]) }
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::L8,
    )
    .unwrap();
    buf
}

#[test]
fn grid_document_pipeline_to_every_format() {
    let config = PipelineConfig::default();
    let staged = strokegraph_pipeline::process_staged(&grid_document_png(), &config)
        .expect("pipeline should succeed");
    let edges = staged.edges();
    assert!(!edges.is_empty());

    let json =
        strokegraph_export::to_json(edges, &staged.classification, staged.dimensions).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["edges"].as_array().unwrap().len(), edges.len());

    let config_json = serde_json::to_string(&config).unwrap();
    let metadata = strokegraph_export::SvgMetadata {
        title: Some("grid"),
        description: None,
        config_json: Some(&config_json),
    };
    let svg =
        strokegraph_export::to_svg(edges, &staged.classification, staged.dimensions, &metadata);
    assert!(svg.contains("<svg"));
    assert!(svg.contains("<path"));
    assert!(svg.contains("</svg>"));

    let overlay = strokegraph_export::render_overlay(edges, &staged.classification, &staged.binary);
    assert_eq!(overlay.width(), staged.dimensions.width);
    let bridge_pixels = overlay
        .pixels()
        .filter(|px| px.0 == strokegraph_export::label_rgb(Label::Bridge))
        .count();
    if staged.classification.bridges.is_empty() {
        assert_eq!(bridge_pixels, 0);
    }

    let plain =
        strokegraph_export::render_classification(edges, &staged.classification, staged.dimensions);
    let png = strokegraph_export::encode_png(&plain).unwrap();
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
}
