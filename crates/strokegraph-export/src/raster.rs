//! Raster renderings of a classified graph and of reduction snapshots.
//!
//! Each edge path is painted pixel by pixel in its label colour, in
//! [`DRAW_ORDER`]. A path pixel lands on black canvas in its own colour;
//! a pixel that is already lit (by an earlier path, or by ink in the
//! overlay) turns white, so crossings and overlaps stand out.

use image::{DynamicImage, ImageEncoder, Rgb, RgbImage};
use strokegraph_pipeline::{
    BinaryMask, Classification, Dimensions, EdgeDictionary, Pixel, ReductionSnapshot,
};

use crate::{DRAW_ORDER, ExportError, label_rgb};

const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Paint every labelled edge of `edges` onto `canvas`.
fn paint_edges(canvas: &mut RgbImage, edges: &EdgeDictionary, classification: &Classification) {
    for label in DRAW_ORDER {
        let colour = Rgb(label_rgb(label));
        for (edge, path) in edges.iter() {
            if classification.label(*edge) != label {
                continue;
            }
            paint_path(canvas, path, colour);
        }
    }
}

fn paint_path(canvas: &mut RgbImage, path: &[Pixel], colour: Rgb<u8>) {
    for &p in path {
        let (Ok(x), Ok(y)) = (u32::try_from(p.col), u32::try_from(p.row)) else {
            continue;
        };
        if x < canvas.width() && y < canvas.height() {
            let lit = *canvas.get_pixel(x, y) != BLACK;
            canvas.put_pixel(x, y, if lit { WHITE } else { colour });
        }
    }
}

/// Distinct colour for the `index`-th path of a rendering.
///
/// Channels stay within 50..=200 so paths read against both the black
/// background and the white overlap marker. Colours repeat after 151
/// paths.
fn path_colour(index: usize) -> Rgb<u8> {
    let channel = |step: usize, offset: usize| {
        let value = (index * step + offset) % 151 + 50;
        u8::try_from(value).unwrap_or(u8::MAX)
    };
    Rgb([channel(67, 0), channel(101, 50), channel(139, 100)])
}

fn paint_paths<'a>(
    dimensions: Dimensions,
    paths: impl IntoIterator<Item = &'a [Pixel]>,
) -> RgbImage {
    let mut canvas = RgbImage::new(dimensions.width, dimensions.height);
    for (index, path) in paths.into_iter().enumerate() {
        paint_path(&mut canvas, path, path_colour(index));
    }
    canvas
}

/// Edge paths in label colours on a black background.
#[must_use]
pub fn render_classification(
    edges: &EdgeDictionary,
    classification: &Classification,
    dimensions: Dimensions,
) -> RgbImage {
    let mut canvas = RgbImage::new(dimensions.width, dimensions.height);
    paint_edges(&mut canvas, edges, classification);
    canvas
}

/// Edge paths drawn over the binary document.
///
/// Ink is shown white and paper black, so the coloured ridge paths stand
/// out against the strokes they run between.
#[must_use]
pub fn render_overlay(
    edges: &EdgeDictionary,
    classification: &Classification,
    binary: &BinaryMask,
) -> RgbImage {
    let Dimensions { width, height } = binary.dimensions();
    let mut canvas = RgbImage::from_fn(width, height, |x, y| {
        let paper = binary.get(Pixel::new(y as usize, x as usize));
        if paper { BLACK } else { WHITE }
    });
    paint_edges(&mut canvas, edges, classification);
    canvas
}

/// Every edge path in its own colour, ignoring labels.
#[must_use]
pub fn render_edges(edges: &EdgeDictionary, dimensions: Dimensions) -> RgbImage {
    paint_paths(dimensions, edges.iter().map(|(_, path)| path))
}

/// A binary mask as white foreground on black.
#[must_use]
pub fn render_mask(mask: &BinaryMask) -> RgbImage {
    DynamicImage::ImageLuma8(mask.to_gray()).to_rgb8()
}

/// The three images of one reduction iteration.
#[derive(Debug, Clone)]
pub struct SnapshotImages {
    /// The skeleton the iteration started from.
    pub skeleton: RgbImage,
    /// The skeleton with vertex neighbourhoods cleared.
    pub disconnected: RgbImage,
    /// Each traced branch in its own colour.
    pub traced: RgbImage,
}

/// Render one reduction iteration.
#[must_use]
pub fn render_snapshot(snapshot: &ReductionSnapshot) -> SnapshotImages {
    SnapshotImages {
        skeleton: render_mask(&snapshot.skeleton),
        disconnected: render_mask(&snapshot.disconnected),
        traced: paint_paths(
            snapshot.skeleton.dimensions(),
            snapshot.traced.iter().map(|t| t.path.as_slice()),
        ),
    }
}

/// Encode an RGB image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Png`] if encoding fails.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(buf)
}
