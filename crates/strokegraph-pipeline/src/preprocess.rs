//! Document front end: decode, binarize, pad, and extract the ridge
//! skeleton that graph reduction starts from.
//!
//! Ridges are the local maxima of the distance from each paper pixel to
//! the nearest ink pixel. Only the largest 4-connected ridge component
//! is kept before thinning.

use std::collections::HashMap;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use crate::mask::BinaryMask;
use crate::thin::Thinner;
use crate::types::{Pixel, PipelineError};

/// Squared Euclidean distance of every pixel to the nearest ink pixel.
pub type DistanceMap = ImageBuffer<Luma<f64>, Vec<f64>>;

/// Two-point sample offsets `(d_row, d_col)`. A pixel is a ridge pixel
/// when it is strictly greater than both samples of at least one pair.
const RIDGE_KERNELS: [[(isize, isize); 2]; 6] = [
    [(-2, 1), (2, -1)],
    [(-2, -1), (2, 1)],
    [(-2, 0), (2, 0)],
    [(1, -2), (-1, 2)],
    [(-1, -2), (1, 2)],
    [(0, -2), (0, 2)],
];

/// Decode raw image bytes and convert to grayscale.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty and
/// [`PipelineError::ImageDecode`] if the data is not a decodable image.
#[must_use = "returns the decoded grayscale image"]
pub fn decode(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Otsu binarization: pixels brighter than the Otsu level are paper
/// (`true`), the rest are ink.
#[must_use]
pub fn binarize(gray: &GrayImage) -> BinaryMask {
    let level = otsu_level(gray);
    debug!(level, "Otsu threshold computed");
    let mut mask = BinaryMask::new(gray.width() as usize, gray.height() as usize);
    for (x, y, pixel) in gray.enumerate_pixels() {
        mask.set(Pixel::new(y as usize, x as usize), pixel.0[0] > level);
    }
    mask
}

/// Surround the document with `border` paper pixels, then a one-pixel
/// ink frame.
#[must_use]
pub fn pad(binary: &BinaryMask, border: u32) -> BinaryMask {
    let border = border as usize;
    let offset = border + 1;
    let width = binary.width() + 2 * offset;
    let height = binary.height() + 2 * offset;
    BinaryMask::from_fn(width, height, |p| {
        let in_frame = p.row == 0 || p.col == 0 || p.row == height - 1 || p.col == width - 1;
        if in_frame {
            return false;
        }
        let inner = p.row >= offset
            && p.col >= offset
            && p.row < offset + binary.height()
            && p.col < offset + binary.width();
        !inner || binary.get(Pixel::new(p.row - offset, p.col - offset))
    })
}

/// Squared distance from each pixel to the nearest ink (`false`) pixel.
#[must_use]
pub fn distance_to_ink(binary: &BinaryMask) -> DistanceMap {
    let dims = binary.dimensions();
    let ink = GrayImage::from_fn(dims.width, dims.height, |x, y| {
        Luma([u8::from(!binary.get(Pixel::new(y as usize, x as usize))) * 255])
    });
    euclidean_squared_distance_transform(&ink)
}

/// Directional local maxima of a distance map.
#[must_use]
pub fn local_maxima(distance: &DistanceMap) -> BinaryMask {
    let width = distance.width() as usize;
    let height = distance.height() as usize;
    let sample = |p: Pixel| -> Option<f64> {
        let x = u32::try_from(p.col).ok()?;
        let y = u32::try_from(p.row).ok()?;
        (x < distance.width() && y < distance.height()).then(|| distance.get_pixel(x, y).0[0])
    };
    BinaryMask::from_fn(width, height, |p| {
        let Some(value) = sample(p) else {
            return false;
        };
        RIDGE_KERNELS.iter().any(|pair| {
            pair.iter().all(|&(dr, dc)| {
                p.offset(dr, dc)
                    .and_then(sample)
                    .is_none_or(|neighbour| value > neighbour)
            })
        })
    })
}

/// Keep only the largest 4-connected foreground component.
///
/// Equal-sized components are resolved in favour of the one whose first
/// pixel comes first in row-major order.
#[must_use]
pub fn largest_component(mask: &BinaryMask) -> BinaryMask {
    let labels = connected_components(&mask.to_gray(), Connectivity::Four, Luma([0u8]));

    let mut sizes: HashMap<u32, usize> = HashMap::new();
    let mut first_seen: Vec<u32> = Vec::new();
    for pixel in labels.pixels() {
        let label = pixel.0[0];
        if label == 0 {
            continue;
        }
        let size = sizes.entry(label).or_insert(0);
        if *size == 0 {
            first_seen.push(label);
        }
        *size += 1;
    }

    let mut best: Option<(u32, usize)> = None;
    for label in first_seen {
        let size = sizes.get(&label).copied().unwrap_or(0);
        if best.is_none_or(|(_, s)| size > s) {
            best = Some((label, size));
        }
    }
    debug!(
        components = sizes.len(),
        largest = best.map_or(0, |(_, s)| s),
        "ridge components labelled"
    );

    let Some((keep, _)) = best else {
        return BinaryMask::new(mask.width(), mask.height());
    };
    BinaryMask::from_fn(mask.width(), mask.height(), |p| {
        let (Ok(x), Ok(y)) = (u32::try_from(p.col), u32::try_from(p.row)) else {
            return false;
        };
        labels.get_pixel(x, y).0[0] == keep
    })
}

/// Intermediate results of ridge extraction.
#[derive(Debug, Clone)]
pub struct Ridges {
    /// All directional maxima of the distance map.
    pub maxima: BinaryMask,
    /// The largest maxima component, thinned.
    pub skeleton: BinaryMask,
}

/// Extract the thinned ridge skeleton of a padded binary document.
#[must_use]
pub fn extract_ridges<T: Thinner + ?Sized>(padded: &BinaryMask, thinner: &T) -> Ridges {
    let distance = distance_to_ink(padded);
    let maxima = local_maxima(&distance);
    let component = largest_component(&maxima);
    let skeleton = thinner.thin(&component);
    debug!(
        maxima = maxima.count(),
        component = component.count(),
        skeleton = skeleton.count(),
        "ridges extracted"
    );
    Ridges { maxima, skeleton }
}
