//! Binary pixel masks: skeletons, ridge maps, and binarized documents.
//!
//! A [`BinaryMask`] is a dense row-major grid of booleans. Reads outside
//! the grid return `false` and writes outside it are ignored, so the
//! lattice code in the rest of the pipeline never has to special-case
//! border pixels.

use image::{GrayImage, Luma};

use crate::types::{Dimensions, Pixel};

/// A 2-D boolean grid; `true` marks a foreground (ridge) pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl BinaryMask {
    /// Create an all-background mask.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    /// Create a mask by evaluating `f` at every pixel.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(Pixel) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(Pixel::new(row, col)));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a mask from a grayscale image: non-zero pixels are foreground.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let data = image.pixels().map(|p| p.0[0] != 0).collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Render the mask as a grayscale image (foreground 255, background 0).
    #[must_use]
    pub fn to_gray(&self) -> GrayImage {
        let dims = self.dimensions();
        GrayImage::from_fn(dims.width, dims.height, |x, y| {
            Luma([if self.get(Pixel::new(y as usize, x as usize)) {
                255
            } else {
                0
            }])
        })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Mask size as image [`Dimensions`].
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: u32::try_from(self.width).unwrap_or(u32::MAX),
            height: u32::try_from(self.height).unwrap_or(u32::MAX),
        }
    }

    /// Whether `pixel` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, pixel: Pixel) -> bool {
        pixel.row < self.height && pixel.col < self.width
    }

    /// Value at `pixel`; `false` outside the grid.
    #[must_use]
    pub fn get(&self, pixel: Pixel) -> bool {
        self.contains(pixel) && self.data[pixel.row * self.width + pixel.col]
    }

    /// Set the value at `pixel`. Out-of-grid writes are ignored.
    pub fn set(&mut self, pixel: Pixel, value: bool) {
        if self.contains(pixel) {
            self.data[pixel.row * self.width + pixel.col] = value;
        }
    }

    /// Iterate over foreground pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(|(i, _)| Pixel::new(i / self.width, i % self.width))
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|set| **set).count()
    }

    /// Whether the mask has no foreground pixels.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        !self.data.contains(&true)
    }

    /// Build a mask from ASCII art: `#` is foreground, anything else is
    /// background. Rows shorter than the longest row are padded.
    #[cfg(any(test, feature = "test-util"))]
    pub fn from_ascii(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Self::from_fn(width, rows.len(), |p| {
            rows[p.row].as_bytes().get(p.col) == Some(&b'#')
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_blank() {
        let mask = BinaryMask::new(4, 3);
        assert!(mask.is_blank());
        assert_eq!(mask.count(), 0);
        assert_eq!(
            mask.dimensions(),
            Dimensions {
                width: 4,
                height: 3
            }
        );
    }

    #[test]
    fn out_of_bounds_reads_are_false_and_writes_ignored() {
        let mut mask = BinaryMask::new(2, 2);
        mask.set(Pixel::new(5, 5), true);
        assert!(!mask.get(Pixel::new(5, 5)));
        assert!(mask.is_blank());
    }

    #[test]
    fn pixels_are_row_major() {
        let mask = BinaryMask::from_ascii(&[".#.", "#..", "..#"]);
        let pixels: Vec<Pixel> = mask.pixels().collect();
        assert_eq!(
            pixels,
            vec![Pixel::new(0, 1), Pixel::new(1, 0), Pixel::new(2, 2)]
        );
    }

    #[test]
    fn gray_round_trip_preserves_foreground() {
        let mask = BinaryMask::from_ascii(&["##..", ".#..", "...#"]);
        let gray = mask.to_gray();
        assert_eq!(gray.width(), 4);
        assert_eq!(gray.height(), 3);
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);
        assert_eq!(gray.get_pixel(2, 1).0[0], 0);
        assert_eq!(BinaryMask::from_gray(&gray), mask);
    }
}
