// Pixel grid and row sampling.
//
// `PixelGrid` is the decoder boundary: whatever color mode the source image
// uses (grayscale, palette, RGBA, 1-bit, 16-bit), it is flattened to 8-bit
// RGB once, here, and everything downstream reads plain `[u8; 3]` triples.
//
// `RowSampler` picks one horizontal line of the grid from a fractional
// position and exposes its pixels column by column. It is the only place
// that rejects empty grids, so no note is ever produced from one.

use crate::error::{InvalidInput, Result, SonifyError};
use image::DynamicImage;
use std::path::Path;

pub type Rgb = [u8; 3];

/// A read-only `width × height` grid of RGB triples, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Build a grid from row-major pixels. The pixel count must match the
    /// dimensions; zero-sized grids are allowed here and rejected on sampling.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(SonifyError::range(
                "pixels",
                format!(
                    "{} pixels supplied for a {width}x{height} grid ({expected} expected)",
                    pixels.len()
                ),
            ));
        }
        Ok(PixelGrid {
            width,
            height,
            pixels,
        })
    }

    /// Build a grid by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        PixelGrid {
            width,
            height,
            pixels,
        }
    }

    /// Normalize a decoded image of any color mode to 8-bit RGB.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|p| p.0).collect();
        PixelGrid {
            width,
            height,
            pixels,
        }
    }

    /// Decode an image file. The format is guessed from the extension.
    pub fn open(path: &Path) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::from_image(&img))
    }

    /// Decode an in-memory image, sniffing the format from its header.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(&img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the pixel at `(x, y)`. Panics when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Select the row at `fraction` of the grid height.
    pub fn sample_row(&self, fraction: f64) -> Result<RowSampler<'_>> {
        if self.width == 0 || self.height == 0 {
            return Err(InvalidInput::EmptyGrid {
                width: self.width,
                height: self.height,
            }
            .into());
        }
        Ok(RowSampler {
            grid: self,
            row: row_index(self.height, fraction),
        })
    }
}

/// `round(height × fraction)`, halves to even, clamped to `[0, height - 1]`.
///
/// `height` must be non-zero.
pub fn row_index(height: u32, fraction: f64) -> u32 {
    let row = (f64::from(height) * fraction).round_ties_even();
    // `as` maps NaN and negatives to 0.
    (row as u32).min(height - 1)
}

/// One horizontal line of a `PixelGrid`.
#[derive(Debug, Clone, Copy)]
pub struct RowSampler<'a> {
    grid: &'a PixelGrid,
    row: u32,
}

impl RowSampler<'_> {
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn width(&self) -> u32 {
        self.grid.width
    }

    pub fn pixel(&self, x: u32) -> Rgb {
        self.grid.pixel(x, self.row)
    }
}
