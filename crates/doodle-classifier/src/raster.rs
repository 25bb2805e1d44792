//! Sketch rasters
//!
//! The canvas hands over RGBA pixels; the model only looks at ink coverage,
//! which lives in the alpha channel.

use crate::error::ClassifierError;
use serde::{Deserialize, Serialize};

/// RGBA pixel buffer captured from the drawing surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA, 4 bytes per pixel
    pub data: Vec<u8>,
}

impl Raster {
    /// Create a raster
    #[inline]
    #[must_use]
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Fully transparent raster of the given size
    ///
    /// Dimensions whose buffer size overflows `usize` get an empty buffer,
    /// which [`Raster::alpha_channel`] then rejects.
    #[must_use]
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0; byte_len(width, height).unwrap_or(0)])
    }

    /// Number of pixels, or `None` if it overflows `usize`
    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> Option<usize> {
        pixel_count(self.width, self.height)
    }

    /// Extract the alpha channel as a single-channel image
    ///
    /// # Errors
    /// `ClassifierError::MalformedRaster` if the buffer length is not
    /// `width * height * 4`, or if that size does not fit in `usize`
    /// (reported as `expected: usize::MAX`).
    pub fn alpha_channel(&self) -> Result<GrayImage, ClassifierError> {
        let actual = self.data.len();
        match byte_len(self.width, self.height) {
            Some(expected) if expected == actual => {}
            expected => {
                return Err(ClassifierError::MalformedRaster {
                    expected: expected.unwrap_or(usize::MAX),
                    actual,
                })
            }
        }

        let pixels = self.data.chunks_exact(4).map(|px| px[3]).collect();
        Ok(GrayImage {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}

/// Single-channel image fed to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl GrayImage {
    /// Count of pixels with any ink
    #[must_use]
    pub fn inked_pixels(&self) -> usize {
        self.pixels.iter().filter(|&&p| p > 0).count()
    }
}

fn pixel_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

fn byte_len(width: u32, height: u32) -> Option<usize> {
    pixel_count(width, height)?.checked_mul(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_channel_takes_every_fourth_byte() {
        let raster = Raster::new(2, 1, vec![9, 9, 9, 0, 1, 2, 3, 255]);
        let gray = raster.alpha_channel().unwrap();
        assert_eq!(gray.pixels, vec![0, 255]);
        assert_eq!(gray.inked_pixels(), 1);
    }

    #[test]
    fn alpha_channel_rejects_short_buffer() {
        let raster = Raster::new(2, 2, vec![0; 15]);
        assert_eq!(
            raster.alpha_channel(),
            Err(ClassifierError::MalformedRaster {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn alpha_channel_rejects_overflowing_dimensions() {
        let raster = Raster::new(u32::MAX, u32::MAX, vec![0; 4]);
        assert_eq!(
            raster.alpha_channel(),
            Err(ClassifierError::MalformedRaster {
                expected: usize::MAX,
                actual: 4
            })
        );
        assert_eq!(Raster::new(3, 2, Vec::new()).pixel_count(), Some(6));
    }

    #[test]
    fn blank_raster_has_no_ink() {
        let gray = Raster::blank(28, 28).alpha_channel().unwrap();
        assert_eq!(gray.pixels.len(), 784);
        assert_eq!(gray.inked_pixels(), 0);
    }
}
