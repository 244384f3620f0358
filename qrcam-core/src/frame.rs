//! Reusable RGBA pixel buffer that video frames are copied into

use crate::error::{QrCamError, QrCamResult};

const BYTES_PER_PIXEL: usize = 4;

/// RGBA8 pixel buffer with fixed dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Row-major RGBA data
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::byte_len(width, height)],
        }
    }

    /// Wrap existing RGBA data, checking its length
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> QrCamResult<Self> {
        let expected = Self::byte_len(width, height);
        if data.len() != expected {
            return Err(QrCamError::InvalidFrameData {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable RGBA bytes, for surfaces drawing a frame in place
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy a full RGBA frame into the buffer
    pub fn copy_from_rgba(&mut self, rgba: &[u8]) -> QrCamResult<()> {
        if rgba.len() != self.data.len() {
            return Err(QrCamError::InvalidFrameData {
                expected: self.data.len(),
                actual: rgba.len(),
            });
        }
        self.data.copy_from_slice(rgba);
        Ok(())
    }

    /// Fill every pixel with one RGBA value
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for pixel in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&rgba);
        }
    }

    /// Rec. 601 luma of the pixel at `(x, y)`, 0 when out of bounds
    pub fn luma(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let r = self.data[offset] as u32;
        let g = self.data[offset + 1] as u32;
        let b = self.data[offset + 2] as u32;
        ((r * 299 + g * 587 + b * 114) / 1000) as u8
    }
}
