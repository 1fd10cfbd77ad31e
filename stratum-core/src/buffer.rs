//! # Buffers
//!
//! Owned raster storage for layer content, masks, and the composite. Both kinds of buffer
//! may be zero-sized, in which case every sample is out of bounds.

use crate::color::Rgba;
use crate::error::BufferMismatch;
use az::CheckedAs;

/// Convert a signed coordinate into an index along an axis of length `len`.
fn axis_index(v: i64, len: u32) -> Option<usize> {
    let v = v.checked_as::<u32>()?;
    (v < len).then_some(v as usize)
}

/// Row-major RGBA raster of premultiplied pixels.
#[derive(Clone, PartialEq, Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}
impl PixelBuffer {
    /// A fully transparent buffer.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, Rgba::TRANSPARENT)
    }
    #[must_use]
    pub fn new_filled(width: u32, height: u32, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }
    /// A buffer with no pixels.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(0, 0)
    }
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> Result<Self, BufferMismatch> {
        let expected = width as usize * height as usize;
        if pixels.len() == expected {
            Ok(Self {
                width,
                height,
                pixels,
            })
        } else {
            Err(BufferMismatch::DataLength {
                expected,
                actual: pixels.len(),
            })
        }
    }
    /// Decode tightly packed 8-bit straight-alpha RGBA.
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, BufferMismatch> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(BufferMismatch::DataLength {
                expected,
                actual: data.len(),
            });
        }
        // Length is a multiple of four, checked above.
        let pixels = bytemuck::cast_slice::<u8, [u8; 4]>(data)
            .iter()
            .copied()
            .map(Rgba::from_rgba8)
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
    /// Encode as tightly packed 8-bit straight-alpha RGBA.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|px| px.to_rgba8()).collect()
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[must_use]
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }
    /// Iterate rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Rgba]> + '_ {
        // chunks_exact panics on zero, and a zero-width buffer has no rows worth visiting.
        self.pixels.chunks_exact(self.width.max(1) as usize)
    }
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }
    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut Rgba> {
        if x < self.width && y < self.height {
            Some(&mut self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }
    /// Read a pixel by signed coordinate, transparent if out of bounds.
    #[must_use]
    pub fn sample(&self, x: i64, y: i64) -> Rgba {
        match (axis_index(x, self.width), axis_index(y, self.height)) {
            (Some(x), Some(y)) => self.pixels[y * self.width as usize + x],
            _ => Rgba::TRANSPARENT,
        }
    }
    /// Read a pixel of a buffer positioned with its top-left at `offset` in canvas space.
    #[must_use]
    pub fn sample_at(&self, offset: [i32; 2], x: u32, y: u32) -> Rgba {
        self.sample(
            i64::from(x) - i64::from(offset[0]),
            i64::from(y) - i64::from(offset[1]),
        )
    }
    /// Build a new buffer of the given size by evaluating `f` at every coordinate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> Rgba) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// Single channel 8-bit grayscale raster.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MaskBuffer {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}
impl MaskBuffer {
    /// Largest sample value, meaning "fully revealed".
    pub const MAX_SAMPLE: u8 = u8::MAX;
    #[must_use]
    pub fn new_filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }
    pub fn from_luma8(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, BufferMismatch> {
        let expected = width as usize * height as usize;
        if samples.len() == expected {
            Ok(Self {
                width,
                height,
                samples,
            })
        } else {
            Err(BufferMismatch::DataLength {
                expected,
                actual: samples.len(),
            })
        }
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[must_use]
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }
    #[must_use]
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        (x < self.width && y < self.height)
            .then(|| self.samples[y as usize * self.width as usize + x as usize])
    }
    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut u8> {
        if x < self.width && y < self.height {
            Some(&mut self.samples[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }
    /// Read a sample by signed coordinate, zero if out of bounds.
    #[must_use]
    pub fn sample(&self, x: i64, y: i64) -> u8 {
        match (axis_index(x, self.width), axis_index(y, self.height)) {
            (Some(x), Some(y)) => self.samples[y * self.width as usize + x],
            _ => 0,
        }
    }
}
