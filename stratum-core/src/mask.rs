//! # Masks
//!
//! A mask modulates its layer's alpha, never its color. Masks are owned by their layer and share
//! the layer content's addressable space; which layer a mask belongs to is always known from the
//! call site.

use std::borrow::Cow;

use crate::buffer::{MaskBuffer, PixelBuffer};
use crate::error::BufferMismatch;

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Mask {
    pub buffer: MaskBuffer,
    /// A disabled mask is kept but ignored.
    pub enabled: bool,
}
impl Mask {
    #[must_use]
    pub fn new(buffer: MaskBuffer) -> Self {
        Self {
            buffer,
            enabled: true,
        }
    }
    /// Alpha multiplier at canvas `(x, y)` for a mask whose top-left sits at `offset`.
    ///
    /// Disabled masks reveal everything, out of bounds samples reveal nothing.
    #[must_use]
    pub fn value_at(&self, offset: [i32; 2], x: u32, y: u32) -> f32 {
        if !self.enabled {
            return 1.0;
        }
        let sample = self.buffer.sample(
            i64::from(x) - i64::from(offset[0]),
            i64::from(y) - i64::from(offset[1]),
        );
        f32::from(sample) / f32::from(MaskBuffer::MAX_SAMPLE)
    }
}

/// Alpha multiplier of an optional mask. No mask reveals everything.
#[must_use]
pub fn mask_value(mask: Option<&Mask>, offset: [i32; 2], x: u32, y: u32) -> f32 {
    mask.map_or(1.0, |mask| mask.value_at(offset, x, y))
}

/// Check that a mask can be addressed in the same space as the content it belongs to.
///
/// Content-less layers place the mask by its own size.
pub fn check_size(layer: &str, content: &PixelBuffer, mask: &Mask) -> Result<(), BufferMismatch> {
    if content.is_empty() || mask.buffer.size() == content.size() {
        Ok(())
    } else {
        Err(BufferMismatch::MaskSize {
            layer: layer.to_owned(),
            mask: mask.buffer.size(),
            content: content.size(),
        })
    }
}

/// Render `content`, positioned at `content_offset`, into a canvas-sized buffer and
/// destination-in it against `mask`, positioned at `mask_offset`.
///
/// Content that is already exactly the canvas with no mask to apply is borrowed as-is.
#[must_use]
pub fn destination_in<'a>(
    content: &'a PixelBuffer,
    content_offset: [i32; 2],
    mask: Option<&Mask>,
    mask_offset: [i32; 2],
    canvas: [u32; 2],
) -> Cow<'a, PixelBuffer> {
    let mask = mask.filter(|mask| mask.enabled);
    if mask.is_none() && content_offset == [0, 0] && content.size() == canvas {
        return Cow::Borrowed(content);
    }
    let [width, height] = canvas;
    Cow::Owned(PixelBuffer::from_fn(width, height, |x, y| {
        let px = content.sample_at(content_offset, x, y);
        match mask {
            Some(mask) => px.scale(mask.value_at(mask_offset, x, y)),
            None => px,
        }
    }))
}
