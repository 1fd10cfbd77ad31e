//! # Adjustments
//!
//! An adjustment layer reads the composite of everything beneath it and returns a transformed
//! copy. The compositor then decides how much of that copy to keep, by opacity, mask, and blend
//! mode. Adjustments are pure: same inputs, same output, no captured mutable state.

use std::sync::Arc;

use crate::buffer::PixelBuffer;
use crate::color::Rgba;

/// Read-only view of the adjustment layer being applied.
#[derive(Copy, Clone, Debug)]
pub struct AdjustmentContext<'a> {
    /// The layer's own content, may be empty.
    pub content: &'a PixelBuffer,
    /// Canvas position of `content`.
    pub offset: [i32; 2],
    pub canvas: [u32; 2],
}
impl AdjustmentContext<'_> {
    /// Alpha of the layer's own content at canvas `(x, y)`, zero outside it.
    #[must_use]
    pub fn coverage(&self, x: i64, y: i64) -> f32 {
        self.content
            .sample(x - i64::from(self.offset[0]), y - i64::from(self.offset[1]))
            .a
    }
}

pub trait Adjustment: Send + Sync + std::fmt::Debug {
    /// Transform `backdrop`. Must return a buffer of `ctx.canvas` size.
    fn apply(&self, ctx: &AdjustmentContext<'_>, backdrop: &PixelBuffer) -> PixelBuffer;
}

pub type AdjustmentRef = Arc<dyn Adjustment>;

/// Apply a per-pixel function to every pixel of the backdrop.
fn map_pixels(backdrop: &PixelBuffer, f: impl Fn(Rgba) -> Rgba) -> PixelBuffer {
    let mut out = backdrop.clone();
    out.pixels_mut().iter_mut().for_each(|px| *px = f(*px));
    out
}

/// Invert straight color, keeping alpha.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Invert;
impl Adjustment for Invert {
    fn apply(&self, _: &AdjustmentContext<'_>, backdrop: &PixelBuffer) -> PixelBuffer {
        // Premultiplied `1 - c` is `a - c*a`.
        map_pixels(backdrop, |px| Rgba::new(px.a - px.r, px.a - px.g, px.a - px.b, px.a))
    }
}

/// Shift each straight color channel, clamping into `[0, 1]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ColorBalance {
    pub shift: [f32; 3],
}
impl Adjustment for ColorBalance {
    fn apply(&self, _: &AdjustmentContext<'_>, backdrop: &PixelBuffer) -> PixelBuffer {
        map_pixels(backdrop, |px| {
            if px.a <= 0.0 {
                return px;
            }
            let [r, g, b] = px.color();
            let shift = |c: f32, by: f32| (c + by).clamp(0.0, 1.0);
            Rgba::from_straight([
                shift(r, self.shift[0]),
                shift(g, self.shift[1]),
                shift(b, self.shift[2]),
                px.a,
            ])
        })
    }
}

/// Replace color with its Rec. 601 luma.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Desaturate;
impl Adjustment for Desaturate {
    fn apply(&self, _: &AdjustmentContext<'_>, backdrop: &PixelBuffer) -> PixelBuffer {
        map_pixels(backdrop, |px| {
            // Linear in the channels, so it can be taken on premultiplied values directly.
            let luma = 0.299 * px.r + 0.587 * px.g + 0.114 * px.b;
            Rgba::new(luma, luma, luma, px.a)
        })
    }
}

/// Shade the backdrop as if embossed by the layer's own content.
///
/// The content's alpha is a height field. Its central-difference normal is lit by a directional
/// light, and backdrop color is scaled by how much brighter or darker that is than flat ground.
/// Where the content is flat, in or out of a glyph, the backdrop is left as-is, so a text layer
/// makes a watermark.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BumpMap {
    /// Light direction around the z axis, radians. Zero lights from +x.
    pub azimuth: f32,
    /// Light angle above the canvas plane, radians, in `(0, pi/2]`.
    pub elevation: f32,
    /// Height field scale. Larger is a deeper emboss.
    pub depth: f32,
}
impl Default for BumpMap {
    fn default() -> Self {
        Self {
            azimuth: std::f32::consts::FRAC_PI_4 * 3.0,
            elevation: std::f32::consts::FRAC_PI_6,
            depth: 2.0,
        }
    }
}
impl BumpMap {
    /// Brightness multiplier at canvas `(x, y)`. Exactly `1.0` on flat ground.
    fn shade(&self, ctx: &AdjustmentContext<'_>, x: u32, y: u32) -> f32 {
        let (x, y) = (i64::from(x), i64::from(y));
        let dx = (ctx.coverage(x + 1, y) - ctx.coverage(x - 1, y)) * 0.5 * self.depth;
        let dy = (ctx.coverage(x, y + 1) - ctx.coverage(x, y - 1)) * 0.5 * self.depth;
        if dx == 0.0 && dy == 0.0 {
            return 1.0;
        }
        let flat = self.elevation.sin();
        if flat <= 0.0 {
            return 1.0;
        }
        let light = [
            self.azimuth.cos() * self.elevation.cos(),
            self.azimuth.sin() * self.elevation.cos(),
            flat,
        ];
        let len = (dx * dx + dy * dy + 1.0).sqrt();
        let lit = (-dx * light[0] - dy * light[1] + light[2]) / len;
        lit.max(0.0) / flat
    }
}
impl Adjustment for BumpMap {
    fn apply(&self, ctx: &AdjustmentContext<'_>, backdrop: &PixelBuffer) -> PixelBuffer {
        let [width, height] = ctx.canvas;
        PixelBuffer::from_fn(width, height, |x, y| {
            let px = backdrop.get(x, y).unwrap_or(Rgba::TRANSPARENT);
            let shade = self.shade(ctx, x, y);
            if shade == 1.0 {
                return px;
            }
            // Scale premultiplied color, which may not exceed alpha.
            let lit = |c: f32| (c * shade).clamp(0.0, px.a);
            Rgba::new(lit(px.r), lit(px.g), lit(px.b), px.a)
        })
    }
}
