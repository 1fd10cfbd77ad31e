//! # Blend
//!
//! Blend modes as a closed set of pure color functions, and the single "over" framework they all
//! plug into. Formulas follow the W3C compositing and blending model, evaluated on premultiplied
//! pixels.

use crate::color::Rgba;

#[derive(
    strum::AsRefStr,
    strum::EnumString,
    strum::Display,
    PartialEq,
    Eq,
    strum::EnumIter,
    Copy,
    Clone,
    Hash,
    Debug,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    /// Linear dodge, clamped at white.
    Add,
    Subtract,
    Average,
    Negation,
    Hue,
    Saturation,
    Color,
    Luminosity,
}
impl Default for BlendMode {
    fn default() -> Self {
        Self::Normal
    }
}

/// Per-channel blend function, `(source, backdrop) -> result`, all straight color in `[0, 1]`.
pub type ChannelFn = fn(f32, f32) -> f32;

impl BlendMode {
    /// The per-channel function of a separable mode, or `None` for the
    /// non-separable modes which need the whole color at once.
    #[must_use]
    pub fn channel_fn(self) -> Option<ChannelFn> {
        Some(match self {
            Self::Normal => channel::normal,
            Self::Multiply => channel::multiply,
            Self::Screen => channel::screen,
            Self::Overlay => channel::overlay,
            Self::Darken => channel::darken,
            Self::Lighten => channel::lighten,
            Self::ColorDodge => channel::color_dodge,
            Self::ColorBurn => channel::color_burn,
            Self::HardLight => channel::hard_light,
            Self::SoftLight => channel::soft_light,
            Self::Difference => channel::difference,
            Self::Exclusion => channel::exclusion,
            Self::Add => channel::add,
            Self::Subtract => channel::subtract,
            Self::Average => channel::average,
            Self::Negation => channel::negation,
            Self::Hue | Self::Saturation | Self::Color | Self::Luminosity => return None,
        })
    }
    #[must_use]
    pub fn is_separable(self) -> bool {
        self.channel_fn().is_some()
    }
    /// `B(Cb, Cs)`: mix a straight source color onto a straight backdrop color.
    #[must_use]
    pub fn blend_color(self, src: [f32; 3], dst: [f32; 3]) -> [f32; 3] {
        if let Some(f) = self.channel_fn() {
            return [f(src[0], dst[0]), f(src[1], dst[1]), f(src[2], dst[2])];
        }
        match self {
            Self::Hue => nonseparable::set_lum(
                nonseparable::set_sat(src, nonseparable::sat(dst)),
                nonseparable::lum(dst),
            ),
            Self::Saturation => nonseparable::set_lum(
                nonseparable::set_sat(dst, nonseparable::sat(src)),
                nonseparable::lum(dst),
            ),
            Self::Color => nonseparable::set_lum(src, nonseparable::lum(dst)),
            Self::Luminosity => nonseparable::set_lum(dst, nonseparable::lum(src)),
            // Separable modes returned above.
            _ => unreachable!(),
        }
    }
}

/// Blend mode for an object, including a mode, opacity modulate, and alpha clip
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Blend {
    pub mode: BlendMode,
    pub opacity: f32,
    /// If alpha clip enabled, it should not affect background alpha, krita style!
    pub alpha_clip: bool,
}
impl Default for Blend {
    fn default() -> Self {
        Self {
            mode: BlendMode::default(),
            opacity: 1.0,
            alpha_clip: false,
        }
    }
}
impl Blend {
    /// Plain Porter-Duff over at full strength. What the bottommost visible layer is forced to.
    pub const OPAQUE_NORMAL: Self = Self {
        mode: BlendMode::Normal,
        opacity: 1.0,
        alpha_clip: false,
    };
}

/// Composite one premultiplied source pixel onto a premultiplied backdrop pixel.
///
/// `src` must already carry every alpha multiplier (opacity, mask coverage).
/// A fully transparent source leaves the backdrop untouched, bit for bit.
#[must_use]
pub fn over(src: Rgba, dst: Rgba, mode: BlendMode, alpha_clip: bool) -> Rgba {
    let sa = src.a;
    if sa <= 0.0 {
        return dst;
    }
    let da = dst.a;
    let inv_sa = 1.0 - sa;

    if mode == BlendMode::Normal && !alpha_clip {
        // Literal Porter-Duff.
        return Rgba::new(
            src.r + dst.r * inv_sa,
            src.g + dst.g * inv_sa,
            src.b + dst.b * inv_sa,
            sa + da * inv_sa,
        );
    }

    // Where there is no backdrop the mix term vanishes, skip the divisions.
    let mixed = if da <= 0.0 {
        [0.0; 3]
    } else {
        mode.blend_color(src.color(), dst.color())
    };
    let both = sa * da;
    let src_only = if alpha_clip { 0.0 } else { 1.0 - da };
    let channel = |s: f32, m: f32, d: f32| s * src_only + both * m + d * inv_sa;
    Rgba::new(
        channel(src.r, mixed[0], dst.r),
        channel(src.g, mixed[1], dst.g),
        channel(src.b, mixed[2], dst.b),
        if alpha_clip { da } else { sa + da * inv_sa },
    )
}

/// Separable blend functions, `(source, backdrop)`.
pub mod channel {
    #[must_use]
    pub fn normal(cs: f32, _cb: f32) -> f32 {
        cs
    }
    #[must_use]
    pub fn multiply(cs: f32, cb: f32) -> f32 {
        cs * cb
    }
    #[must_use]
    pub fn screen(cs: f32, cb: f32) -> f32 {
        cb + cs - cb * cs
    }
    #[must_use]
    pub fn overlay(cs: f32, cb: f32) -> f32 {
        hard_light(cb, cs)
    }
    #[must_use]
    pub fn darken(cs: f32, cb: f32) -> f32 {
        cs.min(cb)
    }
    #[must_use]
    pub fn lighten(cs: f32, cb: f32) -> f32 {
        cs.max(cb)
    }
    #[must_use]
    pub fn color_dodge(cs: f32, cb: f32) -> f32 {
        if cb <= 0.0 {
            0.0
        } else if cs >= 1.0 {
            1.0
        } else {
            (cb / (1.0 - cs)).min(1.0)
        }
    }
    #[must_use]
    pub fn color_burn(cs: f32, cb: f32) -> f32 {
        if cb >= 1.0 {
            1.0
        } else if cs <= 0.0 {
            0.0
        } else {
            1.0 - ((1.0 - cb) / cs).min(1.0)
        }
    }
    #[must_use]
    pub fn hard_light(cs: f32, cb: f32) -> f32 {
        if cs <= 0.5 {
            multiply(2.0 * cs, cb)
        } else {
            screen(2.0 * cs - 1.0, cb)
        }
    }
    #[must_use]
    pub fn soft_light(cs: f32, cb: f32) -> f32 {
        if cs <= 0.5 {
            cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
        } else {
            let d = if cb <= 0.25 {
                ((16.0 * cb - 12.0) * cb + 4.0) * cb
            } else {
                cb.sqrt()
            };
            cb + (2.0 * cs - 1.0) * (d - cb)
        }
    }
    #[must_use]
    pub fn difference(cs: f32, cb: f32) -> f32 {
        (cb - cs).abs()
    }
    #[must_use]
    pub fn exclusion(cs: f32, cb: f32) -> f32 {
        cb + cs - 2.0 * cb * cs
    }
    #[must_use]
    pub fn add(cs: f32, cb: f32) -> f32 {
        (cb + cs).min(1.0)
    }
    #[must_use]
    pub fn subtract(cs: f32, cb: f32) -> f32 {
        (cb - cs).max(0.0)
    }
    #[must_use]
    pub fn average(cs: f32, cb: f32) -> f32 {
        (cb + cs) * 0.5
    }
    #[must_use]
    pub fn negation(cs: f32, cb: f32) -> f32 {
        1.0 - (1.0 - cb - cs).abs()
    }
}

/// Helpers for the Hue/Saturation/Color/Luminosity family.
mod nonseparable {
    pub fn lum([r, g, b]: [f32; 3]) -> f32 {
        0.3 * r + 0.59 * g + 0.11 * b
    }
    fn clip_color(c: [f32; 3]) -> [f32; 3] {
        let l = lum(c);
        let n = c[0].min(c[1]).min(c[2]);
        let x = c[0].max(c[1]).max(c[2]);
        let mut c = c;
        if n < 0.0 {
            c = c.map(|v| l + (v - l) * l / (l - n));
        }
        if x > 1.0 {
            c = c.map(|v| l + (v - l) * (1.0 - l) / (x - l));
        }
        c
    }
    pub fn set_lum(c: [f32; 3], l: f32) -> [f32; 3] {
        let d = l - lum(c);
        clip_color(c.map(|v| v + d))
    }
    pub fn sat(c: [f32; 3]) -> f32 {
        c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
    }
    pub fn set_sat(c: [f32; 3], s: f32) -> [f32; 3] {
        let max = c[0].max(c[1]).max(c[2]);
        let min = c[0].min(c[1]).min(c[2]);
        if max > min {
            c.map(|v| (v - min) * s / (max - min))
        } else {
            [0.0; 3]
        }
    }
}
