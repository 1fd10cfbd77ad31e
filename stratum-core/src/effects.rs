//! Area effects drawn around a shape, and how much margin they need.
//!
//! Only the geometry matters here. A render pass that draws a shape with effects allocates
//! [`AreaEffects::max_effect_thickness`] extra pixels on every side so nothing is clipped.

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Glow {
    pub width: f32,
}
/// Drawn inside the shape only, so it never needs margin.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct InnerGlow {
    pub width: f32,
}
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct NeonBorder {
    pub width: f32,
}
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct DropShadow {
    /// Blur spread.
    pub width: f32,
    /// Shadow displacement, `[x, y]`.
    pub offset: [f32; 2],
}
impl DropShadow {
    /// Extent along each axis.
    fn extents(&self) -> [u32; 2] {
        let spread = ceil_u32(3.0 + self.width.max(0.0) * 2.0);
        self.offset
            .map(|offset| spread.saturating_add(ceil_u32(offset.abs() * 2.0)))
    }
}

/// Non-negative ceiling. Negative and NaN become zero, huge values saturate.
fn ceil_u32(v: f32) -> u32 {
    // `as` saturates, and sends NaN to zero.
    v.max(0.0).ceil() as u32
}

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct AreaEffects {
    pub glow: Option<Glow>,
    pub inner_glow: Option<InnerGlow>,
    pub neon_border: Option<NeonBorder>,
    pub drop_shadow: Option<DropShadow>,
}
impl AreaEffects {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glow.is_none()
            && self.inner_glow.is_none()
            && self.neon_border.is_none()
            && self.drop_shadow.is_none()
    }
    /// The widest reach of any present effect past the shape's boundary, in pixels.
    #[must_use]
    pub fn max_effect_thickness(&self) -> u32 {
        let glow = self.glow.map_or(0, |glow| ceil_u32(glow.width));
        let neon = self.neon_border.map_or(0, |neon| ceil_u32(neon.width));
        let shadow = self.drop_shadow.map_or(0, |shadow| {
            let [x, y] = shadow.extents();
            x.max(y)
        });
        glow.max(neon).max(shadow)
    }
    /// `size` grown by the effect thickness on every side.
    #[must_use]
    pub fn padded_size(&self, [width, height]: [u32; 2]) -> [u32; 2] {
        let margin = self.max_effect_thickness().saturating_mul(2);
        [width.saturating_add(margin), height.saturating_add(margin)]
    }
}
