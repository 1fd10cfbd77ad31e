/// A premultiplied, linear RGBA pixel.
///
/// Every layer buffer and the composite itself are stored in this form, so "over" and
/// destination-in are plain multiply-adds over all four components.
#[repr(C)]
#[derive(Copy, Clone, PartialEq, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}
impl Rgba {
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Create from already-premultiplied channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    /// Create from straight (non-premultiplied) channels.
    #[must_use]
    pub fn from_straight([r, g, b, a]: [f32; 4]) -> Self {
        Self::new(r * a, g * a, b * a, a)
    }
    /// Create an opaque color from straight rgb.
    #[must_use]
    pub fn opaque([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b, 1.0)
    }
    /// Un-premultiply. Fully transparent pixels come back as transparent black.
    #[must_use]
    pub fn to_straight(self) -> [f32; 4] {
        if self.a <= 0.0 {
            [0.0; 4]
        } else {
            let [r, g, b] = self.color();
            [r, g, b, self.a]
        }
    }
    /// Straight rgb, or black if transparent.
    #[must_use]
    pub fn color(self) -> [f32; 3] {
        if self.a <= 0.0 {
            [0.0; 3]
        } else {
            let inv = 1.0 / self.a;
            [self.r * inv, self.g * inv, self.b * inv]
        }
    }
    /// Scale all four components. This is both "opacity" and destination-in against a coverage value.
    #[must_use]
    pub fn scale(self, by: f32) -> Self {
        Self::new(self.r * by, self.g * by, self.b * by, self.a * by)
    }
    /// Decode an 8-bit straight-alpha pixel.
    #[must_use]
    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        let norm = |v: u8| f32::from(v) / 255.0;
        Self::from_straight([norm(r), norm(g), norm(b), norm(a)])
    }
    /// Encode as an 8-bit straight-alpha pixel, rounding and clamping.
    #[must_use]
    pub fn to_rgba8(self) -> [u8; 4] {
        // `as` saturates, and sends NaN to zero.
        self.to_straight()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        bytemuck::cast(*self)
    }
}

#[cfg(test)]
mod test {
    use super::Rgba;
    #[test]
    fn straight_roundtrip() {
        let c = Rgba::from_straight([1.0, 0.5, 0.0, 0.5]);
        assert_eq!(c.as_array(), [0.5, 0.25, 0.0, 0.5]);
        assert_eq!(c.to_straight(), [1.0, 0.5, 0.0, 0.5]);
    }
    #[test]
    fn transparent_normalizes_to_black() {
        let c = Rgba::new(0.3, 0.3, 0.3, 0.0);
        assert_eq!(c.to_straight(), [0.0; 4]);
        assert_eq!(c.to_rgba8(), [0, 0, 0, 0]);
    }
    #[test]
    fn rgba8() {
        assert_eq!(Rgba::from_rgba8([255, 0, 0, 255]), Rgba::opaque([1.0, 0.0, 0.0]));
        assert_eq!(Rgba::from_rgba8([255, 128, 0, 255]).to_rgba8(), [255, 128, 0, 255]);
    }
}
