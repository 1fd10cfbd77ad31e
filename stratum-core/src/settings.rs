/// Knobs of a composite pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Reject layers with opacity outside `[0, 1]` instead of clamping.
    /// Non-finite opacity is always rejected.
    pub strict_opacity: bool,
}
impl Default for Settings {
    /// Fail fast in debug builds, clamp in release.
    fn default() -> Self {
        Self {
            strict_opacity: cfg!(debug_assertions),
        }
    }
}
