use super::Mat4;

/// Viewport size in logical pixels.
///
/// The batch projection maps `(0, 0)` to the top-left corner and
/// `(width, height)` to the bottom-right corner of the surface.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Orthographic projection for this viewport: +Y down, near = -1, far = 1.
    #[inline]
    pub fn projection(self) -> Mat4 {
        Mat4::orthographic(0.0, self.width, self.height, 0.0, -1.0, 1.0)
    }
}
