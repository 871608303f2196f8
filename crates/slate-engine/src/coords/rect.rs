use super::Vec2;

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    /// Corners in quad emission order: top-left, top-right, bottom-right,
    /// bottom-left.
    ///
    /// No normalization is applied; a negative extent mirrors the quad.
    #[inline]
    pub fn corners(self) -> [Vec2; 4] {
        let min = self.min();
        let max = self.max();
        [
            Vec2::new(min.x, min.y),
            Vec2::new(max.x, min.y),
            Vec2::new(max.x, max.y),
            Vec2::new(min.x, max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── corners ───────────────────────────────────────────────────────────

    #[test]
    fn corners_are_clockwise_from_top_left() {
        let c = r(10.0, 20.0, 30.0, 40.0).corners();
        assert_eq!(c[0], Vec2::new(10.0, 20.0));
        assert_eq!(c[1], Vec2::new(40.0, 20.0));
        assert_eq!(c[2], Vec2::new(40.0, 60.0));
        assert_eq!(c[3], Vec2::new(10.0, 60.0));
    }

    #[test]
    fn corners_of_negative_extent_are_not_normalized() {
        let c = r(10.0, 10.0, -5.0, 5.0).corners();
        assert_eq!(c[1], Vec2::new(5.0, 10.0));
    }

    #[test]
    fn max_is_origin_plus_size() {
        assert_eq!(r(1.0, 2.0, 3.0, 4.0).max(), Vec2::new(4.0, 6.0));
    }
}
