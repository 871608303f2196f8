use core::ops::Add;

/// 2D vector in logical pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Component-wise equality within `tolerance` (inclusive).
    #[inline]
    pub fn approx_eq(self, other: Vec2, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_accepts_values_within_tolerance() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(1.05, 1.95);
        assert!(a.approx_eq(b, 0.1));
    }

    #[test]
    fn approx_eq_rejects_values_outside_tolerance() {
        let a = Vec2::new(1.0, 2.0);
        assert!(!a.approx_eq(Vec2::new(1.5, 2.0), 0.1));
        assert!(!a.approx_eq(Vec2::new(1.0, 2.5), 0.1));
    }

    #[test]
    fn approx_eq_is_true_for_identical_vectors() {
        let v = Vec2::new(-3.25, 8.5);
        assert!(v.approx_eq(v, 0.0));
    }

    #[test]
    fn addition_is_component_wise() {
        assert_eq!(Vec2::new(2.0, 4.0) + Vec2::new(1.0, -1.0), Vec2::new(3.0, 3.0));
    }
}
