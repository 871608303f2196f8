/// 4×4 matrix stored as 16 floats in column-major order.
///
/// This is the layout shaders expect for `mat4x4<f32>`, so the raw array can
/// be uploaded without transposition.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4([f32; 16]);

impl Mat4 {
    #[inline]
    pub const fn identity() -> Self {
        Self([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Orthographic projection mapping the box
    /// `[left, right] × [bottom, top] × [near, far]` to clip space.
    ///
    /// Passing `bottom > top` flips Y so that +Y points down the screen.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let lr = 1.0 / (left - right);
        let bt = 1.0 / (bottom - top);
        let nf = 1.0 / (near - far);

        let mut m = Self::identity();
        m.0[0] = -2.0 * lr;
        m.0[5] = -2.0 * bt;
        m.0[10] = 2.0 * nf;
        m.0[12] = (left + right) * lr;
        m.0[13] = (top + bottom) * bt;
        m.0[14] = (near + far) * nf;
        m
    }

    #[inline]
    fn element(&self, column: usize, row: usize) -> f32 {
        self.0[column * 4 + row]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32; 16] {
        &self.0
    }

    /// Multiplies the column vector `v` by this matrix.
    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = (0..4).map(|col| self.element(col, row) * v[col]).sum();
        }
        out
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn identity_leaves_points_unchanged() {
        let p = [3.0, -2.0, 0.5, 1.0];
        assert_eq!(Mat4::identity().transform(p), p);
    }

    #[test]
    fn screen_ortho_maps_top_left_to_upper_left_clip_corner() {
        let m = Mat4::orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);
        assert!(close(m.transform([0.0, 0.0, 0.0, 1.0]), [-1.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn screen_ortho_maps_bottom_right_to_lower_right_clip_corner() {
        let m = Mat4::orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);
        assert!(close(m.transform([640.0, 480.0, 0.0, 1.0]), [1.0, -1.0, 0.0, 1.0]));
    }

    #[test]
    fn screen_ortho_maps_center_to_origin() {
        let m = Mat4::orthographic(0.0, 200.0, 100.0, 0.0, -1.0, 1.0);
        assert!(close(m.transform([100.0, 50.0, 0.0, 1.0]), [0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn storage_is_column_major() {
        let m = Mat4::orthographic(0.0, 2.0, 2.0, 0.0, -1.0, 1.0);
        // Translation lives in the last column.
        assert_eq!(m.as_slice()[12], m.element(3, 0));
        assert_eq!(m.as_slice()[12], -1.0);
        assert_eq!(m.as_slice()[15], 1.0);
    }
}
