use crate::coords::Rect;
use crate::paint::Color;

use super::Vertex;

/// Texture coordinates of a textured quad, in corner order.
pub const TEXTURED_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Vertices of a flat-colored quad: top-left, top-right, bottom-right, bottom-left.
pub fn colored_quad(rect: Rect, color: Color) -> [Vertex; 4] {
    let color = color.to_normalized();
    rect.corners().map(|c| Vertex {
        position: [c.x, c.y, 0.0],
        color,
        tex_coords: [0.0, 0.0],
        tex_slot: Vertex::NO_TEXTURE,
    })
}

/// Vertices of a quad sampling the texture bound to `slot`.
///
/// The vertex color is opaque white so the texel passes through unchanged.
pub fn textured_quad(rect: Rect, slot: u32) -> [Vertex; 4] {
    let corners = rect.corners();
    std::array::from_fn(|i| Vertex {
        position: [corners[i].x, corners[i].y, 0.0],
        color: [1.0; 4],
        tex_coords: TEXTURED_UVS[i],
        tex_slot: slot as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colored_corners_run_clockwise_from_top_left() {
        let q = colored_quad(Rect::new(10.0, 20.0, 30.0, 40.0), Color::rgba(255, 0, 0, 255));
        let positions: Vec<[f32; 3]> = q.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[10.0, 20.0, 0.0], [40.0, 20.0, 0.0], [40.0, 60.0, 0.0], [10.0, 60.0, 0.0]]
        );
        assert!(q.iter().all(|v| v.color == [1.0, 0.0, 0.0, 1.0]));
        assert!(q.iter().all(|v| v.tex_slot == Vertex::NO_TEXTURE));
    }

    #[test]
    fn textured_quad_carries_slot_and_uvs() {
        let q = textured_quad(Rect::new(0.0, 0.0, 8.0, 8.0), 3);
        assert!(q.iter().all(|v| v.tex_slot == 3.0));
        let uvs: Vec<[f32; 2]> = q.iter().map(|v| v.tex_coords).collect();
        assert_eq!(uvs, TEXTURED_UVS.to_vec());
    }
}
