use std::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::gfx::{AttributeFormat, VertexAttribute, VertexLayout};

/// Interleaved quad vertex (40 bytes).
///
///  offset  0  position    [f32; 3]   loc 0
///  offset 12  color       [f32; 4]   loc 1
///  offset 28  tex_coords  [f32; 2]   loc 2
///  offset 36  tex_slot    f32        loc 3
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    /// Normalized RGBA.
    pub color: [f32; 4],
    pub tex_coords: [f32; 2],
    /// Texture slot, or [`Vertex::NO_TEXTURE`] to use `color`.
    pub tex_slot: f32,
}

impl Vertex {
    pub const NO_TEXTURE: f32 = -1.0;

    const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute {
            location: 0,
            format: AttributeFormat::Float32x3,
            offset: offset_of!(Vertex, position) as u32,
        },
        VertexAttribute {
            location: 1,
            format: AttributeFormat::Float32x4,
            offset: offset_of!(Vertex, color) as u32,
        },
        VertexAttribute {
            location: 2,
            format: AttributeFormat::Float32x2,
            offset: offset_of!(Vertex, tex_coords) as u32,
        },
        VertexAttribute {
            location: 3,
            format: AttributeFormat::Float32,
            offset: offset_of!(Vertex, tex_slot) as u32,
        },
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: size_of::<Vertex>() as u32,
        attributes: &Self::ATTRIBUTES,
    };

    #[inline]
    pub fn is_textured(&self) -> bool {
        self.tex_slot >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(size_of::<Vertex>(), 40);
        let offsets: Vec<u32> = Vertex::LAYOUT.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 28, 36]);
        assert!(Vertex::LAYOUT.is_consistent());
    }

    #[test]
    fn sentinel_slot_is_untextured() {
        let v = Vertex { tex_slot: Vertex::NO_TEXTURE, ..Default::default() };
        assert!(!v.is_textured());
        assert!(Vertex { tex_slot: 0.0, ..v }.is_textured());
    }
}
