use crate::gfx::{ShaderSource, UniformDecl, UniformKind, TEX_SLOT_CAPACITY};

/// Batch program. Vertex inputs follow [`Vertex::LAYOUT`](super::Vertex::LAYOUT).
pub const QUAD_WGSL: &str = include_str!("shaders/quad.wgsl");

pub(crate) const WORLD_UNIFORM: &str = "world";
pub(crate) const TEXTURES_UNIFORM: &str = "textures";

const QUAD_UNIFORMS: [UniformDecl; 2] = [
    UniformDecl::new(WORLD_UNIFORM, UniformKind::Mat4),
    UniformDecl::array(TEXTURES_UNIFORM, UniformKind::Int, TEX_SLOT_CAPACITY as u32),
];

pub fn quad_shader() -> ShaderSource<'static> {
    ShaderSource {
        label: "slate quad shader",
        wgsl: QUAD_WGSL,
        uniforms: &QUAD_UNIFORMS,
    }
}
