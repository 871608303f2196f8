//! Batched quad rendering.
//!
//! Draw calls made between [`Renderer::begin_frame`] and
//! [`Renderer::end_frame`] are accumulated into a CPU-side
//! [`GeometryBuffer`] and submitted with a single indexed draw.

mod emit;
mod error;
mod geometry;
mod renderer;
mod shader;
mod slots;
mod vertex;

pub use emit::{colored_quad, textured_quad, TEXTURED_UVS};
pub use error::{BatchError, InitError, RenderError};
pub use geometry::{GeometryBuffer, MAX_VERTICES, QUAD_INDICES};
pub use renderer::{FrameState, FrameStats, Renderer, RendererConfig};
pub use shader::{quad_shader, QUAD_WGSL};
pub use slots::TextureSlots;
pub use vertex::Vertex;
