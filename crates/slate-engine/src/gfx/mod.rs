//! Graphics binding layer.
//!
//! The batcher talks to the GPU exclusively through [`GraphicsBackend`], a
//! small stateful command contract modelled on classic bind-then-draw APIs:
//! resources are created once, bound, updated by sub-range, and drawn with a
//! single indexed call.
//!
//! Implementations:
//! - [`WgpuBackend`]: maps the contract onto wgpu and a window surface.
//! - [`RecordingBackend`]: headless; stores buffers/uniforms in memory and
//!   records every call. Used by tests and frame inspection tools.

mod backend;
mod error;
mod recording;
mod shader;
mod texture;
mod types;
mod uniforms;
mod wgpu_backend;

pub use backend::{Bindable, BufferHandle, GraphicsBackend};
pub use error::GfxError;
pub use recording::{Command, RecordingBackend};
pub use shader::{validate_wgsl, ShaderSource};
pub use texture::Texture;
pub use types::{
    AttributeFormat, BufferId, BufferKind, BufferUsage, ShaderId, TextureFilter, TextureId,
    UniformLocation, VertexArrayId, VertexAttribute, VertexLayout, TEX_SLOT_CAPACITY,
};
pub use uniforms::{UniformBlock, UniformDecl, UniformKind, UniformValue};
pub use wgpu_backend::WgpuBackend;
