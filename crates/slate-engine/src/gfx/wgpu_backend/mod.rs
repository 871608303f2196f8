//! [`GraphicsBackend`](super::GraphicsBackend) on top of wgpu.

mod backend;
mod pipeline;

pub use backend::WgpuBackend;
