use thiserror::Error;

use crate::gfx::GfxError;

use super::FrameState;

/// A draw that did not fit into the current frame. Nothing was recorded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchError {
    #[error("geometry buffer full ({vertices}/{capacity} vertices in use)")]
    GeometryFull { vertices: usize, capacity: usize },

    #[error("all {capacity} texture slots are in use this frame")]
    TextureSlotsExhausted { capacity: usize },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Operation called in a frame state that does not allow it.
    #[error("`{operation}` is not allowed while the renderer is {state:?}")]
    Misuse {
        operation: &'static str,
        state: FrameState,
    },

    #[error(transparent)]
    Gfx(#[from] GfxError),
}

/// Renderer construction failure. Fatal.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("viewport {width}x{height} has no area")]
    InvalidViewport { width: f32, height: f32 },

    #[error("max_vertices must be a non-zero multiple of 4 addressable by 32-bit indices, got {0}")]
    InvalidCapacity(usize),

    #[error("batch shader failed to load")]
    Shader(#[source] GfxError),

    /// The shader does not declare a uniform the renderer writes.
    #[error("batch shader has no uniform `{0}`")]
    MissingUniform(&'static str),

    #[error("backend reported errors during setup: {0:?}")]
    Backend(Vec<GfxError>),
}
