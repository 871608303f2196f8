use thiserror::Error;

/// Errors raised by a [`GraphicsBackend`](super::GraphicsBackend).
///
/// Only resource creation returns these directly. Everything else is queued
/// inside the backend and drained with `take_errors`, so a batch is never
/// interrupted halfway through.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GfxError {
    /// WGSL failed to parse or validate.
    #[error("shader `{label}` failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// A handle that the backend does not know (never created or destroyed).
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    /// Sub-range update outside the buffer's allocated size.
    #[error("buffer {id}: update of {len} bytes at offset {offset} exceeds size {size}")]
    BufferOverflow { id: u32, offset: u64, len: u64, size: u64 },

    /// Sub-range update whose offset or length is not a multiple of 4.
    #[error("buffer {id}: update at offset {offset} with {len} bytes is not 4-byte aligned")]
    MisalignedUpdate { id: u32, offset: u64, len: u64 },

    /// Attribute extends past the vertex stride.
    #[error("vertex layout with stride {stride} has attributes outside the stride")]
    InvalidLayout { stride: u32 },

    #[error("invalid texture: {0}")]
    InvalidTexture(String),

    #[error("texture slot {slot} out of range (capacity {capacity})")]
    SlotOutOfRange { slot: u32, capacity: usize },

    #[error("uniform `{name}`: {message}")]
    UniformMismatch { name: String, message: String },

    /// Draw issued while a required resource was not bound.
    #[error("draw issued without a bound {0}")]
    NotBound(&'static str),

    #[error("draw range {offset}..{end} exceeds index buffer of {available} indices")]
    DrawOutOfRange { offset: u32, end: u64, available: u64 },

    /// Surface acquisition failure.
    #[error("surface error: {message}")]
    Surface { message: String, fatal: bool },
}

impl GfxError {
    /// True for errors after which no further frame can be presented.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GfxError::Surface { fatal: true, .. })
    }
}
