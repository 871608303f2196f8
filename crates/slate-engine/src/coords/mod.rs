//! Coordinate and numeric types shared by the batcher and the runtime.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! The batch shader maps this space to clip space with an orthographic
//! projection built from the current [`Viewport`].

mod mat4;
mod rect;
mod vec2;
mod viewport;

pub use mat4::Mat4;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
