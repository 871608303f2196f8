//! Slate engine crate.
//!
//! Immediate-mode 2D quad batching over a stateful graphics backend, plus
//! the window runtime and GPU setup that host it.

pub mod batch;
pub mod coords;
pub mod core;
pub mod device;
pub mod gfx;
pub mod imaging;
pub mod logging;
pub mod paint;
pub mod time;
pub mod window;

pub use batch::{FrameStats, RenderError, Renderer, RendererConfig};
pub use imaging::Image;
