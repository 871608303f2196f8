//! Window and event loop.
//!
//! Owns the `winit` event loop and window, and builds the GPU context and
//! renderer for it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
