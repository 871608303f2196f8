//! Paint model shared between callers and the batcher.
//!
//! Geometry types remain in `coords`.

mod color;

pub use color::Color;
