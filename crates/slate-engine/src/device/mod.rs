//! GPU device and surface management.
//!
//! Creates the wgpu instance, adapter, device and queue for a window,
//! configures the surface and hands out frames to the wgpu backend.

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;
