use winit::dpi::LogicalSize;
use winit::window::{Window, WindowId};

use crate::batch::{RenderError, Renderer};
use crate::gfx::WgpuBackend;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// Renderer of one window.
pub type WindowRenderer<'w> = Renderer<WgpuBackend<'w>>;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// Drawable size in logical pixels, the unit draw calls are expressed in.
    pub fn logical_size(&self) -> (f32, f32) {
        let logical: LogicalSize<f64> = self.window.inner_size().to_logical(self.window.scale_factor());
        (logical.width as f32, logical.height as f32)
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback invocation, `'w` the window borrow held by the
/// renderer's backend.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub renderer: &'a mut WindowRenderer<'w>,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'w> FrameCtx<'_, 'w> {
    /// Runs one frame: `begin_frame`, `draw`, `end_frame`.
    ///
    /// A failing draw is logged and the quads queued before it are still
    /// presented. Returns `Exit` once the surface is lost for good.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&mut WindowRenderer<'w>) -> Result<(), RenderError>,
    {
        if let Err(e) = self.renderer.begin_frame() {
            log::error!("begin_frame failed: {e}");
            return AppControl::Continue;
        }

        if let Err(e) = draw(&mut *self.renderer) {
            log::warn!("frame {}: {e}", self.time.frame_index);
        }

        self.window.window.pre_present_notify();
        match self.renderer.end_frame() {
            Ok(stats) => log::trace!("frame {}: {stats:?}", self.time.frame_index),
            Err(e) => log::error!("end_frame failed: {e}"),
        }

        if self.renderer.backend().is_lost() {
            log::error!("surface lost; exiting");
            return AppControl::Exit;
        }
        AppControl::Continue
    }
}
