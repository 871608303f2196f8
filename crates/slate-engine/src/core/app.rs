use winit::event::WindowEvent;

use super::ctx::{FrameCtx, WindowRenderer};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once after the window's renderer exists, before the first frame.
    /// Upload textures here. An error aborts the runtime.
    fn setup(&mut self, renderer: &mut WindowRenderer<'_>) -> anyhow::Result<()> {
        let _ = renderer;
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the renderer is dropped. Destroy textures here.
    fn teardown(&mut self, renderer: &mut WindowRenderer<'_>) {
        let _ = renderer;
    }
}
