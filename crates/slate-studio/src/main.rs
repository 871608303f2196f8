use std::path::PathBuf;

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use slate_engine::coords::Rect;
use slate_engine::core::{App, AppControl, FrameCtx, WindowRenderer};
use slate_engine::device::GpuInit;
use slate_engine::gfx::Texture;
use slate_engine::imaging::{Image, ImageError};
use slate_engine::logging::{init_logging, LoggingConfig};
use slate_engine::paint::Color;
use slate_engine::window::{Runtime, RuntimeConfig};
use slate_engine::RendererConfig;

const DEFAULT_IMAGE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/res/sample.png");
const ACTOR_SIZE: f32 = 100.0;

/// Two actors and a banner image, redrawn every frame.
struct Studio {
    image_path: PathBuf,
    banner: Option<Texture>,
    fps_window: (f32, u32),
}

impl Studio {
    fn new(image_path: PathBuf) -> Self {
        Self {
            image_path,
            banner: None,
            fps_window: (0.0, 0),
        }
    }

    fn load_image(&self) -> Result<Image> {
        match Image::load(&self.image_path, false) {
            Ok(image) => Ok(image),
            Err(e) => {
                log::warn!(
                    "{}: {e}; using a generated checkerboard",
                    self.image_path.display()
                );
                Ok(checkerboard(64, 8)?)
            }
        }
    }
}

/// `size`×`size` RGBA checkerboard with `cell`-pixel squares.
fn checkerboard(size: u32, cell: u32) -> Result<Image, ImageError> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if light { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    Image::from_rgba(pixels, size, size)
}

impl App for Studio {
    fn setup(&mut self, renderer: &mut WindowRenderer<'_>) -> Result<()> {
        let image = self.load_image()?;
        let texture = renderer
            .load_texture(&image)
            .context("failed to upload banner texture")?;
        log::info!("banner texture {}x{}", texture.width(), texture.height());
        image.destroy();

        self.banner = Some(texture);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (width, height) = ctx.window.logical_size();
        let t = ctx.time.elapsed;

        let (acc, frames) = &mut self.fps_window;
        *acc += ctx.time.dt;
        *frames += 1;
        if *acc >= 1.0 {
            ctx.window
                .set_title(&format!("slate studio ({:.0} fps)", *frames as f32 / *acc));
            *acc = 0.0;
            *frames = 0;
        }

        let travel = (width - ACTOR_SIZE).max(0.0);
        let player = Rect::new(
            travel * (0.5 + 0.5 * (t * 0.8).sin()),
            40.0,
            ACTOR_SIZE,
            ACTOR_SIZE,
        );
        let enemy = Rect::new(
            travel * (0.5 + 0.5 * (t * 0.8).cos()),
            60.0 + ACTOR_SIZE,
            ACTOR_SIZE,
            ACTOR_SIZE,
        );

        let banner = self.banner.as_ref();
        ctx.render(|r| {
            r.draw_rectangle(player, Color::BLUE)?;
            r.draw_rectangle(enemy, Color::RED)?;

            if let Some(tex) = banner {
                // Full window width, aspect preserved, anchored to the bottom.
                let h = width * tex.height() as f32 / tex.width() as f32;
                r.draw_rectangle_textured(Rect::new(0.0, height - h, width, h), tex)?;
            }
            Ok(())
        })
    }

    fn teardown(&mut self, renderer: &mut WindowRenderer<'_>) {
        if let Some(tex) = self.banner.take() {
            renderer.destroy_texture(tex);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let image_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE));

    let config = RuntimeConfig {
        title: "slate studio".to_string(),
        initial_size: LogicalSize::new(640.0, 480.0),
        renderer: RendererConfig {
            clear_color: Color::rgb(24, 24, 32),
            ..Default::default()
        },
    };

    Runtime::run(config, GpuInit::default(), Studio::new(image_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_alternates_cells() {
        let img = checkerboard(16, 8).unwrap();
        assert_eq!(img.shape(), Rect::new(0.0, 0.0, 16.0, 16.0));
        let px = |x: usize, y: usize| img.pixels()[(y * 16 + x) * 4];
        assert_eq!(px(0, 0), 230);
        assert_eq!(px(8, 0), 40);
        assert_eq!(px(8, 8), 230);
    }
}
