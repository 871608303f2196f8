use crate::coords::{Rect, Viewport};
use crate::gfx::{
    Bindable, BufferHandle, BufferKind, BufferUsage, GraphicsBackend, ShaderId, Texture,
    TextureFilter, UniformLocation, UniformValue, VertexArrayId, TEX_SLOT_CAPACITY,
};
use crate::imaging::Image;
use crate::paint::Color;

use super::shader::{quad_shader, TEXTURES_UNIFORM, WORLD_UNIFORM};
use super::{
    colored_quad, textured_quad, BatchError, GeometryBuffer, InitError, RenderError,
    TextureSlots, Vertex, MAX_VERTICES,
};

/// Frame lifecycle of a [`Renderer`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameState {
    /// Between frames.
    Idle,
    /// After `begin_frame`; draws are accepted.
    Accumulating,
    /// Inside `end_frame`.
    Flushing,
    /// GPU resources released; every operation is rejected.
    ShutDown,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Vertex capacity of one frame. Must be a non-zero multiple of 4, and
    /// four times it must fit in a `u32`.
    pub max_vertices: usize,
    pub clear_color: Color,
    /// Filter used for textures uploaded through [`Renderer::load_texture`].
    pub texture_filter: TextureFilter,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_vertices: MAX_VERTICES,
            clear_color: Color::BLACK,
            texture_filter: TextureFilter::Linear,
        }
    }
}

/// Summary of a submitted frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub quads: usize,
    pub indices: usize,
    pub texture_slots: u32,
    /// Backend errors drained after the flush.
    pub backend_errors: usize,
}

/// GPU objects owned by the renderer.
struct BatchResources {
    vao: VertexArrayId,
    vbo: BufferHandle,
    ibo: BufferHandle,
    shader: ShaderId,
}

/// Immediate-mode quad renderer.
///
/// Each frame is `begin_frame`, any number of draws, then `end_frame`, which
/// uploads the accumulated geometry and issues one indexed draw. Textured
/// draws bind their texture to the next free slot; slots are reclaimed at
/// the start of the next frame.
pub struct Renderer<B: GraphicsBackend> {
    backend: B,
    config: RendererConfig,
    viewport: Viewport,

    geometry: GeometryBuffer,
    slots: TextureSlots,
    state: FrameState,

    resources: Option<BatchResources>,
    world: UniformLocation,
    textures: UniformLocation,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Creates the batch program and buffers on `backend`.
    pub fn new(mut backend: B, viewport: Viewport, config: RendererConfig) -> Result<Self, InitError> {
        if !viewport.is_valid() {
            return Err(InitError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        if !GeometryBuffer::is_valid_capacity(config.max_vertices) {
            return Err(InitError::InvalidCapacity(config.max_vertices));
        }

        let shader = backend.load_shader(&quad_shader()).map_err(InitError::Shader)?;
        let world = backend
            .uniform_location(&shader, WORLD_UNIFORM)
            .ok_or(InitError::MissingUniform(WORLD_UNIFORM))?;
        let textures = backend
            .uniform_location(&shader, TEXTURES_UNIFORM)
            .ok_or(InitError::MissingUniform(TEXTURES_UNIFORM))?;

        let geometry = GeometryBuffer::new(config.max_vertices);
        let vertex_bytes = (geometry.vertex_capacity() * size_of::<Vertex>()) as u64;
        let index_bytes = (geometry.index_capacity() * size_of::<u32>()) as u64;

        let vao = backend.create_vertex_array();
        vao.bind(&mut backend);

        let vbo = BufferHandle::new(
            BufferKind::Vertex,
            backend.create_buffer(BufferKind::Vertex, vertex_bytes, BufferUsage::Dynamic, None),
        );
        vbo.bind(&mut backend);
        backend.set_vertex_layout(&Vertex::LAYOUT);

        let ibo = BufferHandle::new(
            BufferKind::Index,
            backend.create_buffer(BufferKind::Index, index_bytes, BufferUsage::Dynamic, None),
        );
        ibo.bind(&mut backend);

        shader.bind(&mut backend);
        backend.set_uniform(world, UniformValue::Mat4(viewport.projection()));
        backend.set_uniform(textures, UniformValue::IntArray(vec![-1; TEX_SLOT_CAPACITY]));

        let errors = backend.take_errors();
        if !errors.is_empty() {
            return Err(InitError::Backend(errors));
        }

        log::info!(
            "renderer ready: viewport={}x{} max_vertices={} texture_slots={}",
            viewport.width,
            viewport.height,
            config.max_vertices,
            TEX_SLOT_CAPACITY
        );

        Ok(Self {
            backend,
            config,
            viewport,
            geometry,
            slots: TextureSlots::new(),
            state: FrameState::Idle,
            resources: Some(BatchResources { vao, vbo, ibo, shader }),
            world,
            textures,
        })
    }

    /// Starts a frame: clears the target and rewinds geometry and slots.
    ///
    /// Calling it again before `end_frame` discards the partial frame.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        match self.state {
            FrameState::Idle => {}
            FrameState::Accumulating => {
                if !self.geometry.is_empty() {
                    log::debug!(
                        "begin_frame discards {} pending quads",
                        self.geometry.quad_count()
                    );
                }
            }
            state @ (FrameState::Flushing | FrameState::ShutDown) => {
                return Err(RenderError::Misuse { operation: "begin_frame", state });
            }
        }

        // Color only: the batch pipeline has no depth or stencil attachment.
        self.backend.clear(self.config.clear_color.to_normalized());
        self.geometry.reset();
        self.slots.reset();
        self.state = FrameState::Accumulating;
        Ok(())
    }

    /// Queues a flat-colored rectangle.
    pub fn draw_rectangle(&mut self, rect: Rect, color: Color) -> Result<(), RenderError> {
        self.expect_accumulating("draw_rectangle")?;
        self.geometry
            .append_quad(colored_quad(rect, color))
            .inspect_err(|e| log::debug!("draw_rectangle rejected: {e}"))?;
        Ok(())
    }

    /// Queues a rectangle showing `texture`, stretched over `rect`.
    ///
    /// Consumes one texture slot. On failure nothing is bound or queued.
    pub fn draw_rectangle_textured(&mut self, rect: Rect, texture: &Texture) -> Result<(), RenderError> {
        self.expect_accumulating("draw_rectangle_textured")?;

        if !self.geometry.has_room() {
            let err = BatchError::GeometryFull {
                vertices: self.geometry.vertex_count(),
                capacity: self.geometry.vertex_capacity(),
            };
            log::debug!("draw_rectangle_textured rejected: {err}");
            return Err(err.into());
        }
        let slot = self
            .slots
            .allocate()
            .inspect_err(|e| log::debug!("draw_rectangle_textured rejected: {e}"))?;

        self.backend.bind_texture(texture.id(), slot);
        self.geometry.append_quad(textured_quad(rect, slot))?;
        Ok(())
    }

    /// Uploads the frame, draws it with one call and presents.
    pub fn end_frame(&mut self) -> Result<FrameStats, RenderError> {
        self.expect_accumulating("end_frame")?;
        let Some(res) = self.resources.as_ref() else {
            return Err(RenderError::Misuse {
                operation: "end_frame",
                state: FrameState::ShutDown,
            });
        };
        self.state = FrameState::Flushing;

        let bindables: [&dyn Bindable; 4] = [&res.vao, &res.vbo, &res.ibo, &res.shader];
        for resource in bindables {
            resource.bind(&mut self.backend);
        }

        self.backend.update_buffer(res.vbo.id(), 0, self.geometry.vertex_bytes());
        self.backend.update_buffer(res.ibo.id(), 0, self.geometry.index_bytes());
        self.backend
            .set_uniform(self.textures, UniformValue::IntArray(self.slots.sampler_units()));

        // A zero-count indexed draw rasterizes nothing; an empty frame only
        // presents the clear.
        let index_count = self.geometry.index_count() as u32;
        if index_count > 0 {
            self.backend.draw_elements(0, index_count);
        }
        self.backend.swap_buffers();

        let backend_errors = self.drain_backend_errors();
        self.state = FrameState::Idle;

        Ok(FrameStats {
            quads: self.geometry.quad_count(),
            indices: self.geometry.index_count(),
            texture_slots: self.slots.in_use(),
            backend_errors,
        })
    }

    /// Updates the projection after the drawable area changed.
    ///
    /// A viewport without area (minimized window) keeps the previous one.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), RenderError> {
        if self.state == FrameState::ShutDown {
            return Err(RenderError::Misuse {
                operation: "set_viewport",
                state: self.state,
            });
        }
        if !viewport.is_valid() {
            log::debug!("ignoring viewport {}x{}", viewport.width, viewport.height);
            return Ok(());
        }

        self.viewport = viewport;
        self.backend
            .set_uniform(self.world, UniformValue::Mat4(viewport.projection()));
        Ok(())
    }

    /// Uploads `image` as a texture. The image may be dropped afterwards.
    pub fn load_texture(&mut self, image: &Image) -> Result<Texture, RenderError> {
        if self.state == FrameState::ShutDown {
            return Err(RenderError::Misuse {
                operation: "load_texture",
                state: self.state,
            });
        }
        let id = self.backend.load_texture(
            image.pixels(),
            image.width(),
            image.height(),
            self.config.texture_filter,
        )?;
        log::debug!("uploaded {}x{} texture", image.width(), image.height());
        Ok(Texture::new(id, image.width(), image.height()))
    }

    pub fn destroy_texture(&mut self, texture: Texture) {
        self.backend.destroy_texture(texture.into_id());
    }

    /// Releases the renderer's GPU objects. Runs on drop as well.
    pub fn shutdown(&mut self) {
        let Some(res) = self.resources.take() else { return };

        self.backend.destroy_vertex_array(res.vao);
        self.backend.destroy_buffer(res.vbo.into_id());
        self.backend.destroy_buffer(res.ibo.into_id());
        self.backend.destroy_shader(res.shader);
        self.drain_backend_errors();

        self.geometry.reset();
        self.slots.reset();
        self.state = FrameState::ShutDown;
        log::info!("renderer shut down");
    }

    #[inline]
    pub fn state(&self) -> FrameState {
        self.state
    }

    #[inline]
    pub fn geometry(&self) -> &GeometryBuffer {
        &self.geometry
    }

    #[inline]
    pub fn slots(&self) -> &TextureSlots {
        &self.slots
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn expect_accumulating(&self, operation: &'static str) -> Result<(), RenderError> {
        if self.state == FrameState::Accumulating {
            Ok(())
        } else {
            Err(RenderError::Misuse {
                operation,
                state: self.state,
            })
        }
    }

    fn drain_backend_errors(&mut self) -> usize {
        let errors = self.backend.take_errors();
        for e in &errors {
            if e.is_fatal() {
                log::error!("graphics backend: {e}");
            } else if cfg!(debug_assertions) {
                log::warn!("graphics backend: {e}");
            }
        }
        errors.len()
    }
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Command, RecordingBackend};

    fn renderer() -> Renderer<RecordingBackend> {
        Renderer::new(
            RecordingBackend::new(),
            Viewport::new(640.0, 480.0),
            RendererConfig::default(),
        )
        .unwrap()
    }

    fn texture(r: &mut Renderer<RecordingBackend>) -> Texture {
        let image = Image::from_rgba(vec![255; 16], 2, 2).unwrap();
        r.load_texture(&image).unwrap()
    }

    #[test]
    fn rejects_zero_viewport() {
        let err = Renderer::new(RecordingBackend::new(), Viewport::new(0.0, 480.0), RendererConfig::default());
        assert!(matches!(err, Err(InitError::InvalidViewport { .. })));
    }

    #[test]
    fn rejects_unaligned_capacity() {
        let config = RendererConfig { max_vertices: 6, ..Default::default() };
        let err = Renderer::new(RecordingBackend::new(), Viewport::new(1.0, 1.0), config);
        assert!(matches!(err, Err(InitError::InvalidCapacity(6))));
    }

    #[test]
    fn rejects_capacity_beyond_u32_indices() {
        let config = RendererConfig { max_vertices: 1 << 62, ..Default::default() };
        let err = Renderer::new(RecordingBackend::new(), Viewport::new(64.0, 64.0), config);
        assert!(matches!(err, Err(InitError::InvalidCapacity(n)) if n == 1 << 62));

        let too_many_indices = (u32::MAX as usize / 4 + 1).next_multiple_of(4);
        let config = RendererConfig { max_vertices: too_many_indices, ..Default::default() };
        let err = Renderer::new(RecordingBackend::new(), Viewport::new(64.0, 64.0), config);
        assert!(matches!(err, Err(InitError::InvalidCapacity(_))));
    }

    #[test]
    fn init_sets_projection_and_empty_sampler_map() {
        let r = renderer();
        assert_eq!(
            r.backend().uniform(WORLD_UNIFORM),
            Some(&UniformValue::Mat4(Viewport::new(640.0, 480.0).projection()))
        );
        assert_eq!(
            r.backend().uniform(TEXTURES_UNIFORM),
            Some(&UniformValue::IntArray(vec![-1; TEX_SLOT_CAPACITY]))
        );
    }

    #[test]
    fn draw_outside_frame_is_misuse() {
        let mut r = renderer();
        let err = r.draw_rectangle(Rect::new(0.0, 0.0, 1.0, 1.0), Color::RED).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Misuse { operation: "draw_rectangle", state: FrameState::Idle }
        ));
        assert!(matches!(r.end_frame(), Err(RenderError::Misuse { .. })));
    }

    #[test]
    fn textured_draw_binds_before_appending() {
        let mut r = renderer();
        let tex = texture(&mut r);
        r.begin_frame().unwrap();
        r.backend_mut().clear_commands();

        r.draw_rectangle_textured(Rect::new(0.0, 0.0, 4.0, 4.0), &tex).unwrap();
        assert_eq!(
            r.backend().commands(),
            &[Command::BindTexture { id: tex.id().raw(), slot: 0 }]
        );
        assert_eq!(r.slots().in_use(), 1);
    }

    #[test]
    fn exhausted_slots_leave_frame_untouched() {
        let mut r = renderer();
        let tex = texture(&mut r);
        r.begin_frame().unwrap();
        for _ in 0..TEX_SLOT_CAPACITY {
            r.draw_rectangle_textured(Rect::new(0.0, 0.0, 1.0, 1.0), &tex).unwrap();
        }
        let before = r.geometry().vertex_count();

        let err = r.draw_rectangle_textured(Rect::new(0.0, 0.0, 1.0, 1.0), &tex).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Batch(BatchError::TextureSlotsExhausted { capacity: TEX_SLOT_CAPACITY })
        ));
        assert_eq!(r.geometry().vertex_count(), before);
        assert_eq!(r.slots().in_use(), TEX_SLOT_CAPACITY as u32);

        // Colored quads still fit.
        r.draw_rectangle(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BLUE).unwrap();
    }

    #[test]
    fn end_frame_flushes_in_order() {
        let mut r = renderer();
        r.begin_frame().unwrap();
        r.draw_rectangle(Rect::new(0.0, 0.0, 2.0, 2.0), Color::GREEN).unwrap();
        r.backend_mut().clear_commands();

        let stats = r.end_frame().unwrap();
        assert_eq!(stats, FrameStats { quads: 1, indices: 6, texture_slots: 0, backend_errors: 0 });

        let cmds = r.backend().commands();
        assert!(matches!(cmds[0], Command::BindVertexArray { .. }));
        assert!(matches!(cmds[1], Command::BindBuffer { kind: BufferKind::Vertex, .. }));
        assert!(matches!(cmds[2], Command::BindBuffer { kind: BufferKind::Index, .. }));
        assert!(matches!(cmds[3], Command::BindShader { .. }));
        assert!(matches!(cmds[4], Command::UpdateBuffer { offset: 0, len: 160, .. }));
        assert!(matches!(cmds[5], Command::UpdateBuffer { offset: 0, len: 24, .. }));
        assert!(matches!(cmds[6], Command::SetUniform { .. }));
        assert_eq!(cmds[7], Command::DrawElements { offset: 0, count: 6 });
        assert_eq!(cmds[8], Command::SwapBuffers);
        assert_eq!(r.state(), FrameState::Idle);
    }

    #[test]
    fn empty_frame_presents_without_drawing() {
        let mut r = renderer();
        r.begin_frame().unwrap();
        let stats = r.end_frame().unwrap();
        assert_eq!(stats.indices, 0);
        assert!(r.backend().draw_calls().is_empty());
        assert_eq!(r.backend().presents(), 1);
    }

    #[test]
    fn set_viewport_updates_projection() {
        let mut r = renderer();
        r.set_viewport(Viewport::new(800.0, 600.0)).unwrap();
        assert_eq!(
            r.backend().uniform(WORLD_UNIFORM),
            Some(&UniformValue::Mat4(Viewport::new(800.0, 600.0).projection()))
        );

        r.set_viewport(Viewport::new(0.0, 0.0)).unwrap();
        assert_eq!(r.viewport(), Viewport::new(800.0, 600.0));
    }

    #[test]
    fn shutdown_releases_resources_and_blocks_use() {
        let mut r = renderer();
        let tex = texture(&mut r);
        r.destroy_texture(tex);
        r.shutdown();

        assert_eq!(r.backend().live_resources(), 0);
        assert_eq!(r.state(), FrameState::ShutDown);
        assert!(matches!(
            r.begin_frame(),
            Err(RenderError::Misuse { state: FrameState::ShutDown, .. })
        ));
        // Idempotent.
        r.shutdown();
    }
}
