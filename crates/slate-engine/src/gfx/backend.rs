use super::{
    BufferId, BufferKind, BufferUsage, GfxError, ShaderId, ShaderSource, TextureFilter, TextureId,
    UniformLocation, UniformValue, VertexArrayId, VertexLayout,
};

/// Stateful graphics command contract.
///
/// Semantics follow bind-then-use APIs: `set_vertex_layout` applies to the
/// bound vertex array and captures the bound vertex buffer, `update_buffer`
/// writes a byte sub-range without reallocating, and `draw_elements` draws
/// triangles from the bound index buffer using the bound program, vertex array
/// and texture slots.
///
/// Only creation calls report errors directly. Misuse of the other calls is
/// queued and surfaced by [`take_errors`](Self::take_errors).
pub trait GraphicsBackend {
    fn create_vertex_array(&mut self) -> VertexArrayId;
    fn destroy_vertex_array(&mut self, vao: VertexArrayId);
    fn bind_vertex_array(&mut self, vao: &VertexArrayId);
    fn set_vertex_layout(&mut self, layout: &VertexLayout);

    /// Creates a buffer of `size` bytes, optionally filled from `contents`.
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        usage: BufferUsage,
        contents: Option<&[u8]>,
    ) -> BufferId;
    fn destroy_buffer(&mut self, buffer: BufferId);
    fn bind_buffer(&mut self, kind: BufferKind, buffer: &BufferId);
    fn update_buffer(&mut self, buffer: &BufferId, offset: u64, data: &[u8]);

    fn load_shader(&mut self, source: &ShaderSource<'_>) -> Result<ShaderId, GfxError>;
    fn destroy_shader(&mut self, shader: ShaderId);
    fn bind_shader(&mut self, shader: &ShaderId);
    fn uniform_location(&self, shader: &ShaderId, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Uploads tightly packed RGBA8 pixels.
    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        filter: TextureFilter,
    ) -> Result<TextureId, GfxError>;
    fn destroy_texture(&mut self, texture: TextureId);
    fn bind_texture(&mut self, texture: &TextureId, slot: u32);

    /// Clears the current frame's color target.
    fn clear(&mut self, color: [f32; 4]);
    /// Draws `count` indices starting at index `offset` as a triangle list.
    fn draw_elements(&mut self, offset: u32, count: u32);
    /// Presents the current frame.
    fn swap_buffers(&mut self);

    /// Drains queued errors, oldest first.
    fn take_errors(&mut self) -> Vec<GfxError>;
}

/// Lets a renderer drive a backend it does not own.
impl<B: GraphicsBackend + ?Sized> GraphicsBackend for &mut B {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        (**self).create_vertex_array()
    }
    fn destroy_vertex_array(&mut self, vao: VertexArrayId) {
        (**self).destroy_vertex_array(vao)
    }
    fn bind_vertex_array(&mut self, vao: &VertexArrayId) {
        (**self).bind_vertex_array(vao)
    }
    fn set_vertex_layout(&mut self, layout: &VertexLayout) {
        (**self).set_vertex_layout(layout)
    }
    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        usage: BufferUsage,
        contents: Option<&[u8]>,
    ) -> BufferId {
        (**self).create_buffer(kind, size, usage, contents)
    }
    fn destroy_buffer(&mut self, buffer: BufferId) {
        (**self).destroy_buffer(buffer)
    }
    fn bind_buffer(&mut self, kind: BufferKind, buffer: &BufferId) {
        (**self).bind_buffer(kind, buffer)
    }
    fn update_buffer(&mut self, buffer: &BufferId, offset: u64, data: &[u8]) {
        (**self).update_buffer(buffer, offset, data)
    }
    fn load_shader(&mut self, source: &ShaderSource<'_>) -> Result<ShaderId, GfxError> {
        (**self).load_shader(source)
    }
    fn destroy_shader(&mut self, shader: ShaderId) {
        (**self).destroy_shader(shader)
    }
    fn bind_shader(&mut self, shader: &ShaderId) {
        (**self).bind_shader(shader)
    }
    fn uniform_location(&self, shader: &ShaderId, name: &str) -> Option<UniformLocation> {
        (**self).uniform_location(shader, name)
    }
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        (**self).set_uniform(location, value)
    }
    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        filter: TextureFilter,
    ) -> Result<TextureId, GfxError> {
        (**self).load_texture(pixels, width, height, filter)
    }
    fn destroy_texture(&mut self, texture: TextureId) {
        (**self).destroy_texture(texture)
    }
    fn bind_texture(&mut self, texture: &TextureId, slot: u32) {
        (**self).bind_texture(texture, slot)
    }
    fn clear(&mut self, color: [f32; 4]) {
        (**self).clear(color)
    }
    fn draw_elements(&mut self, offset: u32, count: u32) {
        (**self).draw_elements(offset, count)
    }
    fn swap_buffers(&mut self) {
        (**self).swap_buffers()
    }
    fn take_errors(&mut self) -> Vec<GfxError> {
        (**self).take_errors()
    }
}

/// A resource that can be made current on a backend.
pub trait Bindable {
    fn bind(&self, backend: &mut dyn GraphicsBackend);
}

impl Bindable for VertexArrayId {
    fn bind(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_vertex_array(self);
    }
}

impl Bindable for ShaderId {
    fn bind(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_shader(self);
    }
}

/// Buffer together with the binding point it belongs to.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferHandle {
    kind: BufferKind,
    id: BufferId,
}

impl BufferHandle {
    #[inline]
    pub fn new(kind: BufferKind, id: BufferId) -> Self {
        Self { kind, id }
    }

    #[inline]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    #[inline]
    pub fn id(&self) -> &BufferId {
        &self.id
    }

    #[inline]
    pub fn into_id(self) -> BufferId {
        self.id
    }
}

impl Bindable for BufferHandle {
    fn bind(&self, backend: &mut dyn GraphicsBackend) {
        backend.bind_buffer(self.kind, &self.id);
    }
}
