//! Headless backend that keeps every resource in memory.

use std::collections::HashMap;

use super::{
    validate_wgsl, BufferId, BufferKind, BufferUsage, GfxError, GraphicsBackend, ShaderId,
    ShaderSource, TextureFilter, TextureId, UniformBlock, UniformLocation, UniformValue,
    VertexArrayId, VertexLayout, TEX_SLOT_CAPACITY,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateVertexArray { id: u32 },
    DestroyVertexArray { id: u32 },
    BindVertexArray { id: u32 },
    SetVertexLayout { stride: u32, attributes: usize },
    CreateBuffer { id: u32, kind: BufferKind, size: u64, usage: BufferUsage },
    DestroyBuffer { id: u32 },
    BindBuffer { kind: BufferKind, id: u32 },
    UpdateBuffer { id: u32, offset: u64, len: u64 },
    LoadShader { id: u32, label: String },
    DestroyShader { id: u32 },
    BindShader { id: u32 },
    SetUniform { shader: u32, name: String, value: UniformValue },
    LoadTexture { id: u32, width: u32, height: u32, filter: TextureFilter },
    DestroyTexture { id: u32 },
    BindTexture { id: u32, slot: u32 },
    Clear { color: [f32; 4] },
    DrawElements { offset: u32, count: u32 },
    SwapBuffers,
}

#[derive(Debug)]
struct RecordedBuffer {
    kind: BufferKind,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct RecordedShader {
    block: UniformBlock,
    data: Vec<u8>,
    values: HashMap<String, UniformValue>,
}

#[derive(Debug, Default)]
struct RecordedVertexArray {
    layout: Option<VertexLayout>,
    vertex_buffer: Option<u32>,
}

#[derive(Debug, Default)]
struct Bindings {
    vertex_array: Option<u32>,
    vertex_buffer: Option<u32>,
    index_buffer: Option<u32>,
    shader: Option<u32>,
}

/// [`GraphicsBackend`] without a GPU.
///
/// Buffers hold real bytes, uniforms hold the last written value, and each
/// call is appended to a command log. Validation mirrors what a GPU driver
/// would reject (unknown handles, out-of-range updates and draws, unbound
/// state) and queues errors for [`take_errors`](GraphicsBackend::take_errors).
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    commands: Vec<Command>,
    command_limit: Option<usize>,

    vertex_arrays: HashMap<u32, RecordedVertexArray>,
    buffers: HashMap<u32, RecordedBuffer>,
    shaders: HashMap<u32, RecordedShader>,
    textures: HashMap<u32, (u32, u32)>,

    slots: [Option<u32>; TEX_SLOT_CAPACITY],
    bound: Bindings,

    errors: Vec<GfxError>,
    presents: u64,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the newest `limit` commands. Without a limit the log grows
    /// until [`clear_commands`](Self::clear_commands) is called.
    pub fn with_command_limit(limit: usize) -> Self {
        Self {
            command_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Recorded calls, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, command: Command) {
        self.commands.push(command);
        if let Some(limit) = self.command_limit {
            let excess = self.commands.len().saturating_sub(limit);
            self.commands.drain(..excess);
        }
    }

    /// Number of `swap_buffers` calls.
    pub fn presents(&self) -> u64 {
        self.presents
    }

    /// `(offset, count)` of every recorded draw, in order.
    pub fn draw_calls(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::DrawElements { offset, count } => Some((*offset, *count)),
                _ => None,
            })
            .collect()
    }

    /// Full contents of the buffer with raw id `id`.
    pub fn buffer_data(&self, id: u32) -> Option<&[u8]> {
        self.buffers.get(&id).map(|b| b.bytes.as_slice())
    }

    /// Contents of the vertex buffer the bound vertex array reads from.
    pub fn bound_vertex_data(&self) -> Option<&[u8]> {
        let vao = self.vertex_arrays.get(&self.bound.vertex_array?)?;
        self.buffer_data(vao.vertex_buffer?)
    }

    /// Contents of the bound index buffer.
    pub fn bound_index_data(&self) -> Option<&[u8]> {
        self.buffer_data(self.bound.index_buffer?)
    }

    /// Last value written to `name` on the bound program.
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.shaders.get(&self.bound.shader?)?.values.get(name)
    }

    /// Raw id of the texture bound to `slot`.
    pub fn slot_binding(&self, slot: usize) -> Option<u32> {
        self.slots.get(slot).copied().flatten()
    }

    /// Number of live resources of all kinds.
    pub fn live_resources(&self) -> usize {
        self.vertex_arrays.len() + self.buffers.len() + self.shaders.len() + self.textures.len()
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn unknown(&mut self, kind: &'static str, id: u32) {
        self.errors.push(GfxError::UnknownHandle { kind, id });
    }

    fn validate_draw(&self, offset: u32, count: u32) -> Result<(), GfxError> {
        let shader = self.bound.shader.ok_or(GfxError::NotBound("shader program"))?;
        if !self.shaders.contains_key(&shader) {
            return Err(GfxError::UnknownHandle { kind: "shader", id: shader });
        }

        let vao_id = self.bound.vertex_array.ok_or(GfxError::NotBound("vertex array"))?;
        let vao = self
            .vertex_arrays
            .get(&vao_id)
            .ok_or(GfxError::UnknownHandle { kind: "vertex array", id: vao_id })?;
        if vao.layout.is_none() || vao.vertex_buffer.is_none() {
            return Err(GfxError::NotBound("vertex layout"));
        }

        let ibo = self.bound.index_buffer.ok_or(GfxError::NotBound("index buffer"))?;
        let available = self
            .buffers
            .get(&ibo)
            .map(|b| b.bytes.len() as u64 / 4)
            .ok_or(GfxError::UnknownHandle { kind: "buffer", id: ibo })?;

        let end = u64::from(offset) + u64::from(count);
        if end > available {
            return Err(GfxError::DrawOutOfRange { offset, end, available });
        }
        Ok(())
    }
}

impl GraphicsBackend for RecordingBackend {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.alloc_id();
        self.vertex_arrays.insert(id, RecordedVertexArray::default());
        self.record(Command::CreateVertexArray { id });
        VertexArrayId::from_raw(id)
    }

    fn destroy_vertex_array(&mut self, vao: VertexArrayId) {
        let id = vao.raw();
        if self.vertex_arrays.remove(&id).is_none() {
            self.unknown("vertex array", id);
        }
        if self.bound.vertex_array == Some(id) {
            self.bound.vertex_array = None;
        }
        self.record(Command::DestroyVertexArray { id });
    }

    fn bind_vertex_array(&mut self, vao: &VertexArrayId) {
        let id = vao.raw();
        if self.vertex_arrays.contains_key(&id) {
            self.bound.vertex_array = Some(id);
        } else {
            self.unknown("vertex array", id);
        }
        self.record(Command::BindVertexArray { id });
    }

    fn set_vertex_layout(&mut self, layout: &VertexLayout) {
        self.record(Command::SetVertexLayout {
            stride: layout.stride,
            attributes: layout.attributes.len(),
        });

        if !layout.is_consistent() {
            self.errors.push(GfxError::InvalidLayout { stride: layout.stride });
            return;
        }

        let Some(vao_id) = self.bound.vertex_array else {
            self.errors.push(GfxError::NotBound("vertex array"));
            return;
        };
        let Some(vertex_buffer) = self.bound.vertex_buffer else {
            self.errors.push(GfxError::NotBound("vertex buffer"));
            return;
        };
        if let Some(vao) = self.vertex_arrays.get_mut(&vao_id) {
            vao.layout = Some(*layout);
            vao.vertex_buffer = Some(vertex_buffer);
        }
    }

    fn create_buffer(
        &mut self,
        kind: BufferKind,
        size: u64,
        usage: BufferUsage,
        contents: Option<&[u8]>,
    ) -> BufferId {
        let id = self.alloc_id();
        let mut bytes = vec![0u8; size as usize];
        if let Some(src) = contents {
            if src.len() as u64 > size {
                self.errors.push(GfxError::BufferOverflow {
                    id,
                    offset: 0,
                    len: src.len() as u64,
                    size,
                });
            }
            let n = src.len().min(bytes.len());
            bytes[..n].copy_from_slice(&src[..n]);
        }
        self.buffers.insert(id, RecordedBuffer { kind, bytes });
        self.record(Command::CreateBuffer { id, kind, size, usage });
        BufferId::from_raw(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        let id = buffer.raw();
        if self.buffers.remove(&id).is_none() {
            self.unknown("buffer", id);
        }
        for slot in [&mut self.bound.vertex_buffer, &mut self.bound.index_buffer] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.record(Command::DestroyBuffer { id });
    }

    fn bind_buffer(&mut self, kind: BufferKind, buffer: &BufferId) {
        let id = buffer.raw();
        self.record(Command::BindBuffer { kind, id });

        match self.buffers.get(&id) {
            None => self.unknown("buffer", id),
            Some(b) if b.kind != kind => self.errors.push(GfxError::NotBound(match kind {
                BufferKind::Vertex => "vertex buffer",
                BufferKind::Index => "index buffer",
            })),
            Some(_) => match kind {
                BufferKind::Vertex => self.bound.vertex_buffer = Some(id),
                BufferKind::Index => self.bound.index_buffer = Some(id),
            },
        }
    }

    fn update_buffer(&mut self, buffer: &BufferId, offset: u64, data: &[u8]) {
        let id = buffer.raw();
        let len = data.len() as u64;
        self.record(Command::UpdateBuffer { id, offset, len });

        let Some(b) = self.buffers.get_mut(&id) else {
            self.unknown("buffer", id);
            return;
        };
        let size = b.bytes.len() as u64;
        if offset % 4 != 0 || len % 4 != 0 {
            self.errors.push(GfxError::MisalignedUpdate { id, offset, len });
            return;
        }
        if offset + len > size {
            self.errors.push(GfxError::BufferOverflow { id, offset, len, size });
            return;
        }
        let start = offset as usize;
        b.bytes[start..start + data.len()].copy_from_slice(data);
    }

    fn load_shader(&mut self, source: &ShaderSource<'_>) -> Result<ShaderId, GfxError> {
        validate_wgsl(source.label, source.wgsl)?;

        let id = self.alloc_id();
        let block = UniformBlock::new(source.uniforms);
        let data = vec![0u8; block.size() as usize];
        self.shaders.insert(
            id,
            RecordedShader {
                block,
                data,
                values: HashMap::new(),
            },
        );
        self.record(Command::LoadShader {
            id,
            label: source.label.to_string(),
        });
        Ok(ShaderId::from_raw(id))
    }

    fn destroy_shader(&mut self, shader: ShaderId) {
        let id = shader.raw();
        if self.shaders.remove(&id).is_none() {
            self.unknown("shader", id);
        }
        if self.bound.shader == Some(id) {
            self.bound.shader = None;
        }
        self.record(Command::DestroyShader { id });
    }

    fn bind_shader(&mut self, shader: &ShaderId) {
        let id = shader.raw();
        if self.shaders.contains_key(&id) {
            self.bound.shader = Some(id);
        } else {
            self.unknown("shader", id);
        }
        self.record(Command::BindShader { id });
    }

    fn uniform_location(&self, shader: &ShaderId, name: &str) -> Option<UniformLocation> {
        let index = self.shaders.get(&shader.raw())?.block.index_of(name)?;
        Some(UniformLocation::new(shader.raw(), index))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(shader) = self.shaders.get_mut(&location.shader()) else {
            self.unknown("shader", location.shader());
            return;
        };
        let name = shader
            .block
            .decl(location.index())
            .map(|d| d.name.to_string())
            .unwrap_or_default();

        match shader.block.write(location.index(), &value, &mut shader.data) {
            Ok(()) => {
                shader.values.insert(name.clone(), value.clone());
            }
            Err(e) => self.errors.push(e),
        }
        self.record(Command::SetUniform {
            shader: location.shader(),
            name,
            value,
        });
    }

    fn load_texture(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        filter: TextureFilter,
    ) -> Result<TextureId, GfxError> {
        if width == 0 || height == 0 {
            return Err(GfxError::InvalidTexture(format!("zero extent {width}x{height}")));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GfxError::InvalidTexture(format!(
                "{width}x{height} RGBA8 needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        let id = self.alloc_id();
        self.textures.insert(id, (width, height));
        self.record(Command::LoadTexture { id, width, height, filter });
        Ok(TextureId::from_raw(id))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        let id = texture.raw();
        if self.textures.remove(&id).is_none() {
            self.unknown("texture", id);
        }
        for slot in self.slots.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.record(Command::DestroyTexture { id });
    }

    fn bind_texture(&mut self, texture: &TextureId, slot: u32) {
        let id = texture.raw();
        self.record(Command::BindTexture { id, slot });

        if slot as usize >= TEX_SLOT_CAPACITY {
            self.errors.push(GfxError::SlotOutOfRange { slot, capacity: TEX_SLOT_CAPACITY });
            return;
        }
        if !self.textures.contains_key(&id) {
            self.unknown("texture", id);
            return;
        }
        self.slots[slot as usize] = Some(id);
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.record(Command::Clear { color });
    }

    fn draw_elements(&mut self, offset: u32, count: u32) {
        if let Err(e) = self.validate_draw(offset, count) {
            self.errors.push(e);
        }
        self.record(Command::DrawElements { offset, count });
    }

    fn swap_buffers(&mut self) {
        self.presents += 1;
        self.record(Command::SwapBuffers);
    }

    fn take_errors(&mut self) -> Vec<GfxError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{AttributeFormat, UniformDecl, UniformKind, VertexAttribute};

    const ATTRS: [VertexAttribute; 1] = [VertexAttribute {
        location: 0,
        format: AttributeFormat::Float32x2,
        offset: 0,
    }];
    const LAYOUT: VertexLayout = VertexLayout { stride: 8, attributes: &ATTRS };

    const WGSL: &str = r#"
struct Uniforms { tint: vec4<f32> };
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) pos: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.tint;
}
"#;

    const UNIFORMS: [UniformDecl; 1] = [UniformDecl::new("tint", UniformKind::Vec4)];

    fn source() -> ShaderSource<'static> {
        ShaderSource { label: "test", wgsl: WGSL, uniforms: &UNIFORMS }
    }

    /// Backend with a program, a vertex array and 6 indices of index storage bound.
    fn ready_backend() -> RecordingBackend {
        let mut b = RecordingBackend::new();
        let shader = b.load_shader(&source()).unwrap();
        b.bind_shader(&shader);
        let vao = b.create_vertex_array();
        b.bind_vertex_array(&vao);
        let vbo = b.create_buffer(BufferKind::Vertex, 32, BufferUsage::Dynamic, None);
        b.bind_buffer(BufferKind::Vertex, &vbo);
        b.set_vertex_layout(&LAYOUT);
        let ibo = b.create_buffer(BufferKind::Index, 24, BufferUsage::Dynamic, None);
        b.bind_buffer(BufferKind::Index, &ibo);
        b
    }

    #[test]
    fn valid_draw_queues_no_errors() {
        let mut b = ready_backend();
        b.draw_elements(0, 6);
        assert!(b.take_errors().is_empty());
        assert_eq!(b.draw_calls(), vec![(0, 6)]);
    }

    #[test]
    fn draw_past_index_storage_is_reported() {
        let mut b = ready_backend();
        b.draw_elements(2, 6);
        assert_eq!(
            b.take_errors(),
            vec![GfxError::DrawOutOfRange { offset: 2, end: 8, available: 6 }]
        );
    }

    #[test]
    fn draw_without_program_is_reported() {
        let mut b = RecordingBackend::new();
        b.draw_elements(0, 0);
        assert_eq!(b.take_errors(), vec![GfxError::NotBound("shader program")]);
    }

    #[test]
    fn sub_range_update_writes_in_place() {
        let mut b = RecordingBackend::new();
        let buf = b.create_buffer(BufferKind::Vertex, 12, BufferUsage::Dynamic, None);
        b.update_buffer(&buf, 4, &[1, 2, 3, 4]);
        assert_eq!(b.buffer_data(buf.raw()), Some(&[0, 0, 0, 0, 1, 2, 3, 4, 0, 0, 0, 0][..]));
        assert!(b.take_errors().is_empty());
    }

    #[test]
    fn out_of_range_update_is_rejected_without_writing() {
        let mut b = RecordingBackend::new();
        let buf = b.create_buffer(BufferKind::Index, 8, BufferUsage::Dynamic, None);
        b.update_buffer(&buf, 4, &[9; 8]);
        assert_eq!(b.buffer_data(buf.raw()), Some(&[0u8; 8][..]));
        assert!(matches!(b.take_errors()[..], [GfxError::BufferOverflow { .. }]));
    }

    #[test]
    fn uniforms_are_tracked_per_program() {
        let mut b = ready_backend();
        let shader = ShaderId::from_raw(1);
        let loc = b.uniform_location(&shader, "tint").unwrap();
        b.set_uniform(loc, UniformValue::Vec4([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(b.uniform("tint"), Some(&UniformValue::Vec4([1.0, 0.5, 0.0, 1.0])));
        assert!(b.uniform_location(&shader, "missing").is_none());
    }

    #[test]
    fn invalid_shader_is_rejected() {
        let mut b = RecordingBackend::new();
        let src = ShaderSource { label: "bad", wgsl: "fn (", uniforms: &[] };
        assert!(matches!(b.load_shader(&src), Err(GfxError::ShaderCompile { .. })));
        assert_eq!(b.live_resources(), 0);
    }

    #[test]
    fn texture_upload_checks_pixel_count() {
        let mut b = RecordingBackend::new();
        assert!(b.load_texture(&[0; 15], 2, 2, TextureFilter::Linear).is_err());
        assert!(b.load_texture(&[], 0, 0, TextureFilter::Linear).is_err());
        assert!(b.load_texture(&[0; 16], 2, 2, TextureFilter::Linear).is_ok());
    }

    #[test]
    fn destroyed_texture_is_unbound_from_slots() {
        let mut b = RecordingBackend::new();
        let tex = b.load_texture(&[255; 4], 1, 1, TextureFilter::Nearest).unwrap();
        b.bind_texture(&tex, 3);
        assert_eq!(b.slot_binding(3), Some(tex.raw()));
        b.destroy_texture(tex);
        assert_eq!(b.slot_binding(3), None);
        assert_eq!(b.live_resources(), 0);
    }

    #[test]
    fn binding_past_slot_capacity_is_reported() {
        let mut b = RecordingBackend::new();
        let tex = b.load_texture(&[255; 4], 1, 1, TextureFilter::Linear).unwrap();
        b.bind_texture(&tex, TEX_SLOT_CAPACITY as u32);
        assert!(matches!(b.take_errors()[..], [GfxError::SlotOutOfRange { .. }]));
    }

    #[test]
    fn command_limit_keeps_the_newest_calls() {
        let mut b = RecordingBackend::with_command_limit(3);
        for _ in 0..100 {
            b.clear([0.0, 0.0, 0.0, 1.0]);
            b.swap_buffers();
        }
        b.clear([1.0, 1.0, 1.0, 1.0]);

        assert_eq!(b.presents(), 100);
        assert_eq!(
            b.commands(),
            &[
                Command::Clear { color: [0.0, 0.0, 0.0, 1.0] },
                Command::SwapBuffers,
                Command::Clear { color: [1.0, 1.0, 1.0, 1.0] },
            ]
        );
    }
}
