use std::collections::HashMap;

use winit::dpi::PhysicalSize;

use crate::device::{Gpu, GpuFrame};
use crate::gfx::{
    validate_wgsl, BufferId, BufferKind, BufferUsage, GfxError, GraphicsBackend, ShaderId,
    ShaderSource, TextureFilter, TextureId, UniformBlock, UniformLocation, UniformValue,
    VertexArrayId, VertexLayout, TEX_SLOT_CAPACITY,
};

use super::pipeline;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
    /// Size requested by the caller; the allocation is rounded up to 4 bytes.
    size: u64,
}

struct GpuShader {
    label: String,
    module: wgpu::ShaderModule,
    block: UniformBlock,
    data: Vec<u8>,
    ubo: wgpu::Buffer,
    dirty: bool,
    pipelines: HashMap<VertexLayout, wgpu::RenderPipeline>,
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

#[derive(Default)]
struct VertexArrayState {
    layout: Option<VertexLayout>,
    vertex_buffer: Option<u32>,
}

#[derive(Default)]
struct Bindings {
    vertex_array: Option<u32>,
    vertex_buffer: Option<u32>,
    index_buffer: Option<u32>,
    shader: Option<u32>,
}

/// Everything a draw call reads, resolved from the current bindings.
struct DrawTarget {
    shader: u32,
    layout: VertexLayout,
    vertex_buffer: u32,
    index_buffer: u32,
}

/// Stateful backend over a window's [`Gpu`].
///
/// Draws are recorded into one encoder per frame; the surface image is
/// acquired by the first draw (or by `swap_buffers` when nothing was drawn)
/// and presented by `swap_buffers`. Buffer writes go through the queue, so
/// they land before any command of the frame executes.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    bind_group_layout: wgpu::BindGroupLayout,
    fallback: GpuTexture,

    next_id: u32,
    vertex_arrays: HashMap<u32, VertexArrayState>,
    buffers: HashMap<u32, GpuBuffer>,
    shaders: HashMap<u32, GpuShader>,
    textures: HashMap<u32, GpuTexture>,

    slots: [Option<u32>; TEX_SLOT_CAPACITY],
    bound: Bindings,

    frame: Option<GpuFrame>,
    frame_skipped: bool,
    pending_clear: Option<wgpu::Color>,

    errors: Vec<GfxError>,
    lost: bool,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        let bind_group_layout = pipeline::create_bind_group_layout(gpu.device());
        let fallback = create_texture(&gpu, "slate fallback texture", &[255; 4], 1, 1, TextureFilter::Nearest);

        Self {
            gpu,
            bind_group_layout,
            fallback,
            next_id: 0,
            vertex_arrays: HashMap::new(),
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            textures: HashMap::new(),
            slots: Default::default(),
            bound: Bindings::default(),
            frame: None,
            frame_skipped: false,
            pending_clear: None,
            errors: Vec::new(),
            lost: false,
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Reconfigures the surface. A zero size suspends presentation until the
    /// next non-zero resize.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if self.frame.take().is_some() {
            log::debug!("dropping in-flight frame on resize");
        }
        self.gpu.resize(size);
    }

    /// True after a fatal surface error; nothing will be presented again.
    pub fn is_lost(&self) -> bool {
        self.lost
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn unknown(&mut self, kind: &'static str, id: u32) {
        self.errors.push(GfxError::UnknownHandle { kind, id });
    }

    /// Acquires the surface image for this frame if not already held.
    fn ensure_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }
        if self.frame_skipped || self.lost {
            return false;
        }

        let size = self.gpu.size();
        if size.width == 0 || size.height == 0 {
            self.frame_skipped = true;
            return false;
        }

        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.frame = Some(frame);
                true
            }
            Err(err) => {
                let message = err.to_string();
                let action = self.gpu.handle_surface_error(err);
                log::debug!("surface acquisition failed ({message}); action: {action:?}");

                let fatal = action.is_fatal();
                self.lost |= fatal;
                self.frame_skipped = true;
                self.errors.push(GfxError::Surface { message, fatal });
                false
            }
        }
    }

    fn draw_target(&self, offset: u32, count: u32) -> Result<DrawTarget, GfxError> {
        let shader = self.bound.shader.ok_or(GfxError::NotBound("shader program"))?;
        if !self.shaders.contains_key(&shader) {
            return Err(GfxError::UnknownHandle { kind: "shader", id: shader });
        }

        let vao_id = self.bound.vertex_array.ok_or(GfxError::NotBound("vertex array"))?;
        let vao = self
            .vertex_arrays
            .get(&vao_id)
            .ok_or(GfxError::UnknownHandle { kind: "vertex array", id: vao_id })?;
        let (Some(layout), Some(vertex_buffer)) = (vao.layout, vao.vertex_buffer) else {
            return Err(GfxError::NotBound("vertex layout"));
        };
        if !self.buffers.contains_key(&vertex_buffer) {
            return Err(GfxError::UnknownHandle { kind: "buffer", id: vertex_buffer });
        }

        let index_buffer = self.bound.index_buffer.ok_or(GfxError::NotBound("index buffer"))?;
        let available = self
            .buffers
            .get(&index_buffer)
            .map(|b| b.size / 4)
            .ok_or(GfxError::UnknownHandle { kind: "buffer", id: index_buffer })?;

        let end = u64::from(offset) + u64::from(count);
        if end > available {
            return Err(GfxError::DrawOutOfRange { offset, end, available });
        }

        Ok(DrawTarget {
            shader,
            layout,
            vertex_buffer,
            index_buffer,
        })
    }

    fn flush_uniforms(&mut self, shader: u32) {
        let Some(s) = self.shaders.get_mut(&shader) else { return };
        if s.dirty {
            self.gpu.queue().write_buffer(&s.ubo, 0, &s.data);
            s.dirty = false;
        }
    }

    fn ensure_pipeline(&mut self, shader: u32, layout: &VertexLayout) {
        let format = self.gpu.surface_format();
        let Some(s) = self.shaders.get_mut(&shader) else { return };

        if !s.pipelines.contains_key(layout) {
            log::debug!("building pipeline for `{}` (stride {})", s.label, layout.stride);
            let built = pipeline::create_pipeline(
                self.gpu.device(),
                &self.bind_group_layout,
                &s.module,
                &s.label,
                layout,
                format,
            );
            s.pipelines.insert(*layout, built);
        }
    }

    fn create_bind_group(&self, shader: &GpuShader) -> wgpu::BindGroup {
        let slot_textures: Vec<&GpuTexture> = self
            .slots
            .iter()
            .map(|slot| slot.and_then(|id| self.textures.get(&id)).unwrap_or(&self.fallback))
            .collect();

        let mut entries = Vec::with_capacity(1 + 2 * TEX_SLOT_CAPACITY);
        entries.push(wgpu::BindGroupEntry {
            binding: 0,
            resource: shader.ubo.as_entire_binding(),
        });
        for (slot, tex) in slot_textures.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: pipeline::texture_binding(slot),
                resource: wgpu::BindingResource::TextureView(&tex.view),
            });
        }
        for (slot, tex) in slot_textures.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: pipeline::sampler_binding(slot),
                resource: wgpu::BindingResource::Sampler(&tex.sampler),
            });
        }

        self.gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("slate bind group"),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }

    fn clear_pass(&mut self, color: wgpu::Color) {
        let Some(frame) = self.frame.as_mut() else { return };
        let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("slate clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

fn create_texture(
    gpu: &Gpu<'_>,
    label: &str,
    pixels: &[u8],
    width: u32,
    height: u32,
    filter: TextureFilter,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = gpu.device().create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    gpu.queue().write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );

    let filter_mode = match filter {
        TextureFilter::Linear => wgpu::FilterMode::Linear,
        TextureFilter::Nearest => wgpu::FilterMode::Nearest,
    };
    let sampler = gpu.device().create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode,
        min_filter: filter_mode,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    });

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture {
        texture,
        view,
        sampler,
    }
}

#[inline]
fn align4(n: u64) -> u64 {
    (n + 3) & !3
}

impl GraphicsBackend for WgpuBackend<'_> {
    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = self.alloc_id();
        self.vertex_arrays.insert(id, VertexArrayState::default());
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
    }

    fn bind_vertex_array(&mut self, vao: &VertexArrayId) {
        let id = vao.raw();
        if self.vertex_arrays.contains_key(&id) {
            self.bound.vertex_array = Some(id);
        } else {
            self.unknown("vertex array", id);
        }
    }

    fn set_vertex_layout(&mut self, layout: &VertexLayout) {
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

        let (label, gpu_usage) = match (kind, usage) {
            (BufferKind::Vertex, BufferUsage::Static) => ("slate static vbo", wgpu::BufferUsages::VERTEX),
            (BufferKind::Vertex, BufferUsage::Dynamic) => ("slate dynamic vbo", wgpu::BufferUsages::VERTEX),
            (BufferKind::Index, BufferUsage::Static) => ("slate static ibo", wgpu::BufferUsages::INDEX),
            (BufferKind::Index, BufferUsage::Dynamic) => ("slate dynamic ibo", wgpu::BufferUsages::INDEX),
        };

        let buffer = self.gpu.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: align4(size.max(4)),
            usage: gpu_usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        if let Some(src) = contents {
            if src.len() as u64 > size {
                self.errors.push(GfxError::BufferOverflow {
                    id,
                    offset: 0,
                    len: src.len() as u64,
                    size,
                });
            }
            let n = src.len().min(size as usize);
            let mut padded = src[..n].to_vec();
            padded.resize(align4(n as u64) as usize, 0);
            if !padded.is_empty() {
                self.gpu.queue().write_buffer(&buffer, 0, &padded);
            }
        }

        self.buffers.insert(id, GpuBuffer { buffer, kind, size });
        BufferId::from_raw(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        let id = buffer.raw();
        match self.buffers.remove(&id) {
            Some(b) => b.buffer.destroy(),
            None => self.unknown("buffer", id),
        }
        for slot in [&mut self.bound.vertex_buffer, &mut self.bound.index_buffer] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    fn bind_buffer(&mut self, kind: BufferKind, buffer: &BufferId) {
        let id = buffer.raw();
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

        let Some(b) = self.buffers.get(&id) else {
            self.unknown("buffer", id);
            return;
        };
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 || len % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            self.errors.push(GfxError::MisalignedUpdate { id, offset, len });
            return;
        }
        if offset + len > b.size {
            self.errors.push(GfxError::BufferOverflow { id, offset, len, size: b.size });
            return;
        }
        if len > 0 {
            self.gpu.queue().write_buffer(&b.buffer, offset, data);
        }
    }

    fn load_shader(&mut self, source: &ShaderSource<'_>) -> Result<ShaderId, GfxError> {
        validate_wgsl(source.label, source.wgsl)?;

        let device = self.gpu.device();
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
        });

        let block = UniformBlock::new(source.uniforms);
        let data = vec![0u8; block.size() as usize];
        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("slate uniform buffer"),
            size: align4(block.size()).max(16),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let id = self.alloc_id();
        self.shaders.insert(
            id,
            GpuShader {
                label: source.label.to_string(),
                module,
                block,
                data,
                ubo,
                dirty: true,
                pipelines: HashMap::new(),
            },
        );
        Ok(ShaderId::from_raw(id))
    }

    fn destroy_shader(&mut self, shader: ShaderId) {
        let id = shader.raw();
        match self.shaders.remove(&id) {
            Some(s) => s.ubo.destroy(),
            None => self.unknown("shader", id),
        }
        if self.bound.shader == Some(id) {
            self.bound.shader = None;
        }
    }

    fn bind_shader(&mut self, shader: &ShaderId) {
        let id = shader.raw();
        if self.shaders.contains_key(&id) {
            self.bound.shader = Some(id);
        } else {
            self.unknown("shader", id);
        }
    }

    fn uniform_location(&self, shader: &ShaderId, name: &str) -> Option<UniformLocation> {
        let index = self.shaders.get(&shader.raw())?.block.index_of(name)?;
        Some(UniformLocation::new(shader.raw(), index))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let Some(s) = self.shaders.get_mut(&location.shader()) else {
            self.unknown("shader", location.shader());
            return;
        };
        match s.block.write(location.index(), &value, &mut s.data) {
            Ok(()) => s.dirty = true,
            Err(e) => self.errors.push(e),
        }
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
        let limit = self.gpu.device().limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(GfxError::InvalidTexture(format!(
                "{width}x{height} exceeds the device limit of {limit}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GfxError::InvalidTexture(format!(
                "{width}x{height} RGBA8 needs {expected} bytes, got {}",
                pixels.len()
            )));
        }

        let tex = create_texture(&self.gpu, "slate texture", pixels, width, height, filter);
        let id = self.alloc_id();
        self.textures.insert(id, tex);
        Ok(TextureId::from_raw(id))
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        let id = texture.raw();
        match self.textures.remove(&id) {
            Some(t) => t.texture.destroy(),
            None => self.unknown("texture", id),
        }
        for slot in self.slots.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    fn bind_texture(&mut self, texture: &TextureId, slot: u32) {
        let id = texture.raw();
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
        let [r, g, b, a] = color.map(f64::from);
        self.pending_clear = Some(wgpu::Color { r, g, b, a });
    }

    fn draw_elements(&mut self, offset: u32, count: u32) {
        let target = match self.draw_target(offset, count) {
            Ok(t) => t,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        if count == 0 || !self.ensure_frame() {
            return;
        }

        self.flush_uniforms(target.shader);
        self.ensure_pipeline(target.shader, &target.layout);

        let (Some(shader), Some(vbo), Some(ibo)) = (
            self.shaders.get(&target.shader),
            self.buffers.get(&target.vertex_buffer),
            self.buffers.get(&target.index_buffer),
        ) else {
            return;
        };
        let Some(pipeline) = shader.pipelines.get(&target.layout) else { return };
        let bind_group = self.create_bind_group(shader);

        let load = match self.pending_clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        };
        let Some(frame) = self.frame.as_mut() else { return };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("slate batch pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.buffer.slice(..));
        rpass.set_index_buffer(ibo.buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(offset..offset + count, 0, 0..1);
    }

    fn swap_buffers(&mut self) {
        if self.ensure_frame() {
            if let Some(color) = self.pending_clear.take() {
                self.clear_pass(color);
            }
            if let Some(frame) = self.frame.take() {
                self.gpu.submit(frame);
            }
        }
        self.pending_clear = None;
        self.frame_skipped = false;
    }

    fn take_errors(&mut self) -> Vec<GfxError> {
        std::mem::take(&mut self.errors)
    }
}
