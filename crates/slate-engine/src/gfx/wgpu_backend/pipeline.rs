use crate::gfx::{AttributeFormat, VertexLayout, TEX_SLOT_CAPACITY};

/// Binding index of the texture bound to `slot`.
#[inline]
pub(super) const fn texture_binding(slot: usize) -> u32 {
    1 + slot as u32
}

/// Binding index of the sampler paired with `slot`.
#[inline]
pub(super) const fn sampler_binding(slot: usize) -> u32 {
    1 + (TEX_SLOT_CAPACITY + slot) as u32
}

pub(super) fn vertex_format(format: AttributeFormat) -> wgpu::VertexFormat {
    match format {
        AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
        AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
        AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
        AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
    }
}

pub(super) fn vertex_attributes(layout: &VertexLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: vertex_format(a.format),
            offset: u64::from(a.offset),
            shader_location: a.location,
        })
        .collect()
}

/// Layout shared by every program: uniform block, then textures, then samplers.
pub(super) fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = Vec::with_capacity(1 + 2 * TEX_SLOT_CAPACITY);

    entries.push(wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    });

    for slot in 0..TEX_SLOT_CAPACITY {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: texture_binding(slot),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
    }

    for slot in 0..TEX_SLOT_CAPACITY {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: sampler_binding(slot),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("slate bgl"),
        entries: &entries,
    })
}

/// Builds the triangle-list pipeline for one program and vertex layout.
pub(super) fn create_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    module: &wgpu::ShaderModule,
    label: &str,
    layout: &VertexLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let attributes = vertex_attributes(layout);

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("slate pipeline layout"),
        bind_group_layouts: &[bind_group_layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: u64::from(layout.stride),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::VertexAttribute;

    #[test]
    fn texture_and_sampler_bindings_do_not_overlap() {
        assert_eq!(texture_binding(0), 1);
        assert_eq!(texture_binding(TEX_SLOT_CAPACITY - 1), TEX_SLOT_CAPACITY as u32);
        assert_eq!(sampler_binding(0), TEX_SLOT_CAPACITY as u32 + 1);
        assert_eq!(sampler_binding(TEX_SLOT_CAPACITY - 1), 2 * TEX_SLOT_CAPACITY as u32);
    }

    #[test]
    fn attributes_keep_location_and_offset() {
        const ATTRS: [VertexAttribute; 2] = [
            VertexAttribute { location: 0, format: AttributeFormat::Float32x3, offset: 0 },
            VertexAttribute { location: 3, format: AttributeFormat::Float32, offset: 12 },
        ];
        let attrs = vertex_attributes(&VertexLayout { stride: 16, attributes: &ATTRS });
        assert_eq!(attrs[1].shader_location, 3);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[1].format, wgpu::VertexFormat::Float32);
    }
}
