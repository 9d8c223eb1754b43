use std::borrow::Cow;

use crate::compile::{CompiledStage, ProgramStages};
use crate::error::BuildError;

/// Bytes per vertex: one `vec2` position.
const VERTEX_STRIDE: wgpu::BufferAddress = 2 * std::mem::size_of::<f32>() as wgpu::BufferAddress;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    format: wgpu::VertexFormat::Float32x2,
    offset: 0,
    shader_location: 0,
}];

/// Linked program: render pipeline plus the uniform block it reads.
pub struct GradientPipeline {
    pub(crate) pipeline: wgpu::RenderPipeline,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) uniform_size: wgpu::BufferAddress,
}

impl GradientPipeline {
    /// Creates the pipeline inside a validation error scope so a rejected
    /// program surfaces as a [`BuildError::Link`] instead of a device panic.
    pub(crate) fn link(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        stages: &ProgramStages,
    ) -> Result<Self, BuildError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = create_module(device, "grainient vertex", &stages.vertex);
        let fragment_module = create_module(device, "grainient fragment", &stages.fragment);

        let uniform_size = stages.layout.size_bytes();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grainient uniforms"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grainient uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grainient uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grainient pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grainient pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: VERTEX_STRIDE,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &POSITION_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
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
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(BuildError::Link(err.to_string()));
        }

        Ok(Self {
            pipeline,
            bind_group,
            uniform_buffer,
            uniform_size,
        })
    }

    pub(crate) fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &[u8]) {
        let len = (uniforms.len() as wgpu::BufferAddress).min(self.uniform_size) as usize;
        if len == 0 {
            return;
        }
        queue.write_buffer(&self.uniform_buffer, 0, &uniforms[..len]);
    }
}

fn create_module(device: &wgpu::Device, label: &str, stage: &CompiledStage) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(stage.glsl().to_owned()),
            stage: stage.naga_stage(),
            defines: &[],
        },
    })
}
