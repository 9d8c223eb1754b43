//! wgpu implementation of [`DrawSurface`].
//!
//! - `context` owns the wgpu instance, device, and swapchain and reconfigures
//!   the swapchain when the drawable size changes.
//! - `pipeline` turns compiled stages into a render pipeline with a single
//!   uniform bind group.

mod context;
mod pipeline;

use std::any::Any;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::util::DeviceExt;

use crate::compile::ProgramStages;
use crate::error::{BuildError, RenderError};
use crate::platform::DrawSurface;
use crate::types::{ContextAttributes, PixelSize};

use self::context::GpuContext;
pub use self::pipeline::GradientPipeline;

/// A window-backed surface drawn with wgpu.
pub struct WgpuSurface {
    context: GpuContext,
    vertices: Option<(wgpu::Buffer, u32)>,
    clear_color: wgpu::Color,
    // Dropped after `context`, whose surface borrows the window's handles.
    _target: Arc<dyn Any + Send + Sync>,
}

impl WgpuSurface {
    /// Creates a surface for `target`, which is kept alive for as long as the
    /// surface exists.
    pub fn new<T>(
        target: Arc<T>,
        size: PixelSize,
        attributes: &ContextAttributes,
    ) -> Result<Self, RenderError>
    where
        T: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        // SAFETY: `target` is stored in the returned value and dropped after the context.
        let context = unsafe { GpuContext::new(target.as_ref(), size, attributes) }
            .map_err(|err| RenderError::Unsupported(format!("{err:#}")))?;
        let clear_color = if attributes.alpha {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        };
        Ok(Self {
            context,
            vertices: None,
            clear_color,
            _target: target,
        })
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.context.format()
    }
}

impl DrawSurface for WgpuSurface {
    type Program = GradientPipeline;

    fn link_program(&mut self, stages: &ProgramStages) -> Result<GradientPipeline, BuildError> {
        let program = GradientPipeline::link(&self.context.device, self.context.format(), stages)?;
        tracing::debug!(uniform_bytes = program.uniform_size, "linked background program");
        Ok(program)
    }

    fn upload_vertices(&mut self, positions: &[f32]) -> Result<(), RenderError> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grainient vertices"),
            contents: bytemuck::cast_slice(positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::Resource(err.to_string()));
        }
        let count = (positions.len() / 2) as u32;
        self.vertices = Some((buffer, count));
        Ok(())
    }

    fn pixel_size(&self) -> PixelSize {
        self.context.size
    }

    fn reallocate(&mut self, size: PixelSize) {
        self.context.resize(size);
    }

    fn draw(&mut self, program: &GradientPipeline, uniforms: &[u8]) -> Result<(), RenderError> {
        let Some((vertices, count)) = &self.vertices else {
            return Err(RenderError::Resource("no vertex data uploaded".into()));
        };

        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("swapchain lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::debug!("surface timeout; retrying next frame");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::Resource("surface out of memory".into()));
            }
            Err(other) => return Err(RenderError::Surface(other.to_string())),
        };

        program.write_uniforms(&self.context.queue, uniforms);

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("grainient encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("grainient pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&program.pipeline);
            render_pass.set_bind_group(0, &program.bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertices.slice(..));
            render_pass.draw(0..*count, 0..1);
        }
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn release_program(&mut self, program: GradientPipeline) {
        program.uniform_buffer.destroy();
        drop(program);
    }
}
