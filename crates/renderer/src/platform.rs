//! Host seams the lifecycle is written against.
//!
//! A [`Platform`] plays the role of the embedding environment: it reports the
//! viewport, owns the container the surface is attached to, and provides the
//! animation-frame and resize primitives. The [`DrawSurface`] it hands out
//! wraps the GPU context for one surface.

use std::time::Instant;

use crate::compile::ProgramStages;
use crate::error::{BuildError, RenderError};
use crate::types::{ContextAttributes, PixelSize, ViewportMetrics};

/// Identifies one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Identifies a registered resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Embedding environment of a background renderer.
pub trait Platform {
    type Surface: DrawSurface;

    /// Current viewport in logical units.
    fn viewport(&self) -> ViewportMetrics;

    /// Monotonic clock used for the animation time base.
    fn now(&self) -> Instant;

    /// Creates a drawing surface sized to `size`. The surface is not yet
    /// visible; see [`Platform::attach_surface`].
    fn acquire_surface(
        &mut self,
        attributes: &ContextAttributes,
        size: PixelSize,
    ) -> Result<Self::Surface, RenderError>;

    /// Inserts the surface into the container.
    fn attach_surface(&mut self, surface: &Self::Surface);

    /// Removes the surface from the container.
    fn detach_surface(&mut self, surface: &Self::Surface);

    /// Schedules one frame callback. The host later hands the handle back to
    /// [`crate::Background::frame`].
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a pending frame callback. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Starts delivering viewport resize notifications.
    fn add_resize_listener(&mut self) -> ListenerId;

    /// Stops delivering resize notifications for `id`.
    fn remove_resize_listener(&mut self, id: ListenerId);
}

/// A GPU-backed drawing surface.
pub trait DrawSurface {
    /// Linked program object.
    type Program;

    /// Links compiled stages into an executable program.
    fn link_program(&mut self, stages: &ProgramStages) -> Result<Self::Program, BuildError>;

    /// Uploads the position attribute (2 floats per vertex).
    fn upload_vertices(&mut self, positions: &[f32]) -> Result<(), RenderError>;

    /// Current backing storage size, after any clamping to device limits.
    fn pixel_size(&self) -> PixelSize;

    /// Resizes the backing storage and viewport.
    fn reallocate(&mut self, size: PixelSize);

    /// Draws the uploaded triangle with `program`, uploading `uniforms` first.
    fn draw(&mut self, program: &Self::Program, uniforms: &[u8]) -> Result<(), RenderError>;

    /// Frees a program.
    fn release_program(&mut self, program: Self::Program);
}
