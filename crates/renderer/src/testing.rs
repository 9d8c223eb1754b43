//! Recording `Platform` and `DrawSurface` used by the lifecycle tests.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::compile::ProgramStages;
use crate::error::{BuildError, RenderError};
use crate::platform::{DrawSurface, FrameHandle, ListenerId, Platform};
use crate::types::{ContextAttributes, PixelSize, ViewportMetrics};
use crate::uniforms::UniformLayout;

pub(crate) type Recorder = Rc<RefCell<Log>>;

/// Everything the mock observed, plus switches for injected failures.
#[derive(Debug, Default)]
pub(crate) struct Log {
    pub fail_acquire: bool,
    pub fail_link: bool,
    pub fail_upload: bool,
    pub fail_draw: bool,
    /// Largest texture dimension the mock device accepts.
    pub max_dimension: Option<u32>,

    pub surfaces_created: usize,
    pub surfaces_dropped: usize,
    /// Surfaces currently in the container.
    pub attached: usize,
    pub attach_calls: usize,
    pub detach_calls: usize,
    pub programs_linked: usize,
    pub programs_released: usize,
    pub uploaded: Option<Vec<f32>>,
    pub reallocations: Vec<PixelSize>,
    pub draws: Vec<DrawRecord>,
    pub pending_frames: Vec<FrameHandle>,
    pub cancelled: Vec<FrameHandle>,
    pub listeners: Vec<ListenerId>,
}

/// Uniform block contents seen by one draw call.
#[derive(Debug, Clone)]
pub(crate) struct DrawRecord {
    layout: UniformLayout,
    words: Vec<f32>,
}

impl DrawRecord {
    pub fn value(&self, name: &str) -> Option<Vec<f32>> {
        let slot = self.layout.slot(name)?;
        let start = slot.offset as usize;
        let len = slot.kind.components() as usize;
        self.words.get(start..start + len).map(<[f32]>::to_vec)
    }
}

pub(crate) struct MockPlatform {
    viewport: ViewportMetrics,
    clock: Instant,
    next_id: u64,
    log: Recorder,
}

impl MockPlatform {
    pub fn new(viewport: ViewportMetrics) -> Self {
        Self {
            viewport,
            clock: Instant::now(),
            next_id: 1,
            log: Recorder::default(),
        }
    }

    pub fn recorder(&self) -> Recorder {
        Rc::clone(&self.log)
    }

    pub fn set_viewport(&mut self, viewport: ViewportMetrics) {
        self.viewport = viewport;
    }

    /// Fires the oldest scheduled frame, as the host's frame primitive would.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        let mut log = self.log.borrow_mut();
        if log.pending_frames.is_empty() {
            None
        } else {
            Some(log.pending_frames.remove(0))
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Platform for MockPlatform {
    type Surface = MockSurface;

    fn viewport(&self) -> ViewportMetrics {
        self.viewport
    }

    fn now(&self) -> Instant {
        self.clock
    }

    fn acquire_surface(
        &mut self,
        _attributes: &ContextAttributes,
        size: PixelSize,
    ) -> Result<MockSurface, RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_acquire {
            return Err(RenderError::Unsupported("mock backend disabled".into()));
        }
        log.surfaces_created += 1;
        Ok(MockSurface {
            size: clamp_to_device(size, log.max_dimension),
            next_program: 1,
            log: Rc::clone(&self.log),
        })
    }

    fn attach_surface(&mut self, _surface: &MockSurface) {
        let mut log = self.log.borrow_mut();
        log.attached += 1;
        log.attach_calls += 1;
    }

    fn detach_surface(&mut self, _surface: &MockSurface) {
        let mut log = self.log.borrow_mut();
        log.attached = log.attached.saturating_sub(1);
        log.detach_calls += 1;
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle::new(self.next_id());
        self.log.borrow_mut().pending_frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut log = self.log.borrow_mut();
        log.pending_frames.retain(|pending| *pending != handle);
        log.cancelled.push(handle);
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId::new(self.next_id());
        self.log.borrow_mut().listeners.push(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        self.log.borrow_mut().listeners.retain(|listener| *listener != id);
    }
}

pub(crate) struct MockSurface {
    size: PixelSize,
    next_program: u32,
    log: Recorder,
}

#[derive(Debug)]
pub(crate) struct MockProgram {
    _id: u32,
    layout: UniformLayout,
}

impl DrawSurface for MockSurface {
    type Program = MockProgram;

    fn link_program(&mut self, stages: &ProgramStages) -> Result<MockProgram, BuildError> {
        let mut log = self.log.borrow_mut();
        if log.fail_link {
            return Err(BuildError::Link("mock link failure".into()));
        }
        log.programs_linked += 1;
        let id = self.next_program;
        self.next_program += 1;
        Ok(MockProgram {
            _id: id,
            layout: stages.layout.clone(),
        })
    }

    fn upload_vertices(&mut self, positions: &[f32]) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_upload {
            return Err(RenderError::Resource("mock vertex buffer exhausted".into()));
        }
        log.uploaded = Some(positions.to_vec());
        Ok(())
    }

    fn pixel_size(&self) -> PixelSize {
        self.size
    }

    fn reallocate(&mut self, size: PixelSize) {
        let mut log = self.log.borrow_mut();
        self.size = clamp_to_device(size, log.max_dimension);
        log.reallocations.push(size);
    }

    fn draw(&mut self, program: &MockProgram, uniforms: &[u8]) -> Result<(), RenderError> {
        let mut log = self.log.borrow_mut();
        if log.fail_draw {
            return Err(RenderError::Surface("mock surface lost".into()));
        }
        let words = uniforms
            .chunks_exact(4)
            .map(|chunk| f32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        log.draws.push(DrawRecord {
            layout: program.layout.clone(),
            words,
        });
        Ok(())
    }

    fn release_program(&mut self, _program: MockProgram) {
        self.log.borrow_mut().programs_released += 1;
    }
}

fn clamp_to_device(size: PixelSize, max_dimension: Option<u32>) -> PixelSize {
    match max_dimension {
        Some(max) => PixelSize::new(size.width.min(max), size.height.min(max)),
        None => size,
    }
}

impl Drop for MockSurface {
    fn drop(&mut self) {
        self.log.borrow_mut().surfaces_dropped += 1;
    }
}
