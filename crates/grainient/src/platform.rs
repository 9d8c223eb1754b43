use std::sync::Arc;
use std::time::Instant;

use renderer::{
    ContextAttributes, FrameHandle, ListenerId, PixelSize, Platform, RenderError, ViewportMetrics,
    WgpuSurface,
};
use winit::dpi::LogicalSize;
use winit::window::Window;

/// A desktop window acting as viewport and container.
///
/// Frame requests map onto `request_redraw`; the event loop hands the due
/// handle back to the background on `RedrawRequested`.
pub struct WinitPlatform {
    window: Arc<Window>,
    next_id: u64,
    pending_frame: Option<FrameHandle>,
    resize_listener: Option<ListenerId>,
}

impl WinitPlatform {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            next_id: 1,
            pending_frame: None,
            resize_listener: None,
        }
    }

    /// Handle of the frame that should run on this redraw, if one is scheduled.
    pub fn take_due_frame(&mut self) -> Option<FrameHandle> {
        self.pending_frame.take()
    }

    pub fn wants_resize(&self) -> bool {
        self.resize_listener.is_some()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Platform for WinitPlatform {
    type Surface = WgpuSurface;

    fn viewport(&self) -> ViewportMetrics {
        let scale_factor = self.window.scale_factor();
        let logical: LogicalSize<f64> = self.window.inner_size().to_logical(scale_factor);
        ViewportMetrics::new(logical.width, logical.height, scale_factor)
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn acquire_surface(
        &mut self,
        attributes: &ContextAttributes,
        size: PixelSize,
    ) -> Result<WgpuSurface, RenderError> {
        WgpuSurface::new(Arc::clone(&self.window), size, attributes)
    }

    fn attach_surface(&mut self, _surface: &WgpuSurface) {
        self.window.set_visible(true);
    }

    fn detach_surface(&mut self, _surface: &WgpuSurface) {
        self.window.set_visible(false);
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle::new(self.next_id());
        self.pending_frame = Some(handle);
        self.window.request_redraw();
        tracing::trace!(frame = handle.id(), "frame requested");
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame == Some(handle) {
            self.pending_frame = None;
        }
    }

    fn add_resize_listener(&mut self) -> ListenerId {
        let id = ListenerId::new(self.next_id());
        self.resize_listener = Some(id);
        id
    }

    fn remove_resize_listener(&mut self, id: ListenerId) {
        if self.resize_listener == Some(id) {
            self.resize_listener = None;
        }
    }
}
