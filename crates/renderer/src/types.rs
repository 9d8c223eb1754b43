use std::fmt;

/// Upper bound applied to the device pixel ratio before sizing the surface.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Drawable size of the surface in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Viewport dimensions in logical units plus the ratio of physical pixels per unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Pixel ratio actually used for sizing: missing or bogus ratios count as 1
    /// and very dense displays are capped at [`MAX_PIXEL_RATIO`].
    pub fn effective_pixel_ratio(&self) -> f64 {
        let ratio = self.device_pixel_ratio;
        if !ratio.is_finite() || ratio <= 0.0 {
            1.0
        } else {
            ratio.min(MAX_PIXEL_RATIO)
        }
    }

    /// Computes the drawable size as `floor(viewport * min(dpr, 2))` per axis.
    pub fn drawable_size(&self) -> PixelSize {
        let ratio = self.effective_pixel_ratio();
        let width = logical_extent(self.width);
        let height = logical_extent(self.height);
        PixelSize::new(
            scale_extent(width, ratio),
            scale_extent(height, ratio),
        )
    }
}

fn logical_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.floor().max(1.0)
    } else {
        1.0
    }
}

fn scale_extent(extent: f64, ratio: f64) -> u32 {
    let scaled = (extent * ratio).floor();
    if scaled >= u32::MAX as f64 {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

/// GPU adapter power hint forwarded to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    Low,
    #[default]
    High,
}

/// Attributes requested when acquiring the drawing context.
///
/// The background is a flat full-screen layer, so the defaults disable MSAA,
/// depth, and stencil and ask for the high-performance adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAttributes {
    pub alpha: bool,
    pub antialias: bool,
    pub depth: bool,
    pub stencil: bool,
    pub power_preference: PowerPreference,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self {
            alpha: true,
            antialias: false,
            depth: false,
            stencil: false,
            power_preference: PowerPreference::High,
        }
    }
}
