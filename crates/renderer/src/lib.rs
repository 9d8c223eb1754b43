//! Renderer crate for Grainient, an animated gradient background.
//!
//! The crate builds one GLSL program, feeds it a fixed set of tunable
//! uniforms, and drives it from the host's frame callbacks:
//!
//! ```text
//!   ShaderSource ──compile──▶ ProgramStages ──DrawSurface::link──▶ program
//!                                   │
//!                                   └─ UniformLayout ──▶ UniformRegistry
//!
//!   Tunables ⊕ theme overlay ──▶ UniformRegistry ──frame()──▶ DrawSurface::draw
//! ```
//!
//! [`Background`] owns the lifecycle (`init`, `set_theme`, `resize`,
//! `destroy`, and the per-frame step) and talks to its environment only
//! through the [`Platform`] and [`DrawSurface`] traits. [`WgpuSurface`] is
//! the GPU implementation of the latter; [`HostBridge`] forwards an external
//! [`ThemeSignal`] to a running background.

mod background;
mod bridge;
mod compile;
mod error;
mod gpu;
mod params;
mod platform;
mod types;
mod uniforms;

#[cfg(test)]
mod testing;

pub use background::{Background, BackgroundOptions, Phase, FULLSCREEN_TRIANGLE};
pub use bridge::{HostBridge, ThemeSignal};
pub use compile::{
    build_program, compile_stages, BuiltProgram, CompiledStage, ProgramStages, ShaderSource,
    DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
};
pub use error::{BuildError, RenderError, Stage};
pub use gpu::{GradientPipeline, WgpuSurface};
pub use params::{
    hex_to_rgb, resolve, EffectiveParameters, ThemeName, ThemePreset, Tunables, TuningOverrides,
    DARK, LIGHT,
};
pub use platform::{DrawSurface, FrameHandle, ListenerId, Platform};
pub use types::{ContextAttributes, PixelSize, PowerPreference, ViewportMetrics, MAX_PIXEL_RATIO};
pub use uniforms::{UniformHandle, UniformKind, UniformLayout, UniformName, UniformRegistry, UniformSlot};
