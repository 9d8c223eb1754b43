//! Renderer lifecycle: `init`, `set_theme`, `resize`, `destroy`, and the frame step.
//!
//! ```text
//!   Uninitialized ──init ok──▶ Ready ──destroy──▶ Destroyed
//!        │                                          ▲
//!        └──init failed──▶ Failed ──────destroy─────┘
//! ```
//!
//! Every GPU object lives inside [`Active`], which only exists while the
//! renderer is `Ready`. Leaving that state moves it out and releases it, so a
//! torn-down renderer cannot touch the surface again.

use std::time::Instant;

use crate::compile::{build_program, BuiltProgram, ShaderSource};
use crate::error::RenderError;
use crate::params::{resolve, ThemeName, Tunables, TuningOverrides};
use crate::platform::{DrawSurface, FrameHandle, ListenerId, Platform};
use crate::types::{ContextAttributes, PixelSize};
use crate::uniforms::{UniformName, UniformRegistry};

/// One triangle whose clipped interior covers the whole viewport.
pub const FULLSCREEN_TRIANGLE: [f32; 6] = [-1.0, -1.0, 3.0, -1.0, -1.0, 3.0];

/// Construction options. Everything is optional.
#[derive(Debug, Clone, Default)]
pub struct BackgroundOptions {
    pub tuning: TuningOverrides,
    /// Theme applied during `init`, before the first frame.
    pub theme: ThemeName,
    pub attributes: ContextAttributes,
    pub shaders: ShaderSource,
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
    Failed,
    Destroyed,
}

enum State<S: DrawSurface> {
    Uninitialized,
    Ready(Active<S>),
    Failed,
    Destroyed,
}

struct Active<S: DrawSurface> {
    surface: S,
    program: S::Program,
    registry: UniformRegistry,
    theme: ThemeName,
    started: Instant,
    /// Drawable size last derived from the viewport. The surface may hold
    /// less if the backend clamps it.
    requested: PixelSize,
    pending_frame: Option<FrameHandle>,
    resize_listener: ListenerId,
}

/// An animated gradient background bound to a [`Platform`].
pub struct Background<P: Platform> {
    platform: P,
    base: Tunables,
    options: BackgroundOptions,
    state: State<P::Surface>,
}

impl<P: Platform> Background<P> {
    pub fn new(platform: P, options: BackgroundOptions) -> Self {
        let base = Tunables::with_overrides(&options.tuning);
        Self {
            platform,
            base,
            options,
            state: State::Uninitialized,
        }
    }

    /// Acquires the surface, builds the program, and starts the frame loop.
    ///
    /// Returns `false` when the backend is unavailable, a shader fails to
    /// build, or GPU memory runs out; the container is left untouched in that
    /// case. Calling `init` more than once also returns `false`.
    pub fn init(&mut self) -> bool {
        if !matches!(self.state, State::Uninitialized) {
            tracing::debug!(phase = ?self.phase(), "ignoring init outside the uninitialized state");
            return false;
        }
        match self.start() {
            Ok(active) => {
                tracing::info!(
                    size = %active.surface.pixel_size(),
                    theme = %active.theme,
                    uniforms = active.registry.resolved_count(),
                    "background renderer ready"
                );
                self.state = State::Ready(active);
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "background renderer unavailable");
                self.state = State::Failed;
                false
            }
        }
    }

    fn start(&mut self) -> Result<Active<P::Surface>, RenderError> {
        let size = self.platform.viewport().drawable_size();
        let mut surface = self
            .platform
            .acquire_surface(&self.options.attributes, size)?;

        let BuiltProgram { program, layout } = build_program(&mut surface, &self.options.shaders)?;
        if let Err(err) = surface.upload_vertices(&FULLSCREEN_TRIANGLE) {
            surface.release_program(program);
            return Err(err);
        }

        self.platform.attach_surface(&surface);

        let mut registry = UniformRegistry::resolve(&layout);
        self.base.apply(&mut registry);
        let theme = self.options.theme;
        resolve(&self.base, theme).apply_overlay(&mut registry);

        let requested = self.platform.viewport().drawable_size();
        if requested != size {
            surface.reallocate(requested);
        }

        let resize_listener = self.platform.add_resize_listener();
        let started = self.platform.now();
        let pending_frame = Some(self.platform.request_frame());

        Ok(Active {
            surface,
            program,
            registry,
            theme,
            started,
            requested,
            pending_frame,
            resize_listener,
        })
    }

    /// Re-applies only the theme overlay; takes effect on the next frame.
    /// Unrecognized names select the dark preset.
    pub fn set_theme(&mut self, name: &str) {
        let State::Ready(active) = &mut self.state else {
            return;
        };
        let theme = ThemeName::from_attribute(name);
        resolve(&self.base, theme).apply_overlay(&mut active.registry);
        if active.theme != theme {
            tracing::info!(from = %active.theme, to = %theme, "theme changed");
        }
        active.theme = theme;
    }

    /// Matches the backing storage to the current viewport.
    pub fn resize(&mut self) {
        let State::Ready(active) = &mut self.state else {
            return;
        };
        let size = self.platform.viewport().drawable_size();
        if size == active.requested {
            return;
        }
        tracing::debug!(from = %active.requested, to = %size, "resizing background surface");
        active.surface.reallocate(size);
        active.requested = size;
    }

    /// Frame step for the callback identified by `handle`, fired at `now`.
    ///
    /// Handles that are not the outstanding one (cancelled or stale) are
    /// ignored, which stops the loop after `destroy`.
    pub fn frame(&mut self, handle: FrameHandle, now: Instant) {
        let State::Ready(active) = &mut self.state else {
            tracing::trace!(frame = handle.id(), "frame fired after teardown");
            return;
        };
        if active.pending_frame != Some(handle) {
            tracing::trace!(frame = handle.id(), "ignoring stale frame");
            return;
        }
        active.pending_frame = None;

        let elapsed = now.saturating_duration_since(active.started).as_secs_f32();
        active.registry.set_1f(UniformName::Time, elapsed);
        let resolution = active.surface.pixel_size();
        active.registry.set_2f(
            UniformName::Resolution,
            resolution.width as f32,
            resolution.height as f32,
        );
        if let Err(err) = active
            .surface
            .draw(&active.program, active.registry.as_bytes())
        {
            tracing::warn!(error = %err, "background frame failed");
        }

        active.pending_frame = Some(self.platform.request_frame());
    }

    /// Releases everything `init` created. Safe to call in any state and more
    /// than once.
    pub fn destroy(&mut self) {
        let previous = std::mem::replace(&mut self.state, State::Destroyed);
        let State::Ready(active) = previous else {
            return;
        };
        let Active {
            mut surface,
            program,
            pending_frame,
            resize_listener,
            ..
        } = active;

        if let Some(handle) = pending_frame {
            self.platform.cancel_frame(handle);
        }
        self.platform.remove_resize_listener(resize_listener);
        surface.release_program(program);
        self.platform.detach_surface(&surface);
        drop(surface);
        tracing::info!("background renderer destroyed");
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Uninitialized => Phase::Uninitialized,
            State::Ready(_) => Phase::Ready,
            State::Failed => Phase::Failed,
            State::Destroyed => Phase::Destroyed,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Theme currently applied, while ready.
    pub fn theme(&self) -> Option<ThemeName> {
        self.active().map(|active| active.theme)
    }

    /// Drawable size currently allocated, while ready.
    pub fn pixel_size(&self) -> Option<PixelSize> {
        self.active().map(|active| active.surface.pixel_size())
    }

    /// Outstanding frame callback, if any.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.active().and_then(|active| active.pending_frame)
    }

    /// Value last written for `name`, or `None` when not ready or the program
    /// does not declare it.
    pub fn uniform(&self, name: UniformName) -> Option<&[f32]> {
        self.active().and_then(|active| active.registry.value(name))
    }

    pub fn base_tunables(&self) -> &Tunables {
        &self.base
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    fn active(&self) -> Option<&Active<P::Surface>> {
        match &self.state {
            State::Ready(active) => Some(active),
            _ => None,
        }
    }
}

impl<P: Platform> Drop for Background<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::BuildError;
    use crate::params::{hex_to_rgb, DARK, LIGHT};
    use crate::testing::{MockPlatform, Recorder};
    use crate::types::ViewportMetrics;

    const OVERLAY: [UniformName; 8] = [
        UniformName::Color1,
        UniformName::Color2,
        UniformName::Color3,
        UniformName::Contrast,
        UniformName::CenterDarkness,
        UniformName::Saturation,
        UniformName::Gamma,
        UniformName::GrainAmount,
    ];

    fn background(platform: MockPlatform) -> Background<MockPlatform> {
        Background::new(platform, BackgroundOptions::default())
    }

    fn ready() -> (Background<MockPlatform>, Recorder) {
        let platform = MockPlatform::new(ViewportMetrics::new(1000.0, 800.0, 1.0));
        let recorder = platform.recorder();
        let mut background = background(platform);
        assert!(background.init());
        (background, recorder)
    }

    fn overlay_values(background: &Background<MockPlatform>) -> Vec<Vec<f32>> {
        OVERLAY
            .iter()
            .map(|name| background.uniform(*name).expect("declared").to_vec())
            .collect()
    }

    fn fire(background: &mut Background<MockPlatform>, after: Duration) {
        let handle = background.platform_mut().take_frame().expect("frame scheduled");
        let now = background.platform().now() + after;
        background.frame(handle, now);
    }

    #[test]
    fn init_attaches_exactly_one_surface() {
        let (background, recorder) = ready();
        assert_eq!(background.phase(), Phase::Ready);
        let log = recorder.borrow();
        assert_eq!(log.surfaces_created, 1);
        assert_eq!(log.attached, 1);
        assert_eq!(log.listeners.len(), 1);
        assert_eq!(log.pending_frames.len(), 1);
        assert_eq!(log.uploaded.as_deref(), Some(&FULLSCREEN_TRIANGLE[..]));
    }

    #[test]
    fn failed_acquisition_leaves_container_untouched() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        recorder.borrow_mut().fail_acquire = true;
        let mut background = background(platform);

        assert!(!background.init());
        assert_eq!(background.phase(), Phase::Failed);
        let log = recorder.borrow();
        assert_eq!(log.attached, 0);
        assert!(log.pending_frames.is_empty());
        assert!(log.listeners.is_empty());
    }

    #[test]
    fn link_failure_is_not_fatal() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        recorder.borrow_mut().fail_link = true;
        let mut background = background(platform);

        assert!(!background.init());
        let log = recorder.borrow();
        assert_eq!(log.surfaces_created, 1);
        assert_eq!(log.surfaces_dropped, 1);
        assert_eq!(log.attach_calls, 0);
        assert_eq!(log.programs_linked, 0);
    }

    #[test]
    fn broken_shader_fails_before_linking() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        let options = BackgroundOptions {
            shaders: ShaderSource::new(
                crate::compile::DEFAULT_VERTEX_SHADER,
                "#version 300 es\nout vec4 fragColor;\nvoid main() { fragColor = missing; }\n",
            ),
            ..BackgroundOptions::default()
        };
        let mut background = Background::new(platform, options);

        assert!(!background.init());
        assert_eq!(background.phase(), Phase::Failed);
        assert_eq!(recorder.borrow().attach_calls, 0);
    }

    #[test]
    fn upload_failure_releases_program_and_stays_detached() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        recorder.borrow_mut().fail_upload = true;
        let mut background = background(platform);

        assert!(!background.init());
        let log = recorder.borrow();
        assert_eq!(log.attach_calls, 0);
        assert_eq!(log.programs_linked, 1);
        assert_eq!(log.programs_released, 1);
        assert_eq!(log.surfaces_dropped, 1);
    }

    #[test]
    fn init_twice_is_rejected_without_side_effects() {
        let (mut background, recorder) = ready();
        assert!(!background.init());
        assert_eq!(recorder.borrow().surfaces_created, 1);
        assert_eq!(recorder.borrow().attach_calls, 1);
    }

    #[test]
    fn theme_round_trip_restores_exact_values() {
        let (mut background, _recorder) = ready();
        let dark = overlay_values(&background);

        background.set_theme("light");
        assert_eq!(background.theme(), Some(ThemeName::Light));
        assert_eq!(
            background.uniform(UniformName::Gamma),
            Some(&[LIGHT.gamma][..])
        );
        assert_ne!(overlay_values(&background), dark);

        background.set_theme("dark");
        assert_eq!(overlay_values(&background), dark);
    }

    #[test]
    fn unknown_theme_matches_dark() {
        let (mut background, _recorder) = ready();
        background.set_theme("light");
        background.set_theme("unknown-name");
        assert_eq!(background.theme(), Some(ThemeName::Dark));
        assert_eq!(
            background.uniform(UniformName::Color1),
            Some(&hex_to_rgb(DARK.color1)[..])
        );
        assert_eq!(
            background.uniform(UniformName::CenterDarkness),
            Some(&[DARK.center_darkness][..])
        );
    }

    #[test]
    fn theme_change_leaves_base_tunables_alone() {
        let (mut background, _recorder) = ready();
        let before = background.uniform(UniformName::WarpAmplitude).map(<[f32]>::to_vec);
        background.set_theme("light");
        assert_eq!(
            background.uniform(UniformName::WarpAmplitude).map(<[f32]>::to_vec),
            before
        );
        assert_eq!(background.uniform(UniformName::Zoom), Some(&[0.9][..]));
    }

    #[test]
    fn set_theme_before_init_is_ignored() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let mut background = background(platform);
        background.set_theme("light");
        assert_eq!(background.theme(), None);
        assert!(background.init());
        assert_eq!(background.theme(), Some(ThemeName::Dark));
    }

    #[test]
    fn repeated_resize_does_not_reallocate() {
        let (mut background, recorder) = ready();
        for _ in 0..5 {
            background.resize();
        }
        assert!(recorder.borrow().reallocations.is_empty());
    }

    #[test]
    fn resize_caps_the_pixel_ratio() {
        let (mut background, recorder) = ready();
        background
            .platform_mut()
            .set_viewport(ViewportMetrics::new(1000.0, 800.0, 3.0));
        background.resize();
        assert_eq!(background.pixel_size(), Some(PixelSize::new(2000, 1600)));
        assert_eq!(
            recorder.borrow().reallocations,
            vec![PixelSize::new(2000, 1600)]
        );

        fire(&mut background, Duration::from_millis(16));
        assert_eq!(
            background.uniform(UniformName::Resolution),
            Some(&[2000.0, 1600.0][..])
        );
    }

    #[test]
    fn clamped_surfaces_report_their_real_size() {
        let platform = MockPlatform::new(ViewportMetrics::new(5000.0, 300.0, 1.0));
        let recorder = platform.recorder();
        recorder.borrow_mut().max_dimension = Some(4096);
        let mut background = background(platform);
        assert!(background.init());
        assert!(recorder.borrow().reallocations.is_empty());
        assert_eq!(background.pixel_size(), Some(PixelSize::new(4096, 300)));

        background.resize();
        assert!(recorder.borrow().reallocations.is_empty());

        fire(&mut background, Duration::from_millis(16));
        assert_eq!(
            background.uniform(UniformName::Resolution),
            Some(&[4096.0, 300.0][..])
        );

        background
            .platform_mut()
            .set_viewport(ViewportMetrics::new(6000.0, 400.0, 1.0));
        background.resize();
        assert_eq!(
            recorder.borrow().reallocations,
            vec![PixelSize::new(6000, 400)]
        );
        assert_eq!(background.pixel_size(), Some(PixelSize::new(4096, 400)));
    }

    #[test]
    fn frame_advances_time_and_reschedules() {
        let (mut background, recorder) = ready();
        fire(&mut background, Duration::from_millis(1500));

        let time = background.uniform(UniformName::Time).expect("iTime")[0];
        assert!((time - 1.5).abs() < 1e-3, "{time}");
        let log = recorder.borrow();
        assert_eq!(log.draws.len(), 1);
        assert_eq!(log.pending_frames.len(), 1);
    }

    #[test]
    fn stale_frame_handles_are_ignored() {
        let (mut background, recorder) = ready();
        let handle = background.platform_mut().take_frame().expect("scheduled");
        let now = background.platform().now();
        background.frame(handle, now);
        background.frame(handle, now);
        assert_eq!(recorder.borrow().draws.len(), 1);
    }

    #[test]
    fn destroy_before_init_is_safe() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        let mut background = background(platform);
        background.destroy();
        background.destroy();
        assert_eq!(background.phase(), Phase::Destroyed);
        assert!(!background.init());
        assert!(recorder.borrow().pending_frames.is_empty());
        assert_eq!(recorder.borrow().surfaces_created, 0);
    }

    #[test]
    fn destroy_twice_releases_everything_once() {
        let (mut background, recorder) = ready();
        let handle = background.pending_frame().expect("first frame");
        background.destroy();
        background.destroy();

        let log = recorder.borrow();
        assert_eq!(log.attached, 0);
        assert_eq!(log.detach_calls, 1);
        assert_eq!(log.programs_released, 1);
        assert_eq!(log.surfaces_dropped, 1);
        assert_eq!(log.cancelled, vec![handle]);
        assert!(log.pending_frames.is_empty());
        assert!(log.listeners.is_empty());
        drop(log);

        let now = background.platform().now();
        background.frame(handle, now);
        assert!(recorder.borrow().draws.is_empty());
    }

    #[test]
    fn dropping_a_ready_background_tears_it_down() {
        let (background, recorder) = ready();
        drop(background);
        let log = recorder.borrow();
        assert_eq!(log.detach_calls, 1);
        assert_eq!(log.surfaces_dropped, 1);
    }

    #[test]
    fn draw_failures_keep_the_loop_running() {
        let (mut background, recorder) = ready();
        recorder.borrow_mut().fail_draw = true;
        fire(&mut background, Duration::from_millis(16));
        assert_eq!(background.phase(), Phase::Ready);
        assert_eq!(recorder.borrow().pending_frames.len(), 1);
    }

    #[test]
    fn initial_theme_option_is_applied_before_the_first_frame() {
        let platform = MockPlatform::new(ViewportMetrics::new(320.0, 200.0, 2.0));
        let recorder = platform.recorder();
        let options = BackgroundOptions {
            theme: ThemeName::Light,
            tuning: TuningOverrides {
                grain_animated: Some(true),
                ..TuningOverrides::default()
            },
            ..BackgroundOptions::default()
        };
        let mut background = Background::new(platform, options);
        assert!(background.init());
        fire(&mut background, Duration::from_millis(16));

        let log = recorder.borrow();
        let draw = log.draws.first().expect("one draw");
        assert_eq!(draw.value("uColor2"), Some(hex_to_rgb(LIGHT.color2).to_vec()));
        assert_eq!(draw.value("uGrainAnimated"), Some(vec![1.0]));
        assert_eq!(draw.value("iResolution"), Some(vec![640.0, 400.0]));
    }

    #[test]
    fn end_to_end_scenario() {
        let platform = MockPlatform::new(ViewportMetrics::new(1280.0, 720.0, 1.0));
        let recorder = platform.recorder();
        let mut background = background(platform);

        assert!(background.init());
        fire(&mut background, Duration::from_millis(16));
        {
            let log = recorder.borrow();
            let first = log.draws.first().expect("first draw");
            for name in UniformName::ALL {
                assert!(
                    first.value(name.glsl_name()).is_some(),
                    "{} missing from the first draw",
                    name.glsl_name()
                );
            }
            assert_eq!(first.value("uColor1"), Some(hex_to_rgb(DARK.color1).to_vec()));
            assert_eq!(first.value("uTimeSpeed"), Some(vec![0.25]));
        }

        background.set_theme("light");
        background
            .platform_mut()
            .set_viewport(ViewportMetrics::new(1280.0, 720.0, 2.0));
        background.resize();
        fire(&mut background, Duration::from_millis(32));
        fire(&mut background, Duration::from_millis(48));
        {
            let log = recorder.borrow();
            let last = log.draws.last().expect("draw after resize");
            assert_eq!(last.value("uColor1"), Some(hex_to_rgb(LIGHT.color1).to_vec()));
            assert_eq!(last.value("iResolution"), Some(vec![2560.0, 1440.0]));
            assert_eq!(log.reallocations, vec![PixelSize::new(2560, 1440)]);
        }

        background.destroy();
        let log = recorder.borrow();
        assert_eq!(log.surfaces_created, 1);
        assert_eq!(log.surfaces_dropped, 1);
        assert_eq!(log.attach_calls, 1);
        assert_eq!(log.detach_calls, 1);
        assert_eq!(log.attached, 0);
        assert!(log.pending_frames.is_empty());
    }

    #[test]
    fn link_errors_carry_the_build_error() {
        let platform = MockPlatform::new(ViewportMetrics::new(640.0, 480.0, 1.0));
        let recorder = platform.recorder();
        recorder.borrow_mut().fail_link = true;
        let mut platform = platform;
        let mut surface = platform
            .acquire_surface(&ContextAttributes::default(), PixelSize::new(1, 1))
            .expect("mock surface");
        let err = build_program(&mut surface, &ShaderSource::default())
            .err()
            .expect("link fails");
        assert!(matches!(err, BuildError::Link(_)));
    }
}
