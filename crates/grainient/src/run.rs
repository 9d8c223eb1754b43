use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use renderer::{
    resolve, Background, BackgroundOptions, HostBridge, ThemeName, ThemeSignal, Tunables,
};
use tracing_subscriber::EnvFilter;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use crate::bindings::{context_attributes, initial_theme, load_config, tuning_overrides};
use crate::cli::{ParamsArgs, RunArgs};
use crate::paths::AppPaths;
use crate::platform::WinitPlatform;
use crate::state::AppState;

const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_params(args: ParamsArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&paths, args.config.as_deref())?;
    let state = AppState::load_or_default(&paths.state_file())?;

    let overrides = tuning_overrides(&config.tuning).merged(args.tuning.overrides());
    let base = Tunables::with_overrides(&overrides);
    let theme = initial_theme(args.theme, config.theme(), state.theme.as_deref());
    let effective = resolve(&base, theme);

    let json = serde_json::to_string_pretty(&effective)
        .context("failed to serialize effective parameters")?;
    println!("{json}");
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = load_config(&paths, args.config.as_deref())?;
    let state = AppState::load_or_default(&paths.state_file())?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        saved_theme = ?state.theme,
        "resolved grainient paths"
    );

    let attributes = context_attributes(&config.context, args.power, args.opaque);
    let theme = initial_theme(args.theme, config.theme(), state.theme.as_deref());
    let options = BackgroundOptions {
        tuning: tuning_overrides(&config.tuning).merged(args.tuning.overrides()),
        theme,
        attributes,
        ..BackgroundOptions::default()
    };

    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let (width, height) = args.size.unwrap_or(DEFAULT_WINDOW_SIZE);
    let window = WindowBuilder::new()
        .with_title("Grainient")
        .with_inner_size(LogicalSize::new(width, height))
        .with_transparent(attributes.alpha)
        .with_visible(false)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);
    let window_id = window.id();

    let signal = ThemeSignal::new(theme.as_str());
    let background = Background::new(WinitPlatform::new(window), options);
    let mut bridge = HostBridge::start(background, &signal)
        .ok_or_else(|| anyhow!("GPU background unavailable; see the log for details"))?;
    tracing::info!(%theme, "grainient running; press T to toggle the theme, Esc to quit");

    let state_file = paths.state_file();
    event_loop.set_control_flow(ControlFlow::Wait);
    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id: id, event } if id == window_id => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    bridge.teardown();
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. }
                    if event.state == ElementState::Pressed && !event.repeat =>
                {
                    match event.logical_key {
                        Key::Named(NamedKey::Escape) => {
                            bridge.teardown();
                            elwt.exit();
                        }
                        Key::Character(ref value) if value.eq_ignore_ascii_case("t") => {
                            let next = ThemeName::from_attribute(&signal.get()).toggled();
                            signal.set(next.as_str());
                            let saved = AppState {
                                theme: Some(next.as_str().to_string()),
                            };
                            if let Err(err) = saved.persist(&state_file) {
                                tracing::warn!(error = %err, "failed to save theme");
                            }
                        }
                        _ => {}
                    }
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    if bridge.background().platform().wants_resize() {
                        bridge.background_mut().resize();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let due = bridge.background_mut().platform_mut().take_due_frame();
                    if let Some(handle) = due {
                        bridge.background_mut().frame(handle, Instant::now());
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                bridge.pump();
            }
            Event::LoopExiting => {
                bridge.teardown();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop terminated with error: {err}"))?;
    Ok(())
}
