//! Maps configuration, CLI flags, and saved state onto renderer options.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use gradientconfig::{ContextConfig, GradientConfig, PowerSetting, TuningConfig};
use renderer::{ContextAttributes, PowerPreference, ThemeName, TuningOverrides};

use crate::paths::AppPaths;

/// Loads `explicit` if given, otherwise `config.toml` from the config
/// directory when it exists.
pub fn load_config(paths: &AppPaths, explicit: Option<&Path>) -> Result<GradientConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = paths.config_file();
            if !default.exists() {
                tracing::debug!(path = %default.display(), "no config file; using defaults");
                return Ok(GradientConfig::default());
            }
            default
        }
    };
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config = GradientConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load config file at {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

pub fn tuning_overrides(tuning: &TuningConfig) -> TuningOverrides {
    TuningOverrides {
        time_speed: tuning.time_speed,
        color_balance: tuning.color_balance,
        warp_strength: tuning.warp_strength,
        warp_frequency: tuning.warp_frequency,
        warp_speed: tuning.warp_speed,
        warp_amplitude: tuning.warp_amplitude,
        blend_angle: tuning.blend_angle,
        blend_softness: tuning.blend_softness,
        rotation_amount: tuning.rotation_amount,
        noise_scale: tuning.noise_scale,
        grain_amount: tuning.grain_amount,
        grain_scale: tuning.grain_scale,
        grain_animated: tuning.grain_animated,
        contrast: tuning.contrast,
        gamma: tuning.gamma,
        saturation: tuning.saturation,
        center_darkness: tuning.center_darkness,
        center_x: tuning.center_x,
        center_y: tuning.center_y,
        zoom: tuning.zoom,
    }
}

pub fn map_power(power: PowerSetting) -> PowerPreference {
    match power {
        PowerSetting::High => PowerPreference::High,
        PowerSetting::Low => PowerPreference::Low,
    }
}

/// Context attributes from config, with CLI values taking precedence.
pub fn context_attributes(
    context: &ContextConfig,
    power: Option<PowerSetting>,
    opaque: bool,
) -> ContextAttributes {
    let defaults = ContextAttributes::default();
    let alpha = if opaque {
        false
    } else {
        context.alpha.unwrap_or(defaults.alpha)
    };
    ContextAttributes {
        alpha,
        power_preference: power
            .or(context.power)
            .map(map_power)
            .unwrap_or(defaults.power_preference),
        ..defaults
    }
}

/// Picks the initial theme: CLI first, then the config file, then the theme
/// saved from the last session.
pub fn initial_theme(
    cli: Option<ThemeName>,
    config: Option<&str>,
    saved: Option<&str>,
) -> ThemeName {
    if let Some(theme) = cli {
        return theme;
    }
    match config.or(saved) {
        Some(value) => {
            let theme = ThemeName::from_attribute(value);
            if ThemeName::parse(value).is_none() {
                tracing::warn!(value, fallback = %theme, "unknown theme name");
            }
            theme
        }
        None => ThemeName::default(),
    }
}
