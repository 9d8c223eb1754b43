//! Tuning parameters, theme presets, and their resolution into uniforms.

use std::fmt;

use serde::Serialize;

use crate::uniforms::{UniformName, UniformRegistry};

/// Numeric inputs of the gradient field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tunables {
    pub time_speed: f32,
    pub color_balance: f32,
    pub warp_strength: f32,
    pub warp_frequency: f32,
    pub warp_speed: f32,
    pub warp_amplitude: f32,
    pub blend_angle: f32,
    pub blend_softness: f32,
    pub rotation_amount: f32,
    pub noise_scale: f32,
    pub grain_amount: f32,
    pub grain_scale: f32,
    pub grain_animated: bool,
    pub contrast: f32,
    pub gamma: f32,
    pub saturation: f32,
    pub center_darkness: f32,
    pub center_x: f32,
    pub center_y: f32,
    pub zoom: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            time_speed: 0.25,
            color_balance: 0.0,
            warp_strength: 1.0,
            warp_frequency: 5.0,
            warp_speed: 2.0,
            warp_amplitude: 50.0,
            blend_angle: 0.0,
            blend_softness: 0.05,
            rotation_amount: 500.0,
            noise_scale: 2.0,
            grain_amount: 0.1,
            grain_scale: 2.0,
            grain_animated: false,
            contrast: 1.15,
            gamma: 1.0,
            saturation: 0.82,
            center_darkness: 0.28,
            center_x: 0.0,
            center_y: 0.0,
            zoom: 0.9,
        }
    }
}

/// Caller-supplied values layered over [`Tunables::default`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TuningOverrides {
    pub time_speed: Option<f32>,
    pub color_balance: Option<f32>,
    pub warp_strength: Option<f32>,
    pub warp_frequency: Option<f32>,
    pub warp_speed: Option<f32>,
    pub warp_amplitude: Option<f32>,
    pub blend_angle: Option<f32>,
    pub blend_softness: Option<f32>,
    pub rotation_amount: Option<f32>,
    pub noise_scale: Option<f32>,
    pub grain_amount: Option<f32>,
    pub grain_scale: Option<f32>,
    pub grain_animated: Option<bool>,
    pub contrast: Option<f32>,
    pub gamma: Option<f32>,
    pub saturation: Option<f32>,
    pub center_darkness: Option<f32>,
    pub center_x: Option<f32>,
    pub center_y: Option<f32>,
    pub zoom: Option<f32>,
}

impl TuningOverrides {
    /// Combines two override sets; values in `other` win.
    pub fn merged(self, other: TuningOverrides) -> Self {
        Self {
            time_speed: other.time_speed.or(self.time_speed),
            color_balance: other.color_balance.or(self.color_balance),
            warp_strength: other.warp_strength.or(self.warp_strength),
            warp_frequency: other.warp_frequency.or(self.warp_frequency),
            warp_speed: other.warp_speed.or(self.warp_speed),
            warp_amplitude: other.warp_amplitude.or(self.warp_amplitude),
            blend_angle: other.blend_angle.or(self.blend_angle),
            blend_softness: other.blend_softness.or(self.blend_softness),
            rotation_amount: other.rotation_amount.or(self.rotation_amount),
            noise_scale: other.noise_scale.or(self.noise_scale),
            grain_amount: other.grain_amount.or(self.grain_amount),
            grain_scale: other.grain_scale.or(self.grain_scale),
            grain_animated: other.grain_animated.or(self.grain_animated),
            contrast: other.contrast.or(self.contrast),
            gamma: other.gamma.or(self.gamma),
            saturation: other.saturation.or(self.saturation),
            center_darkness: other.center_darkness.or(self.center_darkness),
            center_x: other.center_x.or(self.center_x),
            center_y: other.center_y.or(self.center_y),
            zoom: other.zoom.or(self.zoom),
        }
    }
}

impl Tunables {
    /// Library defaults with `overrides` applied on top.
    pub fn with_overrides(overrides: &TuningOverrides) -> Self {
        let defaults = Self::default();
        Self {
            time_speed: overrides.time_speed.unwrap_or(defaults.time_speed),
            color_balance: overrides.color_balance.unwrap_or(defaults.color_balance),
            warp_strength: overrides.warp_strength.unwrap_or(defaults.warp_strength),
            warp_frequency: overrides.warp_frequency.unwrap_or(defaults.warp_frequency),
            warp_speed: overrides.warp_speed.unwrap_or(defaults.warp_speed),
            warp_amplitude: overrides.warp_amplitude.unwrap_or(defaults.warp_amplitude),
            blend_angle: overrides.blend_angle.unwrap_or(defaults.blend_angle),
            blend_softness: overrides.blend_softness.unwrap_or(defaults.blend_softness),
            rotation_amount: overrides
                .rotation_amount
                .unwrap_or(defaults.rotation_amount),
            noise_scale: overrides.noise_scale.unwrap_or(defaults.noise_scale),
            grain_amount: overrides.grain_amount.unwrap_or(defaults.grain_amount),
            grain_scale: overrides.grain_scale.unwrap_or(defaults.grain_scale),
            grain_animated: overrides.grain_animated.unwrap_or(defaults.grain_animated),
            contrast: overrides.contrast.unwrap_or(defaults.contrast),
            gamma: overrides.gamma.unwrap_or(defaults.gamma),
            saturation: overrides.saturation.unwrap_or(defaults.saturation),
            center_darkness: overrides
                .center_darkness
                .unwrap_or(defaults.center_darkness),
            center_x: overrides.center_x.unwrap_or(defaults.center_x),
            center_y: overrides.center_y.unwrap_or(defaults.center_y),
            zoom: overrides.zoom.unwrap_or(defaults.zoom),
        }
    }

    /// Writes every base uniform. Palette colors come from the theme overlay.
    pub fn apply(&self, registry: &mut UniformRegistry) {
        registry.set_1f(UniformName::TimeSpeed, self.time_speed);
        registry.set_1f(UniformName::ColorBalance, self.color_balance);
        registry.set_1f(UniformName::WarpStrength, self.warp_strength);
        registry.set_1f(UniformName::WarpFrequency, self.warp_frequency);
        registry.set_1f(UniformName::WarpSpeed, self.warp_speed);
        registry.set_1f(UniformName::WarpAmplitude, self.warp_amplitude);
        registry.set_1f(UniformName::BlendAngle, self.blend_angle);
        registry.set_1f(UniformName::BlendSoftness, self.blend_softness);
        registry.set_1f(UniformName::RotationAmount, self.rotation_amount);
        registry.set_1f(UniformName::NoiseScale, self.noise_scale);
        registry.set_1f(UniformName::GrainAmount, self.grain_amount);
        registry.set_1f(UniformName::GrainScale, self.grain_scale);
        // The shader has no boolean inputs.
        registry.set_1f(
            UniformName::GrainAnimated,
            if self.grain_animated { 1.0 } else { 0.0 },
        );
        registry.set_1f(UniformName::Contrast, self.contrast);
        registry.set_1f(UniformName::Gamma, self.gamma);
        registry.set_1f(UniformName::Saturation, self.saturation);
        registry.set_1f(UniformName::CenterDarkness, self.center_darkness);
        registry.set_2f(UniformName::CenterOffset, self.center_x, self.center_y);
        registry.set_1f(UniformName::Zoom, self.zoom);
    }
}

/// Named palette presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

impl ThemeName {
    /// Maps an external attribute value to a preset; anything unrecognized is dark.
    pub fn from_attribute(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Strict lookup, used where an unknown name should be reported.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn preset(self) -> &'static ThemePreset {
        match self {
            Self::Dark => &DARK,
            Self::Light => &LIGHT,
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values a theme overrides. All other tunables always come from the base set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemePreset {
    pub color1: &'static str,
    pub color2: &'static str,
    pub color3: &'static str,
    pub contrast: f32,
    pub center_darkness: f32,
    pub saturation: f32,
    pub gamma: f32,
    pub grain_amount: f32,
}

pub const DARK: ThemePreset = ThemePreset {
    color1: "#7A3EA4",
    color2: "#2A1A66",
    color3: "#0C081A",
    contrast: 1.08,
    center_darkness: 0.4,
    saturation: 0.82,
    gamma: 1.0,
    grain_amount: 0.1,
};

pub const LIGHT: ThemePreset = ThemePreset {
    color1: "#E7C9FA",
    color2: "#8E74D6",
    color3: "#D7C9F0",
    contrast: 1.08,
    center_darkness: 0.2,
    saturation: 0.82,
    gamma: 0.96,
    grain_amount: 0.085,
};

/// Converts `#RRGGBB` (leading `#` optional, any case) to normalized channels.
///
/// Anything else yields opaque white.
pub fn hex_to_rgb(hex: &str) -> [f32; 3] {
    const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return WHITE;
    }
    let mut rgb = [0.0; 3];
    for (index, channel) in rgb.iter_mut().enumerate() {
        let pair = &digits[index * 2..index * 2 + 2];
        match u8::from_str_radix(pair, 16) {
            Ok(value) => *channel = f32::from(value) / 255.0,
            Err(_) => return WHITE,
        }
    }
    rgb
}

/// Base tunables with a theme overlay applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveParameters {
    pub theme: ThemeName,
    #[serde(flatten)]
    pub tunables: Tunables,
    pub color1: [f32; 3],
    pub color2: [f32; 3],
    pub color3: [f32; 3],
}

/// Shallow override of `base` by the preset for `theme`.
pub fn resolve(base: &Tunables, theme: ThemeName) -> EffectiveParameters {
    let preset = theme.preset();
    let mut tunables = *base;
    tunables.contrast = preset.contrast;
    tunables.center_darkness = preset.center_darkness;
    tunables.saturation = preset.saturation;
    tunables.gamma = preset.gamma;
    tunables.grain_amount = preset.grain_amount;
    EffectiveParameters {
        theme,
        tunables,
        color1: hex_to_rgb(preset.color1),
        color2: hex_to_rgb(preset.color2),
        color3: hex_to_rgb(preset.color3),
    }
}

impl EffectiveParameters {
    /// Writes only the uniforms a theme is allowed to change.
    pub fn apply_overlay(&self, registry: &mut UniformRegistry) {
        registry.set_3f(UniformName::Color1, self.color1);
        registry.set_3f(UniformName::Color2, self.color2);
        registry.set_3f(UniformName::Color3, self.color3);
        registry.set_1f(UniformName::Contrast, self.tunables.contrast);
        registry.set_1f(UniformName::CenterDarkness, self.tunables.center_darkness);
        registry.set_1f(UniformName::Saturation, self.tunables.saturation);
        registry.set_1f(UniformName::Gamma, self.tunables.gamma);
        registry.set_1f(UniformName::GrainAmount, self.tunables.grain_amount);
    }
}
