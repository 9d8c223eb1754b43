use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GradientConfig {
    pub version: u32,
    /// Initial theme attribute. Unknown names fall back to dark when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

/// Optional overrides for the gradient's tunables, in snake_case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
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

impl TuningConfig {
    /// Every numeric entry paired with its key, for validation and reporting.
    pub fn numeric_entries(&self) -> [(&'static str, Option<f32>); 19] {
        [
            ("time_speed", self.time_speed),
            ("color_balance", self.color_balance),
            ("warp_strength", self.warp_strength),
            ("warp_frequency", self.warp_frequency),
            ("warp_speed", self.warp_speed),
            ("warp_amplitude", self.warp_amplitude),
            ("blend_angle", self.blend_angle),
            ("blend_softness", self.blend_softness),
            ("rotation_amount", self.rotation_amount),
            ("noise_scale", self.noise_scale),
            ("grain_amount", self.grain_amount),
            ("grain_scale", self.grain_scale),
            ("contrast", self.contrast),
            ("gamma", self.gamma),
            ("saturation", self.saturation),
            ("center_darkness", self.center_darkness),
            ("center_x", self.center_x),
            ("center_y", self.center_y),
            ("zoom", self.zoom),
        ]
    }
}

/// Drawing context preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContextConfig {
    #[serde(default, deserialize_with = "deserialize_power_opt")]
    pub power: Option<PowerSetting>,
    #[serde(default)]
    pub alpha: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    High,
    Low,
}

impl fmt::Display for PowerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerSetting::High => f.write_str("high"),
            PowerSetting::Low => f.write_str("low"),
        }
    }
}

fn deserialize_power_opt<'de, D>(deserializer: D) -> Result<Option<PowerSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_power(&value).map_err(de::Error::custom))
        .transpose()
}

/// Parses a power preference, accepting the common aliases.
pub fn parse_power(raw: &str) -> Result<PowerSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "high" | "high-performance" | "performance" | "discrete" => Ok(PowerSetting::High),
        "low" | "low-power" | "powersave" | "integrated" => Ok(PowerSetting::Low),
        other => Err(format!("invalid power preference '{other}'")),
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            theme: None,
            tuning: TuningConfig::default(),
            context: ContextConfig::default(),
        }
    }
}

impl GradientConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GradientConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if let Some(theme) = &self.theme {
            if theme.trim().is_empty() {
                return Err(ConfigError::Invalid("theme may not be empty".into()));
            }
        }

        for (key, value) in self.tuning.numeric_entries() {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "tuning.{key} must be a finite number"
                    )));
                }
            }
        }

        Ok(())
    }
}
