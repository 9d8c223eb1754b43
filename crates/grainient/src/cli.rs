use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use gradientconfig::{parse_power, PowerSetting};
use renderer::{ThemeName, TuningOverrides};

#[derive(Parser, Debug)]
#[command(
    name = "grainient",
    author,
    version,
    about = "Animated grainy gradient background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file to load instead of `config.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial theme: `dark` or `light`.
    #[arg(long, value_name = "NAME", value_parser = parse_theme)]
    pub theme: Option<ThemeName>,

    /// Window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_window_size)]
    pub size: Option<(u32, u32)>,

    /// GPU power preference: `high` or `low`.
    #[arg(long, value_name = "MODE", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// Request an opaque surface instead of a transparent one.
    #[arg(long)]
    pub opaque: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the effective gradient parameters as JSON and exit.
    Params(ParamsArgs),
}

#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// Configuration file to load instead of `config.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Theme to resolve: `dark` or `light`.
    #[arg(long, value_name = "NAME", value_parser = parse_theme)]
    pub theme: Option<ThemeName>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

/// Per-tunable overrides; these win over the configuration file.
#[derive(Args, Debug, Default, Clone, Copy)]
pub struct TuningArgs {
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub time_speed: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub color_balance: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub warp_strength: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub warp_frequency: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub warp_speed: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub warp_amplitude: Option<f32>,
    #[arg(long, value_name = "DEGREES", help_heading = "Tuning")]
    pub blend_angle: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub blend_softness: Option<f32>,
    #[arg(long, value_name = "DEGREES", help_heading = "Tuning")]
    pub rotation_amount: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub noise_scale: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub grain_amount: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub grain_scale: Option<f32>,
    #[arg(long, value_name = "BOOL", help_heading = "Tuning")]
    pub grain_animated: Option<bool>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub contrast: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub gamma: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub saturation: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub center_darkness: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning", allow_negative_numbers = true)]
    pub center_x: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning", allow_negative_numbers = true)]
    pub center_y: Option<f32>,
    #[arg(long, value_name = "FLOAT", help_heading = "Tuning")]
    pub zoom: Option<f32>,
}

impl TuningArgs {
    pub fn overrides(&self) -> TuningOverrides {
        TuningOverrides {
            time_speed: self.time_speed,
            color_balance: self.color_balance,
            warp_strength: self.warp_strength,
            warp_frequency: self.warp_frequency,
            warp_speed: self.warp_speed,
            warp_amplitude: self.warp_amplitude,
            blend_angle: self.blend_angle,
            blend_softness: self.blend_softness,
            rotation_amount: self.rotation_amount,
            noise_scale: self.noise_scale,
            grain_amount: self.grain_amount,
            grain_scale: self.grain_scale,
            grain_animated: self.grain_animated,
            contrast: self.contrast,
            gamma: self.gamma,
            saturation: self.saturation,
            center_darkness: self.center_darkness,
            center_x: self.center_x,
            center_y: self.center_y,
            zoom: self.zoom,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_theme(value: &str) -> Result<ThemeName, String> {
    ThemeName::parse(&value.to_ascii_lowercase())
        .ok_or_else(|| format!("unknown theme '{value}'; expected 'dark' or 'light'"))
}

pub fn parse_window_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok((width, height))
}
