use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::Tone;
use crate::error::Result;
use crate::sdft::{EqualTemperament, Smoothing};

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingKind {
    #[default]
    Fast,
    Heavy,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzerConfig {
    /// Samples per processed block.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Seconds; 0 disables smoothing.
    #[serde(default = "default_average_window")]
    pub average_window: f64,
    #[serde(default)]
    pub smoothing: SmoothingKind,
    /// Longest window the heavy smoother can be set to, in seconds.
    #[serde(default = "default_max_average_window")]
    pub max_average_window: f64,
    /// Levels below this are reported as 0.
    #[serde(default)]
    pub gate: f32,
    /// Seconds between report rows.
    #[serde(default = "default_report_interval")]
    pub report_interval: f64,
}

#[derive(Debug, Deserialize)]
pub struct KeyboardConfig {
    #[serde(default = "default_keys")]
    pub keys: usize,
    #[serde(default = "default_reference_key")]
    pub reference_key: usize,
    #[serde(default = "default_reference_frequency")]
    pub reference_frequency: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

#[derive(Debug, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_detector_block_size")]
    pub block_size: usize,
    /// Level at which a tone counts as present.
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Seconds of silence enforced after each detection.
    #[serde(default = "default_cooldown")]
    pub cooldown: f64,
    #[serde(default = "default_average_window")]
    pub average_window: f64,
    #[serde(default = "default_tones")]
    pub tones: Vec<Tone>,
}

impl AnalyzerConfig {
    pub fn smoothing(&self) -> Option<Smoothing> {
        match self.smoothing {
            SmoothingKind::Fast => Some(Smoothing::Fast),
            SmoothingKind::Heavy => Some(Smoothing::Heavy {
                max_window_seconds: self.max_average_window,
            }),
        }
    }
}

impl KeyboardConfig {
    pub fn tuning(&self, sample_rate: u32) -> Result<EqualTemperament> {
        EqualTemperament::new(
            sample_rate,
            self.keys,
            self.reference_key,
            self.reference_frequency,
            self.tolerance,
        )
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            average_window: default_average_window(),
            smoothing: SmoothingKind::default(),
            max_average_window: default_max_average_window(),
            gate: 0.0,
            report_interval: default_report_interval(),
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            keys: default_keys(),
            reference_key: default_reference_key(),
            reference_frequency: default_reference_frequency(),
            tolerance: default_tolerance(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            block_size: default_detector_block_size(),
            sensitivity: default_sensitivity(),
            cooldown: default_cooldown(),
            average_window: default_average_window(),
            tones: default_tones(),
        }
    }
}

fn default_block_size() -> usize { 128 }
fn default_average_window() -> f64 { 0.05 }
fn default_max_average_window() -> f64 { 0.5 }
fn default_report_interval() -> f64 { 0.1 }
fn default_keys() -> usize { 61 }
fn default_reference_key() -> usize { 33 }
fn default_reference_frequency() -> f64 { 440.0 }
fn default_tolerance() -> f64 { 1.0 }
fn default_detector_block_size() -> usize { 64 }
fn default_sensitivity() -> f32 { 0.1 }
fn default_cooldown() -> f64 { 10.0 }

// two-tone doorbell
fn default_tones() -> Vec<Tone> {
    vec![
        Tone {
            label: "downstairs".into(),
            frequency: 727.0,
            bandwidth: 2.0,
        },
        Tone {
            label: "upstairs".into(),
            frequency: 977.0,
            bandwidth: 2.0,
        },
    ]
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// `./chromalizer.toml`, then the XDG-style and platform config dirs.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("chromalizer.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("chromalizer").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("chromalizer").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
