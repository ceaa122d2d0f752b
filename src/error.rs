//! Error type for analyzer construction and configuration.
//!
//! Processing itself never fails; everything here is raised before the
//! first block is handed to the analyzer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("frequency must be a positive finite number, got {0}")]
    InvalidFrequency(f64),

    #[error("bandwidth must be a positive finite number, got {0}")]
    InvalidBandwidth(f64),

    #[error("bandwidth {bandwidth} Hz rounds the window length to zero at {sample_rate} Hz")]
    EmptyWindow { bandwidth: f64, sample_rate: u32 },

    #[error("bin index {k} is outside 0..{n}")]
    BinOutOfRange { k: usize, n: usize },

    #[error("window of {n} samples exceeds the {max} sample limit")]
    WindowTooLong { n: f64, max: usize },

    #[error("tolerance must be a positive finite number, got {0}")]
    InvalidTolerance(f64),

    #[error("reference key {reference_key} is outside a keyboard of {keys} keys")]
    InvalidReferenceKey { reference_key: usize, keys: usize },

    #[error("tuning produced no bins")]
    EmptyTuning,

    #[error("smoothing window must be a positive finite number of seconds, got {0}")]
    InvalidSmoothingWindow(f64),

    #[error("{name} must be a non-negative finite number, got {value}")]
    InvalidSetting { name: &'static str, value: f64 },

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
