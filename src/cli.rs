use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use chromalizer::config::{Config, KeyboardConfig, SmoothingKind};

#[derive(Parser, Debug)]
#[command(name = "chromalizer", about = "Per-note level analyzer and tone detector")]
pub struct Cli {
    /// Config file (TOML). Defaults to ./chromalizer.toml or the user config dir
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write per-key levels of an audio file over time
    Analyze(AnalyzeArgs),
    /// Scan recordings for the configured tones
    Detect(DetectArgs),
    /// Print how keys map onto DFT bins
    Keys(KeysArgs),
}

#[derive(Args, Debug)]
pub struct KeyboardArgs {
    /// Number of keys
    #[arg(long)]
    pub keys: Option<usize>,

    /// Index of the key tuned to the reference frequency
    #[arg(long)]
    pub reference_key: Option<usize>,

    /// Reference frequency in Hz; report labels name the nearest note to it
    #[arg(long)]
    pub reference_frequency: Option<f64>,

    /// Bandwidth multiplier; above 1 trades selectivity for faster response
    #[arg(long)]
    pub tolerance: Option<f64>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,

    /// Samples per processed block
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Smoothing window in seconds (0 disables)
    #[arg(short, long)]
    pub average_window: Option<f64>,

    /// Smoothing strategy
    #[arg(long, value_enum)]
    pub smoothing: Option<SmoothingArg>,

    /// Levels below this threshold are written as 0
    #[arg(long)]
    pub gate: Option<f32>,

    /// Seconds between report rows
    #[arg(long)]
    pub report_interval: Option<f64>,

    #[command(flatten)]
    pub keyboard: KeyboardArgs,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Recordings to scan
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Level at which a tone counts as present
    #[arg(short, long)]
    pub sensitivity: Option<f32>,

    /// Seconds to ignore further detections after one fires
    #[arg(long)]
    pub cooldown: Option<f64>,
}

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Sample rate to derive bins for
    #[arg(long, default_value_t = 44100)]
    pub sample_rate: u32,

    #[command(flatten)]
    pub keyboard: KeyboardArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SmoothingArg {
    Fast,
    Heavy,
}

impl KeyboardArgs {
    pub fn apply(&self, keyboard: &mut KeyboardConfig) {
        if let Some(keys) = self.keys {
            keyboard.keys = keys;
        }
        if let Some(reference_key) = self.reference_key {
            keyboard.reference_key = reference_key;
        }
        if let Some(reference_frequency) = self.reference_frequency {
            keyboard.reference_frequency = reference_frequency;
        }
        if let Some(tolerance) = self.tolerance {
            keyboard.tolerance = tolerance;
        }
    }
}

impl AnalyzeArgs {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut Config) {
        let analyzer = &mut config.analyzer;
        if let Some(block_size) = self.block_size {
            analyzer.block_size = block_size;
        }
        if let Some(average_window) = self.average_window {
            analyzer.average_window = average_window;
        }
        if let Some(smoothing) = self.smoothing {
            analyzer.smoothing = match smoothing {
                SmoothingArg::Fast => SmoothingKind::Fast,
                SmoothingArg::Heavy => SmoothingKind::Heavy,
            };
        }
        if let Some(gate) = self.gate {
            analyzer.gate = gate;
        }
        if let Some(report_interval) = self.report_interval {
            analyzer.report_interval = report_interval;
        }
        self.keyboard.apply(&mut config.keyboard);
    }
}

impl DetectArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(sensitivity) = self.sensitivity {
            config.detector.sensitivity = sensitivity;
        }
        if let Some(cooldown) = self.cooldown {
            config.detector.cooldown = cooldown;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "chromalizer",
            "analyze",
            "song.flac",
            "--smoothing",
            "heavy",
            "--gate",
            "0.2",
            "--keys",
            "88",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.analyzer.smoothing, SmoothingKind::Heavy);
        assert_eq!(config.analyzer.gate, 0.2);
        assert_eq!(config.analyzer.block_size, 128);
        assert_eq!(config.keyboard.keys, 88);
        assert_eq!(args.format, Format::Csv);
    }

    #[test]
    fn detect_needs_input() {
        assert!(Cli::try_parse_from(["chromalizer", "detect"]).is_err());
        let cli = Cli::parse_from(["chromalizer", "detect", "a.wav", "b.wav", "--cooldown", "3"]);
        let Command::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(config.detector.cooldown, 3.0);
    }
}
