mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chromalizer::audio::decode_audio;
use chromalizer::config::{self, Config, DetectorConfig};
use chromalizer::detect::ToneDetector;
use chromalizer::sdft::{note_name, EqualTemperament, NoiseGate, SlidingDft, Tuning};
use cli::{AnalyzeArgs, Cli, Command, DetectArgs, KeysArgs};
use report::ReportWriter;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect chromalizer.toml / user config
    let config = match cli.config.clone().or_else(config::discover_config) {
        Some(path) => {
            let cfg = config::load_config(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };

    match cli.command {
        Command::Analyze(args) => analyze(&args, config),
        Command::Detect(args) => detect(&args, config),
        Command::Keys(args) => keys(&args, config),
    }
}

fn key_labels(tuning: &EqualTemperament) -> Vec<String> {
    (0..tuning.keys())
        .map(|key| note_name(tuning.midi_note(key)))
        .collect()
}

fn analyze(args: &AnalyzeArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    let settings = &config.analyzer;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    log::info!("Decoding audio...");
    let audio = decode_audio(&args.input)?;

    let tuning = config
        .keyboard
        .tuning(audio.sample_rate)
        .context("Invalid keyboard configuration")?;
    let mut sdft = SlidingDft::new(&tuning, settings.smoothing())
        .context("Failed to build analyzer")?;
    let gate = NoiseGate::new(settings.gate);
    let average_window = sdft.set_average_window(settings.average_window);

    log::info!(
        "Analyzing {} keys, block {} samples, window {:.3}s ({:?}), gate {:.3}",
        sdft.len(),
        settings.block_size,
        average_window,
        settings.smoothing,
        gate.threshold()
    );

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    let mut report = ReportWriter::new(out, args.format, &key_labels(&tuning))?;

    let block_size = settings.block_size.max(1);
    let blocks_per_row = (settings.report_interval * audio.sample_rate as f64 / block_size as f64)
        .round()
        .max(1.0) as usize;
    let total_blocks = audio.samples.len().div_ceil(block_size);

    let pb = ProgressBar::new(total_blocks as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks ({eta} remaining)")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let mut row = vec![0.0f32; sdft.len()];
    let mut processed = 0usize;
    let mut rows = 0usize;
    for (index, block) in audio.samples.chunks(block_size).enumerate() {
        let levels = sdft.process(block, average_window);
        processed += block.len();

        if (index + 1) % blocks_per_row == 0 {
            row.copy_from_slice(levels);
            gate.apply(&mut row);
            report.write_row(processed as f64 / audio.sample_rate as f64, &row)?;
            rows += 1;
        }
        pb.inc(1);
    }
    pb.finish_with_message("Analysis complete");
    report.finish()?;

    log::info!(
        "Done: {} rows over {:.1}s{}",
        rows,
        audio.duration(),
        args.output
            .as_ref()
            .map(|p| format!(", output: {}", p.display()))
            .unwrap_or_default()
    );
    Ok(())
}

struct Event {
    time: f64,
    label: String,
    level: f32,
}

fn scan(path: &Path, settings: &DetectorConfig) -> Result<Vec<Event>> {
    let audio = decode_audio(path)?;
    let mut detector = ToneDetector::new(audio.sample_rate, settings)
        .context("Failed to build tone detector")?;

    let mut events = Vec::new();
    for block in audio.samples.chunks(settings.block_size.max(1)) {
        if let Some(hit) = detector.process(block) {
            log::info!(
                "{}: '{}' at {:.2}s (level {:.3})",
                path.display(),
                detector.label(hit.tone),
                hit.time,
                hit.level
            );
            events.push(Event {
                time: hit.time,
                label: detector.label(hit.tone).to_string(),
                level: hit.level,
            });
        }
    }
    Ok(events)
}

fn detect(args: &DetectArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);
    let settings = &config.detector;

    log::info!(
        "Listening for {} tone(s) in {} file(s), sensitivity {:.2}, cooldown {:.1}s",
        settings.tones.len(),
        args.inputs.len(),
        settings.sensitivity,
        settings.cooldown
    );

    let pb = ProgressBar::new(args.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let results: Vec<(&PathBuf, Result<Vec<Event>>)> = args
        .inputs
        .par_iter()
        .map(|path| {
            let result = scan(path, settings);
            pb.inc(1);
            (path, result)
        })
        .collect();
    pb.finish_and_clear();

    let mut failures = 0;
    for (path, result) in &results {
        match result {
            Ok(events) => {
                println!("{}: {} detection(s)", path.display(), events.len());
                for event in events {
                    println!("  {:>9.2}s  {:<16} {:.3}", event.time, event.label, event.level);
                }
            }
            Err(err) => {
                log::error!("{}: {:#}", path.display(), err);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, results.len());
    }
    Ok(())
}

fn keys(args: &KeysArgs, mut config: Config) -> Result<()> {
    args.keyboard.apply(&mut config.keyboard);
    let tuning = config
        .keyboard
        .tuning(args.sample_rate)
        .context("Invalid keyboard configuration")?;
    let mapping = tuning.mapping()?;

    println!("{:>4} {:<5} {:>10} {:>6} {:>7} {:>10} {:>8}", "key", "note", "target Hz", "k", "N", "actual Hz", "bw Hz");
    for (key, (label, params)) in key_labels(&tuning).iter().zip(&mapping).enumerate() {
        println!(
            "{:>4} {:<5} {:>10.2} {:>6} {:>7} {:>10.2} {:>8.2}",
            key,
            label,
            tuning.key_to_frequency(key as f64),
            params.k,
            params.n,
            params.frequency(args.sample_rate),
            params.bandwidth(args.sample_rate)
        );
    }
    Ok(())
}
