//! Thresholded tone events on top of the level analyzer.
//!
//! A detector watches a handful of labelled tones, fires when one of them
//! crosses the sensitivity and then stays quiet for a cooldown, so a ringing
//! doorbell produces one event instead of hundreds.

use serde::Deserialize;

use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::sdft::{Band, BandList, SlidingDft, Smoothing};

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Tone {
    pub label: String,
    pub frequency: f64,
    pub bandwidth: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    /// Index into the configured tones.
    pub tone: usize,
    pub level: f32,
    /// Stream time at the end of the triggering block.
    pub time: f64,
}

pub struct ToneDetector {
    sdft: SlidingDft,
    labels: Vec<String>,
    sensitivity: f32,
    average_window: f64,
    cooldown_samples: u64,
    clock: u64,
    quiet_until: u64,
}

impl ToneDetector {
    pub fn new(sample_rate: u32, config: &DetectorConfig) -> Result<Self> {
        if !config.sensitivity.is_finite() || config.sensitivity < 0.0 {
            return Err(Error::InvalidSetting {
                name: "sensitivity",
                value: config.sensitivity as f64,
            });
        }
        if !config.cooldown.is_finite() || config.cooldown < 0.0 {
            return Err(Error::InvalidSetting {
                name: "cooldown",
                value: config.cooldown,
            });
        }

        let bands = config
            .tones
            .iter()
            .map(|tone| Band {
                frequency: tone.frequency,
                bandwidth: tone.bandwidth,
            })
            .collect();
        let mut sdft = SlidingDft::new(&BandList::new(sample_rate, bands), Some(Smoothing::Fast))?;
        let average_window = sdft.set_average_window(config.average_window);

        for (tone, params) in config.tones.iter().zip(sdft.mapping()) {
            log::debug!(
                "tone '{}': {:.1} Hz -> k={} N={} ({:.2} Hz)",
                tone.label,
                tone.frequency,
                params.k,
                params.n,
                params.frequency(sample_rate)
            );
        }

        Ok(Self {
            sdft,
            labels: config.tones.iter().map(|tone| tone.label.clone()).collect(),
            sensitivity: config.sensitivity,
            average_window,
            cooldown_samples: (config.cooldown * sample_rate as f64).round() as u64,
            clock: 0,
            quiet_until: 0,
        })
    }

    pub fn label(&self, tone: usize) -> &str {
        &self.labels[tone]
    }

    pub fn sample_rate(&self) -> u32 {
        self.sdft.sample_rate()
    }

    /// Latest smoothed level of every tone.
    pub fn levels(&self) -> &[f32] {
        self.sdft.levels()
    }

    /// Feed one block. The first tone, in configured order, at or above the
    /// sensitivity fires unless a previous detection is still cooling down.
    pub fn process(&mut self, samples: &[f32]) -> Option<Detection> {
        let levels = self.sdft.process(samples, self.average_window);
        self.clock += samples.len() as u64;
        if self.clock < self.quiet_until {
            return None;
        }

        let (tone, &level) = levels
            .iter()
            .enumerate()
            .find(|&(_, &level)| level >= self.sensitivity)?;
        self.quiet_until = self.clock + self.cooldown_samples;
        Some(Detection {
            tone,
            level,
            time: self.clock as f64 / self.sdft.sample_rate() as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const RATE: u32 = 8000;

    fn tone(freq: f64, start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| (0.3 * (2.0 * PI * freq * i as f64 / RATE as f64).sin()) as f32)
            .collect()
    }

    fn run(detector: &mut ToneDetector, signal: &[f32]) -> Vec<Detection> {
        signal
            .chunks(64)
            .filter_map(|block| detector.process(block))
            .collect()
    }

    #[test]
    fn doorbell_defaults_tell_the_bells_apart() {
        let config = DetectorConfig::default();
        let mut detector = ToneDetector::new(RATE, &config).unwrap();

        let hits = run(&mut detector, &tone(977.0, 0, 8000));
        assert_eq!(hits.len(), 1);
        assert_eq!(detector.label(hits[0].tone), "upstairs");
        assert!(hits[0].time < 0.5);
        assert!(hits[0].level >= config.sensitivity);
    }

    #[test]
    fn cooldown_suppresses_repeats_until_it_expires() {
        let config = DetectorConfig {
            cooldown: 2.0,
            ..DetectorConfig::default()
        };
        let mut detector = ToneDetector::new(RATE, &config).unwrap();

        assert_eq!(run(&mut detector, &tone(727.0, 0, 8000)).len(), 1);
        assert!(run(&mut detector, &vec![0.0; 8000]).is_empty());

        let hits = run(&mut detector, &tone(727.0, 0, 16000));
        assert_eq!(hits.len(), 1);
        assert_eq!(detector.label(hits[0].tone), "downstairs");
        assert!(hits[0].time > 2.0);
    }

    #[test]
    fn silence_never_fires() {
        let mut detector = ToneDetector::new(RATE, &DetectorConfig::default()).unwrap();
        assert!(run(&mut detector, &vec![0.0; 16000]).is_empty());
        assert!(detector.levels().iter().all(|&level| level == 0.0));
    }

    #[test]
    fn rejects_negative_cooldown() {
        let config = DetectorConfig {
            cooldown: -1.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            ToneDetector::new(RATE, &config),
            Err(Error::InvalidSetting { name: "cooldown", .. })
        ));
    }

    #[test]
    fn rejects_tone_above_sample_rate() {
        let config = DetectorConfig {
            tones: vec![Tone {
                label: "bat".into(),
                frequency: 9000.0,
                bandwidth: 100.0,
            }],
            ..DetectorConfig::default()
        };
        assert!(ToneDetector::new(RATE, &config).is_err());
    }
}
