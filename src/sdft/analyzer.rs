use super::average::{FastMovingAverage, HeavyMovingAverage, MovingAverage};
use super::bin::{BinParameters, FrequencyBin};
use super::buffer::CircularBuffer;
use super::tuning::Tuning;
use crate::error::{Error, Result};

/// Which smoother to attach to the level vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Smoothing {
    /// Exponential, no history.
    Fast,
    /// Exact windowed mean; windows are clamped to `max_window_seconds`.
    Heavy { max_window_seconds: f64 },
}

/// Real-time per-key level analyzer.
///
/// Everything is allocated in [`SlidingDft::new`]; [`SlidingDft::process`]
/// only does arithmetic, so it is safe to call from an audio callback.
pub struct SlidingDft {
    sample_rate: u32,
    bins: Vec<FrequencyBin>,
    history: CircularBuffer<f32>,
    levels: Vec<f32>,
    average: Option<Box<dyn MovingAverage + Send>>,
    average_window_seconds: f64,
}

impl SlidingDft {
    pub fn new(tuning: &dyn Tuning, smoothing: Option<Smoothing>) -> Result<Self> {
        let sample_rate = tuning.sample_rate();
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        let mapping = tuning.mapping()?;
        if mapping.is_empty() {
            return Err(Error::EmptyTuning);
        }
        let bins = mapping
            .into_iter()
            .map(FrequencyBin::new)
            .collect::<Result<Vec<_>>>()?;
        let max_n = bins.iter().map(|bin| bin.params().n).max().unwrap_or(0);

        let channels = bins.len();
        let average: Option<Box<dyn MovingAverage + Send>> = match smoothing {
            None => None,
            Some(Smoothing::Fast) => Some(Box::new(FastMovingAverage::new(channels, sample_rate))),
            Some(Smoothing::Heavy { max_window_seconds }) => Some(Box::new(
                HeavyMovingAverage::new(channels, sample_rate, max_window_seconds)?,
            )),
        };

        log::debug!(
            "sliding DFT: {} bins at {} Hz, {} samples of history, smoothing {:?}",
            channels,
            sample_rate,
            max_n,
            smoothing
        );

        Ok(Self {
            sample_rate,
            bins,
            history: CircularBuffer::new(max_n),
            levels: vec![0.0; channels],
            average,
            average_window_seconds: 0.0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn bins(&self) -> &[FrequencyBin] {
        &self.bins
    }

    pub fn mapping(&self) -> impl Iterator<Item = BinParameters> + '_ {
        self.bins.iter().map(FrequencyBin::params)
    }

    /// Level vector produced by the last [`SlidingDft::process`] call.
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn has_smoothing(&self) -> bool {
        self.average.is_some()
    }

    /// Reconfigure the smoothing window and return the window actually in
    /// effect, which is shorter than `seconds` when a Heavy smoother cannot
    /// hold it. Call between blocks, before streaming starts.
    pub fn set_average_window(&mut self, seconds: f64) -> f64 {
        let effective = self.apply_average_window(seconds);
        let clamped = self.average_window_seconds - effective > 0.5 / self.sample_rate as f64;
        if self.average.is_some() && clamped {
            log::warn!(
                "averaging window of {:.3}s exceeds the preallocated {:.3}s, clamping",
                self.average_window_seconds,
                effective
            );
        }
        effective
    }

    fn apply_average_window(&mut self, seconds: f64) -> f64 {
        let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };
        self.average_window_seconds = seconds;
        match self.average.as_deref_mut() {
            Some(average) => {
                average.set_window_seconds(seconds);
                average.window_seconds()
            }
            None => 0.0,
        }
    }

    /// Feed one block and return the level vector, one value per key.
    ///
    /// An attached smoother follows the raw levels sample by sample; its
    /// output is returned when `average_window_seconds > 0`, the raw levels
    /// otherwise. Oversized windows are clamped without notice. Non-finite
    /// samples are treated as silence.
    pub fn process(&mut self, samples: &[f32], average_window_seconds: f64) -> &[f32] {
        let smoothing = self.average.is_some()
            && average_window_seconds.is_finite()
            && average_window_seconds > 0.0;
        if smoothing && average_window_seconds != self.average_window_seconds {
            self.apply_average_window(average_window_seconds);
        }

        for &sample in samples {
            let sample = if sample.is_finite() { sample } else { 0.0 };
            self.history.write(sample);
            for bin in &mut self.bins {
                bin.update(self.history.read(bin.params().n), sample);
            }

            if let Some(average) = self.average.as_deref_mut() {
                for (level, bin) in self.levels.iter_mut().zip(&self.bins) {
                    *level = bin.normalized_amplitude_spectrum() as f32;
                }
                average.update(&self.levels);
            }
        }

        match self.average.as_deref().filter(|_| smoothing) {
            Some(average) => {
                for (channel, level) in self.levels.iter_mut().enumerate() {
                    *level = average.read(channel);
                }
            }
            None => {
                for (level, bin) in self.levels.iter_mut().zip(&self.bins) {
                    *level = bin.normalized_amplitude_spectrum() as f32;
                }
            }
        }

        &self.levels
    }
}

/// Zeroes levels below a threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseGate {
    threshold: f32,
}

impl NoiseGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn apply(&self, levels: &mut [f32]) {
        for level in levels.iter_mut().filter(|level| **level < self.threshold) {
            *level = 0.0;
        }
    }
}
