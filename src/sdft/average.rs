use super::bin::MAX_WINDOW_LENGTH;
use super::buffer::CircularBuffer;
use crate::error::{Error, Result};

/// Per-channel temporal smoothing, one channel per tracked bin.
///
/// Implementations never allocate after construction; changing the window
/// only touches coefficients, indices and sums.
pub trait MovingAverage {
    fn channels(&self) -> usize;

    fn window_seconds(&self) -> f64;

    /// Non-positive or non-finite windows mean passthrough. Windows beyond
    /// what the implementation can hold are clamped.
    fn set_window_seconds(&mut self, seconds: f64);

    /// Push one value per channel.
    fn update(&mut self, levels: &[f32]);

    fn read(&self, channel: usize) -> f32;
}

fn window_in_samples(seconds: f64, sample_rate: u32) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds * sample_rate as f64
    } else {
        0.0
    }
}

/// Single-pole exponential smoother.
///
/// Cheap and memoryless apart from one value per channel, but it only ever
/// approaches its input asymptotically.
#[derive(Clone, Debug)]
pub struct FastMovingAverage {
    sample_rate: u32,
    window_seconds: f64,
    alpha: f64,
    values: Vec<f64>,
}

impl FastMovingAverage {
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            window_seconds: 0.0,
            alpha: 1.0,
            values: vec![0.0; channels],
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl MovingAverage for FastMovingAverage {
    fn channels(&self) -> usize {
        self.values.len()
    }

    fn window_seconds(&self) -> f64 {
        self.window_seconds
    }

    fn set_window_seconds(&mut self, seconds: f64) {
        let window = window_in_samples(seconds, self.sample_rate);
        self.window_seconds = window / self.sample_rate as f64;
        // time constant of `window` samples
        self.alpha = if window <= 1.0 {
            1.0
        } else {
            1.0 - (-1.0 / window).exp()
        };
    }

    #[inline]
    fn update(&mut self, levels: &[f32]) {
        let alpha = self.alpha;
        for (value, &level) in self.values.iter_mut().zip(levels) {
            *value += alpha * (level as f64 - *value);
        }
    }

    fn read(&self, channel: usize) -> f32 {
        self.values[channel] as f32
    }
}

/// Exact mean over the last `window` samples of each channel.
///
/// History for the longest allowed window is allocated up front; shorter
/// windows read a prefix of it.
#[derive(Clone, Debug)]
pub struct HeavyMovingAverage {
    sample_rate: u32,
    window: usize,
    history: Vec<CircularBuffer<f32>>,
    sums: Vec<f64>,
}

impl HeavyMovingAverage {
    pub fn new(channels: usize, sample_rate: u32, max_window_seconds: f64) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if !max_window_seconds.is_finite() || max_window_seconds <= 0.0 {
            return Err(Error::InvalidSmoothingWindow(max_window_seconds));
        }
        let capacity = (max_window_seconds * sample_rate as f64).round().max(1.0);
        if capacity > MAX_WINDOW_LENGTH as f64 {
            return Err(Error::WindowTooLong {
                n: capacity,
                max: MAX_WINDOW_LENGTH,
            });
        }
        let capacity = capacity as usize;
        Ok(Self {
            sample_rate,
            window: 1,
            history: (0..channels).map(|_| CircularBuffer::new(capacity)).collect(),
            sums: vec![0.0; channels],
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn capacity(&self) -> usize {
        self.history.first().map_or(0, CircularBuffer::capacity)
    }
}

impl MovingAverage for HeavyMovingAverage {
    fn channels(&self) -> usize {
        self.sums.len()
    }

    fn window_seconds(&self) -> f64 {
        self.window as f64 / self.sample_rate as f64
    }

    fn set_window_seconds(&mut self, seconds: f64) {
        let requested = window_in_samples(seconds, self.sample_rate).round() as usize;
        let window = requested.clamp(1, self.capacity().max(1));
        if window == self.window {
            return;
        }
        self.window = window;
        for (sum, history) in self.sums.iter_mut().zip(&self.history) {
            *sum = (0..window).map(|lag| history.read(lag) as f64).sum();
        }
    }

    #[inline]
    fn update(&mut self, levels: &[f32]) {
        let window = self.window;
        for ((sum, history), &level) in self.sums.iter_mut().zip(&mut self.history).zip(levels) {
            history.write(level);
            *sum += level as f64 - history.read(window) as f64;
        }
    }

    fn read(&self, channel: usize) -> f32 {
        (self.sums[channel] / self.window as f64) as f32
    }
}
