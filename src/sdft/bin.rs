use rustfft::num_complex::Complex64;
use std::f64::consts::{PI, SQRT_2};

use crate::error::{Error, Result};

/// Per-step contraction of the rotation coefficient.
///
/// A unit-magnitude rotation lets round-off random-walk the accumulator away
/// from its orbit forever. Shrinking it by 1e-9 per step bounds that error at
/// roughly 1e-7 of the signal, while the bias over the longest practical
/// window (tens of thousands of samples) stays below 1e-4.
pub const DAMPING_FACTOR: f64 = 1.0 - 1e-9;

/// RMS of a full-scale sinusoid: 0 dB for [`FrequencyBin::decibels`].
pub const REFERENCE_AMPLITUDE: f64 = 1.0 / SQRT_2;

/// Mean window power under which a bin reads as silent (-120 dBFS).
const SILENCE_POWER: f64 = 1e-12;

/// Longest window a bin may span: a little over six minutes at 44.1 kHz.
pub const MAX_WINDOW_LENGTH: usize = 1 << 24;

/// DFT bin index `k` over a window of `n` samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinParameters {
    pub k: usize,
    pub n: usize,
}

impl BinParameters {
    pub fn new(k: usize, n: usize) -> Result<Self> {
        if n > MAX_WINDOW_LENGTH {
            return Err(Error::WindowTooLong {
                n: n as f64,
                max: MAX_WINDOW_LENGTH,
            });
        }
        if n == 0 || k >= n {
            return Err(Error::BinOutOfRange { k, n });
        }
        Ok(Self { k, n })
    }

    /// The DC and Nyquist bins have no mirror image in the spectrum.
    pub fn is_real(&self) -> bool {
        self.k == 0 || 2 * self.k == self.n
    }

    /// Frequency actually tracked by this bin.
    pub fn frequency(&self, sample_rate: u32) -> f64 {
        self.k as f64 * sample_rate as f64 / self.n as f64
    }

    /// Spacing between neighbouring bins of the same window length.
    pub fn bandwidth(&self, sample_rate: u32) -> f64 {
        sample_rate as f64 / self.n as f64
    }
}

/// Sliding single-frequency DFT.
///
/// Every step folds the newest sample in and the sample leaving the window
/// out, then rotates:
///
/// ```text
/// X[n] = W * (X[n-1] + x[n] - r^N * x[n-N]),   W = r * e^(i*2*pi*k/N)
/// ```
///
/// `r` is [`DAMPING_FACTOR`]. The departing sample has been rotated N times
/// since it entered, so it is removed with the same `r^N` decay it picked up.
#[derive(Clone, Debug)]
pub struct FrequencyBin {
    params: BinParameters,
    coeff: Complex64,
    departure_decay: f64,
    amplitude_scale: f64,
    dft: Complex64,
    total_power: f64,
}

impl FrequencyBin {
    pub fn new(params: BinParameters) -> Result<Self> {
        let params = BinParameters::new(params.k, params.n)?;
        let BinParameters { k, n } = params;
        let theta = 2.0 * PI * k as f64 / n as f64;
        Ok(Self {
            params,
            coeff: Complex64::from_polar(DAMPING_FACTOR, theta),
            departure_decay: DAMPING_FACTOR.powf(n as f64),
            amplitude_scale: (if params.is_real() { 1.0 } else { SQRT_2 }) / n as f64,
            dft: Complex64::new(0.0, 0.0),
            total_power: 0.0,
        })
    }

    pub fn params(&self) -> BinParameters {
        self.params
    }

    /// One recursive step. `previous` is the sample N writes behind
    /// `current`.
    #[inline]
    pub fn update(&mut self, previous: f32, current: f32) {
        let previous = previous as f64;
        let current = current as f64;
        self.total_power += current * current - previous * previous;
        self.dft = (self.dft + current - previous * self.departure_decay) * self.coeff;
    }

    /// RMS amplitude of the component at the bin frequency.
    pub fn amplitude_spectrum(&self) -> f64 {
        self.amplitude_scale * self.dft.norm()
    }

    /// RMS of the whole window.
    pub fn rms(&self) -> f64 {
        self.mean_power().sqrt()
    }

    /// Share of the window's energy found at the bin frequency.
    ///
    /// A pure sinusoid at the bin frequency reads 1.0 whatever the window
    /// length; richer waveforms read their fundamental's share of the power
    /// (6/pi^2 for a sawtooth, 8/pi^2 for a square wave).
    pub fn normalized_amplitude_spectrum(&self) -> f64 {
        let power = self.mean_power();
        if power < SILENCE_POWER {
            return 0.0;
        }
        let amplitude = self.amplitude_spectrum();
        amplitude * amplitude / power
    }

    /// Level of the bin component relative to a full-scale sinusoid.
    pub fn decibels(&self) -> f64 {
        20.0 * (self.amplitude_spectrum() / REFERENCE_AMPLITUDE).log10()
    }

    fn mean_power(&self) -> f64 {
        // running sum can dip a hair below zero after silence
        (self.total_power / self.params.n as f64).max(0.0)
    }
}
