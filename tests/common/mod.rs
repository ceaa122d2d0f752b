#![allow(dead_code)]

use std::f64::consts::PI;

/// Full-scale sine, `len` samples starting at sample index `start`.
pub fn sine(freq: f64, sample_rate: u32, start: usize, len: usize) -> Vec<f32> {
    (start..start + len)
        .map(|i| (2.0 * PI * freq * i as f64 / sample_rate as f64).sin() as f32)
        .collect()
}

/// Rising sawtooth in [-1, 1) with a whole number of samples per period.
pub fn sawtooth(period: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * (i % period) as f64 / period as f64 - 1.0) as f32)
        .collect()
}

/// Square wave, +1 for the first half of each period and -1 for the second.
pub fn square(period: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| if i % period < period / 2 { 1.0 } else { -1.0 })
        .collect()
}

/// Deterministic white noise in [-amplitude, amplitude].
pub fn noise(amplitude: f32, len: usize) -> Vec<f32> {
    let mut seed = 0x9e37_79b9_u32;
    (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            ((seed as f32 / u32::MAX as f32) * 2.0 - 1.0) * amplitude
        })
        .collect()
}

pub fn mix(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}
