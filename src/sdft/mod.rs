//! Sliding single-frequency DFT analyzer.
//!
//! Samples go into a shared delay line and straight into one recursive DFT
//! bin per tracked key. Each bin pulls its own N-samples-old value back out
//! of the delay line, so cost per sample is constant per key whatever the
//! window lengths are.

pub mod analyzer;
pub mod average;
pub mod bin;
pub mod buffer;
pub mod tuning;

pub use analyzer::{NoiseGate, SlidingDft, Smoothing};
pub use average::{FastMovingAverage, HeavyMovingAverage, MovingAverage};
pub use bin::{BinParameters, FrequencyBin};
pub use buffer::CircularBuffer;
pub use tuning::{frequency_and_bandwidth_to_bin, note_name, Band, BandList, EqualTemperament, Tuning};
