//! Per-note intensity levels from a live audio stream.
//!
//! [`sdft::SlidingDft`] turns blocks of samples into one level per tracked
//! key. [`detect::ToneDetector`] builds a thresholded event detector on top
//! of it, and [`config`] loads both from TOML.

pub mod audio;
pub mod config;
pub mod detect;
pub mod error;
pub mod sdft;

pub use error::{Error, Result};
