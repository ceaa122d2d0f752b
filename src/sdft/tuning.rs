use super::bin::{BinParameters, MAX_WINDOW_LENGTH};
use crate::error::{Error, Result};

/// Source of the ordered bin list an analyzer tracks.
pub trait Tuning {
    fn sample_rate(&self) -> u32;

    /// One `(k, N)` pair per tracked key, in output order.
    fn mapping(&self) -> Result<Vec<BinParameters>>;
}

/// Nearest `(k, N)` for a target frequency and bandwidth.
///
/// Both values are rounded, so the tracked frequency can sit up to half a bin
/// away from `frequency`. Targets above Nyquist are accepted and tracked at
/// their alias.
pub fn frequency_and_bandwidth_to_bin(
    sample_rate: u32,
    frequency: f64,
    bandwidth: f64,
) -> Result<BinParameters> {
    if sample_rate == 0 {
        return Err(Error::InvalidSampleRate);
    }
    if !frequency.is_finite() || frequency <= 0.0 {
        return Err(Error::InvalidFrequency(frequency));
    }
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(Error::InvalidBandwidth(bandwidth));
    }

    let sample_rate_f = sample_rate as f64;
    let n = (sample_rate_f / bandwidth).round();
    if n < 1.0 {
        return Err(Error::EmptyWindow { bandwidth, sample_rate });
    }
    if n > MAX_WINDOW_LENGTH as f64 {
        return Err(Error::WindowTooLong { n, max: MAX_WINDOW_LENGTH });
    }
    if 2.0 * frequency > sample_rate_f {
        log::warn!(
            "{:.1} Hz is above Nyquist at {} Hz and will read its alias",
            frequency,
            sample_rate
        );
    }
    let k = (frequency * n / sample_rate_f).round();
    BinParameters::new(k as usize, n as usize)
}

/// Equal-tempered keyboard.
#[derive(Clone, Debug)]
pub struct EqualTemperament {
    sample_rate: u32,
    keys: usize,
    reference_key: usize,
    reference_frequency: f64,
    tolerance: f64,
}

impl EqualTemperament {
    pub fn new(
        sample_rate: u32,
        keys: usize,
        reference_key: usize,
        reference_frequency: f64,
        tolerance: f64,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if keys == 0 {
            return Err(Error::EmptyTuning);
        }
        if reference_key >= keys {
            return Err(Error::InvalidReferenceKey { reference_key, keys });
        }
        if !reference_frequency.is_finite() || reference_frequency <= 0.0 {
            return Err(Error::InvalidFrequency(reference_frequency));
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(Error::InvalidTolerance(tolerance));
        }
        Ok(Self {
            sample_rate,
            keys,
            reference_key,
            reference_frequency,
            tolerance,
        })
    }

    /// 61 keys from C2, A4 = 440 Hz.
    pub fn standard(sample_rate: u32) -> Result<Self> {
        Self::new(sample_rate, 61, 33, 440.0, 1.0)
    }

    pub fn keys(&self) -> usize {
        self.keys
    }

    pub fn reference_key(&self) -> usize {
        self.reference_key
    }

    pub fn reference_frequency(&self) -> f64 {
        self.reference_frequency
    }

    /// Nearest MIDI note number of `key`, placing the reference key by its
    /// frequency against A4 = 440 Hz.
    pub fn midi_note(&self, key: usize) -> i32 {
        let reference = 69.0 + 12.0 * (self.reference_frequency / 440.0).log2();
        (reference + key as f64 - self.reference_key as f64).round() as i32
    }

    /// Target frequency of a (possibly fractional) key position.
    pub fn key_to_frequency(&self, key: f64) -> f64 {
        self.reference_frequency * 2f64.powf((key - self.reference_key as f64) / 12.0)
    }

    /// Distance between the half-semitone neighbours of `key`, scaled by the
    /// tolerance.
    pub fn bandwidth(&self, key: usize) -> f64 {
        let key = key as f64;
        (self.key_to_frequency(key + 0.5) - self.key_to_frequency(key - 0.5)) * self.tolerance
    }
}

impl Tuning for EqualTemperament {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn mapping(&self) -> Result<Vec<BinParameters>> {
        (0..self.keys)
            .map(|key| {
                frequency_and_bandwidth_to_bin(
                    self.sample_rate,
                    self.key_to_frequency(key as f64),
                    self.bandwidth(key),
                )
            })
            .collect()
    }
}

/// One explicitly placed band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub frequency: f64,
    pub bandwidth: f64,
}

/// Explicit list of bands, for detectors that only care about a few tones.
#[derive(Clone, Debug)]
pub struct BandList {
    sample_rate: u32,
    bands: Vec<Band>,
}

impl BandList {
    pub fn new(sample_rate: u32, bands: Vec<Band>) -> Self {
        Self { sample_rate, bands }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }
}

impl Tuning for BandList {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn mapping(&self) -> Result<Vec<BinParameters>> {
        if self.bands.is_empty() {
            return Err(Error::EmptyTuning);
        }
        self.bands
            .iter()
            .map(|band| frequency_and_bandwidth_to_bin(self.sample_rate, band.frequency, band.bandwidth))
            .collect()
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name of a MIDI note number, e.g. 69 -> "A4".
pub fn note_name(midi_note: i32) -> String {
    let name = NOTE_NAMES[midi_note.rem_euclid(12) as usize];
    let octave = midi_note.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_window_and_index() {
        let params = frequency_and_bandwidth_to_bin(8000, 727.0, 2.0).unwrap();
        assert_eq!(params, BinParameters { k: 364, n: 4000 });
        assert!((params.frequency(8000) - 728.0).abs() < 1e-9);

        let params = frequency_and_bandwidth_to_bin(44100, 440.0, 25.0).unwrap();
        assert_eq!(params.n, 1764);
        assert_eq!(params.k, 18);
    }

    #[test]
    fn rejects_nonsense_bins() {
        assert!(matches!(
            frequency_and_bandwidth_to_bin(0, 440.0, 10.0),
            Err(Error::InvalidSampleRate)
        ));
        assert!(matches!(
            frequency_and_bandwidth_to_bin(8000, 440.0, 0.0),
            Err(Error::InvalidBandwidth(_))
        ));
        assert!(matches!(
            frequency_and_bandwidth_to_bin(8000, 440.0, 20000.0),
            Err(Error::EmptyWindow { .. })
        ));
        assert!(matches!(
            frequency_and_bandwidth_to_bin(8000, 7999.0, 100.0),
            Err(Error::BinOutOfRange { k: 80, n: 80 })
        ));
        assert!(matches!(
            frequency_and_bandwidth_to_bin(8000, f64::NAN, 10.0),
            Err(Error::InvalidFrequency(_))
        ));
    }

    #[test]
    fn rejects_windows_too_long_to_allocate() {
        assert!(matches!(
            frequency_and_bandwidth_to_bin(44100, 65.4, 1e-9),
            Err(Error::WindowTooLong { .. })
        ));
        let tuning = EqualTemperament::new(44100, 61, 33, 440.0, 1e-9).unwrap();
        assert!(matches!(tuning.mapping(), Err(Error::WindowTooLong { .. })));
    }

    #[test]
    fn keys_above_nyquist_map_to_their_alias() {
        let tuning = EqualTemperament::new(8000, 88, 48, 440.0, 1.0).unwrap();
        let mapping = tuning.mapping().unwrap();
        let top = mapping[87];
        assert!(tuning.key_to_frequency(87.0) > 4000.0);
        assert!(2 * top.k > top.n && top.k < top.n);
    }

    #[test]
    fn midi_notes_follow_reference_frequency() {
        let standard = EqualTemperament::standard(44100).unwrap();
        assert_eq!(standard.midi_note(33), 69);
        assert_eq!(standard.midi_note(0), 36);

        let from_middle_c = EqualTemperament::new(44100, 12, 0, 261.63, 1.0).unwrap();
        assert_eq!(from_middle_c.midi_note(0), 60);
        assert_eq!(note_name(from_middle_c.midi_note(11)), "B4");
    }

    #[test]
    fn every_key_lands_within_half_a_bin() {
        for sample_rate in [8000, 22050, 44100, 48000] {
            let tuning = EqualTemperament::standard(sample_rate).unwrap();
            let mapping = tuning.mapping().unwrap();
            assert_eq!(mapping.len(), 61);
            for (key, params) in mapping.iter().enumerate() {
                let target = tuning.key_to_frequency(key as f64);
                let error = (params.frequency(sample_rate) - target).abs();
                assert!(
                    error <= params.bandwidth(sample_rate) / 2.0 + 1e-9,
                    "key {} at {} Hz off by {}",
                    key,
                    sample_rate,
                    error
                );
            }
        }
    }

    #[test]
    fn wider_tolerance_means_shorter_windows() {
        let tight = EqualTemperament::new(44100, 61, 33, 440.0, 1.0).unwrap();
        let loose = EqualTemperament::new(44100, 61, 33, 440.0, 2.0).unwrap();
        let tight = tight.mapping().unwrap();
        let loose = loose.mapping().unwrap();
        for (t, l) in tight.iter().zip(loose.iter()) {
            assert!(l.n < t.n);
        }
    }

    #[test]
    fn reference_key_maps_to_reference_frequency() {
        let tuning = EqualTemperament::standard(44100).unwrap();
        assert!((tuning.key_to_frequency(33.0) - 440.0).abs() < 1e-9);
        assert!((tuning.key_to_frequency(45.0) - 880.0).abs() < 1e-9);
        assert!((tuning.key_to_frequency(0.0) - 65.406).abs() < 1e-3);
    }

    #[test]
    fn rejects_bad_keyboards() {
        assert!(matches!(
            EqualTemperament::new(44100, 10, 10, 440.0, 1.0),
            Err(Error::InvalidReferenceKey { .. })
        ));
        assert!(matches!(
            EqualTemperament::new(44100, 61, 33, 440.0, 0.0),
            Err(Error::InvalidTolerance(_))
        ));
        assert!(matches!(
            EqualTemperament::new(44100, 0, 0, 440.0, 1.0),
            Err(Error::EmptyTuning)
        ));
        assert!(matches!(BandList::new(8000, vec![]).mapping(), Err(Error::EmptyTuning)));
    }

    #[test]
    fn names_notes() {
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(36), "C2");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(-1), "B-2");
    }
}
