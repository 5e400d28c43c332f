//! Continuous-signal container (MNE's `Info` + `RawArray`).
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};

use crate::config::UnitScale;
use crate::error::{Error, Result};
use crate::extract::{extract_eeg, EegRecording};
use crate::filter;
use crate::mat::load_mat;

// ── Channel type ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelType {
    #[default]
    Eeg,
    Eog,
    Emg,
    Ecg,
    Misc,
    Stim,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
            ChannelType::Eog => "eog",
            ChannelType::Emg => "emg",
            ChannelType::Ecg => "ecg",
            ChannelType::Misc => "misc",
            ChannelType::Stim => "stim",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "eeg" => ChannelType::Eeg,
            "eog" => ChannelType::Eog,
            "emg" => ChannelType::Emg,
            "ecg" => ChannelType::Ecg,
            "misc" => ChannelType::Misc,
            "stim" => ChannelType::Stim,
            other => return Err(Error::Config(format!("unknown channel type `{other}`"))),
        })
    }
}

// ── Info ──────────────────────────────────────────────────────────────────

/// Recording metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    /// Channel names in row order. Duplicates are allowed.
    pub ch_names:  Vec<String>,
    pub ch_types:  Vec<ChannelType>,
    /// Sampling rate in Hz.
    pub sfreq:     f32,
    /// `[C, 2]` projected electrode positions, when known.
    pub positions: Option<Array2<f32>>,
}

impl Info {
    pub fn n_chan(&self) -> usize {
        self.ch_names.len()
    }

    pub fn nyquist(&self) -> f32 {
        self.sfreq / 2.0
    }

    /// Attach `[C, 2]` electrode positions.
    pub fn with_positions(mut self, positions: Array2<f32>) -> Result<Self> {
        if positions.dim() != (self.n_chan(), 2) {
            return Err(Error::Shape(format!(
                "positions {:?} do not match {} channels",
                positions.dim(),
                self.n_chan()
            )));
        }
        self.positions = Some(positions);
        Ok(self)
    }
}

/// Build an [`Info`] giving every channel the same type.
///
/// Mirrors `mne.create_info(ch_names, sfreq, ch_types)`.
pub fn create_info(ch_names: Vec<String>, sfreq: f32, ch_type: ChannelType) -> Result<Info> {
    if !(sfreq.is_finite() && sfreq > 0.0) {
        return Err(Error::Config(format!("sampling rate must be positive, got {sfreq}")));
    }
    let ch_types = vec![ch_type; ch_names.len()];
    Ok(Info { ch_names, ch_types, sfreq, positions: None })
}

// ── RawArray ──────────────────────────────────────────────────────────────

/// A continuous `[C, T]` recording with its metadata. Immutable once built;
/// processing steps return new instances.
#[derive(Debug, Clone)]
pub struct RawArray {
    data: Array2<f32>,
    info: Info,
}

impl RawArray {
    /// Pair `data` (`[C, T]`) with `info`.
    ///
    /// # Errors
    ///
    /// [`Error::Shape`] if the row count differs from the number of names.
    pub fn new(data: Array2<f32>, info: Info) -> Result<Self> {
        if data.nrows() != info.n_chan() {
            return Err(Error::Shape(format!(
                "data has {} channels but info lists {}",
                data.nrows(),
                info.n_chan()
            )));
        }
        Ok(Self { data, info })
    }

    /// Assemble a recording from extracted fields, carrying electrode
    /// positions over when the file has them.
    pub fn from_recording(rec: EegRecording, ch_type: ChannelType) -> Result<Self> {
        let mut info = create_info(rec.ch_names, rec.sfreq, ch_type)?;
        if let Some(pos) = rec.positions {
            info = info.with_positions(pos)?;
        }
        Self::new(rec.data, info)
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f32> {
        self.data
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn ch_names(&self) -> &[String] {
        &self.info.ch_names
    }

    pub fn sfreq(&self) -> f32 {
        self.info.sfreq
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f32 {
        self.n_times() as f32 / self.info.sfreq
    }

    /// Sample times in seconds, starting at 0.
    pub fn times(&self) -> Array1<f32> {
        let sfreq = self.info.sfreq;
        Array1::from_shape_fn(self.n_times(), |t| t as f32 / sfreq)
    }

    /// Keep only the named channels, in the order given.
    ///
    /// The first channel with a matching name is taken when names repeat.
    pub fn pick_channels(&self, names: &[&str]) -> Result<RawArray> {
        let idx = names
            .iter()
            .map(|&n| {
                self.info
                    .ch_names
                    .iter()
                    .position(|c| c == n)
                    .ok_or_else(|| Error::missing(n))
            })
            .collect::<Result<Vec<usize>>>()?;

        let info = Info {
            ch_names: idx.iter().map(|&i| self.info.ch_names[i].clone()).collect(),
            ch_types: idx.iter().map(|&i| self.info.ch_types[i]).collect(),
            sfreq: self.info.sfreq,
            positions: self.info.positions.as_ref().map(|p| p.select(Axis(0), &idx)),
        };
        RawArray::new(self.data.select(Axis(0), &idx), info)
    }

    /// Return a zero-phase FIR filtered copy.
    ///
    /// `l_freq = None` → lowpass, `h_freq = None` → highpass, both set →
    /// band-pass. See [`filter::design_filter`].
    pub fn filter(&self, l_freq: Option<f32>, h_freq: Option<f32>) -> Result<RawArray> {
        let h = filter::design_filter(l_freq, h_freq, self.info.sfreq)?;
        let mut data = self.data.clone();
        filter::apply_fir_zero_phase(&mut data, &h)?;
        Ok(RawArray { data, info: self.info.clone() })
    }
}

/// Load a subject file and assemble its [`RawArray`].
pub fn create_raw_object<P: AsRef<Path>>(
    path: P,
    ch_type: ChannelType,
    scale: UnitScale,
) -> Result<RawArray> {
    let mat = load_mat(path)?;
    RawArray::from_recording(extract_eeg(&mat, scale)?, ch_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("C{i}")).collect()
    }

    #[test]
    fn channel_count_must_match() {
        let info = create_info(names(3), 100.0, ChannelType::Eeg).unwrap();
        let err = RawArray::new(Array2::zeros((4, 10)), info).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn sfreq_must_be_positive() {
        assert!(matches!(create_info(names(1), 0.0, ChannelType::Eeg), Err(Error::Config(_))));
        assert!(matches!(create_info(names(1), f32::NAN, ChannelType::Eeg), Err(Error::Config(_))));
    }

    #[test]
    fn duplicate_names_are_accepted() {
        let info = create_info(vec!["Cz".into(), "Cz".into()], 100.0, ChannelType::Eeg).unwrap();
        assert!(RawArray::new(Array2::zeros((2, 5)), info).is_ok());
    }

    #[test]
    fn times_and_duration() {
        let info = create_info(names(2), 100.0, ChannelType::Eeg).unwrap();
        let raw = RawArray::new(Array2::zeros((2, 250)), info).unwrap();
        assert_eq!(raw.n_times(), 250);
        approx::assert_abs_diff_eq!(raw.duration(), 2.5, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(raw.times()[100], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn pick_channels_reorders() {
        let info = create_info(names(3), 100.0, ChannelType::Eeg).unwrap();
        let data = Array2::from_shape_fn((3, 4), |(c, _)| c as f32);
        let raw = RawArray::new(data, info).unwrap();
        let picked = raw.pick_channels(&["C2", "C0"]).unwrap();
        assert_eq!(picked.ch_names(), &["C2".to_string(), "C0".to_string()]);
        assert_eq!(picked.data()[[0, 0]], 2.0);
        assert!(matches!(raw.pick_channels(&["Fz"]), Err(Error::MissingField(_))));
    }

    #[test]
    fn from_recording_carries_positions() {
        let rec = EegRecording {
            data: Array2::zeros((3, 10)),
            sfreq: 100.0,
            ch_names: names(3),
            positions: Some(Array2::from_shape_fn((3, 2), |(c, k)| (c * 2 + k) as f32)),
        };
        let raw = RawArray::from_recording(rec, ChannelType::Eog).unwrap();
        assert_eq!(raw.n_channels(), 3);
        assert_eq!(raw.info().ch_types, vec![ChannelType::Eog; 3]);
        assert_eq!(raw.info().positions.as_ref().unwrap()[[2, 1]], 5.0);
    }

    #[test]
    fn from_recording_checks_channel_count() {
        let rec = EegRecording {
            data: Array2::zeros((2, 10)),
            sfreq: 100.0,
            ch_names: names(3),
            positions: None,
        };
        assert!(matches!(RawArray::from_recording(rec, ChannelType::Eeg), Err(Error::Shape(_))));
    }

    #[test]
    fn channel_type_parses() {
        assert_eq!("EEG".parse::<ChannelType>().unwrap(), ChannelType::Eeg);
        assert!("meg".parse::<ChannelType>().is_err());
    }
}
