//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the load → filter →
//! epoch pipeline. The defaults reproduce the motor-imagery setup for BCI
//! Competition III dataset IVa: 8–30 Hz band-pass, 0–3.5 s epochs,
//! classes `right` = 1 and `foot` = 2.
use std::fmt;
use std::str::FromStr;

use crate::events::EventId;
use crate::raw::ChannelType;

/// Scale from the dataset's stored int16 `cnt` units to microvolts.
///
/// The dataset stores `0.1 µV` per count, so `cnt × 0.1` is in µV.
pub const CNT_TO_MICROVOLTS: f32 = 0.1;

/// Scale from stored `cnt` units straight to volts: `0.1 × 0.1e-6`.
///
/// Historically used by a second copy of the extractor; note this is
/// `1e-8`, i.e. one decade below true volts (`1e-7`).
pub const CNT_TO_VOLTS: f32 = 0.1 * 0.1e-6;

/// Unit conversion applied to `cnt` by the EEG extractor.
///
/// There is no implicit choice: the configured variant is the one applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnitScale {
    /// `× 0.1` ([`CNT_TO_MICROVOLTS`]).
    #[default]
    Microvolts,
    /// `× 1e-8` ([`CNT_TO_VOLTS`]).
    Volts,
    /// Any other factor, for datasets with a different resolution.
    Custom(f32),
}

impl UnitScale {
    pub fn factor(self) -> f32 {
        match self {
            UnitScale::Microvolts => CNT_TO_MICROVOLTS,
            UnitScale::Volts => CNT_TO_VOLTS,
            UnitScale::Custom(f) => f,
        }
    }
}

impl fmt::Display for UnitScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitScale::Microvolts => f.write_str("uv"),
            UnitScale::Volts => f.write_str("v"),
            UnitScale::Custom(x) => write!(f, "{x}"),
        }
    }
}

impl FromStr for UnitScale {
    type Err = String;

    /// `uv` / `microvolts`, `v` / `volts`, or a bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uv" | "microvolts" => Ok(UnitScale::Microvolts),
            "v" | "volts" => Ok(UnitScale::Volts),
            other => other
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite() && *f != 0.0)
                .map(UnitScale::Custom)
                .ok_or_else(|| format!("unknown unit scale `{s}` (expected uv, v or a number)")),
        }
    }
}

/// Default low cutoff of the mu/beta band-pass (Hz).
pub const DEFAULT_L_FREQ: f32 = 8.0;
/// Default high cutoff of the mu/beta band-pass (Hz).
pub const DEFAULT_H_FREQ: f32 = 30.0;
/// Default epoch start relative to the cue (s).
pub const DEFAULT_TMIN: f32 = 0.0;
/// Default epoch end relative to the cue (s).
pub const DEFAULT_TMAX: f32 = 3.5;

/// Configuration for the full pipeline.
///
/// All fields are `pub` so you can use struct-update syntax:
///
/// ```
/// use mieeg::{PipelineConfig, UnitScale};
///
/// let cfg = PipelineConfig {
///     unit_scale: UnitScale::Volts,
///     tmax:       2.5,
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.l_freq, Some(8.0));
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Conversion applied to the stored `cnt` values.
    ///
    /// Default: [`UnitScale::Microvolts`].
    pub unit_scale: UnitScale,

    /// Channel type assigned to every channel of the recording.
    ///
    /// Default: [`ChannelType::Eeg`].
    pub ch_type: ChannelType,

    /// Low cutoff in Hz; `None` makes the filter a lowpass.
    ///
    /// Default: `Some(8.0)`.
    pub l_freq: Option<f32>,

    /// High cutoff in Hz; `None` makes the filter a highpass.
    /// With both cutoffs `None` filtering is skipped.
    ///
    /// Default: `Some(30.0)`.
    pub h_freq: Option<f32>,

    /// Epoch window start relative to each cue, in seconds.
    ///
    /// Default: `0.0`.
    pub tmin: f32,

    /// Epoch window end relative to each cue, in seconds (inclusive).
    ///
    /// Default: `3.5`.
    pub tmax: f32,

    /// Class names and their event codes.
    ///
    /// Default: `{"right": 1, "foot": 2}`.
    pub event_id: EventId,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unit_scale: UnitScale::default(),
            ch_type: ChannelType::Eeg,
            l_freq: Some(DEFAULT_L_FREQ),
            h_freq: Some(DEFAULT_H_FREQ),
            tmin: DEFAULT_TMIN,
            tmax: DEFAULT_TMAX,
            event_id: EventId::default(),
        }
    }
}

impl PipelineConfig {
    /// `true` when at least one cutoff is set.
    pub fn filters(&self) -> bool {
        self.l_freq.is_some() || self.h_freq.is_some()
    }
}
