//! # mieeg — motor-imagery EEG loading and preprocessing in pure Rust
//!
//! `mieeg` reads the MATLAB files of BCI Competition III dataset IVa,
//! wraps the continuous signal and its cue markers in MNE-style
//! structures, band-pass filters the signal and cuts event-locked epochs
//! ready for a CSP-style classifier.
//!
//! ## Pipeline overview
//!
//! ```text
//! aa.mat
//!   │
//!   ├─ mat::load_mat()              Level-5 MAT-file reader (v5/v6/v7)
//!   ├─ extract::extract_eeg()       cnt [T, C] int16 → [C, T] f32 × unit scale
//!   ├─ extract::load_events()       mrk.pos / mrk.y, NaN (unlabeled) trials dropped
//!   ├─ events::create_events_array  [N, 3] = (onset, 0, class)
//!   ├─ raw::RawArray                signal + channel names + sfreq
//!   ├─ RawArray::filter()           FIR band-pass, 8–30 Hz (mu / beta)
//!   ├─ epoch::create_epoch()        0–3.5 s windows at each cue, no baseline
//!   └─ features::extract_csp_features
//!        │
//!        └─→ (X [E, C, T] f32, y [E] i64)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use mieeg::{run_pipeline, PipelineConfig, extract_csp_features};
//!
//! let out = run_pipeline("data/raw/aa.mat", &PipelineConfig::default()).unwrap();
//! let (x, y) = extract_csp_features(&out.epochs);
//! println!("X {:?}, {} labels", x.dim(), y.len());
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use mieeg::mat::load_mat;
//! use mieeg::extract::{extract_eeg, load_events};
//! use mieeg::events::{create_events_array, EventId};
//! use mieeg::raw::{create_info, ChannelType, RawArray};
//! use mieeg::epoch::create_epoch;
//! use mieeg::UnitScale;
//!
//! let mat = load_mat("data/raw/aa.mat").unwrap();
//! let rec = extract_eeg(&mat, UnitScale::Microvolts).unwrap();
//! let info = create_info(rec.ch_names, rec.sfreq, ChannelType::Eeg).unwrap();
//! let raw = RawArray::new(rec.data, info).unwrap();
//!
//! let (pos, labels) = load_events(&mat).unwrap();
//! let events = create_events_array(&pos, &labels).unwrap();
//!
//! let filtered = raw.filter(Some(8.0), Some(30.0)).unwrap();
//! let epochs = create_epoch(&filtered, &events, &EventId::motor_imagery(), 0.0, 3.5).unwrap();
//! ```

pub mod config;
pub mod epoch;
pub mod error;
pub mod events;
pub mod extract;
pub mod features;
pub mod filter;
pub mod io;
pub mod mat;
pub mod raw;

use std::path::Path;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{PipelineConfig, UnitScale, CNT_TO_MICROVOLTS, CNT_TO_VOLTS};

// error
pub use error::{Error, Result};

// mat
pub use mat::{load_mat, parse_mat, MatFile, MatValue};

// extract
pub use extract::{extract_eeg, load_events, load_raw_eeg, EegRecording};

// events
pub use events::{create_events_array, EventId, EventTable};

// raw
pub use raw::{create_info, create_raw_object, ChannelType, Info, RawArray};

// filter
pub use filter::{apply_fir_zero_phase, bandpass_filter, design_filter};

// epoch
pub use epoch::{create_epoch, DropReason, Epochs};

// features
pub use features::extract_csp_features;

// io
pub use io::{write_features, StWriter};

/// Everything the pipeline produces for one subject file.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Unfiltered continuous recording.
    pub raw:      RawArray,
    /// Filtered recording (a copy of `raw` when filtering is disabled).
    pub filtered: RawArray,
    /// All labeled trials.
    pub events:   EventTable,
    /// Epochs cut from `filtered`.
    pub epochs:   Epochs,
}

/// Load one subject file into a [`RawArray`] and its [`EventTable`].
///
/// The file is read once and both extractors run on the same image.
pub fn load_subject<P: AsRef<Path>>(path: P, cfg: &PipelineConfig) -> Result<(RawArray, EventTable)> {
    let mat = load_mat(path)?;

    let raw = RawArray::from_recording(extract_eeg(&mat, cfg.unit_scale)?, cfg.ch_type)?;

    let (positions, labels) = load_events(&mat)?;
    let events = create_events_array(&positions, &labels)?;
    Ok((raw, events))
}

/// Run the **full pipeline** on one subject file: load, filter, epoch.
///
/// Any failure aborts the run; no partial output is returned.
///
/// # Errors
///
/// Propagates the first [`Error`] of any stage: file / format problems
/// from the loader, missing fields or shape mismatches from the
/// extractors, and invalid cutoffs or epoch windows from `cfg`.
pub fn run_pipeline<P: AsRef<Path>>(path: P, cfg: &PipelineConfig) -> Result<PipelineOutput> {
    let (raw, events) = load_subject(path, cfg)?;

    let filtered = if cfg.filters() {
        raw.filter(cfg.l_freq, cfg.h_freq)?
    } else {
        raw.clone()
    };
    log::info!(
        "filter: l_freq={:?} h_freq={:?} on {} ch",
        cfg.l_freq,
        cfg.h_freq,
        filtered.n_channels()
    );

    let epochs = create_epoch(&filtered, &events, &cfg.event_id, cfg.tmin, cfg.tmax)?;
    Ok(PipelineOutput { raw, filtered, events, epochs })
}
