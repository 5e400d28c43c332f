//! Field extraction from a loaded BCI Competition III IVa MAT-file.
//!
//! Expected layout:
//!
//! ```text
//! cnt  [T, C] int16      continuous signal, 0.1 µV per count
//! nfo  1×1 struct        fs (scalar), clab (1×C cell of char),
//!                        xpos / ypos (C×1, optional)
//! mrk  1×1 struct        pos (1×N onsets), y (1×N, NaN = unlabeled),
//!                        className (1×K cell, optional)
//! ```
use std::path::Path;

use ndarray::Array2;

use crate::config::UnitScale;
use crate::error::{Error, Result};
use crate::mat::{load_mat, CellArray, MatFile, MatValue, Record};

// ── EEG ───────────────────────────────────────────────────────────────────

/// Continuous signal converted to `[C, T]` f32 in the configured unit.
///
/// `cnt` is stored `[T, C]` column-major, i.e. channel by channel, so the
/// stored order is already row-major `[C, T]` and no copy-transpose is
/// needed. Each value is cast to `f32` before scaling.
pub fn extract_eeg_data(mat: &MatFile, scale: UnitScale) -> Result<Array2<f32>> {
    let cnt = mat.field("cnt")?.expect_numeric("cnt")?;
    if cnt.dims.len() != 2 {
        return Err(Error::Shape(format!("`cnt` must be 2-D, got dimensions {:?}", cnt.dims)));
    }
    let (n_samples, n_channels) = (cnt.dims[0], cnt.dims[1]);
    let factor = scale.factor();
    let values: Vec<f32> = cnt.real.iter().map(|&v| v as f32 * factor).collect();
    Array2::from_shape_vec((n_channels, n_samples), values)
        .map_err(|e| Error::Shape(format!("`cnt`: {e}")))
}

/// Unwrap the scalar `nfo` struct.
pub fn extract_info(mat: &MatFile) -> Result<&Record> {
    mat.field("nfo")?.expect_record("nfo")
}

/// `nfo.fs` as a positive, finite sampling rate in Hz.
pub fn extract_sampling_rate(nfo: &Record) -> Result<f32> {
    let fs = nfo
        .field("fs")?
        .expect_numeric("fs")?
        .scalar()
        .ok_or_else(|| Error::format("`fs` is not a scalar"))?;
    if !(fs.is_finite() && fs > 0.0) {
        return Err(Error::format(format!("sampling rate must be positive, got {fs}")));
    }
    Ok(fs as f32)
}

/// The raw `nfo.clab` cell array.
pub fn extract_channel_labels(nfo: &Record) -> Result<&CellArray> {
    nfo.field("clab")?.expect_cell("clab")
}

/// Convert a cell array of char cells to plain strings, in cell order.
pub fn convert_channel_labels(raw_channels: &CellArray) -> Result<Vec<String>> {
    raw_channels
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            MatValue::Char(c) => Ok(c.as_string()),
            other => Err(Error::format(format!(
                "channel label {i} is {}, expected char",
                other.kind()
            ))),
        })
        .collect()
}

/// Electrode positions from `nfo.xpos` / `nfo.ypos` as `[C, 2]`, if present.
pub fn extract_positions(nfo: &Record) -> Result<Option<Array2<f32>>> {
    let (Some(x), Some(y)) = (nfo.get("xpos"), nfo.get("ypos")) else {
        return Ok(None);
    };
    let x = x.expect_numeric("xpos")?;
    let y = y.expect_numeric("ypos")?;
    if x.numel() != y.numel() {
        return Err(Error::Shape(format!(
            "`xpos` has {} entries but `ypos` has {}",
            x.numel(),
            y.numel()
        )));
    }
    let pos = Array2::from_shape_fn((x.numel(), 2), |(c, k)| {
        let src = if k == 0 { &x.real } else { &y.real };
        src[c] as f32
    });
    Ok(Some(pos))
}

/// Signal, sampling rate, channel names and optional positions of one
/// recording.
#[derive(Debug, Clone)]
pub struct EegRecording {
    /// `[C, T]` in the configured unit.
    pub data:      Array2<f32>,
    pub sfreq:     f32,
    pub ch_names:  Vec<String>,
    /// `[C, 2]` 2-D projected electrode positions.
    pub positions: Option<Array2<f32>>,
}

/// Run the EEG extractor on an already-loaded file.
///
/// # Errors
///
/// * [`Error::MissingField`] if `cnt`, `nfo`, `fs` or `clab` is absent.
/// * [`Error::Shape`] if `clab` (or the positions) disagree with the
///   channel dimension of `cnt`.
pub fn extract_eeg(mat: &MatFile, scale: UnitScale) -> Result<EegRecording> {
    let data = extract_eeg_data(mat, scale)?;
    let nfo = extract_info(mat)?;
    let sfreq = extract_sampling_rate(nfo)?;
    let ch_names = convert_channel_labels(extract_channel_labels(nfo)?)?;

    if ch_names.len() != data.nrows() {
        return Err(Error::Shape(format!(
            "`clab` lists {} channels but `cnt` has {}",
            ch_names.len(),
            data.nrows()
        )));
    }
    let positions = extract_positions(nfo)?;
    if let Some(p) = &positions {
        if p.nrows() != ch_names.len() {
            return Err(Error::Shape(format!(
                "{} electrode positions for {} channels",
                p.nrows(),
                ch_names.len()
            )));
        }
    }

    log::info!(
        "EEG: {} ch × {} samples @ {sfreq} Hz (scale {})",
        data.nrows(),
        data.ncols(),
        scale.factor()
    );
    Ok(EegRecording { data, sfreq, ch_names, positions })
}

/// Load a file and return `(data [C, T], sfreq, channel names)`.
pub fn load_raw_eeg<P: AsRef<Path>>(path: P, scale: UnitScale) -> Result<(Array2<f32>, f32, Vec<String>)> {
    let mat = load_mat(path)?;
    let rec = extract_eeg(&mat, scale)?;
    Ok((rec.data, rec.sfreq, rec.ch_names))
}

// ── Events ────────────────────────────────────────────────────────────────

/// 2⁶³: the first `f64` that no longer converts to `i64` exactly.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Onsets and integer class codes of the labeled trials.
///
/// Trials whose `mrk.y` is NaN (the test set) are dropped from both
/// outputs; the survivors keep their stored order. Onsets are used
/// verbatim, without re-basing MATLAB's 1-based sample indices. Labels are
/// truncated toward zero.
///
/// # Errors
///
/// * [`Error::MissingField`] if `mrk`, `pos` or `y` is absent.
/// * [`Error::Shape`] if `pos` and `y` differ in length or are not vectors.
/// * [`Error::Format`] for a negative, fractional or out-of-range onset, or
///   a label that is infinite or out of range.
pub fn load_events(mat: &MatFile) -> Result<(Vec<i64>, Vec<i64>)> {
    let mrk = mat.field("mrk")?.expect_record("mrk")?;
    let positions = vector(mrk, "pos")?;
    let labels = vector(mrk, "y")?;
    if positions.len() != labels.len() {
        return Err(Error::Shape(format!(
            "`mrk.pos` has {} entries but `mrk.y` has {}",
            positions.len(),
            labels.len()
        )));
    }

    let mut labeled_positions = Vec::with_capacity(positions.len());
    let mut class_labels = Vec::with_capacity(labels.len());
    for (i, (&pos, &y)) in positions.iter().zip(labels).enumerate() {
        if y.is_nan() {
            continue;
        }
        if !(y.is_finite() && y.abs() < I64_LIMIT) {
            return Err(Error::format(format!("trial {i}: label {y} is not a class code")));
        }
        if !(pos.is_finite() && pos >= 0.0 && pos < I64_LIMIT && pos.fract() == 0.0) {
            return Err(Error::format(format!("trial {i}: onset {pos} is not a sample index")));
        }
        labeled_positions.push(pos as i64);
        class_labels.push(y as i64);
    }

    log::info!(
        "events: {} labeled of {} trials",
        labeled_positions.len(),
        positions.len()
    );
    Ok((labeled_positions, class_labels))
}

/// [`load_events`] on a file path.
pub fn load_events_file<P: AsRef<Path>>(path: P) -> Result<(Vec<i64>, Vec<i64>)> {
    load_events(&load_mat(path)?)
}

/// Class names from `mrk.className`, if the file carries them.
pub fn class_names(mat: &MatFile) -> Option<Vec<String>> {
    let mrk = mat.get("mrk")?.as_struct()?.at(0, 0)?;
    let cell = mrk.get("className")?.as_cell()?;
    cell.iter().map(|v| v.as_char().map(|c| c.as_string())).collect()
}

fn vector<'a>(rec: &'a Record, name: &str) -> Result<&'a [f64]> {
    let arr = rec.field(name)?.expect_numeric(name)?;
    arr.as_vector()
        .ok_or_else(|| Error::Shape(format!("`{name}` must be a vector, got {:?}", arr.dims)))
}
