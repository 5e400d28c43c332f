//! FIR filter design and application.
//!
//! - [`design`]: Hamming-windowed sinc highpass / lowpass / band-pass design,
//!   matching `mne.filter.create_filter(fir_window='hamming', phase='zero')`.
//! - [`apply`]: Overlap-add zero-phase convolution, matching MNE's
//!   `_overlap_add_filter` / `_1d_overlap_filter`.

pub mod apply;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_1d, OverlapAdd};
pub use design::{
    auto_filter_length, auto_h_trans_bandwidth, auto_trans_bandwidth, design_bandpass,
    design_filter, design_highpass, firwin, gain_at, hamming,
};

use crate::error::Result;
use crate::raw::RawArray;

/// Band-pass filtered copy of `raw` (the mu/beta stage, 8–30 Hz by default).
pub fn bandpass_filter(raw: &RawArray, l_freq: f32, h_freq: f32) -> Result<RawArray> {
    raw.filter(Some(l_freq), Some(h_freq))
}
