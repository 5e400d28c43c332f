//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! For cutoffs `l_freq` / `h_freq` Hz at sampling rate `sfreq`:
//!   • l transition = min(max(0.25 · l_freq, 2.0), l_freq)
//!   • h transition = min(max(0.25 · h_freq, 2.0), sfreq/2 − h_freq)
//!   • filter length N = ceil(3.3 / min(transitions) · sfreq), rounded to odd
//!   • windowed-sinc sections (Hamming) combined per band edge:
//!       highpass = δ − lp(l_freq − l_tb/2)
//!       lowpass  =     lp(h_freq + h_tb/2)
//!       bandpass =     lp(h_freq + h_tb/2) − lp(l_freq − l_tb/2)
//!     each section sized by its own transition band and centred in N.
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Compute MNE-compatible transition bandwidth for a highpass edge.
///
/// Rule: `min(max(0.25 * l_freq, 2.0), l_freq)`
pub fn auto_trans_bandwidth(l_freq: f32) -> f32 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth for a lowpass edge.
///
/// Rule: `min(max(0.25 * h_freq, 2.0), sfreq / 2 - h_freq)`
pub fn auto_h_trans_bandwidth(h_freq: f32, sfreq: f32) -> f32 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Compute the number of FIR taps for a given transition bandwidth.
/// Returns an odd integer (required for zero-phase linear-phase FIR).
///
/// Formula: `ceil(3.3 / trans_bw * sfreq)` rounded up to odd.
pub fn auto_filter_length(trans_bw: f32, sfreq: f32) -> usize {
    let n_raw = ((3.3 / trans_bw * sfreq).ceil() as usize).max(1);
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// One band edge: its -6 dB firwin cutoff and its own kernel length.
#[derive(Debug, Clone, Copy)]
struct Edge {
    cutoff_hz: f32,
    n_taps:    usize,
}

/// Design a zero-phase FIR kernel for the given cutoffs.
///
/// | `l_freq` | `h_freq` | response  |
/// |----------|----------|-----------|
/// | `Some`   | `None`   | highpass  |
/// | `None`   | `Some`   | lowpass   |
/// | `Some`   | `Some`   | band-pass |
///
/// Matches `mne.filter.create_filter(..., fir_window='hamming',
/// fir_design='firwin', phase='zero')`.
///
/// # Errors
///
/// [`Error::Config`] when both cutoffs are `None`, a cutoff is not in
/// `(0, sfreq/2)`, or `l_freq >= h_freq`.
pub fn design_filter(l_freq: Option<f32>, h_freq: Option<f32>, sfreq: f32) -> Result<Vec<f32>> {
    if !(sfreq.is_finite() && sfreq > 0.0) {
        return Err(Error::Config(format!("sampling rate must be positive, got {sfreq}")));
    }
    let nyq = sfreq / 2.0;
    for (name, f) in [("l_freq", l_freq), ("h_freq", h_freq)] {
        if let Some(f) = f {
            if !(f.is_finite() && f > 0.0 && f < nyq) {
                return Err(Error::Config(format!(
                    "{name} = {f} Hz must lie in (0, {nyq}) Hz"
                )));
            }
        }
    }
    if let (Some(l), Some(h)) = (l_freq, h_freq) {
        if l >= h {
            return Err(Error::Config(format!("l_freq ({l} Hz) must be below h_freq ({h} Hz)")));
        }
    }

    let low_edge = l_freq.map(|l| {
        let tb = auto_trans_bandwidth(l);
        Edge { cutoff_hz: l - tb / 2.0, n_taps: auto_filter_length(tb, sfreq) }
    });
    let high_edge = h_freq.map(|h| {
        let tb = auto_h_trans_bandwidth(h, sfreq);
        Edge { cutoff_hz: h + tb / 2.0, n_taps: auto_filter_length(tb, sfreq) }
    });

    let n = match (low_edge, high_edge) {
        (Some(a), Some(b)) => a.n_taps.max(b.n_taps),
        (Some(a), None) | (None, Some(a)) => a.n_taps,
        (None, None) => {
            return Err(Error::Config("at least one of l_freq / h_freq must be set".into()));
        }
    };

    let mut h = vec![0.0_f64; n];
    match high_edge {
        Some(e) => add_centered(&mut h, &firwin(e.n_taps, e.cutoff_hz, sfreq), 1.0),
        // All-pass above the low edge.
        None => h[n / 2] = 1.0,
    }
    if let Some(e) = low_edge {
        add_centered(&mut h, &firwin(e.n_taps, e.cutoff_hz, sfreq), -1.0);
    }

    log::debug!(
        "designed FIR l={l_freq:?} h={h_freq:?} @ {sfreq} Hz: {n} taps"
    );
    Ok(h.iter().map(|&v| v as f32).collect())
}

/// Zero-phase highpass FIR (Hamming-windowed sinc); see [`design_filter`].
pub fn design_highpass(l_freq: f32, sfreq: f32) -> Result<Vec<f32>> {
    design_filter(Some(l_freq), None, sfreq)
}

/// Checked band-pass design; see [`design_filter`].
pub fn design_bandpass(l_freq: f32, h_freq: f32, sfreq: f32) -> Result<Vec<f32>> {
    design_filter(Some(l_freq), Some(h_freq), sfreq)
}

/// `h[offset..offset+m] += sign * section`, centring an odd section in an
/// odd kernel.
fn add_centered(h: &mut [f64], section: &[f64], sign: f64) {
    let offset = (h.len() - section.len()) / 2;
    for (dst, &v) in h[offset..offset + section.len()].iter_mut().zip(section) {
        *dst += sign * v;
    }
}

/// Lowpass FIR section (Hamming-windowed sinc) with unit DC gain.
///
/// `cutoff_hz` is the -6 dB point; `n` must be odd. Highpass responses are
/// built from it by spectral inversion in [`design_filter`].
pub fn firwin(n: usize, cutoff_hz: f32, sfreq: f32) -> Vec<f64> {
    debug_assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let nyq = sfreq as f64 / 2.0;
    let fc = cutoff_hz as f64 / nyq;

    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x) / (π·x), → fc at x = 0
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    // Unit DC gain.
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Magnitude of the kernel's frequency response at `freq` Hz.
pub fn gain_at(h: &[f32], freq: f32, sfreq: f32) -> f32 {
    let w = 2.0 * PI * freq as f64 / sfreq as f64;
    let (re, im) = h.iter().enumerate().fold((0.0_f64, 0.0_f64), |(re, im), (k, &v)| {
        let ph = w * k as f64;
        (re + v as f64 * ph.cos(), im - v as f64 * ph.sin())
    });
    (re * re + im * im).sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_length_is_odd() {
        for l_freq in [0.5_f32, 1.0, 2.0, 5.0, 8.0] {
            let tb = auto_trans_bandwidth(l_freq);
            let n = auto_filter_length(tb, 256.0);
            assert!(n % 2 == 1, "N={n} is even for l_freq={l_freq}");
        }
    }

    #[test]
    fn highpass_known_length_256hz() {
        // At 256 Hz / 0.5 Hz: MNE produces 1691 taps.
        let h = design_highpass(0.5, 256.0).unwrap();
        assert_eq!(h.len(), 1691, "expected 1691 taps, got {}", h.len());
    }

    #[test]
    fn bandpass_length_set_by_narrowest_edge() {
        // 8 Hz edge: tb = 2 Hz → 165 taps at 100 Hz; 30 Hz edge: tb = 7.5 Hz → 45.
        let h = design_bandpass(8.0, 30.0, 100.0).unwrap();
        assert_eq!(h.len(), 165);
    }

    #[test]
    fn h_trans_capped_by_nyquist() {
        assert_eq!(auto_h_trans_bandwidth(30.0, 100.0), 7.5);
        assert_eq!(auto_h_trans_bandwidth(48.0, 100.0), 2.0);
        approx::assert_abs_diff_eq!(auto_h_trans_bandwidth(49.5, 100.0), 0.5);
    }

    #[test]
    fn bandpass_is_symmetric_and_dc_free() {
        let h = design_bandpass(8.0, 30.0, 100.0).unwrap();
        let n = h.len();
        for i in 0..n / 2 {
            approx::assert_abs_diff_eq!(h[i], h[n - 1 - i], epsilon = 1e-7_f32);
        }
        let s: f32 = h.iter().sum();
        assert!(s.abs() < 1e-5, "bandpass DC gain = {s}");
    }

    #[test]
    fn bandpass_response() {
        let h = design_bandpass(8.0, 30.0, 100.0).unwrap();
        approx::assert_abs_diff_eq!(gain_at(&h, 18.0, 100.0), 1.0, epsilon = 0.01);
        assert!(gain_at(&h, 2.0, 100.0) < 0.01);
        assert!(gain_at(&h, 45.0, 100.0) < 0.01);
    }

    #[test]
    fn lowpass_dc_gain_unity() {
        let h = firwin(101, 10.0, 256.0);
        let dc: f64 = h.iter().sum();
        approx::assert_abs_diff_eq!(dc, 1.0, epsilon = 1e-9);
        let lp = design_filter(None, Some(20.0), 100.0).unwrap();
        approx::assert_abs_diff_eq!(lp.iter().sum::<f32>(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn highpass_is_delta_minus_lowpass() {
        let hp = design_filter(Some(8.0), None, 100.0).unwrap();
        let n = hp.len();
        let tb = auto_trans_bandwidth(8.0);
        let lp = firwin(n, 8.0 - tb / 2.0, 100.0);
        for (i, (&a, &b)) in hp.iter().zip(&lp).enumerate() {
            let delta = if i == n / 2 { 1.0 } else { 0.0 };
            approx::assert_abs_diff_eq!(a as f64, delta - b, epsilon = 1e-6);
        }
        assert!(gain_at(&hp, 0.0, 100.0) < 1e-5);
        approx::assert_abs_diff_eq!(gain_at(&hp, 40.0, 100.0), 1.0, epsilon = 0.01);
    }

    #[test]
    fn rejects_bad_cutoffs() {
        for (l, h) in [(None, None), (Some(30.0), Some(8.0)), (Some(8.0), Some(50.0)), (Some(-1.0), None)] {
            assert!(
                matches!(design_filter(l, h, 100.0), Err(Error::Config(_))),
                "l={l:?} h={h:?} accepted"
            );
        }
    }
}
