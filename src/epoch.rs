//! Event-locked epoching (MNE's `Epochs(..., baseline=None, preload=True)`).
//!
//! For each event whose code is in the class map, the window
//! `[onset + round(tmin·sfreq), onset + round(tmax·sfreq)]` (inclusive) is
//! cut from every channel. Windows that leave the recording are dropped and
//! logged. No baseline correction is applied.
use ndarray::{s, Array1, Array3};

use crate::error::{Error, Result};
use crate::events::{EventId, EventTable};
use crate::raw::RawArray;

/// Why an event did not produce an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Event code not in the class map.
    Ignored,
    /// Window extends before the first or past the last sample.
    NoData,
}

/// Epoched data with the events it was cut at.
#[derive(Debug, Clone)]
pub struct Epochs {
    data:      Array3<f32>,
    events:    EventTable,
    event_id:  EventId,
    ch_names:  Vec<String>,
    sfreq:     f32,
    start_off: i64,
    selection: Vec<usize>,
    drop_log:  Vec<Option<DropReason>>,
}

impl Epochs {
    /// `[E, C, T]` epoch data.
    pub fn get_data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Events of the kept epochs, one row per epoch.
    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn sfreq(&self) -> f32 {
        self.sfreq
    }

    pub fn len(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples per epoch.
    pub fn n_times(&self) -> usize {
        self.data.shape()[2]
    }

    /// Window start actually used, after rounding to samples.
    pub fn tmin(&self) -> f32 {
        self.start_off as f32 / self.sfreq
    }

    /// Window end actually used, after rounding to samples.
    pub fn tmax(&self) -> f32 {
        (self.start_off + self.n_times() as i64 - 1) as f32 / self.sfreq
    }

    /// Time of each sample relative to the event onset, in seconds.
    pub fn times(&self) -> Array1<f32> {
        let (off, sfreq) = (self.start_off, self.sfreq);
        Array1::from_shape_fn(self.n_times(), |k| (off + k as i64) as f32 / sfreq)
    }

    /// Indices into the input event table of the kept epochs.
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// One entry per input event: `None` if kept, else why it was dropped.
    pub fn drop_log(&self) -> &[Option<DropReason>] {
        &self.drop_log
    }

    /// Epochs of a single class (`epochs["right"]`).
    pub fn select(&self, class: &str) -> Result<Epochs> {
        let code = self.event_id.code(class).ok_or_else(|| Error::missing(class))?;
        let keep: Vec<usize> = self
            .events
            .labels()
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == code)
            .map(|(i, _)| i)
            .collect();
        Ok(Epochs {
            data: self.data.select(ndarray::Axis(0), &keep),
            events: self.events.select(&keep),
            event_id: EventId::new([(class, code)]),
            ch_names: self.ch_names.clone(),
            sfreq: self.sfreq,
            start_off: self.start_off,
            selection: keep.iter().map(|&i| self.selection[i]).collect(),
            drop_log: self.drop_log.clone(),
        })
    }
}

/// Cut event-locked epochs from `raw`.
///
/// # Errors
///
/// [`Error::Config`] if `tmin > tmax`, either bound is not finite, or the
/// window is longer than the recording.
pub fn create_epoch(
    raw: &RawArray,
    events: &EventTable,
    event_id: &EventId,
    tmin: f32,
    tmax: f32,
) -> Result<Epochs> {
    if !(tmin.is_finite() && tmax.is_finite()) || tmin > tmax {
        return Err(Error::Config(format!("invalid epoch window [{tmin}, {tmax}] s")));
    }
    let sfreq = raw.sfreq();
    let n_samples = raw.n_times() as i64;
    let (start_off, stop_off) = (sample_offset(tmin, sfreq)?, sample_offset(tmax, sfreq)?);
    let n_times = stop_off
        .checked_sub(start_off)
        .and_then(|d| d.checked_add(1))
        .filter(|&n| n <= n_samples)
        .ok_or_else(|| {
            Error::Config(format!(
                "epoch window [{tmin}, {tmax}] s is longer than the recording ({n_samples} samples)"
            ))
        })? as usize;

    for (name, code) in event_id.iter() {
        if events.count(code) == 0 {
            log::warn!("no events found for class `{name}` (code {code})");
        }
    }

    let mut selection = Vec::with_capacity(events.len());
    let mut drop_log = Vec::with_capacity(events.len());
    for (i, (&onset, &code)) in events.onsets().iter().zip(events.labels().iter()).enumerate() {
        if !event_id.contains_code(code) {
            drop_log.push(Some(DropReason::Ignored));
            continue;
        }
        let in_range = onset
            .checked_add(start_off)
            .zip(onset.checked_add(stop_off))
            .is_some_and(|(start, stop)| start >= 0 && stop < n_samples);
        if !in_range {
            log::debug!("event {i} @ {onset}: window [{tmin}, {tmax}] s outside recording");
            drop_log.push(Some(DropReason::NoData));
            continue;
        }
        drop_log.push(None);
        selection.push(i);
    }

    let data_in = raw.data();
    let mut data = Array3::<f32>::zeros((selection.len(), raw.n_channels(), n_times));
    for (e, &i) in selection.iter().enumerate() {
        let start = (events.onsets()[i] + start_off) as usize;
        data.slice_mut(s![e, .., ..])
            .assign(&data_in.slice(s![.., start..start + n_times]));
    }

    let n_no_data = drop_log.iter().filter(|d| **d == Some(DropReason::NoData)).count();
    if n_no_data > 0 {
        log::warn!("{n_no_data} epochs dropped: window outside the recording");
    }
    log::info!(
        "epochs: {} kept of {} events, {n_times} samples each ({tmin}–{tmax} s)",
        selection.len(),
        events.len()
    );

    Ok(Epochs {
        data,
        events: events.select(&selection),
        event_id: event_id.clone(),
        ch_names: raw.ch_names().to_vec(),
        sfreq,
        start_off,
        selection,
        drop_log,
    })
}

/// `round(t · sfreq)` as a sample offset, rejecting values beyond `i64`.
fn sample_offset(t: f32, sfreq: f32) -> Result<i64> {
    let off = (f64::from(t) * f64::from(sfreq)).round();
    if off.abs() >= i64::MAX as f64 {
        return Err(Error::Config(format!("epoch bound {t} s is out of range")));
    }
    Ok(off as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_events_array;
    use crate::raw::{create_info, ChannelType};
    use ndarray::Array2;

    fn ramp_raw(n_ch: usize, n_t: usize, sfreq: f32) -> RawArray {
        let names = (0..n_ch).map(|i| format!("C{i}")).collect();
        let info = create_info(names, sfreq, ChannelType::Eeg).unwrap();
        // value = channel * 1000 + sample index
        let data = Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 1000 + t) as f32);
        RawArray::new(data, info).unwrap()
    }

    #[test]
    fn window_is_inclusive() {
        let raw = ramp_raw(2, 1000, 100.0);
        let ev = create_events_array(&[100, 300], &[1, 2]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 3.5).unwrap();
        assert_eq!(ep.get_data().shape(), &[2, 2, 351]);
        assert_eq!(ep.get_data()[[0, 0, 0]], 100.0);
        assert_eq!(ep.get_data()[[1, 1, 350]], 1650.0);
        approx::assert_abs_diff_eq!(ep.times()[350], 3.5, epsilon = 1e-6);
    }

    #[test]
    fn negative_tmin() {
        let raw = ramp_raw(1, 500, 100.0);
        let ev = create_events_array(&[200], &[1]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), -0.5, 0.5).unwrap();
        assert_eq!(ep.n_times(), 101);
        assert_eq!(ep.get_data()[[0, 0, 0]], 150.0);
        approx::assert_abs_diff_eq!(ep.tmin(), -0.5, epsilon = 1e-6);
    }

    #[test]
    fn out_of_range_windows_dropped() {
        let raw = ramp_raw(1, 400, 100.0);
        // 0–3.5 s: 100 + 350 and 60 + 350 run past sample 399.
        let ev = create_events_array(&[10, 100, 60], &[1, 1, 2]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 3.5).unwrap();
        assert_eq!(ep.len(), 1);
        assert_eq!(ep.selection(), &[0]);
        assert_eq!(ep.drop_log()[1], Some(DropReason::NoData));
        assert_eq!(ep.drop_log()[2], Some(DropReason::NoData));

        // -0.5–0 s: 10 - 50 starts before sample 0.
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), -0.5, 0.0).unwrap();
        assert_eq!(ep.selection(), &[1, 2]);
    }

    #[test]
    fn unknown_codes_ignored() {
        let raw = ramp_raw(1, 1000, 100.0);
        let ev = create_events_array(&[10, 20, 30], &[1, 7, 2]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 1.0).unwrap();
        assert_eq!(ep.events().labels().to_vec(), vec![1, 2]);
        assert_eq!(ep.drop_log()[1], Some(DropReason::Ignored));
    }

    #[test]
    fn no_events_gives_empty_epochs() {
        let raw = ramp_raw(3, 1000, 100.0);
        let ep = create_epoch(&raw, &EventTable::empty(), &EventId::motor_imagery(), 0.0, 3.5)
            .unwrap();
        assert!(ep.is_empty());
        assert_eq!(ep.get_data().shape(), &[0, 3, 351]);
    }

    #[test]
    fn reversed_window_rejected() {
        let raw = ramp_raw(1, 100, 100.0);
        let ev = EventTable::empty();
        assert!(matches!(
            create_epoch(&raw, &ev, &EventId::motor_imagery(), 1.0, 0.0),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn unrepresentable_window_rejected() {
        let raw = ramp_raw(1, 100, 100.0);
        let ev = create_events_array(&[10], &[1]).unwrap();
        for (tmin, tmax) in [(-1e30, 1e30), (0.0, f32::MAX), (-f32::MAX, 0.0)] {
            assert!(
                matches!(create_epoch(&raw, &ev, &EventId::motor_imagery(), tmin, tmax), Err(Error::Config(_))),
                "[{tmin}, {tmax}] accepted"
            );
        }
    }

    #[test]
    fn window_longer_than_recording_rejected() {
        let raw = ramp_raw(1, 300, 100.0);
        let ev = create_events_array(&[10], &[1]).unwrap();
        let err = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 3.5).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        // Exactly the recording length still fits.
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 2.99).unwrap();
        assert_eq!(ep.n_times(), 300);
        assert!(ep.is_empty());
    }

    #[test]
    fn extreme_onsets_are_dropped_not_overflowed() {
        let raw = ramp_raw(1, 1000, 100.0);
        let ev = create_events_array(&[i64::MAX, 10, i64::MIN], &[1, 2, 1]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), -0.5, 3.5).unwrap();
        assert!(ep.is_empty());
        assert_eq!(ep.drop_log(), &[Some(DropReason::NoData); 3]);

        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 1.0).unwrap();
        assert_eq!(ep.selection(), &[1]);
        assert_eq!(ep.drop_log()[0], Some(DropReason::NoData));
    }

    #[test]
    fn select_by_class() {
        let raw = ramp_raw(1, 1000, 100.0);
        let ev = create_events_array(&[10, 20, 30, 40], &[1, 2, 2, 1]).unwrap();
        let ep = create_epoch(&raw, &ev, &EventId::motor_imagery(), 0.0, 0.1).unwrap();
        let foot = ep.select("foot").unwrap();
        assert_eq!(foot.len(), 2);
        assert_eq!(foot.selection(), &[1, 2]);
        assert_eq!(foot.get_data()[[1, 0, 0]], 30.0);
        assert!(ep.select("left").is_err());
    }
}
