/// pipeline_steps: load a subject MAT-file, run each preprocessing step and
/// write every intermediate array to a safetensors file for comparison
/// against the Python/MNE pipeline.
///
/// Output keys:
///   raw        [C, T]        f32  scaled `cnt`
///   filtered   [C, T]        f32  after the FIR band-pass
///   events     [N, 3]        i64  (onset, 0, class)
///   epochs     [E, C, S]     f32  event-locked windows, no baseline
///   labels     [E]           i64  class code per kept epoch
///   selection  [E]           i64  event index per kept epoch
///   kernel     [L]           f32  filter taps
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mieeg::{
    epoch::create_epoch,
    events::{create_events_array, EventId},
    extract::{extract_eeg, load_events},
    filter::{apply_fir_zero_phase, design_filter},
    io::StWriter,
    mat::load_mat,
    raw::{create_info, ChannelType, RawArray},
    UnitScale,
};

#[derive(Parser, Debug)]
#[command(name = "pipeline_steps")]
struct Args {
    /// Input MAT-file.
    #[arg(long, default_value = "data/raw/aa.mat")]
    mat: PathBuf,

    /// Output safetensors path.
    #[arg(long)]
    output: PathBuf,

    /// Unit conversion for `cnt`.
    #[arg(long, default_value_t = UnitScale::Microvolts)]
    scale: UnitScale,

    /// Band-pass low cutoff (Hz).
    #[arg(long, default_value_t = 8.0_f32)]
    l_freq: f32,

    /// Band-pass high cutoff (Hz).
    #[arg(long, default_value_t = 30.0_f32)]
    h_freq: f32,

    /// Epoch window end (s).
    #[arg(long, default_value_t = 3.5_f32)]
    tmax: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    // ── 1. Read MAT ────────────────────────────────────────────────────────
    let t_mat = now();
    let mat = load_mat(&args.mat)?;
    let rec = extract_eeg(&mat, args.scale)?;
    let sfreq = rec.sfreq;
    let info = create_info(rec.ch_names, sfreq, ChannelType::Eeg)?;
    let raw = RawArray::new(rec.data, info)?;
    let ms_mat = t_mat.elapsed().as_secs_f64() * 1000.0;
    let (n_ch, n_t) = raw.data().dim();

    // ── 2. Events ──────────────────────────────────────────────────────────
    let t_ev = now();
    let (pos, labels) = load_events(&mat)?;
    let events = create_events_array(&pos, &labels)?;
    let ms_ev = t_ev.elapsed().as_secs_f64() * 1000.0;

    // ── 3. Band-pass filter ────────────────────────────────────────────────
    let t_bp = now();
    let h = design_filter(Some(args.l_freq), Some(args.h_freq), sfreq)?;
    let mut data_bp = raw.data().clone();
    apply_fir_zero_phase(&mut data_bp, &h)?;
    let ms_bp = t_bp.elapsed().as_secs_f64() * 1000.0;
    let filtered = RawArray::new(data_bp, raw.info().clone())?;

    // ── 4. Epoch ───────────────────────────────────────────────────────────
    let t_ep = now();
    let epochs = create_epoch(&filtered, &events, &EventId::motor_imagery(), 0.0, args.tmax)?;
    let ms_ep = t_ep.elapsed().as_secs_f64() * 1000.0;

    // Format: "TIMING mat=Xms events=Xms bandpass=Xms epoch=Xms"
    eprintln!(
        "TIMING mat={ms_mat:.4}ms events={ms_ev:.4}ms bandpass={ms_bp:.4}ms epoch={ms_ep:.4}ms",
    );
    eprintln!(
        "  {n_ch} ch × {n_t}  sfreq={sfreq} Hz  {} events  {} epochs  {} taps",
        events.len(),
        epochs.len(),
        h.len()
    );

    // ── 5. Write output ────────────────────────────────────────────────────
    eprintln!("Writing → {}", args.output.display());
    let mut w = StWriter::new();

    w.add_f32_arr2("raw",      raw.data());
    w.add_f32_arr2("filtered", filtered.data());
    w.add_i64_arr2("events",   events.as_array());
    w.add_f32_arr3("epochs",   epochs.get_data());

    let kept = epochs.events().labels().to_vec();
    let selection: Vec<i64> = epochs.selection().iter().map(|&i| i as i64).collect();
    w.add_i64("labels",    &kept,      &[kept.len()]);
    w.add_i64("selection", &selection, &[selection.len()]);
    w.add_f32("kernel",    &h,         &[h.len()]);
    w.add_metadata("sfreq", sfreq.to_string());
    w.write(&args.output)?;

    eprintln!("Done.");
    Ok(())
}

/// Return `std::time::Instant::now()` (used for internal timing).
#[inline(always)]
fn now() -> std::time::Instant { std::time::Instant::now() }
