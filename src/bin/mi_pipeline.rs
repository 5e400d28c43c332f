use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use mieeg::{extract_csp_features, run_pipeline, write_features, PipelineConfig, UnitScale};

#[derive(Parser)]
#[command(name = "mi_pipeline", about = "Motor-imagery EEG preprocessing (BCI Competition III IVa)")]
struct Args {
    /// Subject MAT-file.
    #[arg(long, default_value = "data/raw/aa.mat")]
    mat: PathBuf,

    /// Write X / y features to this safetensors file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Unit conversion for `cnt`: "uv", "v" or a numeric factor.
    #[arg(long, default_value_t = UnitScale::Microvolts)]
    scale: UnitScale,

    /// Band-pass low cutoff (Hz).
    #[arg(long, default_value_t = 8.0)]
    l_freq: f32,

    /// Band-pass high cutoff (Hz).
    #[arg(long, default_value_t = 30.0)]
    h_freq: f32,

    /// Skip the band-pass stage.
    #[arg(long)]
    no_filter: bool,

    /// Epoch start relative to the cue (s).
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    tmin: f32,

    /// Epoch end relative to the cue (s).
    #[arg(long, default_value_t = 3.5, allow_hyphen_values = true)]
    tmax: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let (l_freq, h_freq) = if args.no_filter {
        (None, None)
    } else {
        (Some(args.l_freq), Some(args.h_freq))
    };
    let cfg = PipelineConfig {
        unit_scale: args.scale,
        l_freq,
        h_freq,
        tmin: args.tmin,
        tmax: args.tmax,
        ..PipelineConfig::default()
    };

    let out = run_pipeline(&args.mat, &cfg)
        .with_context(|| format!("pipeline failed on {}", args.mat.display()))?;

    println!(
        "Loaded {} ch × {} samples @ {} Hz ({:.1} s)",
        out.raw.n_channels(),
        out.raw.n_times(),
        out.raw.sfreq(),
        out.raw.duration()
    );
    for (name, code) in cfg.event_id.iter() {
        println!("  {name:<6} {:>4} events", out.events.count(code));
    }

    let (x, y) = extract_csp_features(&out.epochs);
    let dropped = out.epochs.drop_log().iter().filter(|d| d.is_some()).count();
    println!("Produced {} epochs (dropped {dropped}), X {:?}", out.epochs.len(), x.dim());

    if let Some(path) = &args.output {
        write_features(&x, &y, out.epochs.ch_names(), out.epochs.sfreq(), path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Written → {}", path.display());
    }

    Ok(())
}
