use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use exg_window::{make_windows, WindowConfig};

#[derive(Parser)]
#[command(name = "make_windows", about = "Build a labelled sliding-window dataset from EDF recordings")]
struct Args {
    /// Directory scanned recursively for *.edf (+ *.seizures) files
    #[arg(long)]
    edf_dir: PathBuf,

    /// Root directory for window files
    #[arg(long, default_value = "data/processed")]
    out_dir: PathBuf,

    /// Manifest CSV output path
    #[arg(long, default_value = "metadata.csv")]
    meta_csv: PathBuf,

    /// JSON file with WindowConfig fields (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (default: min(4, cores))
    #[arg(long)]
    workers: Option<usize>,

    /// Recordings taken per class (default: 20)
    #[arg(long)]
    max_per_class: Option<usize>,

    /// Abandon a recording after this many seconds
    #[arg(long)]
    timeout_secs: Option<f64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => WindowConfig::from_json_file(path)?,
        None => WindowConfig::default(),
    };
    if let Some(w) = args.workers {
        cfg.workers = w;
    }
    if let Some(n) = args.max_per_class {
        cfg.max_per_class = n;
    }
    if args.timeout_secs.is_some() {
        cfg.recording_timeout_secs = args.timeout_secs;
    }

    let summary = make_windows(&args.edf_dir, &args.out_dir, &args.meta_csv, &cfg)?;
    let report = &summary.report;

    println!("Discovered {} recordings ({} positive + {} negative selected)",
        summary.discovered, summary.positive, summary.negative);
    println!("Processed  {} recordings → {} windows ({} positive)",
        report.processed, report.windows(), report.positives());
    if !report.failures.is_empty() {
        println!("Skipped    {} recordings:", report.failed());
        for f in &report.failures {
            println!("  {:<24} {:<8} {}", f.recording.id, f.kind.to_string(), f.message);
        }
    }
    println!("Manifest   → {}", args.meta_csv.display());

    Ok(())
}
