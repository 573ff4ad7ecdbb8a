//! `nmf-sweep` — factor `./raw_matrix.txt` at ranks 1..=9 and write `W<i>.txt` / `H<i>.txt`.
//!
//! Settings come from `./nmf_sweep.toml` when present. Log verbosity follows
//! `RUST_LOG` (default `info`).

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nmf_sweep::{run_sweep, SweepConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let base = std::env::current_dir().context("cannot determine working directory")?;
    let config = SweepConfig::load(&base)?;

    let report = run_sweep(&config)
        .with_context(|| format!("rank sweep over {} failed", config.input.display()))?;

    tracing::info!(
        rows = report.rows,
        cols = report.cols,
        files = report.files_written(),
        "sweep complete"
    );
    Ok(())
}
