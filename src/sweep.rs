//! The batch rank sweep.
//!
//! ```text
//! raw_matrix.txt ──read──▶ X ──┬─ rank 1 ─▶ Nmf::fit ─▶ W1.txt, H1.txt
//!                              ├─ rank 2 ─▶ Nmf::fit ─▶ W2.txt, H2.txt
//!                              ⋮
//!                              └─ rank 9 ─▶ Nmf::fit ─▶ W9.txt, H9.txt
//! ```
//!
//! Ranks run in ascending order, one at a time. `X` is read once and only
//! borrowed afterwards. Each rank's factors are written as soon as they are
//! computed and then dropped. The first error ends the sweep; files already
//! written for lower ranks stay on disk.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{RankPolicy, SweepConfig};
use crate::error::{NmfError, NmfResult};
use crate::matrix_file::{read_matrix, write_matrix};
use crate::nmf::{check_input, Factorization, Nmf};

/// `W<rank>.txt`
pub fn w_file_name(rank: usize) -> String {
    format!("W{rank}.txt")
}

/// `H<rank>.txt`
pub fn h_file_name(rank: usize) -> String {
    format!("H{rank}.txt")
}

/// Paths of the `W` and `H` files for `rank` inside `dir`.
pub fn factor_paths(dir: &Path, rank: usize) -> (PathBuf, PathBuf) {
    (dir.join(w_file_name(rank)), dir.join(h_file_name(rank)))
}

/// What one rank of the sweep produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOutcome {
    /// Rank requested, and the inner dimension of the written files.
    pub rank: usize,
    /// Rank actually fitted; smaller than `rank` only under [`RankPolicy::Pad`].
    pub effective_rank: usize,
    /// Where `W` was written.
    pub w_path: PathBuf,
    /// Where `H` was written.
    pub h_path: PathBuf,
    /// `‖X − W·H‖_F`.
    pub reconstruction_error: f64,
    /// Solver iterations used.
    pub iterations: u32,
    /// Whether the solver met its tolerance.
    pub converged: bool,
}

/// Summary of a completed sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Input file the matrix came from.
    pub input: PathBuf,
    /// Rows of `X`.
    pub rows: usize,
    /// Columns of `X`.
    pub cols: usize,
    /// One entry per rank, ascending.
    pub outcomes: Vec<RankOutcome>,
}

impl SweepReport {
    /// `(rank, reconstruction_error)` pairs in sweep order.
    pub fn errors(&self) -> Vec<(usize, f64)> {
        self.outcomes
            .iter()
            .map(|o| (o.rank, o.reconstruction_error))
            .collect()
    }

    /// Number of files written (two per rank).
    pub fn files_written(&self) -> usize {
        self.outcomes.len() * 2
    }
}

/// Read `config.input` and sweep it.
///
/// The input is read before anything is created on disk, so a missing or
/// malformed input leaves the output directory untouched.
pub fn run_sweep(config: &SweepConfig) -> NmfResult<SweepReport> {
    config.validate()?;
    let x = read_matrix(&config.input)?;
    info!(
        input = %config.input.display(),
        rows = x.nrows(),
        cols = x.ncols(),
        "loaded input matrix"
    );
    sweep_matrix(&x, &config.input, config)
}

/// Sweep an already-loaded matrix; `input` is only recorded in the report.
pub fn sweep_matrix(x: &Array2<f64>, input: &Path, config: &SweepConfig) -> NmfResult<SweepReport> {
    check_input(x)?;

    let out_dir = config.output_dir();
    fs::create_dir_all(&out_dir).map_err(|e| NmfError::io(&out_dir, e))?;

    let mut outcomes = Vec::with_capacity(config.ranks.len());
    for rank in config.ranks.iter() {
        let fit = factor_rank(x, rank, config)?;
        let effective_rank = fit.rank();
        let fit = fit.zero_pad(rank);

        let (w_path, h_path) = factor_paths(&out_dir, rank);
        write_matrix(&w_path, &fit.w)?;
        write_matrix(&h_path, &fit.h)?;

        info!(
            rank,
            error = fit.report.reconstruction_error,
            iterations = fit.report.iterations,
            converged = fit.report.converged,
            "wrote {} and {}",
            w_path.display(),
            h_path.display()
        );

        outcomes.push(RankOutcome {
            rank,
            effective_rank,
            w_path,
            h_path,
            reconstruction_error: fit.report.reconstruction_error,
            iterations: fit.report.iterations,
            converged: fit.report.converged,
        });
    }

    Ok(SweepReport {
        input: input.to_path_buf(),
        rows: x.nrows(),
        cols: x.ncols(),
        outcomes,
    })
}

/// Fit one rank under the configured solver settings and [`RankPolicy`].
pub fn factor_rank(x: &Array2<f64>, rank: usize, config: &SweepConfig) -> NmfResult<Factorization> {
    let max = x.nrows().min(x.ncols());
    let fitted_rank = match config.rank_policy {
        RankPolicy::Pad if rank > max => {
            warn!(rank, max, "rank exceeds min(rows, cols); fitting at {max} and zero-padding");
            max
        }
        _ => rank,
    };

    Nmf::new(fitted_rank)
        .with_rank_bound(config.rank_policy != RankPolicy::Unbounded)
        .with_solver(config.solver)
        .with_stopping(config.tolerance, config.max_iterations)
        .with_seed(config.seed)
        .fit(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(w_file_name(1), "W1.txt");
        assert_eq!(h_file_name(9), "H9.txt");
        let (w, h) = factor_paths(Path::new("/out"), 3);
        assert_eq!(w, PathBuf::from("/out/W3.txt"));
        assert_eq!(h, PathBuf::from("/out/H3.txt"));
    }

    #[test]
    fn test_report_helpers() {
        let outcome = |rank: usize, err: f64| RankOutcome {
            rank,
            effective_rank: rank,
            w_path: PathBuf::from(w_file_name(rank)),
            h_path: PathBuf::from(h_file_name(rank)),
            reconstruction_error: err,
            iterations: 10,
            converged: true,
        };
        let report = SweepReport {
            input: PathBuf::from("raw_matrix.txt"),
            rows: 4,
            cols: 3,
            outcomes: vec![outcome(1, 2.0), outcome(2, 0.5)],
        };
        assert_eq!(report.errors(), vec![(1, 2.0), (2, 0.5)]);
        assert_eq!(report.files_written(), 4);
    }

    #[test]
    fn test_pad_policy_fits_at_max_rank() {
        let x = ndarray::array![[1.0, 2.0], [3.0, 4.0]];
        let config = SweepConfig {
            rank_policy: RankPolicy::Pad,
            ..SweepConfig::default()
        };
        let fit = factor_rank(&x, 9, &config).unwrap();
        assert_eq!(fit.rank(), 2);
    }

    #[test]
    fn test_default_policy_fits_requested_rank() {
        let x = ndarray::array![[1.0, 2.0], [3.0, 4.0]];
        let fit = factor_rank(&x, 9, &SweepConfig::default()).unwrap();
        assert_eq!(fit.rank(), 9);
        assert_eq!((fit.w.dim(), fit.h.dim()), ((2, 9), (9, 2)));
    }

    #[test]
    fn test_reject_policy_errors() {
        let x = ndarray::array![[1.0, 2.0], [3.0, 4.0]];
        let config = SweepConfig {
            rank_policy: RankPolicy::Reject,
            ..SweepConfig::default()
        };
        let err = factor_rank(&x, 9, &config).unwrap_err();
        assert!(matches!(err, NmfError::RankExceedsShape { rank: 9, max: 2, .. }));
    }
}
