//! # nmf-sweep
//!
//! Batch rank sweep for non-negative matrix factorization (NMF).
//!
//! Load a non-negative matrix `X` from a plain-text file, factor it as
//! `X ≈ W·H` with `W, H ≥ 0` for every rank in a range (1 through 9 by
//! default), and write each pair of factors back out as plain text.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! raw_matrix.txt → X → for i in ranks: Nmf(i).fit(X) → W<i>.txt, H<i>.txt
//!                        ↑                 ↑
//!                   SweepConfig      random_init + Solver
//!
//! W<i>.txt, H<i>.txt → FactorizedModel → X̂[row, col]
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`config`] | [`SweepConfig`], [`RankPolicy`] | Input/output paths, rank range, solver settings; TOML loading |
//! | [`matrix_file`] | [`read_matrix`], [`write_matrix`] | Whitespace-separated text format, exact `f64` round trip |
//! | [`init`] | [`random_init`] | Seeded, scaled random starting factors |
//! | [`solver`] | [`Solver`], [`ConvergenceResult`] | Coordinate-descent and multiplicative-update rules |
//! | [`nmf`] | [`Nmf`], [`Factorization`] | Input validation and one rank-`k` fit |
//! | [`sweep`] | [`run_sweep`], [`SweepReport`] | The rank loop and `W<i>` / `H<i>` file naming |
//! | [`model`] | [`FactorizedModel`] | Reload a written pair and query cells lazily |
//! | [`error`] | [`NmfError`] | Error taxonomy for all of the above |
//!
//! ## Determinism
//!
//! The starting factors come from a `ChaCha8Rng` seeded by [`SweepConfig::seed`]
//! and both solvers are deterministic, so the same input and seed always produce
//! the same files.

#![deny(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod init;
pub mod matrix_file;
pub mod model;
pub mod nmf;
pub mod solver;
pub mod sweep;

pub use config::{RankPolicy, RankRange, SweepConfig};
pub use error::{NmfError, NmfResult};
pub use init::random_init;
pub use matrix_file::{read_matrix, write_matrix};
pub use model::FactorizedModel;
pub use nmf::{Factorization, Nmf};
pub use solver::{reconstruction_error, ConvergenceResult, Solver};
pub use sweep::{run_sweep, RankOutcome, SweepReport};
