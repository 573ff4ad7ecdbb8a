//! The NMF estimator: validate the input, seed the factors, run a solver.
//!
//! ```rust,ignore
//! use nmf_sweep::nmf::Nmf;
//!
//! let fit = Nmf::new(2).fit(&x)?;
//! assert_eq!(fit.w.dim(), (x.nrows(), 2));
//! assert_eq!(fit.h.dim(), (2, x.ncols()));
//! ```

use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{NmfError, NmfResult};
use crate::init::{random_init, DEFAULT_SEED};
use crate::solver::{ConvergenceResult, Solver};

/// Default stopping tolerance.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// A fitted pair of non-negative factors with `W·H ≈ X`.
#[derive(Clone, Debug)]
pub struct Factorization {
    /// `m × k` basis matrix.
    pub w: Array2<f64>,
    /// `k × n` coefficient matrix.
    pub h: Array2<f64>,
    /// How the solver finished.
    pub report: ConvergenceResult,
}

impl Factorization {
    /// The inner dimension `k`.
    pub fn rank(&self) -> usize {
        self.w.ncols()
    }

    /// Grow the factors to `rank` by appending zero columns to `W` and zero rows
    /// to `H`. The product `W·H` is unchanged. No-op when `rank <= self.rank()`.
    pub fn zero_pad(mut self, rank: usize) -> Self {
        let k = self.rank();
        if rank <= k {
            return self;
        }
        let (m, n) = (self.w.nrows(), self.h.ncols());

        let mut w = Array2::zeros((m, rank));
        w.slice_mut(ndarray::s![.., ..k]).assign(&self.w);
        let mut h = Array2::zeros((rank, n));
        h.slice_mut(ndarray::s![..k, ..]).assign(&self.h);

        self.w = w;
        self.h = h;
        self
    }
}

/// Non-negative matrix factorization with Frobenius loss and seeded random start.
#[derive(Clone, Debug, PartialEq)]
pub struct Nmf {
    /// Inner dimension of the factors.
    pub rank: usize,
    /// Update rule (default: coordinate descent).
    pub solver: Solver,
    /// Stopping tolerance (default: 1e-4).
    pub tolerance: f64,
    /// Iteration cap (default: 200).
    pub max_iterations: u32,
    /// Seed for the random start (default: 0).
    pub seed: u64,
    /// Reject ranks above `min(m, n)` (default: true).
    pub bound_rank: bool,
}

impl Nmf {
    /// Estimator for `rank` with default solver settings.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            solver: Solver::default(),
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
            bound_rank: true,
        }
    }

    /// Replace the solver.
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Replace tolerance and iteration cap.
    pub fn with_stopping(mut self, tolerance: f64, max_iterations: u32) -> Self {
        self.tolerance = tolerance;
        self.max_iterations = max_iterations;
        self
    }

    /// Replace the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Allow or forbid ranks above `min(m, n)`.
    ///
    /// With the bound lifted the random start simply has more columns than the
    /// data has independent directions; the fit still succeeds.
    pub fn with_rank_bound(mut self, bound_rank: bool) -> Self {
        self.bound_rank = bound_rank;
        self
    }

    /// Factor `x` into `W (m × rank)` and `H (rank × n)`.
    ///
    /// # Errors
    /// - [`NmfError::EmptyInput`] if `x` has no rows or columns.
    /// - [`NmfError::NonFinite`] / [`NmfError::NegativeInput`] on the first bad entry.
    /// - [`NmfError::InvalidRank`] for rank 0.
    /// - [`NmfError::RankExceedsShape`] if `rank > min(m, n)` and the bound is on.
    pub fn fit(&self, x: &Array2<f64>) -> NmfResult<Factorization> {
        check_input(x)?;
        if self.bound_rank {
            check_rank(self.rank, x.dim())?;
        } else if self.rank == 0 {
            return Err(NmfError::InvalidRank { rank: 0 });
        }

        let (mut w, mut h) = random_init(x, self.rank, self.seed);
        let report = self
            .solver
            .run(x, &mut w, &mut h, self.tolerance, self.max_iterations);

        if !report.converged {
            warn!(
                rank = self.rank,
                max_iterations = self.max_iterations,
                "maximum number of iterations reached; increase it to improve convergence"
            );
        }
        debug!(
            rank = self.rank,
            iterations = report.iterations,
            error = report.reconstruction_error,
            "factorization finished"
        );

        Ok(Factorization { w, h, report })
    }
}

/// Reject empty, non-finite, or negative input.
pub fn check_input(x: &Array2<f64>) -> NmfResult<()> {
    if x.is_empty() {
        return Err(NmfError::EmptyInput);
    }
    for ((row, col), &v) in x.indexed_iter() {
        if !v.is_finite() {
            return Err(NmfError::NonFinite { row, col });
        }
    }
    for ((row, col), &value) in x.indexed_iter() {
        if value < 0.0 {
            return Err(NmfError::NegativeInput { row, col, value });
        }
    }
    Ok(())
}

/// Reject rank 0 and ranks above `min(rows, cols)`.
pub fn check_rank(rank: usize, (rows, cols): (usize, usize)) -> NmfResult<()> {
    if rank == 0 {
        return Err(NmfError::InvalidRank { rank });
    }
    let max = rows.min(cols);
    if rank > max {
        return Err(NmfError::RankExceedsShape { rank, max, rows, cols });
    }
    Ok(())
}
