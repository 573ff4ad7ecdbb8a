//! Update rules for Frobenius-norm NMF.
//!
//! Given non-negative `X (m × n)` and starting factors `W (m × k)`, `H (k × n)`,
//! the solvers iterate until the stopping rule fires or `max_iterations` is hit,
//! minimising
//!
//! ```text
//! ½ ‖X − W·H‖²_F    subject to W ≥ 0, H ≥ 0
//! ```
//!
//! # Coordinate descent
//!
//! Alternates a pass over `W` (with `HHᵀ`, `XHᵀ`) and a pass over `Hᵀ` (with
//! `WᵀW`, `XᵀW`). Each coordinate takes a projected Newton step
//! `w ← max(w − g / HHᵀ[t,t], 0)`. The pass accumulates the *violation*
//! `Σ |projected gradient|`; iteration stops once
//! `violation / violation_of_first_pass ≤ tolerance`.
//!
//! # Multiplicative update
//!
//! ```text
//! W ← W ∘ (X·Hᵀ) / (W·H·Hᵀ + ε)
//! H ← H ∘ (Wᵀ·X) / (Wᵀ·W·H + ε)
//! ```
//!
//! Every 10 iterations the reconstruction error is measured; iteration stops
//! once `(previous − current) / initial < tolerance`.
//!
//! # Invariants
//! - Every entry of `W` and `H` stays ≥ 0 after every update.
//! - No randomness: given the same start, the result is bit-for-bit repeatable.

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How often (in iterations) the multiplicative solver measures its error.
const MU_CHECK_INTERVAL: u32 = 10;

/// Factorization algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Solver {
    /// Cyclic coordinate descent with projected Newton steps.
    #[default]
    CoordinateDescent,
    /// Lee–Seung multiplicative updates.
    MultiplicativeUpdate,
}

/// Outcome of running a solver to completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    /// Whether the stopping rule fired within `max_iterations`.
    pub converged: bool,
    /// Number of full `W`+`H` iterations performed.
    pub iterations: u32,
    /// `‖X − W·H‖_F` of the returned factors.
    pub reconstruction_error: f64,
}

/// Frobenius norm of the residual `X − W·H`.
pub fn reconstruction_error(x: &Array2<f64>, w: &Array2<f64>, h: &Array2<f64>) -> f64 {
    let approx = w.dot(h);
    let diff = x - &approx;
    diff.mapv(|v| v * v).sum().sqrt()
}

impl Solver {
    /// Refine `w` and `h` in place. Returns the convergence summary.
    pub fn run(
        self,
        x: &Array2<f64>,
        w: &mut Array2<f64>,
        h: &mut Array2<f64>,
        tolerance: f64,
        max_iterations: u32,
    ) -> ConvergenceResult {
        let (converged, iterations) = match self {
            Self::CoordinateDescent => coordinate_descent(x, w, h, tolerance, max_iterations),
            Self::MultiplicativeUpdate => {
                multiplicative_update(x, w, h, tolerance, max_iterations)
            }
        };
        ConvergenceResult {
            converged,
            iterations,
            reconstruction_error: reconstruction_error(x, w, h),
        }
    }
}

// ─── Coordinate descent ──────────────────────────────────────────────────────

fn coordinate_descent(
    x: &Array2<f64>,
    w: &mut Array2<f64>,
    h: &mut Array2<f64>,
    tolerance: f64,
    max_iterations: u32,
) -> (bool, u32) {
    // Hᵀ is updated with the same routine as W.
    let mut ht = h.t().to_owned();
    let mut violation_init = 0.0_f64;
    let mut converged = false;
    let mut iterations = 0u32;

    for iter in 1..=max_iterations {
        iterations = iter;

        let hht = ht.t().dot(&ht);
        let xht = x.dot(&ht);
        let mut violation = update_coordinates(w, &hht, &xht);

        let wtw = w.t().dot(&*w);
        let xtw = x.t().dot(&*w);
        violation += update_coordinates(&mut ht, &wtw, &xtw);

        if iter == 1 {
            violation_init = violation;
        }
        if violation_init == 0.0 {
            converged = true;
            break;
        }
        let ratio = violation / violation_init;
        debug!(iter, violation, ratio, "coordinate descent pass");
        if ratio <= tolerance {
            converged = true;
            break;
        }
    }

    *h = ht.t().as_standard_layout().into_owned();
    (converged, iterations)
}

/// One cyclic pass over every coordinate of `w`, column by column.
///
/// `gram` is the `k × k` Gram matrix of the fixed factor and `cross` the
/// `rows × k` product of the data with it. Returns the summed violation.
fn update_coordinates(w: &mut Array2<f64>, gram: &Array2<f64>, cross: &Array2<f64>) -> f64 {
    let (rows, k) = w.dim();
    let mut violation = 0.0;

    for t in 0..k {
        let hess = gram[[t, t]];
        for i in 0..rows {
            let mut grad = -cross[[i, t]];
            for r in 0..k {
                grad += gram[[t, r]] * w[[i, r]];
            }

            // projected gradient
            let pg = if w[[i, t]] == 0.0 { grad.min(0.0) } else { grad };
            violation += pg.abs();

            if hess != 0.0 {
                w[[i, t]] = (w[[i, t]] - grad / hess).max(0.0);
            }
        }
    }
    violation
}

// ─── Multiplicative update ───────────────────────────────────────────────────

fn multiplicative_update(
    x: &Array2<f64>,
    w: &mut Array2<f64>,
    h: &mut Array2<f64>,
    tolerance: f64,
    max_iterations: u32,
) -> (bool, u32) {
    let error_at_init = reconstruction_error(x, w, h);
    let mut previous_error = error_at_init;
    let mut iterations = 0u32;

    for iter in 1..=max_iterations {
        iterations = iter;

        let numer = x.dot(&h.t());
        let denom = w.dot(&h.dot(&h.t()));
        scale_in_place(w, &numer, &denom);

        let numer = w.t().dot(x);
        let denom = w.t().dot(&*w).dot(&*h);
        scale_in_place(h, &numer, &denom);

        if tolerance > 0.0 && iter % MU_CHECK_INTERVAL == 0 {
            let error = reconstruction_error(x, w, h);
            debug!(iter, error, "multiplicative update check");
            if error_at_init == 0.0 || (previous_error - error) / error_at_init < tolerance {
                return (true, iter);
            }
            previous_error = error;
        }
    }
    (false, iterations)
}

/// Elementwise `base *= numer / (denom + ε)`, replacing non-finite results by 0.
fn scale_in_place(base: &mut Array2<f64>, numer: &Array2<f64>, denom: &Array2<f64>) {
    Zip::from(base)
        .and(numer)
        .and(denom)
        .for_each(|b, &n, &d| {
            let v = *b * (n / (d + f64::EPSILON));
            *b = if v.is_finite() { v } else { 0.0 };
        });
}
