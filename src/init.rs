//! Seeded random initialization of the factor matrices.
//!
//! Both factors start as absolute values of standard-normal draws scaled by
//!
//! ```text
//! avg = sqrt(mean(X) / k)
//! ```
//!
//! so that `W·H` starts on the same scale as `X`. `H (k × n)` is drawn first,
//! then `W (m × k)`, from a single `ChaCha8Rng` seeded with `seed`. The stream is
//! platform-independent, so a given `(X, k, seed)` always yields the same start.

use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 0;

/// Starting point for a rank-`k` factorization of `x`.
///
/// Returns `(W, H)` with shapes `(m, k)` and `(k, n)`. All entries are ≥ 0.
/// An all-zero `x` yields all-zero factors.
pub fn random_init(x: &Array2<f64>, rank: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let (m, n) = x.dim();
    let mean = x.mean().unwrap_or(0.0).max(0.0);
    let avg = (mean / rank.max(1) as f64).sqrt();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut draw = |rows: usize, cols: usize| {
        Array2::from_shape_simple_fn((rows, cols), || {
            let z: f64 = StandardNormal.sample(&mut rng);
            (avg * z).abs()
        })
    };

    let h = draw(rank, n);
    let w = draw(m, rank);
    (w, h)
}
