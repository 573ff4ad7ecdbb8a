//! Reloading a persisted factorization.
//!
//! A [`FactorizedModel`] keeps `W (m × k)` and `H (k × n)` and answers cell
//! queries on the implied `m × n` matrix without materialising it:
//!
//! ```text
//! X̂[row, col] = Σ_r W[row, r] · H[r, col]
//! ```
//!
//! Rows can optionally be addressed by external ids (e.g. the zone or road id
//! each row of the original matrix described) through [`FactorizedModel::with_row_labels`].

use std::path::Path;

use hashbrown::HashMap;
use ndarray::Array2;

use crate::error::{NmfError, NmfResult};
use crate::matrix_file::read_matrix;
use crate::sweep::factor_paths;

/// A `W`/`H` pair with lazy cell evaluation.
#[derive(Clone, Debug)]
pub struct FactorizedModel {
    w: Array2<f64>,
    h: Array2<f64>,
    row_index: HashMap<u64, usize>,
}

impl FactorizedModel {
    /// Wrap in-memory factors. The columns of `w` must equal the rows of `h`.
    pub fn new(w: Array2<f64>, h: Array2<f64>) -> NmfResult<Self> {
        if w.ncols() != h.nrows() {
            return Err(NmfError::shape_mismatch(format!(
                "the number of columns of w ({}) should be equal to the number of rows of h ({})",
                w.ncols(),
                h.nrows()
            )));
        }
        Ok(Self {
            w,
            h,
            row_index: HashMap::new(),
        })
    }

    /// Read `w_path` and `h_path`.
    pub fn from_files(w_path: impl AsRef<Path>, h_path: impl AsRef<Path>) -> NmfResult<Self> {
        let w = read_matrix(w_path)?;
        let h = read_matrix(h_path)?;
        Self::new(w, h)
    }

    /// Read `dir/W<rank>.txt` and `dir/H<rank>.txt`, as written by the sweep.
    pub fn load(dir: impl AsRef<Path>, rank: usize) -> NmfResult<Self> {
        let (w_path, h_path) = factor_paths(dir.as_ref(), rank);
        Self::from_files(w_path, h_path)
    }

    /// Attach one unique label per row, in row order.
    pub fn with_row_labels(mut self, labels: &[u64]) -> NmfResult<Self> {
        if labels.len() != self.height() {
            return Err(NmfError::shape_mismatch(format!(
                "{} row labels given for {} rows",
                labels.len(),
                self.height()
            )));
        }
        let mut index = HashMap::with_capacity(labels.len());
        for (row, &label) in labels.iter().enumerate() {
            if index.insert(label, row).is_some() {
                return Err(NmfError::shape_mismatch(format!(
                    "duplicate row label {label}"
                )));
            }
        }
        self.row_index = index;
        Ok(self)
    }

    /// Row for `label`, if labels are attached and the label is known.
    pub fn find_row(&self, label: u64) -> Option<usize> {
        self.row_index.get(&label).copied()
    }

    /// Number of rows of the implied matrix.
    pub fn height(&self) -> usize {
        self.w.nrows()
    }

    /// Number of columns of the implied matrix.
    pub fn width(&self) -> usize {
        self.h.ncols()
    }

    /// Inner dimension `k`.
    pub fn rank(&self) -> usize {
        self.w.ncols()
    }

    /// Basis matrix `W`.
    pub fn w(&self) -> &Array2<f64> {
        &self.w
    }

    /// Coefficient matrix `H`.
    pub fn h(&self) -> &Array2<f64> {
        &self.h
    }

    /// Cell `(row, col)` of `W·H`, or `None` outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height() || col >= self.width() {
            return None;
        }
        Some(self.w.row(row).dot(&self.h.column(col)))
    }

    /// Cell addressed by row label.
    pub fn get_labeled(&self, label: u64, col: usize) -> Option<f64> {
        self.find_row(label).and_then(|row| self.get(row, col))
    }

    /// The full product `W·H`.
    pub fn reconstruct(&self) -> Array2<f64> {
        self.w.dot(&self.h)
    }
}
