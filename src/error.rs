//! Error types for loading, factoring, and persisting matrices.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type NmfResult<T> = Result<T, NmfError>;

/// Errors raised by the rank sweep and its building blocks.
#[derive(Debug, Error)]
pub enum NmfError {
    /// Reading or writing a file failed (including a missing input file).
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File the operation was acting on
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A token in a matrix file is not a floating-point literal.
    #[error("Parse error in {} at line {line}: {message}", path.display())]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the offending token
        message: String,
    },

    /// A row has a different number of columns from the first row.
    #[error("Ragged row at line {line}: expected {expected} columns, found {actual}")]
    RaggedRow {
        /// 1-based line number
        line: usize,
        /// Column count of the first row
        expected: usize,
        /// Column count of this row
        actual: usize,
    },

    /// The matrix has no rows or no columns.
    #[error("Empty input matrix")]
    EmptyInput,

    /// An entry is negative.
    #[error("Negative value {value} at ({row}, {col}) in data passed to NMF")]
    NegativeInput {
        /// Row index of the first negative entry
        row: usize,
        /// Column index of the first negative entry
        col: usize,
        /// The offending value
        value: f64,
    },

    /// An entry is NaN or infinite.
    #[error("Non-finite value at ({row}, {col}) in data passed to NMF")]
    NonFinite {
        /// Row index of the first non-finite entry
        row: usize,
        /// Column index of the first non-finite entry
        col: usize,
    },

    /// Rank zero was requested.
    #[error("Invalid rank {rank}: rank must be a positive integer")]
    InvalidRank {
        /// Requested rank
        rank: usize,
    },

    /// Rank is larger than `min(rows, cols)` of the input.
    #[error("Rank {rank} exceeds min(rows, cols) = {max} for a {rows}x{cols} matrix")]
    RankExceedsShape {
        /// Requested rank
        rank: usize,
        /// Largest admissible rank
        max: usize,
        /// Rows of the input
        rows: usize,
        /// Columns of the input
        cols: usize,
    },

    /// Inner dimensions of `W` and `H` disagree, or labels do not fit the rows.
    #[error("Shape mismatch: {message}")]
    ShapeMismatch {
        /// Description of the mismatch
        message: String,
    },

    /// Configuration could not be read or failed validation.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what is wrong
        message: String,
    },
}

impl NmfError {
    /// Wrap an I/O error together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            message: message.into(),
        }
    }

    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` if this error means the file did not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_problem() {
        let errors: Vec<NmfError> = vec![
            NmfError::EmptyInput,
            NmfError::NegativeInput { row: 1, col: 2, value: -0.5 },
            NmfError::InvalidRank { rank: 0 },
            NmfError::RankExceedsShape { rank: 9, max: 2, rows: 2, cols: 2 },
            NmfError::shape_mismatch("w has 3 columns, h has 2 rows"),
            NmfError::config("ranks must start at 1 or above"),
        ];
        let expected = [
            "Empty input",
            "Negative value -0.5 at (1, 2)",
            "Invalid rank 0",
            "Rank 9 exceeds min(rows, cols) = 2",
            "w has 3 columns",
            "ranks must start",
        ];
        for (err, needle) in errors.iter().zip(expected) {
            let msg = err.to_string();
            assert!(msg.contains(needle), "{msg:?} should contain {needle:?}");
        }
    }

    #[test]
    fn test_io_error_reports_path_and_not_found() {
        let err = NmfError::io(
            "/nowhere/raw_matrix.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.is_not_found());
        assert!(err.to_string().contains("/nowhere/raw_matrix.txt"));

        let denied = NmfError::io(
            "W1.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!denied.is_not_found());
    }
}
