//! Plain-text matrix files.
//!
//! One matrix row per line, entries separated by whitespace. This is the format
//! of the sweep's input (`raw_matrix.txt`) and of every `W<i>.txt` / `H<i>.txt`
//! it writes.
//!
//! # Reading
//!
//! - Text after `#` on a line is a comment; blank lines are skipped.
//! - Every row must have as many entries as the first row.
//! - Entries are decimal or scientific-notation `f64` literals.
//!
//! # Writing
//!
//! ```text
//! 1.000000000000000000e+00 2.500000000000000000e-01
//! 3.333333333333333148e-01 0.000000000000000000e+00
//! ```
//!
//! Eighteen fractional digits is enough for every `f64` to survive a
//! write/read cycle bit-for-bit.

use std::fs;
use std::path::Path;

use ndarray::Array2;

use crate::error::{NmfError, NmfResult};

/// Fractional digits written for every entry.
pub const FRACTION_DIGITS: usize = 18;

const INLINE_ORIGIN: &str = "<inline>";

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// Parse matrix text into a dense `rows × cols` array.
///
/// Errors use `<inline>` as the file name; [`read_matrix`] reports the real path.
pub fn parse_matrix(text: &str) -> NmfResult<Array2<f64>> {
    parse_from(text, Path::new(INLINE_ORIGIN))
}

fn parse_from(text: &str, origin: &Path) -> NmfResult<Array2<f64>> {
    let mut data: Vec<f64> = Vec::new();
    let mut cols = 0usize;
    let mut rows = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let content = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        if content.trim().is_empty() {
            continue;
        }

        let start = data.len();
        for token in content.split_whitespace() {
            let value: f64 = token.parse().map_err(|e| NmfError::Parse {
                path: origin.to_path_buf(),
                line: line_no,
                message: format!("could not convert {token:?} to float: {e}"),
            })?;
            data.push(value);
        }
        let width = data.len() - start;

        if rows == 0 {
            cols = width;
        } else if width != cols {
            return Err(NmfError::RaggedRow {
                line: line_no,
                expected: cols,
                actual: width,
            });
        }
        rows += 1;
    }

    if rows == 0 || cols == 0 {
        return Err(NmfError::EmptyInput);
    }

    Array2::from_shape_vec((rows, cols), data)
        .map_err(|e| NmfError::shape_mismatch(e.to_string()))
}

/// Read a matrix file from disk.
pub fn read_matrix(path: impl AsRef<Path>) -> NmfResult<Array2<f64>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| NmfError::io(path, e))?;
    parse_from(&text, path)
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// Format one entry as `d.dddddddddddddddddde±XX`.
///
/// The exponent always carries a sign and at least two digits.
pub fn format_entry(value: f64) -> String {
    let s = format!("{:.*e}", FRACTION_DIGITS, value);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        // NaN / inf carry no exponent
        None => s,
    }
}

/// Format a whole matrix, one row per line with a trailing newline.
pub fn format_matrix(matrix: &Array2<f64>) -> String {
    let mut out = String::with_capacity(matrix.len() * (FRACTION_DIGITS + 8));
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(|&v| format_entry(v)).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Write a matrix file, replacing any existing file at `path`.
pub fn write_matrix(path: impl AsRef<Path>, matrix: &Array2<f64>) -> NmfResult<()> {
    let path = path.as_ref();
    fs::write(path, format_matrix(matrix)).map_err(|e| NmfError::io(path, e))
}
