//! Sweep configuration.
//!
//! All settings have defaults, so an empty or missing config file reproduces
//! the classic layout: read `raw_matrix.txt`, sweep ranks 1 through 9, write
//! `W<i>.txt` / `H<i>.txt` next to the input.
//!
//! ```toml
//! input = "raw_matrix.txt"
//! output_dir = "factors"
//! seed = 0
//! solver = "coordinate_descent"   # or "multiplicative_update"
//! tolerance = 1e-4
//! max_iterations = 200
//! rank_policy = "unbounded"       # or "reject", "pad"
//!
//! [ranks]
//! start = 1
//! end = 9
//! ```
//!
//! Relative paths in a config file resolve against the file's own directory.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NmfError, NmfResult};
use crate::init::DEFAULT_SEED;
use crate::nmf::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use crate::solver::Solver;

/// Input file name looked up in the base directory.
pub const INPUT_FILE_NAME: &str = "raw_matrix.txt";

/// Optional config file name looked up in the base directory.
pub const CONFIG_FILE_NAME: &str = "nmf_sweep.toml";

/// What to do with a rank larger than `min(rows, cols)` of the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankPolicy {
    /// Fit at the requested rank; the factors simply carry more columns than
    /// the data has independent directions.
    #[default]
    Unbounded,
    /// Abort the sweep with [`NmfError::RankExceedsShape`].
    Reject,
    /// Factor at `min(rows, cols)` and zero-pad the factors to the requested rank.
    Pad,
}

/// Inclusive range of ranks to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankRange {
    /// First rank (≥ 1).
    pub start: usize,
    /// Last rank, inclusive.
    pub end: usize,
}

impl RankRange {
    /// Ranks `start..=end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Iterate the ranks in ascending order.
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// Number of ranks in the range.
    pub fn len(&self) -> usize {
        self.end.saturating_add(1).saturating_sub(self.start)
    }

    /// Returns `true` if the range holds no rank.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RankRange {
    fn default() -> Self {
        Self { start: 1, end: 9 }
    }
}

/// Everything the sweep needs, passed explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Input matrix file.
    pub input: PathBuf,
    /// Output directory; `None` means the input file's directory.
    pub output_dir: Option<PathBuf>,
    /// Ranks to sweep (default 1..=9).
    pub ranks: RankRange,
    /// Seed for the random start of every rank.
    pub seed: u64,
    /// Update rule.
    pub solver: Solver,
    /// Solver stopping tolerance.
    pub tolerance: f64,
    /// Solver iteration cap.
    pub max_iterations: u32,
    /// Handling of ranks above `min(rows, cols)`.
    pub rank_policy: RankPolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(INPUT_FILE_NAME),
            output_dir: None,
            ranks: RankRange::default(),
            seed: DEFAULT_SEED,
            solver: Solver::default(),
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            rank_policy: RankPolicy::default(),
        }
    }
}

impl SweepConfig {
    /// Defaults rooted at `dir`: `dir/raw_matrix.txt` in, outputs in `dir`.
    pub fn for_directory(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            input: dir.join(INPUT_FILE_NAME),
            output_dir: Some(dir.to_path_buf()),
            ..Self::default()
        }
    }

    /// Use `dir/nmf_sweep.toml` if present, otherwise [`SweepConfig::for_directory`].
    pub fn load(dir: impl AsRef<Path>) -> NmfResult<Self> {
        let dir = dir.as_ref();
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::for_directory(dir))
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> NmfResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NmfError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, base)
    }

    /// Parse TOML text, resolving relative paths against `base`.
    pub fn from_toml_str(content: &str, base: &Path) -> NmfResult<Self> {
        let mut config: SweepConfig = toml::from_str(content)
            .map_err(|e| NmfError::config(format!("Failed to parse config file: {}", e)))?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.input.is_relative() {
            self.input = base.join(&self.input);
        }
        if let Some(dir) = self.output_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }

    /// Directory the factor files go to.
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => dir.clone(),
            None => match self.input.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            },
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> NmfResult<()> {
        if self.ranks.start == 0 {
            return Err(NmfError::config("ranks.start must be at least 1"));
        }
        if self.ranks.is_empty() {
            return Err(NmfError::config(format!(
                "ranks.end ({}) must not be below ranks.start ({})",
                self.ranks.end, self.ranks.start
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(NmfError::config(format!(
                "tolerance must be a finite non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(NmfError::config("max_iterations must be greater than 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_layout() {
        let config = SweepConfig::default();
        assert_eq!(config.input, PathBuf::from("raw_matrix.txt"));
        assert_eq!(config.ranks.iter().collect::<Vec<_>>(), (1..=9).collect::<Vec<_>>());
        assert_eq!(config.seed, 0);
        assert_eq!(config.solver, Solver::CoordinateDescent);
        assert_eq!(config.rank_policy, RankPolicy::Unbounded);
        assert_eq!(config.output_dir(), PathBuf::from("."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_for_directory_roots_paths() {
        let config = SweepConfig::for_directory("/data/run");
        assert_eq!(config.input, PathBuf::from("/data/run/raw_matrix.txt"));
        assert_eq!(config.output_dir(), PathBuf::from("/data/run"));
    }

    #[test]
    fn test_output_dir_defaults_to_input_parent() {
        let config = SweepConfig {
            input: PathBuf::from("/data/in/matrix.txt"),
            ..SweepConfig::default()
        };
        assert_eq!(config.output_dir(), PathBuf::from("/data/in"));
    }

    #[test]
    fn test_full_toml_parses() {
        let toml_str = r#"
            input = "m.txt"
            output_dir = "out"
            seed = 17
            solver = "multiplicative_update"
            tolerance = 1e-6
            max_iterations = 500
            rank_policy = "pad"

            [ranks]
            start = 2
            end = 4
        "#;
        let config = SweepConfig::from_toml_str(toml_str, Path::new("/base")).unwrap();
        assert_eq!(config.input, PathBuf::from("/base/m.txt"));
        assert_eq!(config.output_dir(), PathBuf::from("/base/out"));
        assert_eq!(config.seed, 17);
        assert_eq!(config.solver, Solver::MultiplicativeUpdate);
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.rank_policy, RankPolicy::Pad);
        assert_eq!(config.ranks, RankRange::new(2, 4));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SweepConfig::from_toml_str("seed = 3\n", Path::new("/base")).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.input, PathBuf::from("/base/raw_matrix.txt"));
        assert_eq!(config.ranks, RankRange::default());
        assert_eq!(config.output_dir(), PathBuf::from("/base"));
    }

    #[test]
    fn test_partial_rank_table_keeps_other_bound() {
        let config =
            SweepConfig::from_toml_str("[ranks]\nstart = 2\n", Path::new("/base")).unwrap();
        assert_eq!(config.ranks, RankRange::new(2, 9));

        let config = SweepConfig::from_toml_str("[ranks]\nend = 4\n", Path::new("/base")).unwrap();
        assert_eq!(config.ranks, RankRange::new(1, 4));
    }

    #[test]
    fn test_rank_policy_names() {
        for (name, policy) in [
            ("unbounded", RankPolicy::Unbounded),
            ("reject", RankPolicy::Reject),
            ("pad", RankPolicy::Pad),
        ] {
            let text = format!("rank_policy = \"{name}\"\n");
            let config = SweepConfig::from_toml_str(&text, Path::new("/base")).unwrap();
            assert_eq!(config.rank_policy, policy);
        }
    }

    #[test]
    fn test_absolute_paths_untouched() {
        let config =
            SweepConfig::from_toml_str("input = \"/abs/x.txt\"\n", Path::new("/base")).unwrap();
        assert_eq!(config.input, PathBuf::from("/abs/x.txt"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let cases = [
            ("[ranks]\nstart = 0\nend = 3\n", "ranks.start"),
            ("[ranks]\nstart = 5\nend = 3\n", "ranks.end"),
            ("tolerance = -1.0\n", "tolerance"),
            ("max_iterations = 0\n", "max_iterations"),
            ("solver = \"gradient\"\n", "parse"),
        ];
        for (text, needle) in cases {
            let err = SweepConfig::from_toml_str(text, Path::new("/base")).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains(needle), "{text:?} gave {msg:?}");
        }
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = SweepConfig {
            seed: 5,
            rank_policy: RankPolicy::Pad,
            ..SweepConfig::for_directory("/data")
        };
        let text = toml::to_string(&config).unwrap();
        let restored: SweepConfig = toml::from_str(&text).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_load_without_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = SweepConfig::load(dir.path()).unwrap();
        assert_eq!(config, SweepConfig::for_directory(dir.path()));
    }

    #[test]
    fn test_load_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[ranks]\nstart = 1\nend = 2\n")
            .unwrap();
        let config = SweepConfig::load(dir.path()).unwrap();
        assert_eq!(config.ranks, RankRange::new(1, 2));
        assert_eq!(config.input, dir.path().join(INPUT_FILE_NAME));
    }

    #[test]
    fn test_rank_range_len() {
        assert_eq!(RankRange::new(1, 9).len(), 9);
        assert_eq!(RankRange::new(3, 3).len(), 1);
        assert!(RankRange::new(4, 3).is_empty());
    }
}
