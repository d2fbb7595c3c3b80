//! Error types for configuration and pattern decoding.

use thiserror::Error;

/// Invalid engine configuration. Reported before any simulation starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("cell pixel size must be positive, got {0}")]
    CellSize(f32),

    #[error("{name} must be positive")]
    Interval { name: &'static str },

    /// A fraction or probability outside `[0, 1]`.
    #[error("{name} must lie in [0, 1], got {value}")]
    Fraction { name: &'static str, value: f64 },

    #[error("max_spectrum_repeats must be at least 1")]
    SpectrumRepeats,

    #[error("max_generations must be at least 1 when set")]
    MaxGenerations,

    #[error("surface {width}x{height} yields an empty grid")]
    EmptyGrid { width: f32, height: f32 },

    #[error("malformed options: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A pattern string that cannot be turned back into a grid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("row {row} is empty")]
    EmptyToken { row: usize },

    #[error("row {row} contains invalid base-36 digit {digit:?}")]
    InvalidDigit { row: usize, digit: char },

    #[error("row {row} needs {bits} columns but the grid has {columns}")]
    RowTooWide { row: usize, bits: usize, columns: usize },

    #[error("pattern has {found} rows, expected {expected}")]
    RowCount { found: usize, expected: usize },
}
