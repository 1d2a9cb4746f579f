//! Error types for R-tree construction.

use thiserror::Error;

/// Errors raised when an [`RTreeBuilder`](crate::RTreeBuilder) is given an
/// invalid configuration.
///
/// Dimensional mismatches between entries and an existing tree are caller
/// bugs and panic instead of returning an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("dimensions must be 2 or more, got {0}")]
    Dimensions(usize),

    #[error("minChildren must be 2 or more, got {0}")]
    MinChildren(usize),

    #[error("maxChildren must be greater than minChildren, got max {max} with min {min}")]
    MaxChildren { min: usize, max: usize },

    #[error("loading factor must be greater than 0 and at most 1, got {0}")]
    LoadingFactor(f64),
}

/// Result type for tree construction.
pub type ConfigResult<T> = Result<T, ConfigError>;
