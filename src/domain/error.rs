//! Configuration errors detected before training starts.

use thiserror::Error;

/// A run that cannot start. Every variant is fatal and is raised before
/// the first mini-batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A size, count or interval that must be at least 1.
    #[error("'{field}' must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("unsupported channel count {channels} (expected 1 or 3)")]
    UnsupportedChannels { channels: usize },

    /// An image whose flattened width differs from the model's input width.
    #[error("image '{source_name}' has {actual} values but the model expects D = {expected}")]
    WidthMismatch { expected: usize, actual: usize, source_name: String },

    #[error("the {split} split is empty")]
    EmptySplit { split: &'static str },

    #[error("'{field}' must lie strictly between 0 and 1, got {value}")]
    InvalidFraction { field: &'static str, value: f64 },

    #[error("beta must be finite and non-negative, got {value}")]
    InvalidBeta { value: f64 },
}
