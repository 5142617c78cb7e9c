//! Error types for the explainable-inference pipeline.

use thiserror::Error;

/// Pipeline errors
///
/// Every variant is a deterministic structural failure: the same network and
/// input always fail the same way, so callers should surface these rather
/// than retry.
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("Input shape {got:?} does not match network input {expected:?}")]
    InvalidInputShape {
        expected: (usize, usize, usize),
        got: (usize, usize, usize),
    },

    #[error("Invalid network configuration: {0}")]
    InvalidConfig(String),

    #[error("No spatial Conv2D layer found in network. Layers: {layer_kinds:?}")]
    MissingConvLayer { layer_kinds: Vec<String> },

    #[error("Backward pass produced no gradient at the tap layer: {0}")]
    GradientComputation(String),

    #[error("Activation map is all-zero after ReLU; the model attended to nothing")]
    DegenerateHeatmap,

    #[error("Heatmap PNG encoding failed: {0}")]
    HeatmapEncoding(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ExplainError>;
