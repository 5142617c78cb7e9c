//! Forward inference: network + prepared input → raw positive-class score

use crate::error::Result;
use crate::network::{ImageTensor, LayeredNetwork};

/// Raw classifier output: P(positive class) in `[0, 1]`.
pub type RawScore = f32;

/// Executes the plain forward pass.
///
/// Pure and deterministic: the same network and input always produce the
/// same score, and no state is retained between calls.
pub struct InferenceRunner;

impl InferenceRunner {
    /// Run the classifier, returning the raw score.
    ///
    /// Fails with `InvalidInputShape` if `input` does not match the
    /// network's declared input shape.
    pub fn run(network: &LayeredNetwork, input: &ImageTensor) -> Result<RawScore> {
        let output = network.forward(input)?;
        Ok(output[0])
    }
}
