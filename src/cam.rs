//! Grad-CAM: gradient-weighted class-activation mapping
//!
//! Taps the last spatial Conv2D layer, differentiates the positive-class
//! score with respect to the tap output, pools the gradient into per-channel
//! weights, and folds the channels into a normalized 2D saliency map.

use ndarray::Array2;

use crate::autograd;
use crate::error::{ExplainError, Result};
use crate::network::{FeatureShape, ImageTensor, LayeredNetwork};

/// Normalized 2D saliency map in `[0, 1]`, at the tap layer's resolution.
#[derive(Debug, Clone)]
pub struct ActivationMap {
    data: Array2<f32>,
}

impl ActivationMap {
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// `(height, width)` of the map.
    pub fn dims(&self) -> (usize, usize) {
        self.data.dim()
    }
}

/// Computes the class-activation map for one inference.
pub struct GradCamEngine;

impl GradCamEngine {
    /// Compute the normalized activation map for `input`.
    ///
    /// The classifier head is a single sigmoid unit, so the predicted-class
    /// channel is the positive score itself regardless of the decided label
    /// (argmax over one output always selects it).
    pub fn compute(network: &LayeredNetwork, input: &ImageTensor) -> Result<ActivationMap> {
        let tap_index = network.last_spatial_conv().ok_or_else(|| {
            ExplainError::MissingConvLayer { layer_kinds: network.layer_kinds() }
        })?;
        let (height, width, channels) = match network.shape_at(tap_index) {
            FeatureShape::Spatial { height, width, channels } => (height, width, channels),
            FeatureShape::Flat(_) => unreachable!("tap layer is spatial by selection"),
        };

        let (tap, mut final_out) = network.tap(tap_index, input)?;
        autograd::backward(&mut final_out, None);

        let grad = tap.grad().ok_or_else(|| {
            ExplainError::GradientComputation(
                "backward pass did not reach the tap layer".to_string(),
            )
        })?;
        let activations = tap.data();

        // Global-average-pool the gradient: one importance weight per channel.
        let spatial = height * width;
        let mut weights = vec![0.0f32; channels];
        for (channel, weight) in weights.iter_mut().enumerate() {
            let mut sum = 0.0;
            for cell in 0..spatial {
                sum += grad[cell * channels + channel];
            }
            *weight = sum / spatial as f32;
        }

        // Channel-weighted sum, clipped at zero.
        let mut map = Array2::zeros((height, width));
        let mut max = 0.0f32;
        for y in 0..height {
            for x in 0..width {
                let cell = y * width + x;
                let mut value = 0.0;
                for (channel, weight) in weights.iter().enumerate() {
                    value += weight * activations[cell * channels + channel];
                }
                let value = value.max(0.0);
                map[[y, x]] = value;
                max = max.max(value);
            }
        }

        if max == 0.0 {
            return Err(ExplainError::DegenerateHeatmap);
        }
        map.mapv_inplace(|v| v / max);

        Ok(ActivationMap { data: map })
    }
}
