//! Forward execution over the layer sequence
//!
//! Two entry points: a plain forward pass for classification, and a tapped
//! pass that re-runs the same layers in two segments so the tap layer's
//! output becomes a gradient leaf for Grad-CAM.

use ndarray::Array1;

use crate::autograd::{self, Tensor};
use crate::error::Result;

use super::{FeatureShape, ImageTensor, Layer, LayeredNetwork};

impl LayeredNetwork {
    /// Shape consumed by the layer at `index`.
    fn input_shape_of(&self, index: usize) -> FeatureShape {
        if index == 0 {
            let (height, width, channels) = self.input_shape();
            FeatureShape::Spatial { height, width, channels }
        } else {
            self.shape_at(index - 1)
        }
    }

    fn apply_layer(&self, index: usize, input: &Tensor) -> Tensor {
        let shape = self.input_shape_of(index);
        match &self.layers()[index] {
            Layer::Conv2D(conv) => {
                let (height, width, _) = spatial_extent(shape);
                let geom = autograd::ConvGeometry {
                    height,
                    width,
                    in_channels: conv.in_channels,
                    kernel_h: conv.kernel_h,
                    kernel_w: conv.kernel_w,
                    out_channels: conv.out_channels,
                };
                autograd::conv2d(input, &conv.weights, &conv.bias, geom)
            }
            Layer::MaxPool2D { window } => {
                let (height, width, channels) = spatial_extent(shape);
                let geom = autograd::PoolGeometry { height, width, channels, window: *window };
                autograd::max_pool2d(input, geom)
            }
            Layer::ReLU => autograd::relu(input),
            Layer::Sigmoid => autograd::sigmoid(input),
            // Flatten is a shape-only transition over flat storage.
            Layer::Flatten => input.clone(),
            Layer::Dense(dense) => {
                autograd::dense(input, &dense.weights, &dense.bias, dense.in_dim, dense.out_dim)
            }
        }
    }

    fn run_range(&self, start: usize, end: usize, mut current: Tensor) -> Tensor {
        for index in start..end {
            current = self.apply_layer(index, &current);
        }
        current
    }

    /// Plain forward pass: no gradient tape is built.
    pub fn forward(&self, input: &ImageTensor) -> Result<Array1<f32>> {
        self.check_input(input)?;
        let current = Tensor::new(input.data().clone(), false);
        let output = self.run_range(0, self.layers().len(), current);
        Ok(output.data().clone())
    }

    /// Differentiable tapped pass.
    ///
    /// Runs input → tap without a tape, re-seeds the tap output as a
    /// gradient leaf, then runs tap → head with the tape attached. Returns
    /// `(tap_output, final_output)`; calling `backward` on the final output
    /// deposits the gradient of the score into the tap output's grad cell.
    pub fn tap(&self, index: usize, input: &ImageTensor) -> Result<(Tensor, Tensor)> {
        self.check_input(input)?;
        let head_in = Tensor::new(input.data().clone(), false);
        let head_out = self.run_range(0, index + 1, head_in);

        let tap_leaf = Tensor::new(head_out.data().clone(), true);
        let final_out = self.run_range(index + 1, self.layers().len(), tap_leaf.clone());
        Ok((tap_leaf, final_out))
    }
}

fn spatial_extent(shape: FeatureShape) -> (usize, usize, usize) {
    match shape {
        FeatureShape::Spatial { height, width, channels } => (height, width, channels),
        FeatureShape::Flat(_) => unreachable!("shape validated at construction"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Conv2D, Dense};
    use super::*;
    use approx::assert_relative_eq;

    /// 2x2x1 input, 1x1 identity conv, flatten, summing dense, sigmoid.
    fn tiny_net() -> LayeredNetwork {
        LayeredNetwork::new(
            (2, 2, 1),
            vec![
                Layer::Conv2D(Conv2D::new(1, 1, 1, 1, vec![1.0], vec![0.0]).unwrap()),
                Layer::ReLU,
                Layer::Flatten,
                Layer::Dense(Dense::new(4, 1, vec![1.0; 4], vec![0.0]).unwrap()),
                Layer::Sigmoid,
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_forward_scalar_output() {
        let net = tiny_net();
        let input = ImageTensor::new(vec![0.1, 0.2, 0.3, 0.4], 2, 2, 1).unwrap();
        let out = net.forward(&input).unwrap();
        assert_eq!(out.len(), 1);
        // sigmoid(0.1 + 0.2 + 0.3 + 0.4) = sigmoid(1.0)
        assert_relative_eq!(out[0], 1.0 / (1.0 + (-1.0f32).exp()), epsilon = 1e-6);
    }

    #[test]
    fn test_tap_gradient_reaches_leaf() {
        let net = tiny_net();
        let input = ImageTensor::new(vec![0.1, 0.2, 0.3, 0.4], 2, 2, 1).unwrap();
        let (tap, mut final_out) = net.tap(0, &input).unwrap();
        autograd::backward(&mut final_out, None);

        let grad = tap.grad().expect("gradient should reach the tap leaf");
        assert_eq!(grad.len(), 4);
        // d sigmoid(sum)/d each input = y * (1 - y), identical across cells
        let y = final_out.data()[0];
        for &g in grad.iter() {
            assert_relative_eq!(g, y * (1.0 - y), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_tap_at_final_layer_shares_grad_cell() {
        // Tap at the last layer: final output IS the leaf, so seeding the
        // backward pass lands the gradient directly in the tap cell.
        let net = tiny_net();
        let input = ImageTensor::new(vec![0.1, 0.2, 0.3, 0.4], 2, 2, 1).unwrap();
        let (tap, mut final_out) = net.tap(4, &input).unwrap();
        autograd::backward(&mut final_out, None);
        assert!(tap.grad().is_some());
    }

    #[test]
    fn test_forward_rejects_wrong_shape() {
        let net = tiny_net();
        let input = ImageTensor::new(vec![0.0; 9], 3, 3, 1).unwrap();
        assert!(net.forward(&input).is_err());
    }
}
