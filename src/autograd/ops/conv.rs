//! 2D convolution autograd operation
//!
//! Valid padding, stride 1, HWC layout over flat tensors. Weights are laid
//! out `[kh, kw, cin, cout]` and bias `[cout]`. The network's weights are
//! frozen at inference time, so the backward pass differentiates with
//! respect to the input activation only.

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Spatial geometry of one convolution application.
#[derive(Debug, Clone, Copy)]
pub struct ConvGeometry {
    pub height: usize,
    pub width: usize,
    pub in_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub out_channels: usize,
}

impl ConvGeometry {
    pub fn out_height(&self) -> usize {
        self.height - self.kernel_h + 1
    }

    pub fn out_width(&self) -> usize {
        self.width - self.kernel_w + 1
    }

    #[inline]
    fn weight_index(&self, ky: usize, kx: usize, ci: usize, co: usize) -> usize {
        ((ky * self.kernel_w + kx) * self.in_channels + ci) * self.out_channels + co
    }
}

/// Convolve `input` with `weights`, adding `bias` per output channel.
pub fn conv2d(input: &Tensor, weights: &Array1<f32>, bias: &Array1<f32>, geom: ConvGeometry) -> Tensor {
    let (oh, ow) = (geom.out_height(), geom.out_width());
    let x = input.data();
    let mut out = vec![0.0f32; oh * ow * geom.out_channels];

    for oy in 0..oh {
        for ox in 0..ow {
            for co in 0..geom.out_channels {
                let mut acc = bias[co];
                for ky in 0..geom.kernel_h {
                    for kx in 0..geom.kernel_w {
                        let base = ((oy + ky) * geom.width + ox + kx) * geom.in_channels;
                        for ci in 0..geom.in_channels {
                            acc += x[base + ci] * weights[geom.weight_index(ky, kx, ci, co)];
                        }
                    }
                }
                out[(oy * ow + ox) * geom.out_channels + co] = acc;
            }
        }
    }

    let requires_grad = input.requires_grad();
    let mut result = Tensor::new(Array1::from(out), requires_grad);

    if requires_grad {
        let input_clone = input.clone();
        let backward_op = Rc::new(Conv2dBackward {
            input: input_clone,
            weights: weights.clone(),
            geom,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct Conv2dBackward {
    input: Tensor,
    weights: Array1<f32>,
    geom: ConvGeometry,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for Conv2dBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.input.requires_grad() {
                let g = &self.geom;
                let (oh, ow) = (g.out_height(), g.out_width());
                let mut grad_in = vec![0.0f32; g.height * g.width * g.in_channels];

                // ∂L/∂x[iy,ix,ci] = Σ ∂L/∂out[oy,ox,co] * w[ky,kx,ci,co]
                // scattered from each output cell over its receptive field
                for oy in 0..oh {
                    for ox in 0..ow {
                        for co in 0..g.out_channels {
                            let go = grad[(oy * ow + ox) * g.out_channels + co];
                            if go == 0.0 {
                                continue;
                            }
                            for ky in 0..g.kernel_h {
                                for kx in 0..g.kernel_w {
                                    let base = ((oy + ky) * g.width + ox + kx) * g.in_channels;
                                    for ci in 0..g.in_channels {
                                        grad_in[base + ci] +=
                                            go * self.weights[g.weight_index(ky, kx, ci, co)];
                                    }
                                }
                            }
                        }
                    }
                }

                self.input.accumulate_grad(Array1::from(grad_in));
            }

            if let Some(op) = self.input.backward_op() {
                op.backward();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_relative_eq;

    fn geom_3x3_to_2x2() -> ConvGeometry {
        ConvGeometry {
            height: 3,
            width: 3,
            in_channels: 1,
            kernel_h: 2,
            kernel_w: 2,
            out_channels: 1,
        }
    }

    #[test]
    fn test_conv2d_forward_known_values() {
        // 3x3 input, 2x2 averaging-style kernel of ones, zero bias
        let x = Tensor::new(
            Array1::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]),
            false,
        );
        let w = Array1::from(vec![1.0; 4]);
        let b = Array1::from(vec![0.0]);
        let y = conv2d(&x, &w, &b, geom_3x3_to_2x2());
        // windows: [1,2,4,5]=12, [2,3,5,6]=16, [4,5,7,8]=24, [5,6,8,9]=28
        assert_eq!(y.data().to_vec(), vec![12.0, 16.0, 24.0, 28.0]);
    }

    #[test]
    fn test_conv2d_bias_added_per_channel() {
        let x = Tensor::new(Array1::from(vec![0.0; 9]), false);
        let w = Array1::from(vec![1.0; 4]);
        let b = Array1::from(vec![0.5]);
        let y = conv2d(&x, &w, &b, geom_3x3_to_2x2());
        assert!(y.data().iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_conv2d_backward_counts_window_membership() {
        let x = Tensor::new(Array1::from(vec![0.0; 9]), true);
        let w = Array1::from(vec![1.0; 4]);
        let b = Array1::from(vec![0.0]);
        let mut y = conv2d(&x, &w, &b, geom_3x3_to_2x2());
        backward(&mut y, None);
        // With unit upstream grad and unit weights, each input cell's grad is
        // the number of 2x2 windows containing it.
        let grad = x.grad().unwrap();
        let expected = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0];
        for (&got, &want) in grad.iter().zip(expected.iter()) {
            assert_relative_eq!(got, want);
        }
    }

    #[test]
    fn test_conv2d_multichannel_layout() {
        // 2x2x2 input, 1x1 kernel mapping 2 channels to 1: out = x0 + 2*x1
        let geom = ConvGeometry {
            height: 2,
            width: 2,
            in_channels: 2,
            kernel_h: 1,
            kernel_w: 1,
            out_channels: 1,
        };
        let x = Tensor::new(
            Array1::from(vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0]),
            false,
        );
        let w = Array1::from(vec![1.0, 2.0]);
        let b = Array1::from(vec![0.0]);
        let y = conv2d(&x, &w, &b, geom);
        assert_eq!(y.data().to_vec(), vec![21.0, 42.0, 63.0, 84.0]);
    }
}
