//! Max pooling autograd operation
//!
//! Non-overlapping square windows over HWC layout; the forward pass records
//! the argmax position of every window so the backward pass can route the
//! gradient to exactly those cells.

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Geometry of one pooling application.
#[derive(Debug, Clone, Copy)]
pub struct PoolGeometry {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
    pub window: usize,
}

impl PoolGeometry {
    pub fn out_height(&self) -> usize {
        self.height / self.window
    }

    pub fn out_width(&self) -> usize {
        self.width / self.window
    }
}

/// Max-pool `input` over non-overlapping `window`x`window` tiles.
pub fn max_pool2d(input: &Tensor, geom: PoolGeometry) -> Tensor {
    let (oh, ow) = (geom.out_height(), geom.out_width());
    let x = input.data();
    let mut out = vec![0.0f32; oh * ow * geom.channels];
    let mut argmax = vec![0usize; oh * ow * geom.channels];

    for oy in 0..oh {
        for ox in 0..ow {
            for ch in 0..geom.channels {
                let mut best = f32::NEG_INFINITY;
                let mut best_idx = 0;
                for wy in 0..geom.window {
                    for wx in 0..geom.window {
                        let iy = oy * geom.window + wy;
                        let ix = ox * geom.window + wx;
                        let idx = (iy * geom.width + ix) * geom.channels + ch;
                        if x[idx] > best {
                            best = x[idx];
                            best_idx = idx;
                        }
                    }
                }
                let out_idx = (oy * ow + ox) * geom.channels + ch;
                out[out_idx] = best;
                argmax[out_idx] = best_idx;
            }
        }
    }

    let requires_grad = input.requires_grad();
    let mut result = Tensor::new(Array1::from(out), requires_grad);

    if requires_grad {
        let input_clone = input.clone();
        let backward_op = Rc::new(MaxPoolBackward {
            input: input_clone,
            argmax,
            input_len: geom.height * geom.width * geom.channels,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct MaxPoolBackward {
    input: Tensor,
    argmax: Vec<usize>,
    input_len: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for MaxPoolBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.input.requires_grad() {
                // ∂L/∂x is nonzero only at each window's argmax
                let mut grad_in = vec![0.0f32; self.input_len];
                for (out_idx, &in_idx) in self.argmax.iter().enumerate() {
                    grad_in[in_idx] += grad[out_idx];
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

    #[test]
    fn test_max_pool_forward_picks_window_max() {
        let geom = PoolGeometry {
            height: 4,
            width: 4,
            channels: 1,
            window: 2,
        };
        #[rustfmt::skip]
        let x = Tensor::new(
            Array1::from(vec![
                1.0, 5.0, 2.0, 0.0,
                3.0, 4.0, 1.0, 6.0,
                0.0, 0.0, 9.0, 8.0,
                2.0, 1.0, 7.0, 3.0,
            ]),
            false,
        );
        let y = max_pool2d(&x, geom);
        assert_eq!(y.data().to_vec(), vec![5.0, 6.0, 2.0, 9.0]);
    }

    #[test]
    fn test_max_pool_backward_routes_to_argmax() {
        let geom = PoolGeometry {
            height: 2,
            width: 2,
            channels: 1,
            window: 2,
        };
        let x = Tensor::new(Array1::from(vec![1.0, 4.0, 2.0, 3.0]), true);
        let mut y = max_pool2d(&x, geom);
        backward(&mut y, None);
        let grad = x.grad().unwrap();
        assert_eq!(grad.to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_max_pool_channels_pooled_independently() {
        let geom = PoolGeometry {
            height: 2,
            width: 2,
            channels: 2,
            window: 2,
        };
        // channel 0: [1,2,3,4] -> 4; channel 1: [8,7,6,5] -> 8
        let x = Tensor::new(
            Array1::from(vec![1.0, 8.0, 2.0, 7.0, 3.0, 6.0, 4.0, 5.0]),
            false,
        );
        let y = max_pool2d(&x, geom);
        assert_eq!(y.data().to_vec(), vec![4.0, 8.0]);
    }
}
