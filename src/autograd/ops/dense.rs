//! Fully-connected autograd operation
//!
//! Flat mat-vec with bias: `out[j] = b[j] + Σ_i x[i] * w[i*out_dim + j]`.
//! Weights are frozen at inference time; backward differentiates with
//! respect to the input only.

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Apply a dense layer to a flat input.
pub fn dense(
    input: &Tensor,
    weights: &Array1<f32>,
    bias: &Array1<f32>,
    in_dim: usize,
    out_dim: usize,
) -> Tensor {
    let x = input.data();
    let mut out = vec![0.0f32; out_dim];

    for (j, out_j) in out.iter_mut().enumerate() {
        let mut acc = bias[j];
        for i in 0..in_dim {
            acc += x[i] * weights[i * out_dim + j];
        }
        *out_j = acc;
    }

    let requires_grad = input.requires_grad();
    let mut result = Tensor::new(Array1::from(out), requires_grad);

    if requires_grad {
        let input_clone = input.clone();
        let backward_op = Rc::new(DenseBackward {
            input: input_clone,
            weights: weights.clone(),
            in_dim,
            out_dim,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct DenseBackward {
    input: Tensor,
    weights: Array1<f32>,
    in_dim: usize,
    out_dim: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for DenseBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.input.requires_grad() {
                // ∂L/∂x[i] = Σ_j ∂L/∂out[j] * w[i,j]
                let mut grad_in = vec![0.0f32; self.in_dim];
                for (i, grad_i) in grad_in.iter_mut().enumerate() {
                    let mut acc = 0.0;
                    for j in 0..self.out_dim {
                        acc += grad[j] * self.weights[i * self.out_dim + j];
                    }
                    *grad_i = acc;
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

    #[test]
    fn test_dense_forward_known_values() {
        // x = [1, 2], w = [[1, 2], [3, 4]] row-major, b = [0.5, -0.5]
        let x = Tensor::new(Array1::from(vec![1.0, 2.0]), false);
        let w = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let b = Array1::from(vec![0.5, -0.5]);
        let y = dense(&x, &w, &b, 2, 2);
        // out = [1*1 + 2*3 + 0.5, 1*2 + 2*4 - 0.5] = [7.5, 9.5]
        assert_eq!(y.data().to_vec(), vec![7.5, 9.5]);
    }

    #[test]
    fn test_dense_backward_transposed_weights() {
        let x = Tensor::new(Array1::from(vec![0.0, 0.0]), true);
        let w = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let b = Array1::from(vec![0.0, 0.0]);
        let mut y = dense(&x, &w, &b, 2, 2);
        backward(&mut y, None);
        // grad_x[i] = Σ_j w[i,j] with unit upstream grad
        let grad = x.grad().unwrap();
        assert_relative_eq!(grad[0], 3.0);
        assert_relative_eq!(grad[1], 7.0);
    }
}
