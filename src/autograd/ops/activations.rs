//! Activation function autograd operations: relu, sigmoid

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| x.max(0.0));
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let a_clone = a.clone();
        let backward_op = Rc::new(ReluBackward {
            a: a_clone,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct ReluBackward {
    a: Tensor,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for ReluBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂a = ∂L/∂out * (a > 0)
                let grad_a = grad * &self.a.data().mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });
                self.a.accumulate_grad(grad_a);
            }

            if let Some(op) = self.a.backward_op() {
                op.backward();
            }
        }
    }
}

/// Sigmoid activation
///
/// sigmoid(x) = 1 / (1 + e^(-x))
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| 1.0 / (1.0 + (-x).exp()));

    let requires_grad = a.requires_grad();
    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let a_clone = a.clone();
        let output_clone = result.clone();
        let backward_op = Rc::new(SigmoidBackward {
            a: a_clone,
            output: output_clone,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Tensor,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂sigmoid/∂x = y * (1 - y)
                let y = self.output.data();
                let grad_a = grad_output * &y.mapv(|v| v * (1.0 - v));
                self.a.accumulate_grad(grad_a);
            }

            if let Some(op) = self.a.backward_op() {
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
    use ndarray::Array1;

    #[test]
    fn test_relu_forward_clips_negatives() {
        let x = Tensor::new(Array1::from(vec![-2.0, -0.5, 0.0, 0.5, 2.0]), false);
        let y = relu(&x);
        assert_eq!(y.data().to_vec(), vec![0.0, 0.0, 0.0, 0.5, 2.0]);
    }

    #[test]
    fn test_relu_backward_masks_gradient() {
        let x = Tensor::new(Array1::from(vec![-1.0, 2.0]), true);
        let mut y = relu(&x);
        backward(&mut y, None);
        let grad = x.grad().unwrap();
        assert_eq!(grad.to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_sigmoid_forward_range() {
        let x = Tensor::new(Array1::from(vec![-10.0, 0.0, 10.0]), false);
        let y = sigmoid(&x);
        assert!(y.data()[0] < 0.001);
        assert_relative_eq!(y.data()[1], 0.5);
        assert!(y.data()[2] > 0.999);
    }

    #[test]
    fn test_sigmoid_backward_peak_at_zero() {
        let x = Tensor::new(Array1::from(vec![0.0]), true);
        let mut y = sigmoid(&x);
        backward(&mut y, None);
        // y(1-y) at x=0 is 0.25
        assert_relative_eq!(x.grad().unwrap()[0], 0.25);
    }
}
