//! Flat tensor with a shared gradient cell
//!
//! Data is immutable after construction and shared between clones; the
//! gradient lives in an `Rc<RefCell<...>>` cell so a backward op holding a
//! clone of its input writes gradients the caller's handle can read.

use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

use super::BackwardOp;

#[derive(Clone)]
pub struct Tensor {
    data: Rc<Array1<f32>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

impl Tensor {
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data: Rc::new(data),
            grad: Rc::new(RefCell::new(None)),
            requires_grad,
            backward_op: None,
        }
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Current gradient, if one has been accumulated.
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Handle to the gradient cell, shared with backward ops.
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    /// Overwrite the gradient, seeding the backward pass.
    pub fn set_grad(&mut self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add `grad` into the gradient cell, initializing it on first write.
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing = &*existing + &grad,
            None => *cell = Some(grad),
        }
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_grad_cell() {
        let t = Tensor::new(Array1::from(vec![1.0, 2.0]), true);
        let clone = t.clone();
        clone.accumulate_grad(Array1::from(vec![0.5, 0.5]));
        assert_eq!(t.grad().unwrap().to_vec(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_accumulate_grad_sums() {
        let t = Tensor::new(Array1::from(vec![0.0; 2]), true);
        t.accumulate_grad(Array1::from(vec![1.0, 2.0]));
        t.accumulate_grad(Array1::from(vec![3.0, 4.0]));
        assert_eq!(t.grad().unwrap().to_vec(), vec![4.0, 6.0]);
    }

    #[test]
    fn test_fresh_tensor_has_no_grad_or_op() {
        let t = Tensor::new(Array1::from(vec![1.0]), false);
        assert!(t.grad().is_none());
        assert!(t.backward_op().is_none());
        assert_eq!(t.len(), 1);
    }
}
