//! The tensor type at the bottom of the autograd tape.

use super::BackwardOp;
use ndarray::Array1;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared slot a backward op writes its upstream gradient into.
///
/// Every tensor owns one; ops capture the cell of their result so the
/// gradient is visible to whoever holds the parameter, clones included.
pub type GradCell = Rc<RefCell<Option<Array1<f32>>>>;

/// Flat f32 tensor with an attached gradient slot and, for op results,
/// the backward op that produced it.
///
/// Cloning copies the data but shares the gradient cell: backward ops hold
/// clones of their inputs, and accumulation through a clone still reaches
/// the original parameter.
#[derive(Clone)]
pub struct Tensor {
    data: Array1<f32>,
    grad: GradCell,
    backward_op: Option<Rc<dyn BackwardOp>>,
    requires_grad: bool,
}

impl Tensor {
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data,
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad,
        }
    }

    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    pub fn zeros(size: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(size), requires_grad)
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Scalar value of a 1-element tensor
    pub fn item(&self) -> f32 {
        debug_assert_eq!(self.data.len(), 1, "item() requires a scalar tensor");
        self.data[0]
    }

    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Snapshot of the current gradient, if one has been accumulated
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Overwrite the gradient, discarding anything accumulated so far
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add into the gradient; tensors reused across ops get the sum
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// The shared gradient cell, for ops capturing their result's slot
    pub fn grad_cell(&self) -> GradCell {
        self.grad.clone()
    }

    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(len={}, requires_grad={}, grad {})",
            self.data.len(),
            self.requires_grad,
            if self.grad.borrow().is_some() {
                "set"
            } else {
                "unset"
            }
        )
    }
}
