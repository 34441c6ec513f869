//! Tape-based autograd engine
//!
//! Tensors carry a shared gradient cell and an optional backward op. Every op
//! accumulates gradients into its inputs and then recurses into their backward
//! ops, so a chain of dense layers trains end to end from a scalar loss.

mod backward;
mod ops;
mod tensor;

pub use backward::BackwardOp;
pub use ops::{add, affine, mean, relu, scale, sigmoid};
pub use tensor::{GradCell, Tensor};

/// Perform a backward pass from a tensor, seeding its gradient with ones
/// (the usual case for a scalar loss) unless an explicit seed is given.
pub fn backward(tensor: &Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    match grad_output {
        Some(grad) => tensor.set_grad(grad),
        None => tensor.set_grad(ndarray::Array1::ones(tensor.len())),
    }

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}
