//! Autograd operations with backward passes

use super::{BackwardOp, GradCell, Tensor};
use ndarray::Array1;
use std::rc::Rc;

fn propagate(t: &Tensor) {
    if let Some(op) = t.backward_op() {
        op.backward();
    }
}

/// Add two tensors element-wise
pub fn add(a: &Tensor, b: &Tensor) -> Tensor {
    assert_eq!(a.len(), b.len(), "add: length mismatch");
    let data = a.data() + b.data();
    let requires_grad = a.requires_grad() || b.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(AddBackward {
            a: a.clone(),
            b: b.clone(),
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct AddBackward {
    a: Tensor,
    b: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for AddBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad.clone());
            }
            if self.b.requires_grad() {
                self.b.accumulate_grad(grad.clone());
            }

            propagate(&self.a);
            propagate(&self.b);
        }
    }
}

/// Scale a tensor by a constant
pub fn scale(a: &Tensor, factor: f32) -> Tensor {
    let data = a.data() * factor;
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(ScaleBackward {
            a: a.clone(),
            factor,
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct ScaleBackward {
    a: Tensor,
    factor: f32,
    result_grad: GradCell,
}

impl BackwardOp for ScaleBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad * self.factor);
            }
            propagate(&self.a);
        }
    }
}

/// Mean of all elements, as a scalar tensor
pub fn mean(a: &Tensor) -> Tensor {
    let n = a.len().max(1) as f32;
    let data = Array1::from(vec![a.data().sum() / n]);
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(MeanBackward {
            a: a.clone(),
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct MeanBackward {
    a: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for MeanBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂a_i = ∂L/∂mean / n
                let g = grad[0] / self.a.len().max(1) as f32;
                self.a.accumulate_grad(Array1::from(vec![g; self.a.len()]));
            }
            propagate(&self.a);
        }
    }
}

/// ReLU activation
pub fn relu(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| x.max(0.0));
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(ReluBackward {
            a: a.clone(),
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct ReluBackward {
    a: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for ReluBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let grad_a = grad * &self.a.data().mapv(|x| if x > 0.0 { 1.0 } else { 0.0 });
                self.a.accumulate_grad(grad_a);
            }
            propagate(&self.a);
        }
    }
}

/// Sigmoid activation
///
/// The forward output is captured for the backward pass:
/// ∂σ/∂x = σ(x) * (1 - σ(x))
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| 1.0 / (1.0 + (-x).exp()));
    let requires_grad = a.requires_grad();

    let mut result = Tensor::new(data, requires_grad);

    if requires_grad {
        let output = result.clone();
        result.set_backward_op(Rc::new(SigmoidBackward {
            a: a.clone(),
            output,
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Tensor,
    result_grad: GradCell,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                let grad_a: Array1<f32> = self
                    .output
                    .data()
                    .iter()
                    .zip(grad.iter())
                    .map(|(&y, &g)| g * y * (1.0 - y))
                    .collect();
                self.a.accumulate_grad(grad_a);
            }
            propagate(&self.a);
        }
    }
}

/// Affine transform: y = W @ x + b
///
/// The dense-layer primitive. `w` is a row-major `[out_dim * in_dim]` matrix,
/// `b` has length `out_dim`, `x` has length `in_dim`.
pub fn affine(w: &Tensor, b: &Tensor, x: &Tensor, out_dim: usize, in_dim: usize) -> Tensor {
    assert_eq!(w.len(), out_dim * in_dim, "affine: weight size mismatch");
    assert_eq!(b.len(), out_dim, "affine: bias size mismatch");
    assert_eq!(x.len(), in_dim, "affine: input size mismatch");

    let mut data = vec![0.0; out_dim];
    for (i, out) in data.iter_mut().enumerate() {
        let mut sum = b.data()[i];
        for p in 0..in_dim {
            sum += w.data()[i * in_dim + p] * x.data()[p];
        }
        *out = sum;
    }

    let requires_grad = w.requires_grad() || b.requires_grad() || x.requires_grad();
    let mut result = Tensor::new(Array1::from(data), requires_grad);

    if requires_grad {
        result.set_backward_op(Rc::new(AffineBackward {
            w: w.clone(),
            b: b.clone(),
            x: x.clone(),
            out_dim,
            in_dim,
            result_grad: result.grad_cell(),
        }));
    }

    result
}

struct AffineBackward {
    w: Tensor,
    b: Tensor,
    x: Tensor,
    out_dim: usize,
    in_dim: usize,
    result_grad: GradCell,
}

impl BackwardOp for AffineBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            // ∂L/∂W[i,p] = g_i * x_p
            if self.w.requires_grad() {
                let mut grad_w = vec![0.0; self.out_dim * self.in_dim];
                for i in 0..self.out_dim {
                    for p in 0..self.in_dim {
                        grad_w[i * self.in_dim + p] = grad[i] * self.x.data()[p];
                    }
                }
                self.w.accumulate_grad(Array1::from(grad_w));
            }

            // ∂L/∂b = g
            if self.b.requires_grad() {
                self.b.accumulate_grad(grad.clone());
            }

            // ∂L/∂x_p = sum_i g_i * W[i,p]
            if self.x.requires_grad() {
                let mut grad_x = vec![0.0; self.in_dim];
                for (p, gx) in grad_x.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for i in 0..self.out_dim {
                        sum += grad[i] * self.w.data()[i * self.in_dim + p];
                    }
                    *gx = sum;
                }
                self.x.accumulate_grad(Array1::from(grad_x));
            }

            propagate(&self.w);
            propagate(&self.b);
            propagate(&self.x);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_relative_eq;

    #[test]
    fn add_forward_backward() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);
        let b = Tensor::from_vec(vec![3.0, 4.0], true);

        let c = add(&a, &b);
        assert_eq!(c.data(), &Array1::from(vec![4.0, 6.0]));

        backward(&c, None);
        assert_eq!(a.grad().unwrap(), Array1::from(vec![1.0, 1.0]));
        assert_eq!(b.grad().unwrap(), Array1::from(vec![1.0, 1.0]));
    }

    #[test]
    fn scale_backward_applies_factor() {
        let a = Tensor::from_vec(vec![1.0, -2.0], true);
        let c = scale(&a, 3.0);

        backward(&c, None);
        assert_eq!(a.grad().unwrap(), Array1::from(vec![3.0, 3.0]));
    }

    #[test]
    fn mean_forward_backward() {
        let a = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let m = mean(&a);

        assert_relative_eq!(m.item(), 2.5, epsilon = 1e-6);

        backward(&m, None);
        let g = a.grad().unwrap();
        for i in 0..4 {
            assert_relative_eq!(g[i], 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn relu_masks_negative_gradient() {
        let a = Tensor::from_vec(vec![1.0, -1.0], true);
        let r = relu(&a);
        assert_eq!(r.data(), &Array1::from(vec![1.0, 0.0]));

        backward(&r, None);
        assert_eq!(a.grad().unwrap(), Array1::from(vec![1.0, 0.0]));
    }

    #[test]
    fn sigmoid_gradient_at_zero() {
        let a = Tensor::from_vec(vec![0.0], true);
        let s = sigmoid(&a);
        assert_relative_eq!(s.item(), 0.5, epsilon = 1e-6);

        backward(&s, None);
        // σ'(0) = 0.25
        assert_relative_eq!(a.grad().unwrap()[0], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn affine_forward() {
        // W = [[1, 2], [3, 4]], b = [0.5, -0.5], x = [1, 1]
        let w = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let b = Tensor::from_vec(vec![0.5, -0.5], true);
        let x = Tensor::from_vec(vec![1.0, 1.0], false);

        let y = affine(&w, &b, &x, 2, 2);
        assert_relative_eq!(y.data()[0], 3.5, epsilon = 1e-6);
        assert_relative_eq!(y.data()[1], 6.5, epsilon = 1e-6);
    }

    #[test]
    fn affine_backward_reaches_weights_and_input() {
        let w = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], true);
        let b = Tensor::from_vec(vec![0.0, 0.0], true);
        let x = Tensor::from_vec(vec![5.0, 7.0], true);

        let y = affine(&w, &b, &x, 2, 2);
        backward(&y, None);

        // grad w[i,p] = x_p
        assert_eq!(w.grad().unwrap(), Array1::from(vec![5.0, 7.0, 5.0, 7.0]));
        assert_eq!(b.grad().unwrap(), Array1::from(vec![1.0, 1.0]));
        // grad x_p = sum_i w[i,p]
        assert_eq!(x.grad().unwrap(), Array1::from(vec![4.0, 6.0]));
    }

    #[test]
    fn gradients_chain_through_two_affines() {
        // y = w2 @ (w1 @ x): a two-layer chain must propagate to w1
        let w1 = Tensor::from_vec(vec![2.0], true);
        let b1 = Tensor::from_vec(vec![0.0], false);
        let w2 = Tensor::from_vec(vec![3.0], true);
        let b2 = Tensor::from_vec(vec![0.0], false);
        let x = Tensor::from_vec(vec![4.0], false);

        let h = affine(&w1, &b1, &x, 1, 1);
        let y = affine(&w2, &b2, &h, 1, 1);
        assert_relative_eq!(y.item(), 24.0, epsilon = 1e-6);

        backward(&y, None);
        // dy/dw2 = h = 8, dy/dw1 = w2 * x = 12
        assert_relative_eq!(w2.grad().unwrap()[0], 8.0, epsilon = 1e-6);
        assert_relative_eq!(w1.grad().unwrap()[0], 12.0, epsilon = 1e-6);
    }
}
