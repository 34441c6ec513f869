//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms.
///
/// Parameters are owned by the model's layers, so a step receives mutable
/// borrows collected via `Mlp::params_mut` and updates them in place.
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [&mut Tensor]);

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

/// Scale all gradients so their global L2 norm does not exceed `max_norm`.
pub fn clip_grad_norm(params: &[&mut Tensor], max_norm: f32) {
    let mut total_sq = 0.0f32;
    for param in params.iter() {
        if let Some(grad) = param.grad() {
            total_sq += grad.iter().map(|g| g * g).sum::<f32>();
        }
    }

    let norm = total_sq.sqrt();
    if norm > max_norm && norm > 0.0 {
        let factor = max_norm / norm;
        for param in params.iter() {
            if let Some(grad) = param.grad() {
                param.set_grad(grad * factor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn clip_leaves_small_gradients_alone() {
        let mut t = Tensor::from_vec(vec![0.0], true);
        t.set_grad(Array1::from(vec![0.5]));

        clip_grad_norm(&[&mut t], 1.0);
        assert_eq!(t.grad().unwrap()[0], 0.5);
    }

    #[test]
    fn clip_rescales_to_max_norm() {
        let mut a = Tensor::from_vec(vec![0.0], true);
        let mut b = Tensor::from_vec(vec![0.0], true);
        a.set_grad(Array1::from(vec![3.0]));
        b.set_grad(Array1::from(vec![4.0]));

        clip_grad_norm(&[&mut a, &mut b], 1.0);
        let norm =
            (a.grad().unwrap()[0].powi(2) + b.grad().unwrap()[0].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
