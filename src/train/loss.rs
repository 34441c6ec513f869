//! Loss functions for training

use crate::autograd::{BackwardOp, GradCell};
use crate::Tensor;
use ndarray::Array1;
use std::rc::Rc;

/// Trait for loss functions
pub trait LossFn {
    /// Compute a scalar loss tensor wired for backpropagation into
    /// `predictions` and, through its backward op, into the model graph.
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Name of the loss function
    fn name(&self) -> &str;
}

/// Backward node shared by the analytic losses below: accumulates a
/// precomputed gradient (scaled by the upstream gradient) into the
/// predictions tensor and continues down its graph.
struct AnalyticLossBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    result_grad: GradCell,
}

impl BackwardOp for AnalyticLossBackward {
    fn backward(&self) {
        if let Some(upstream) = self.result_grad.borrow().as_ref() {
            let g = upstream[0];
            self.predictions.accumulate_grad(&self.grad * g);

            if let Some(op) = self.predictions.backward_op() {
                op.backward();
            }
        }
    }
}

pub(crate) fn analytic_loss(predictions: &Tensor, value: f32, grad: Array1<f32>) -> Tensor {
    let mut loss = Tensor::from_vec(vec![value], true);
    if predictions.requires_grad() {
        loss.set_backward_op(Rc::new(AnalyticLossBackward {
            predictions: predictions.clone(),
            grad,
            result_grad: loss.grad_cell(),
        }));
    }
    loss
}

/// Mean Squared Error Loss
///
/// L = mean((predictions - targets)²)
pub struct MSELoss;

impl LossFn for MSELoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have same length"
        );

        let n = predictions.len().max(1) as f32;
        let diff = predictions.data() - targets.data();
        let mse = (&diff * &diff).mean().unwrap_or(0.0);

        // d(MSE)/d(pred) = 2 * (pred - target) / n
        analytic_loss(predictions, mse, &diff * (2.0 / n))
    }

    fn name(&self) -> &str {
        "MSE"
    }
}

/// Binary cross-entropy over raw logits
///
/// Uses the numerically stable form
/// `L = mean(max(z, 0) - z·t + ln(1 + e^(-|z|)))`, with the sigmoid folded
/// into the gradient: `d(L)/d(z) = (σ(z) - t) / n`.
pub struct BceWithLogitsLoss;

impl LossFn for BceWithLogitsLoss {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.len(),
            targets.len(),
            "predictions and targets must have same length"
        );

        let n = predictions.len().max(1) as f32;
        let mut total = 0.0f32;
        let mut grad = Vec::with_capacity(predictions.len());

        for (&z, &t) in predictions.data().iter().zip(targets.data().iter()) {
            total += z.max(0.0) - z * t + (1.0 + (-z.abs()).exp()).ln();
            let p = 1.0 / (1.0 + (-z).exp());
            grad.push((p - t) / n);
        }

        analytic_loss(predictions, total / n, Array1::from(grad))
    }

    fn name(&self) -> &str {
        "BCEWithLogits"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use approx::assert_relative_eq;

    #[test]
    fn mse_basic() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let target = Tensor::from_vec(vec![1.5, 2.5, 3.5], false);

        let loss = MSELoss.forward(&pred, &target);
        assert_relative_eq!(loss.item(), 0.25, epsilon = 1e-5);
    }

    #[test]
    fn mse_zero_for_perfect_prediction() {
        let pred = Tensor::from_vec(vec![1.0, 2.0], true);
        let target = Tensor::from_vec(vec![1.0, 2.0], false);

        let loss = MSELoss.forward(&pred, &target);
        assert_relative_eq!(loss.item(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn mse_gradient() {
        let pred = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);
        let target = Tensor::from_vec(vec![0.0, 0.0, 0.0], false);

        let loss = MSELoss.forward(&pred, &target);
        backward(&loss, None);

        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], 2.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(grad[1], 4.0 / 3.0, epsilon = 1e-5);
        assert_relative_eq!(grad[2], 6.0 / 3.0, epsilon = 1e-5);
    }

    #[test]
    fn mse_gradient_reaches_upstream_graph() {
        // pred = 2 * x, so d(loss)/d(x) must include the chain factor 2
        let x = Tensor::from_vec(vec![1.0], true);
        let pred = crate::autograd::scale(&x, 2.0);
        let target = Tensor::from_vec(vec![0.0], false);

        let loss = MSELoss.forward(&pred, &target);
        backward(&loss, None);

        // d(mse)/d(pred) = 2 * 2 / 1 = 4; d/d(x) = 4 * 2 = 8
        assert_relative_eq!(x.grad().unwrap()[0], 8.0, epsilon = 1e-5);
    }

    #[test]
    fn bce_matches_closed_form_at_zero_logit() {
        let pred = Tensor::from_vec(vec![0.0], true);
        let target = Tensor::from_vec(vec![1.0], false);

        let loss = BceWithLogitsLoss.forward(&pred, &target);
        // -ln(0.5)
        assert_relative_eq!(loss.item(), 0.6931472, epsilon = 1e-5);
    }

    #[test]
    fn bce_gradient_is_sigmoid_minus_target() {
        let pred = Tensor::from_vec(vec![0.0, 2.0], true);
        let target = Tensor::from_vec(vec![1.0, 0.0], false);

        let loss = BceWithLogitsLoss.forward(&pred, &target);
        backward(&loss, None);

        let grad = pred.grad().unwrap();
        assert_relative_eq!(grad[0], (0.5 - 1.0) / 2.0, epsilon = 1e-5);
        let sig2 = 1.0 / (1.0 + (-2.0f32).exp());
        assert_relative_eq!(grad[1], sig2 / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn bce_decreases_with_confident_correct_logit() {
        let target = Tensor::from_vec(vec![1.0], false);
        let weak = BceWithLogitsLoss.forward(&Tensor::from_vec(vec![0.5], true), &target);
        let strong = BceWithLogitsLoss.forward(&Tensor::from_vec(vec![3.0], true), &target);
        assert!(strong.item() < weak.item());
    }
}
