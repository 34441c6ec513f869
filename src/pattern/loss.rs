//! Hand-written loss terms over pixel grids.
//!
//! The pure functions here compute display values; [`student_loss_op`]
//! produces the same composite value as a differentiable scalar so the
//! student network can be trained against it.

use super::grid::PixelGrid;
use crate::autograd::Tensor;
use crate::train::loss::analytic_loss;
use ndarray::Array1;

/// Coefficients of the composite student objective
#[derive(Debug, Clone, Copy)]
pub struct LossWeights {
    pub ramp: f32,
    pub chess: f32,
    pub smoothness: f32,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            ramp: 8.0,
            chess: 3.0,
            smoothness: 0.02,
        }
    }
}

/// Mean squared error between two grids of identical shape
pub fn mse(target: &PixelGrid, prediction: &PixelGrid) -> f32 {
    let n = prediction.data().len() as f32;
    target
        .data()
        .iter()
        .zip(prediction.data())
        .map(|(t, p)| (p - t).powi(2))
        .sum::<f32>()
        / n
}

/// MSE against the fixed horizontal ramp target, independent of any input
pub fn ramp_loss(prediction: &PixelGrid) -> f32 {
    let ramp = PixelGrid::ramp(prediction.width(), prediction.height());
    mse(&ramp, prediction)
}

const CONTRAST_TARGET: f32 = 0.3;

/// Neighbor-contrast loss: pushes the absolute difference of adjacent
/// cells toward 0.3 across horizontal, vertical, and diagonal pairs.
/// The diagonal term is weighted x2 and the three terms are averaged.
/// Edge cells without a neighbor in a given direction are excluded.
pub fn chess_neighbor_loss(prediction: &PixelGrid) -> f32 {
    let (w, h) = (prediction.width(), prediction.height());
    // Below 2x2 at least one relation has no pairs to average over.
    if w < 2 || h < 2 {
        return 0.0;
    }

    let mut horizontal = 0.0;
    for r in 0..h {
        for c in 0..w - 1 {
            let d = (prediction.get(r, c) - prediction.get(r, c + 1)).abs();
            horizontal += (d - CONTRAST_TARGET).powi(2);
        }
    }
    horizontal /= (h * (w - 1)) as f32;

    let mut vertical = 0.0;
    for r in 0..h - 1 {
        for c in 0..w {
            let d = (prediction.get(r, c) - prediction.get(r + 1, c)).abs();
            vertical += (d - CONTRAST_TARGET).powi(2);
        }
    }
    vertical /= ((h - 1) * w) as f32;

    let mut diagonal = 0.0;
    for r in 0..h - 1 {
        for c in 0..w - 1 {
            let d = (prediction.get(r, c) - prediction.get(r + 1, c + 1)).abs();
            diagonal += (d - CONTRAST_TARGET).powi(2);
        }
    }
    diagonal /= ((h - 1) * (w - 1)) as f32;

    (horizontal + vertical + 2.0 * diagonal) / 3.0
}

/// Mean squared horizontal first-difference, scaled by 0.1
pub fn smoothness(prediction: &PixelGrid) -> f32 {
    let (w, h) = (prediction.width(), prediction.height());
    if w < 2 || h == 0 {
        return 0.0;
    }
    let mut total = 0.0;
    for r in 0..h {
        for c in 0..w - 1 {
            total += (prediction.get(r, c + 1) - prediction.get(r, c)).powi(2);
        }
    }
    0.1 * total / (h * (w - 1)) as f32
}

/// Composite objective value, display-only
pub fn student_loss(prediction: &PixelGrid, weights: &LossWeights) -> f32 {
    weights.ramp * ramp_loss(prediction)
        + weights.chess * chess_neighbor_loss(prediction)
        + weights.smoothness * smoothness(prediction)
}

fn sign(d: f32) -> f32 {
    if d > 0.0 {
        1.0
    } else if d < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Differentiable composite objective over a flat row-major prediction.
///
/// Computes the same value as [`student_loss`] and attaches the combined
/// analytic gradient of all three terms as a single backward op, so one
/// backward pass reaches the student's parameters.
pub fn student_loss_op(
    prediction: &Tensor,
    height: usize,
    width: usize,
    weights: &LossWeights,
) -> Tensor {
    let p = prediction.data();
    debug_assert_eq!(p.len(), height * width);
    let idx = |r: usize, c: usize| r * width + c;

    let n = (height * width) as f32;
    let n_h = (height * (width - 1)) as f32;
    let n_v = ((height - 1) * width) as f32;
    let n_d = ((height - 1) * (width - 1)) as f32;

    let mut grad = Array1::<f32>::zeros(p.len());

    // Ramp term
    let ramp_denom = (width - 1).max(1) as f32;
    let mut ramp_total = 0.0;
    for r in 0..height {
        for c in 0..width {
            let target = c as f32 / ramp_denom;
            let diff = p[idx(r, c)] - target;
            ramp_total += diff * diff;
            grad[idx(r, c)] += weights.ramp * 2.0 * diff / n;
        }
    }
    let ramp_value = ramp_total / n;

    // Chess terms; each pair contributes +/- the same gradient to its
    // two cells. d(|d| - 0.3)^2 / dd = 2 (|d| - 0.3) sign(d).
    let chess_pairs = |pairs: &[((usize, usize), (usize, usize))],
                           count: f32,
                           relation_weight: f32,
                           grad: &mut Array1<f32>|
     -> f32 {
        let mut total = 0.0;
        for &((ra, ca), (rb, cb)) in pairs {
            let d = p[idx(ra, ca)] - p[idx(rb, cb)];
            let excess = d.abs() - CONTRAST_TARGET;
            total += excess * excess;
            let g = weights.chess * relation_weight * 2.0 * excess * sign(d) / (3.0 * count);
            grad[idx(ra, ca)] += g;
            grad[idx(rb, cb)] -= g;
        }
        relation_weight * total / (3.0 * count)
    };

    let mut h_pairs = Vec::with_capacity(n_h as usize);
    for r in 0..height {
        for c in 0..width - 1 {
            h_pairs.push(((r, c), (r, c + 1)));
        }
    }
    let mut v_pairs = Vec::with_capacity(n_v as usize);
    for r in 0..height - 1 {
        for c in 0..width {
            v_pairs.push(((r, c), (r + 1, c)));
        }
    }
    let mut d_pairs = Vec::with_capacity(n_d as usize);
    for r in 0..height - 1 {
        for c in 0..width - 1 {
            d_pairs.push(((r, c), (r + 1, c + 1)));
        }
    }

    let mut chess_value = 0.0;
    chess_value += chess_pairs(&h_pairs, n_h, 1.0, &mut grad);
    chess_value += chess_pairs(&v_pairs, n_v, 1.0, &mut grad);
    chess_value += chess_pairs(&d_pairs, n_d, 2.0, &mut grad);

    // Smoothness term
    let mut smooth_total = 0.0;
    for r in 0..height {
        for c in 0..width - 1 {
            let d = p[idx(r, c + 1)] - p[idx(r, c)];
            smooth_total += d * d;
            let g = weights.smoothness * 0.1 * 2.0 * d / n_h;
            grad[idx(r, c + 1)] += g;
            grad[idx(r, c)] -= g;
        }
    }
    let smooth_value = 0.1 * smooth_total / n_h;

    let value = weights.ramp * ramp_value
        + weights.chess * chess_value
        + weights.smoothness * smooth_value;

    analytic_loss(prediction, value, grad)
}
