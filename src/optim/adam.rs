//! Adam optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Exponentially decayed gradient statistics for one parameter tensor
struct Moments {
    mean: Array1<f32>,
    variance: Array1<f32>,
}

impl Moments {
    fn zeros(len: usize) -> Self {
        Self {
            mean: Array1::zeros(len),
            variance: Array1::zeros(len),
        }
    }
}

/// Adam: per-element step sizes from running first and second gradient
/// moments, with the bias correction folded into the step size.
///
/// Moment state is allocated on the first `step` call, one entry per
/// parameter, so the same optimizer must always be fed the parameter
/// slice in the same order.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    state: Vec<Moments>,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            epsilon,
            t: 0,
            state: Vec::new(),
        }
    }

    /// Adam with the usual β1=0.9, β2=0.999, ε=1e-8
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [&mut Tensor]) {
        if self.state.is_empty() {
            self.state = params.iter().map(|p| Moments::zeros(p.len())).collect();
        }
        self.t += 1;

        let step_size = self.lr * (1.0 - self.beta2.powi(self.t as i32)).sqrt()
            / (1.0 - self.beta1.powi(self.t as i32));

        for (param, moments) in params.iter_mut().zip(&mut self.state) {
            let grad = match param.grad() {
                Some(g) => g,
                None => continue,
            };

            moments.mean = &moments.mean * self.beta1 + &grad * (1.0 - self.beta1);
            moments.variance =
                &moments.variance * self.beta2 + grad.mapv(|g| g * g) * (1.0 - self.beta2);

            let denom = moments.variance.mapv(f32::sqrt) + self.epsilon;
            let update = &moments.mean / &denom * step_size;
            let new_data = param.data() - &update;
            *param.data_mut() = new_data;
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_against_gradient() {
        let mut opt = Adam::default_params(0.1);
        let mut param = Tensor::from_vec(vec![1.0], true);
        param.set_grad(Array1::from(vec![1.0]));

        opt.step(&mut [&mut param]);
        assert!(param.data()[0] < 1.0);
    }

    #[test]
    fn converges_on_quadratic() {
        // minimize f(x) = (x - 3)^2, gradient 2(x - 3)
        let mut opt = Adam::default_params(0.1);
        let mut x = Tensor::from_vec(vec![0.0], true);

        for _ in 0..500 {
            let g = 2.0 * (x.data()[0] - 3.0);
            x.zero_grad();
            x.set_grad(Array1::from(vec![g]));
            opt.step(&mut [&mut x]);
        }

        assert!((x.data()[0] - 3.0).abs() < 1e-2);
    }

    #[test]
    fn skips_params_without_gradients() {
        let mut opt = Adam::default_params(0.1);
        let mut param = Tensor::from_vec(vec![1.0], true);

        opt.step(&mut [&mut param]);
        assert_eq!(param.data()[0], 1.0);
    }

    #[test]
    fn moment_state_is_tracked_per_parameter() {
        // Two parameters, only the second gets gradients: its momentum
        // must build up across steps while the first stays untouched.
        let mut opt = Adam::default_params(0.1);
        let mut frozen = Tensor::from_vec(vec![2.0], true);
        let mut active = Tensor::from_vec(vec![1.0], true);

        let mut previous = active.data()[0];
        for _ in 0..3 {
            active.zero_grad();
            active.set_grad(Array1::from(vec![1.0]));
            opt.step(&mut [&mut frozen, &mut active]);

            assert_eq!(frozen.data()[0], 2.0);
            assert!(active.data()[0] < previous);
            previous = active.data()[0];
        }
    }

    #[test]
    fn lr_accessors() {
        let mut opt = Adam::default_params(0.01);
        assert_eq!(opt.lr(), 0.01);
        opt.set_lr(0.001);
        assert_eq!(opt.lr(), 0.001);
    }
}
