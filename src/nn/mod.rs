//! Dense layers and the sequential `Mlp` container

use crate::autograd::{affine, relu, sigmoid};
use crate::Tensor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation applied after a layer's affine transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    /// No activation: the layer emits raw logits
    Identity,
}

impl Activation {
    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Activation::Relu => relu(x),
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x.clone(),
        }
    }
}

/// Shape and activation of one dense layer, serializable for model artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub in_dim: usize,
    pub out_dim: usize,
    pub activation: Activation,
}

/// Fully-connected layer with a flattened `[out_dim * in_dim]` weight matrix
pub struct Dense {
    w: Tensor,
    b: Tensor,
    spec: LayerSpec,
}

impl Dense {
    /// Xavier-uniform initialized layer
    pub fn new<R: Rng>(in_dim: usize, out_dim: usize, activation: Activation, rng: &mut R) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let w_data: Vec<f32> = (0..out_dim * in_dim)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();

        Self {
            w: Tensor::from_vec(w_data, true),
            b: Tensor::zeros(out_dim, true),
            spec: LayerSpec {
                in_dim,
                out_dim,
                activation,
            },
        }
    }

    /// Layer with explicit weights (used when loading an artifact)
    pub fn from_weights(spec: LayerSpec, w: Vec<f32>, b: Vec<f32>) -> Self {
        assert_eq!(w.len(), spec.out_dim * spec.in_dim, "weight size mismatch");
        assert_eq!(b.len(), spec.out_dim, "bias size mismatch");
        Self {
            w: Tensor::from_vec(w, true),
            b: Tensor::from_vec(b, true),
            spec,
        }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        let z = affine(&self.w, &self.b, x, self.spec.out_dim, self.spec.in_dim);
        self.spec.activation.apply(&z)
    }

    pub fn spec(&self) -> LayerSpec {
        self.spec
    }

    pub fn weight(&self) -> &Tensor {
        &self.w
    }

    pub fn bias(&self) -> &Tensor {
        &self.b
    }
}

/// Sequential stack of dense layers
pub struct Mlp {
    layers: Vec<Dense>,
}

impl Mlp {
    /// Build from `(out_dim, activation)` layer definitions, chaining input
    /// widths from `input_dim`.
    pub fn new<R: Rng>(input_dim: usize, defs: &[(usize, Activation)], rng: &mut R) -> Self {
        let mut layers = Vec::with_capacity(defs.len());
        let mut in_dim = input_dim;
        for &(out_dim, activation) in defs {
            layers.push(Dense::new(in_dim, out_dim, activation, rng));
            in_dim = out_dim;
        }
        Self { layers }
    }

    pub fn from_layers(layers: Vec<Dense>) -> Self {
        Self { layers }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.forward(&out);
        }
        out
    }

    /// Mutable borrows of every parameter, in layer order (weight, bias)
    pub fn params_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = Vec::with_capacity(self.layers.len() * 2);
        for layer in &mut self.layers {
            params.push(&mut layer.w);
            params.push(&mut layer.b);
        }
        params
    }

    pub fn zero_grad(&self) {
        for layer in &self.layers {
            layer.w.zero_grad();
            layer.b.zero_grad();
        }
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn specs(&self) -> Vec<LayerSpec> {
        self.layers.iter().map(|l| l.spec).collect()
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map(|l| l.spec.in_dim).unwrap_or(0)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.spec.out_dim).unwrap_or(0)
    }

    /// Total number of trainable scalars
    pub fn param_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.w.len() + l.b.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::backward;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn forward_produces_requested_width() {
        let mlp = Mlp::new(
            4,
            &[(8, Activation::Relu), (2, Activation::Sigmoid)],
            &mut rng(),
        );
        let x = Tensor::from_vec(vec![0.1, 0.2, 0.3, 0.4], false);
        let y = mlp.forward(&x);

        assert_eq!(y.len(), 2);
        assert_eq!(mlp.input_dim(), 4);
        assert_eq!(mlp.output_dim(), 2);
    }

    #[test]
    fn sigmoid_output_stays_in_unit_interval() {
        let mlp = Mlp::new(3, &[(5, Activation::Sigmoid)], &mut rng());
        let x = Tensor::from_vec(vec![10.0, -10.0, 3.0], false);
        let y = mlp.forward(&x);

        for &v in y.data() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn backward_fills_every_parameter_gradient() {
        let mut mlp = Mlp::new(
            2,
            &[(3, Activation::Relu), (1, Activation::Identity)],
            &mut rng(),
        );
        let x = Tensor::from_vec(vec![1.0, -0.5], false);
        let y = mlp.forward(&x);
        backward(&y, None);

        // Bias gradients always flow; weight gradients can be relu-masked.
        for (i, p) in mlp.params_mut().iter().enumerate() {
            if i % 2 == 1 {
                assert!(p.grad().is_some(), "bias {i} missing gradient");
            }
        }
    }

    #[test]
    fn param_count_matches_shapes() {
        let mlp = Mlp::new(4, &[(8, Activation::Relu), (2, Activation::Identity)], &mut rng());
        // (4*8 + 8) + (8*2 + 2)
        assert_eq!(mlp.param_count(), 58);
    }

    #[test]
    fn seeded_init_is_deterministic() {
        let a = Mlp::new(4, &[(3, Activation::Relu)], &mut rng());
        let b = Mlp::new(4, &[(3, Activation::Relu)], &mut rng());
        assert_eq!(a.layers()[0].weight().data(), b.layers()[0].weight().data());
    }
}
