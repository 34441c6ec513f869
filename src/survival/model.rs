//! Classifier construction for the survival pipeline

use crate::nn::{Activation, Mlp};
use rand::Rng;

/// Two-layer binary classifier emitting a single logit.
///
/// Sigmoid is applied at prediction time, not inside the network, so
/// training can use the numerically stable logit-space loss.
pub fn build_classifier<R: Rng>(feature_count: usize, rng: &mut R) -> Mlp {
    Mlp::new(
        feature_count,
        &[(16, Activation::Relu), (1, Activation::Identity)],
        rng,
    )
}
