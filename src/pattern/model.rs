//! Network construction for the pattern demo

use crate::nn::{Activation, Mlp};
use rand::Rng;

/// Grid side length; both networks map a flattened grid to a grid.
pub const GRID_SIZE: usize = 16;
const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// Student architecture selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchVariant {
    /// 512-unit hidden layer
    #[default]
    Default,
    /// Narrow 32-unit bottleneck
    Compression,
    /// Two hidden layers, 128 then 256
    Transformation,
}

impl ArchVariant {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "default" => Some(Self::Default),
            "compression" => Some(Self::Compression),
            "transformation" => Some(Self::Transformation),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Compression => "compression",
            Self::Transformation => "transformation",
        }
    }
}

/// Baseline: 256 -> 64 relu -> 256 sigmoid, trained to reproduce its input
pub fn build_baseline<R: Rng>(rng: &mut R) -> Mlp {
    Mlp::new(
        GRID_CELLS,
        &[(64, Activation::Relu), (GRID_CELLS, Activation::Sigmoid)],
        rng,
    )
}

/// Student network for the composite objective, shaped by the variant
pub fn build_student<R: Rng>(variant: ArchVariant, rng: &mut R) -> Mlp {
    let layers: Vec<(usize, Activation)> = match variant {
        ArchVariant::Compression => {
            vec![(32, Activation::Relu), (GRID_CELLS, Activation::Sigmoid)]
        }
        ArchVariant::Transformation => vec![
            (128, Activation::Relu),
            (256, Activation::Relu),
            (GRID_CELLS, Activation::Sigmoid),
        ],
        ArchVariant::Default => {
            vec![(512, Activation::Relu), (GRID_CELLS, Activation::Sigmoid)]
        }
    };
    Mlp::new(GRID_CELLS, &layers, rng)
}
