//! Optimizers for training

mod adam;
mod optimizer;

pub use adam::Adam;
pub use optimizer::{clip_grad_norm, Optimizer};
