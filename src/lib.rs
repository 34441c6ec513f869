//! # Aprendiz: Training Demos on a Tape-Based Autograd Engine
//!
//! Aprendiz bundles two small, independent training pipelines on top of a
//! shared autograd/optimizer layer:
//!
//! - **pattern**: trains a "baseline" network to copy a random 16x16 grid
//!   while a "student" network is pushed toward a chess-like horizontal
//!   gradient by three hand-written loss terms.
//! - **survival**: a tabular binary-classification pipeline — CSV parsing,
//!   imputation/standardization/one-hot features, mini-batch training with
//!   early stopping, confusion/ROC/AUC evaluation and CSV export.
//!
//! ## Architecture
//!
//! - **autograd**: Tensor with a gradient tape and chained backward ops
//! - **optim**: Adam optimizer and gradient clipping
//! - **nn**: dense layers and the `Mlp` container
//! - **train**: loss functions, callbacks (early stopping), generic trainer
//! - **pattern**: Demo A loss library, model factory and session
//! - **survival**: Demo B CSV/feature pipeline, evaluator and exporter
//! - **io**: model artifact saving and loading (JSON, YAML)

pub mod autograd;
pub mod error;
pub mod io;
pub mod nn;
pub mod optim;
pub mod pattern;
pub mod survival;
pub mod train;

// Re-export commonly used types
pub use autograd::{backward, Tensor};
pub use error::{Error, Result};
