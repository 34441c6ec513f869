//! High-level training loop
//!
//! Loss functions, a callback system with early stopping, training
//! configuration and metrics, and a `Trainer` that runs fixed-epoch
//! mini-batch fits with a held-out validation split.

pub mod callback;
mod config;
pub(crate) mod loss;
mod trainer;

pub use callback::{
    CallbackAction, CallbackContext, CallbackManager, EarlyStopping, ProgressCallback,
    TrainerCallback,
};
pub use config::{MetricsTracker, TrainConfig};
pub use loss::{BceWithLogitsLoss, LossFn, MSELoss};
pub use trainer::{FitResult, Trainer};
