//! Model persistence: architecture plus weights in JSON or YAML,
//! chosen by file extension.

mod save;

pub use save::{load_model, save_model, ModelMetadata, SavedLayer, SavedModel};
