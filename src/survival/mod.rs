//! Tabular survival-classification pipeline: CSV parsing, feature
//! engineering, a small classifier trained with early stopping, threshold
//! evaluation, and CSV/model exports.

mod csv;
mod dataset;
mod evaluate;
mod export;
mod features;
mod model;
mod session;

pub use csv::{parse_csv, Row, Value};
pub use dataset::{ordered_split, TestDataset, TrainDataset};
pub use evaluate::{auc, confusion_matrix, feature_importance, roc_curve, ConfusionCounts, Evaluation};
pub use export::{write_probabilities, write_submission};
pub use features::{ImputationStats, Preprocessor};
pub use model::build_classifier;
pub use session::{ColumnSummary, InspectReport, PipelineSession, TrainSummary};
