//! Error types for aprendiz

use thiserror::Error;

/// Failure taxonomy shared by both demo pipelines.
///
/// Every operation boundary catches into one of these variants; numeric edge
/// cases (zero denominators in metrics or standardization) resolve to defined
/// fallbacks instead of surfacing here.
#[derive(Error, Debug)]
pub enum Error {
    /// A required file or prior pipeline step is not available yet.
    #[error("input missing: {0}")]
    InputMissing(String),

    /// Malformed CSV input; no partial state is committed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A single row could not be turned into a feature vector. Non-fatal,
    /// the row is dropped by the caller.
    #[error("feature extraction failed: {0}")]
    FeatureExtraction(String),

    /// Training or prediction failed; the last good state is retained.
    #[error("training failed: {0}")]
    Training(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;
