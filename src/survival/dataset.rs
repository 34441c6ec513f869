//! Preprocessed datasets and the ordered train/validation split

use super::csv::Row;
use super::features::Preprocessor;
use crate::{Error, Result};

/// Training rows turned into aligned feature vectors and {0,1} labels.
/// Rows that fail extraction are dropped from both sides together.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    pub features: Vec<Vec<f32>>,
    pub labels: Vec<f32>,
}

impl TrainDataset {
    pub fn build(rows: &[Row], preprocessor: &Preprocessor) -> Result<Self> {
        let mut features = Vec::with_capacity(rows.len());
        let mut labels = Vec::with_capacity(rows.len());
        let mut dropped = 0usize;

        for row in rows {
            let survived = match row.number("Survived") {
                Some(s) => {
                    if s == 0.0 {
                        0.0
                    } else {
                        1.0
                    }
                }
                None => {
                    dropped += 1;
                    continue;
                }
            };
            match preprocessor.transform(row) {
                Ok(v) => {
                    features.push(v);
                    labels.push(survived);
                }
                Err(_) => dropped += 1,
            }
        }

        if dropped > 0 {
            eprintln!("dropped {dropped} training row(s) during feature extraction");
        }
        if features.is_empty() {
            return Err(Error::FeatureExtraction(
                "no usable training rows after extraction".into(),
            ));
        }
        Ok(Self { features, labels })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Test rows with their passenger identifiers, aligned after drops
#[derive(Debug, Clone)]
pub struct TestDataset {
    pub features: Vec<Vec<f32>>,
    pub passenger_ids: Vec<i64>,
}

impl TestDataset {
    pub fn build(rows: &[Row], preprocessor: &Preprocessor) -> Result<Self> {
        let mut features = Vec::with_capacity(rows.len());
        let mut passenger_ids = Vec::with_capacity(rows.len());
        let mut dropped = 0usize;

        for row in rows {
            let id = match row.number("PassengerId") {
                Some(id) => id as i64,
                None => {
                    dropped += 1;
                    continue;
                }
            };
            match preprocessor.transform(row) {
                Ok(v) => {
                    features.push(v);
                    passenger_ids.push(id);
                }
                Err(_) => dropped += 1,
            }
        }

        if dropped > 0 {
            eprintln!("dropped {dropped} test row(s) during feature extraction");
        }
        if features.is_empty() {
            return Err(Error::FeatureExtraction(
                "no usable test rows after extraction".into(),
            ));
        }
        Ok(Self {
            features,
            passenger_ids,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Ordered split: the first `1 - validation_split` of rows train, the
/// remainder validate. No shuffling.
pub fn ordered_split(
    dataset: &TrainDataset,
    validation_split: f32,
) -> (
    (&[Vec<f32>], &[f32]),
    (&[Vec<f32>], &[f32]),
) {
    let n = dataset.len();
    let train_len = ((n as f32) * (1.0 - validation_split)).floor() as usize;
    let train_len = train_len.clamp(1, n);
    let (fx, vx) = dataset.features.split_at(train_len);
    let (fy, vy) = dataset.labels.split_at(train_len);
    ((fx, fy), (vx, vy))
}
