//! Staged pipeline session: load, inspect, preprocess, create-model,
//! train, evaluate, predict, export.
//!
//! Each stage requires its predecessors and fails with `InputMissing`
//! when invoked out of order, leaving prior state untouched.

use super::csv::{parse_csv, Row};
use super::dataset::{ordered_split, TestDataset, TrainDataset};
use super::evaluate::{self, Evaluation};
use super::export::{write_probabilities, write_submission};
use super::features::Preprocessor;
use super::model::build_classifier;
use crate::io::{save_model, ModelMetadata};
use crate::optim::Adam;
use crate::train::{BceWithLogitsLoss, EarlyStopping, ProgressCallback, TrainConfig, Trainer};
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

const LEARNING_RATE: f32 = 0.001;
const SUBMISSION_THRESHOLD: f32 = 0.5;

/// Per-column overview produced by `inspect`
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub missing: usize,
}

#[derive(Debug, Clone)]
pub struct InspectReport {
    pub train_rows: usize,
    pub test_rows: Option<usize>,
    pub columns: Vec<ColumnSummary>,
}

/// Outcome of the training stage
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub epochs_run: usize,
    pub final_loss: f32,
    pub best_val_loss: Option<f32>,
    pub stopped_early: bool,
    pub train_size: usize,
    pub validation_size: usize,
}

pub struct PipelineSession {
    seed: u64,
    family_features: bool,
    verbose: bool,
    train_rows: Option<Vec<Row>>,
    test_rows: Option<Vec<Row>>,
    preprocessor: Option<Preprocessor>,
    train_data: Option<TrainDataset>,
    test_data: Option<TestDataset>,
    trainer: Option<Trainer>,
    trained: bool,
    val_labels: Vec<f32>,
    val_probabilities: Vec<f32>,
    test_probabilities: Option<Vec<f32>>,
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

impl PipelineSession {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            family_features: false,
            verbose: false,
            train_rows: None,
            test_rows: None,
            preprocessor: None,
            train_data: None,
            test_data: None,
            trainer: None,
            trained: false,
            val_labels: Vec::new(),
            val_probabilities: Vec::new(),
            test_probabilities: None,
        }
    }

    /// Toggle the derived family-size features; everything downstream of
    /// preprocessing is invalidated.
    pub fn set_family_features(&mut self, enabled: bool) {
        if self.family_features != enabled {
            self.family_features = enabled;
            self.invalidate_from_preprocess();
        }
    }

    pub fn family_features(&self) -> bool {
        self.family_features
    }

    /// Print per-epoch progress during training
    pub fn set_verbose(&mut self, on: bool) {
        self.verbose = on;
    }

    fn invalidate_from_preprocess(&mut self) {
        self.preprocessor = None;
        self.train_data = None;
        self.test_data = None;
        self.trainer = None;
        self.trained = false;
        self.val_labels.clear();
        self.val_probabilities.clear();
        self.test_probabilities = None;
    }

    pub fn load_train_csv(&mut self, text: &str) -> Result<usize> {
        let rows = parse_csv(text)?;
        if rows[0].get("Survived").is_none() {
            return Err(Error::Parse("training data lacks a Survived column".into()));
        }
        let n = rows.len();
        self.train_rows = Some(rows);
        self.invalidate_from_preprocess();
        Ok(n)
    }

    pub fn load_test_csv(&mut self, text: &str) -> Result<usize> {
        let rows = parse_csv(text)?;
        if rows[0].get("PassengerId").is_none() {
            return Err(Error::Parse("test data lacks a PassengerId column".into()));
        }
        let n = rows.len();
        self.test_rows = Some(rows);
        self.test_data = None;
        self.test_probabilities = None;
        Ok(n)
    }

    fn require_train_rows(&self) -> Result<&Vec<Row>> {
        self.train_rows
            .as_ref()
            .ok_or_else(|| Error::InputMissing("no training CSV loaded".into()))
    }

    /// Row counts and per-column missing-value tallies for the loaded data
    pub fn inspect(&self) -> Result<InspectReport> {
        let rows = self.require_train_rows()?;
        let columns = rows[0]
            .columns()
            .iter()
            .map(|name| ColumnSummary {
                name: name.clone(),
                missing: rows
                    .iter()
                    .filter(|r| r.get(name).map(|v| v.is_null()).unwrap_or(true))
                    .count(),
            })
            .collect();
        Ok(InspectReport {
            train_rows: rows.len(),
            test_rows: self.test_rows.as_ref().map(Vec::len),
            columns,
        })
    }

    /// Fit imputation statistics on the training rows and vectorize both
    /// datasets. Returns (train rows kept, test rows kept).
    pub fn preprocess(&mut self) -> Result<(usize, Option<usize>)> {
        let rows = self.require_train_rows()?;
        let preprocessor = Preprocessor::fit(rows, self.family_features);
        let train_data = TrainDataset::build(rows, &preprocessor)?;
        let test_data = match &self.test_rows {
            Some(test_rows) => Some(TestDataset::build(test_rows, &preprocessor)?),
            None => None,
        };

        let kept = (train_data.len(), test_data.as_ref().map(TestDataset::len));
        self.preprocessor = Some(preprocessor);
        self.train_data = Some(train_data);
        self.test_data = test_data;
        self.trainer = None;
        self.trained = false;
        Ok(kept)
    }

    pub fn preprocessor(&self) -> Option<&Preprocessor> {
        self.preprocessor.as_ref()
    }

    fn build_trainer(&self, feature_count: usize) -> Trainer {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let model = build_classifier(feature_count, &mut rng);
        let mut trainer = Trainer::new(
            model,
            Box::new(Adam::default_params(LEARNING_RATE)),
            Box::new(BceWithLogitsLoss),
            TrainConfig::new()
                .with_epochs(50)
                .with_batch_size(32)
                .with_validation_split(0.2),
        );
        trainer.add_callback(EarlyStopping::with_patience(5));
        if self.verbose {
            trainer.add_callback(ProgressCallback::default());
        }
        trainer
    }

    /// Build the classifier sized to the current feature width; returns
    /// its parameter count.
    pub fn create_model(&mut self) -> Result<usize> {
        let feature_count = self
            .preprocessor
            .as_ref()
            .ok_or_else(|| Error::InputMissing("preprocess before creating a model".into()))?
            .feature_count();
        let trainer = self.build_trainer(feature_count);
        let params = trainer.model().param_count();
        self.trainer = Some(trainer);
        self.trained = false;
        Ok(params)
    }

    /// Fit on the first 80% of rows, validating on the remaining 20%,
    /// with early stopping at patience 5 on validation loss.
    pub fn train(&mut self) -> Result<TrainSummary> {
        if self.trainer.is_none() {
            return Err(Error::InputMissing("create a model before training".into()));
        }
        // Optimizer moments, early-stopping state and epoch counters all
        // carry over from a previous fit, so a re-train starts from a
        // freshly built trainer.
        if self.trained {
            let feature_count = self
                .preprocessor
                .as_ref()
                .ok_or_else(|| Error::InputMissing("preprocess before training".into()))?
                .feature_count();
            let trainer = self.build_trainer(feature_count);
            self.trainer = Some(trainer);
            self.trained = false;
        }
        let train_data = self
            .train_data
            .as_ref()
            .ok_or_else(|| Error::InputMissing("preprocess before training".into()))?;
        let trainer = self
            .trainer
            .as_mut()
            .ok_or_else(|| Error::InputMissing("create a model before training".into()))?;

        let split = trainer.config().validation_split;
        let ((train_x, train_y), (val_x, val_y)) = ordered_split(train_data, split);

        let result = trainer.fit(train_x, train_y, Some((val_x, val_y)))?;

        self.val_labels = val_y.to_vec();
        self.val_probabilities = val_x
            .iter()
            .map(|x| sigmoid(trainer.predict(x)[0]))
            .collect();
        self.trained = true;

        Ok(TrainSummary {
            epochs_run: result.epochs_run,
            final_loss: result.final_loss,
            best_val_loss: result.best_val_loss,
            stopped_early: result.stopped_early,
            train_size: train_x.len(),
            validation_size: val_x.len(),
        })
    }

    fn require_trained(&self) -> Result<&Trainer> {
        match (&self.trainer, self.trained) {
            (Some(trainer), true) => Ok(trainer),
            _ => Err(Error::InputMissing("train the model first".into())),
        }
    }

    /// Confusion metrics on the validation slice at an adjustable
    /// threshold; cheap enough to drive from a slider.
    pub fn evaluate(&self, threshold: f32) -> Result<Evaluation> {
        self.require_trained()?;
        Ok(evaluate::confusion_matrix(
            &self.val_labels,
            &self.val_probabilities,
            threshold,
        ))
    }

    pub fn roc_curve(&self) -> Result<Vec<(f32, f32)>> {
        self.require_trained()?;
        Ok(evaluate::roc_curve(&self.val_labels, &self.val_probabilities))
    }

    pub fn auc(&self) -> Result<f32> {
        self.require_trained()?;
        Ok(evaluate::auc(&self.val_labels, &self.val_probabilities))
    }

    pub fn feature_importance(&self) -> Result<Vec<(&'static str, f32)>> {
        let trainer = self.require_trained()?;
        let preprocessor = self
            .preprocessor
            .as_ref()
            .ok_or_else(|| Error::InputMissing("preprocess before ranking features".into()))?;
        Ok(evaluate::feature_importance(
            trainer.model(),
            &preprocessor.feature_names(),
        ))
    }

    /// Score the test set; returns the number of predictions made.
    pub fn predict(&mut self) -> Result<usize> {
        let trainer = match (&self.trainer, self.trained) {
            (Some(trainer), true) => trainer,
            _ => return Err(Error::InputMissing("train the model first".into())),
        };
        let test_data = self
            .test_data
            .as_ref()
            .ok_or_else(|| Error::InputMissing("no test CSV loaded and preprocessed".into()))?;

        let probabilities: Vec<f32> = test_data
            .features
            .iter()
            .map(|x| sigmoid(trainer.predict(x)[0]))
            .collect();
        let n = probabilities.len();
        self.test_probabilities = Some(probabilities);
        Ok(n)
    }

    /// Write `submission.csv`, `probabilities.csv`, and the model
    /// artifact into `dir`.
    pub fn export(&self, dir: &Path) -> Result<()> {
        let trainer = self.require_trained()?;
        let test_data = self
            .test_data
            .as_ref()
            .ok_or_else(|| Error::InputMissing("no test data to export".into()))?;
        let probabilities = self
            .test_probabilities
            .as_ref()
            .ok_or_else(|| Error::InputMissing("run predict before exporting".into()))?;

        write_submission(
            &dir.join("submission.csv"),
            &test_data.passenger_ids,
            probabilities,
            SUBMISSION_THRESHOLD,
        )?;
        write_probabilities(
            &dir.join("probabilities.csv"),
            &test_data.passenger_ids,
            probabilities,
        )?;

        let preprocessor = self
            .preprocessor
            .as_ref()
            .ok_or_else(|| Error::InputMissing("no fitted preprocessor".into()))?;
        let metadata = ModelMetadata {
            name: "survival-classifier".into(),
            input_dim: preprocessor.feature_count(),
            feature_names: preprocessor
                .feature_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        };
        save_model(&dir.join("model.json"), trainer.model(), metadata)?;
        Ok(())
    }
}
