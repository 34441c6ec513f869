//! Trainer abstraction for fixed-epoch mini-batch fits

use super::callback::{CallbackAction, CallbackContext, CallbackManager, TrainerCallback};
use super::{LossFn, MetricsTracker, TrainConfig};
use crate::autograd::{backward, scale};
use crate::nn::Mlp;
use crate::optim::{clip_grad_norm, Optimizer};
use crate::{Error, Result, Tensor};
use std::time::Instant;

/// Result of a training run
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Epochs actually completed
    pub epochs_run: usize,
    /// Training loss of the last epoch
    pub final_loss: f32,
    /// Best validation loss observed (when a split was used)
    pub best_val_loss: Option<f32>,
    /// Whether a callback stopped training before the configured epochs ran out
    pub stopped_early: bool,
    /// Total training time in seconds
    pub elapsed_secs: f64,
}

/// Orchestrates the training loop for a single-output `Mlp`.
///
/// Batches are visited in the original row order; the per-epoch validation
/// loss is computed on the held-out slice and handed to callbacks, which is
/// where `EarlyStopping` makes its decision.
pub struct Trainer {
    model: Mlp,
    optimizer: Box<dyn Optimizer>,
    loss_fn: Box<dyn LossFn>,
    config: TrainConfig,
    pub metrics: MetricsTracker,
    callbacks: CallbackManager,
    start_time: Option<Instant>,
}

impl Trainer {
    pub fn new(
        model: Mlp,
        optimizer: Box<dyn Optimizer>,
        loss_fn: Box<dyn LossFn>,
        config: TrainConfig,
    ) -> Self {
        Self {
            model,
            optimizer,
            loss_fn,
            config,
            metrics: MetricsTracker::new(),
            callbacks: CallbackManager::new(),
            start_time: None,
        }
    }

    pub fn add_callback<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.add(callback);
    }

    pub fn model(&self) -> &Mlp {
        &self.model
    }

    pub fn into_model(self) -> Mlp {
        self.model
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    fn build_context(
        &self,
        epoch: usize,
        step: usize,
        steps_per_epoch: usize,
        loss: f32,
        val_loss: Option<f32>,
    ) -> CallbackContext {
        CallbackContext {
            epoch,
            max_epochs: self.config.epochs,
            step,
            steps_per_epoch,
            global_step: self.metrics.steps,
            loss,
            lr: self.optimizer.lr(),
            val_loss,
            elapsed_secs: self
                .start_time
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        }
    }

    /// Raw model outputs for one sample
    pub fn predict(&self, features: &[f32]) -> Vec<f32> {
        let x = Tensor::from_vec(features.to_vec(), false);
        self.model.forward(&x).data().to_vec()
    }

    /// Mean loss over a sample set, forward passes only
    pub fn evaluate_loss(&self, features: &[Vec<f32>], labels: &[f32]) -> f32 {
        if features.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for (x, &y) in features.iter().zip(labels.iter()) {
            let input = Tensor::from_vec(x.clone(), false);
            let pred = self.model.forward(&input);
            let target = Tensor::from_vec(vec![y; pred.len()], false);
            total += self.loss_fn.forward(&pred, &target).item();
        }
        total / features.len() as f32
    }

    /// Train for the configured number of epochs (or until a callback stops).
    ///
    /// `features` and `labels` must be index-aligned; `validation` is an
    /// optional held-out slice evaluated after every epoch.
    pub fn fit(
        &mut self,
        features: &[Vec<f32>],
        labels: &[f32],
        validation: Option<(&[Vec<f32>], &[f32])>,
    ) -> Result<FitResult> {
        if features.is_empty() {
            return Err(Error::Training("no training samples".into()));
        }
        if features.len() != labels.len() {
            return Err(Error::Training(format!(
                "features/labels misaligned: {} vs {}",
                features.len(),
                labels.len()
            )));
        }

        self.start_time = Some(Instant::now());
        let mut stopped_early = false;
        let mut final_loss = 0.0;
        let mut best_val: Option<f32> = None;

        let batch_size = self.config.batch_size.max(1);
        let steps_per_epoch = features.len().div_ceil(batch_size);

        let ctx = self.build_context(0, 0, steps_per_epoch, 0.0, None);
        self.callbacks.on_train_begin(&ctx);

        for epoch in 0..self.config.epochs {
            let mut epoch_total = 0.0;

            for (step, (batch_x, batch_y)) in features
                .chunks(batch_size)
                .zip(labels.chunks(batch_size))
                .enumerate()
            {
                let batch_loss = self.train_batch(batch_x, batch_y)?;
                epoch_total += batch_loss * batch_x.len() as f32;
                self.metrics.increment_step();

                let ctx = self.build_context(epoch, step, steps_per_epoch, batch_loss, None);
                if self.callbacks.on_step_end(&ctx) == CallbackAction::Stop {
                    stopped_early = true;
                    break;
                }
            }

            if stopped_early {
                break;
            }

            final_loss = epoch_total / features.len() as f32;
            if !final_loss.is_finite() {
                return Err(Error::Training(format!(
                    "non-finite training loss at epoch {epoch}"
                )));
            }

            let val_loss = validation.map(|(vx, vy)| self.evaluate_loss(vx, vy));
            if let Some(v) = val_loss {
                if best_val.map_or(true, |b| v < b) {
                    best_val = Some(v);
                }
            }

            self.metrics.record_epoch(final_loss, val_loss);

            let ctx =
                self.build_context(epoch, steps_per_epoch, steps_per_epoch, final_loss, val_loss);
            if self.callbacks.on_epoch_end(&ctx) == CallbackAction::Stop {
                stopped_early = true;
                break;
            }
        }

        let ctx = self.build_context(self.metrics.epoch, 0, steps_per_epoch, final_loss, None);
        self.callbacks.on_train_end(&ctx);

        Ok(FitResult {
            epochs_run: self.metrics.epoch,
            final_loss,
            best_val_loss: best_val,
            stopped_early,
            elapsed_secs: self
                .start_time
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
        })
    }

    /// One optimizer step over a mini-batch: gradients from every sample are
    /// accumulated (each scaled by 1/batch_len) before the update.
    fn train_batch(&mut self, batch_x: &[Vec<f32>], batch_y: &[f32]) -> Result<f32> {
        self.model.zero_grad();

        let inv = 1.0 / batch_x.len() as f32;
        let mut total = 0.0;

        for (x, &y) in batch_x.iter().zip(batch_y.iter()) {
            let input = Tensor::from_vec(x.clone(), false);
            let pred = self.model.forward(&input);
            let target = Tensor::from_vec(vec![y; pred.len()], false);

            let loss = self.loss_fn.forward(&pred, &target);
            total += loss.item();

            let scaled = scale(&loss, inv);
            backward(&scaled, None);
        }

        let batch_loss = total * inv;
        if !batch_loss.is_finite() {
            return Err(Error::Training("non-finite batch loss".into()));
        }

        let mut params = self.model.params_mut();
        if let Some(max_norm) = self.config.max_grad_norm {
            clip_grad_norm(&params, max_norm);
        }
        self.optimizer.step(&mut params);

        Ok(batch_loss)
    }
}
