//! Training configuration and metrics

/// Training configuration
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Number of epochs to run (early stopping may end the fit sooner)
    pub epochs: usize,

    /// Mini-batch size
    pub batch_size: usize,

    /// Fraction of the training data held out for validation, taken from the
    /// end of the set in original row order (no shuffling)
    pub validation_split: f32,

    /// Maximum gradient norm for clipping (None = no clipping)
    pub max_grad_norm: Option<f32>,

    /// Print training progress every N epochs
    pub log_interval: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            validation_split: 0.2,
            max_grad_norm: None,
            log_interval: 10,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_validation_split(mut self, split: f32) -> Self {
        self.validation_split = split.clamp(0.0, 0.9);
        self
    }

    pub fn with_grad_clip(mut self, max_norm: f32) -> Self {
        self.max_grad_norm = Some(max_norm);
        self
    }

    pub fn with_log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval.max(1);
        self
    }
}

/// Tracks training metrics across epochs
#[derive(Clone, Debug, Default)]
pub struct MetricsTracker {
    /// Training loss history (one per epoch)
    pub losses: Vec<f32>,

    /// Validation loss history (one per epoch, when a split is used)
    pub val_losses: Vec<f32>,

    /// Training step count
    pub steps: usize,

    /// Completed epochs
    pub epoch: usize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, loss: f32, val_loss: Option<f32>) {
        self.losses.push(loss);
        if let Some(v) = val_loss {
            self.val_losses.push(v);
        }
        self.epoch += 1;
    }

    pub fn increment_step(&mut self) {
        self.steps += 1;
    }

    /// Lowest validation loss observed so far
    pub fn best_val_loss(&self) -> Option<f32> {
        self.val_losses
            .iter()
            .copied()
            .fold(None, |best, v| match best {
                Some(b) if b <= v => Some(b),
                _ => Some(v),
            })
    }
}
