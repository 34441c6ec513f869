//! Callback system for training events
//!
//! Hooks for training-loop events: `on_train_begin` / `on_train_end`,
//! `on_epoch_end` and `on_step_end`. Early stopping is implemented as a
//! callback observing the per-epoch validation loss.

/// Context passed to callbacks with current training state
#[derive(Clone, Debug, Default)]
pub struct CallbackContext {
    /// Current epoch (0-indexed)
    pub epoch: usize,
    /// Total epochs planned
    pub max_epochs: usize,
    /// Current step within epoch
    pub step: usize,
    /// Total steps in epoch
    pub steps_per_epoch: usize,
    /// Global step count
    pub global_step: usize,
    /// Current training loss
    pub loss: f32,
    /// Current learning rate
    pub lr: f32,
    /// Validation loss for the finished epoch (if a split is used)
    pub val_loss: Option<f32>,
    /// Training duration in seconds
    pub elapsed_secs: f64,
}

/// Action to take after a callback
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    /// Continue training normally
    Continue,
    /// Stop training (early stopping)
    Stop,
}

/// Trait for training callbacks. All methods default to no-ops, so an
/// implementation only overrides the events it cares about.
pub trait TrainerCallback {
    fn on_train_begin(&mut self, _ctx: &CallbackContext) {}

    fn on_train_end(&mut self, _ctx: &CallbackContext) {}

    fn on_epoch_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    fn on_step_end(&mut self, _ctx: &CallbackContext) -> CallbackAction {
        CallbackAction::Continue
    }

    /// Callback name for logging
    fn name(&self) -> &str {
        "TrainerCallback"
    }
}

// =============================================================================
// Early Stopping Callback
// =============================================================================

/// Halts training once the monitored loss stops improving.
///
/// Tracks the best validation loss seen and a wait counter: the counter
/// resets to zero whenever a loss lower than `best - min_delta` is observed,
/// otherwise it increments; once it reaches `patience`, training stops.
/// Falls back to the training loss when no validation loss is available.
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    patience: usize,
    min_delta: f32,
    best_loss: f32,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize, min_delta: f32) -> Self {
        Self {
            patience,
            min_delta,
            best_loss: f32::INFINITY,
            wait: 0,
        }
    }

    /// Patience-only construction: any strictly lower loss resets the counter
    pub fn with_patience(patience: usize) -> Self {
        Self::new(patience, 0.0)
    }

    pub fn reset(&mut self) {
        self.best_loss = f32::INFINITY;
        self.wait = 0;
    }

    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    fn observe(&mut self, loss: f32) {
        if loss < self.best_loss - self.min_delta {
            self.best_loss = loss;
            self.wait = 0;
        } else {
            self.wait += 1;
        }
    }
}

impl TrainerCallback for EarlyStopping {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let loss = ctx.val_loss.unwrap_or(ctx.loss);
        self.observe(loss);

        if self.wait >= self.patience {
            eprintln!(
                "Early stopping: no improvement for {} epochs (best loss: {:.4})",
                self.patience, self.best_loss
            );
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    fn name(&self) -> &str {
        "EarlyStopping"
    }
}

// =============================================================================
// Progress Callback
// =============================================================================

/// Logs epoch progress to stdout
#[derive(Clone, Debug)]
pub struct ProgressCallback {
    log_interval: usize,
}

impl ProgressCallback {
    pub fn new(log_interval: usize) -> Self {
        Self {
            log_interval: log_interval.max(1),
        }
    }
}

impl Default for ProgressCallback {
    fn default() -> Self {
        Self { log_interval: 10 }
    }
}

impl TrainerCallback for ProgressCallback {
    fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        if (ctx.epoch + 1) % self.log_interval == 0 || ctx.epoch + 1 == ctx.max_epochs {
            let val_str = ctx
                .val_loss
                .map(|v| format!(", val_loss: {v:.4}"))
                .unwrap_or_default();

            println!(
                "Epoch {}/{}: loss: {:.4}{} ({:.1}s)",
                ctx.epoch + 1,
                ctx.max_epochs,
                ctx.loss,
                val_str,
                ctx.elapsed_secs
            );
        }
        CallbackAction::Continue
    }

    fn name(&self) -> &str {
        "ProgressCallback"
    }
}

// =============================================================================
// Callback Manager
// =============================================================================

/// Manages multiple callbacks and dispatches events
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn on_train_begin(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_train_begin(ctx);
        }
    }

    pub fn on_train_end(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx);
        }
    }

    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    pub fn on_step_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_step_end(ctx) == CallbackAction::Stop {
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Property Tests
// =============================================================================
