//! Interactive training session for the pattern demo.
//!
//! Owns the shared input grid, both networks, and their optimizers.
//! `step` advances both models once; `tick` drives the auto-run loop at a
//! fixed cadence. A step failure is logged and halts auto-running rather
//! than tearing the session down.

use super::grid::PixelGrid;
use super::loss::{self, student_loss_op, LossWeights};
use super::model::{build_baseline, build_student, ArchVariant, GRID_SIZE};
use crate::autograd::backward;
use crate::nn::Mlp;
use crate::optim::{Adam, Optimizer};
use crate::train::{LossFn, MSELoss};
use crate::{Error, Result, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::time::Duration;

const LEARNING_RATE: f32 = 0.01;
const AUTO_INTERVAL_MS: u64 = 40;
const LOG_CAPACITY: usize = 10;
const LOG_EVERY: usize = 10;

/// Whether the session is advancing on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    AutoRunning,
}

/// Display values produced by one training step
#[derive(Debug, Clone, Copy)]
pub struct StepReport {
    pub step: usize,
    pub baseline_loss: f32,
    pub student_loss: f32,
}

pub struct PatternSession {
    input: PixelGrid,
    baseline: Mlp,
    student: Mlp,
    baseline_optimizer: Adam,
    student_optimizer: Adam,
    weights: LossWeights,
    variant: ArchVariant,
    step: usize,
    run_state: RunState,
    auto_interval: Duration,
    log: VecDeque<String>,
    rng: StdRng,
}

impl PatternSession {
    pub fn new(variant: ArchVariant, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let input = PixelGrid::random(GRID_SIZE, GRID_SIZE, &mut rng);
        let baseline = build_baseline(&mut rng);
        let student = build_student(variant, &mut rng);

        let mut session = Self {
            input,
            baseline,
            student,
            baseline_optimizer: Adam::default_params(LEARNING_RATE),
            student_optimizer: Adam::default_params(LEARNING_RATE),
            weights: LossWeights::default(),
            variant,
            step: 0,
            run_state: RunState::Idle,
            auto_interval: Duration::from_millis(AUTO_INTERVAL_MS),
            log: VecDeque::with_capacity(LOG_CAPACITY),
            rng,
        };
        session.push_log(format!("initialized with \"{}\" architecture", variant.as_str()));
        session
    }

    pub fn input(&self) -> &PixelGrid {
        &self.input
    }

    pub fn step_count(&self) -> usize {
        self.step
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn variant(&self) -> ArchVariant {
        self.variant
    }

    /// Newest-first log lines, at most ten
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    pub fn baseline_prediction(&self) -> PixelGrid {
        self.render(&self.baseline)
    }

    pub fn student_prediction(&self) -> PixelGrid {
        self.render(&self.student)
    }

    fn render(&self, model: &Mlp) -> PixelGrid {
        let x = Tensor::from_vec(self.input.data().to_vec(), false);
        let out = model.forward(&x);
        PixelGrid::from_slice(GRID_SIZE, GRID_SIZE, &out.data().to_vec())
    }

    fn push_log(&mut self, line: String) {
        self.log.push_front(line);
        self.log.truncate(LOG_CAPACITY);
    }

    /// Advance both models by one optimizer step on the fixed input.
    ///
    /// The two updates are independent: each model's loss is backpropagated
    /// only through its own parameters before its own optimizer applies the
    /// update. Display losses are recomputed afterwards from fresh forward
    /// passes.
    pub fn step(&mut self) -> Result<StepReport> {
        self.step += 1;

        let input = Tensor::from_vec(self.input.data().to_vec(), false);

        // Baseline learns to reproduce its input under plain MSE.
        self.baseline.zero_grad();
        let pred = self.baseline.forward(&input);
        let loss = MSELoss.forward(&pred, &input);
        backward(&loss, None);
        let mut params = self.baseline.params_mut();
        self.baseline_optimizer.step(&mut params);

        // Student learns the composite objective.
        self.student.zero_grad();
        let pred = self.student.forward(&input);
        let loss = student_loss_op(&pred, GRID_SIZE, GRID_SIZE, &self.weights);
        backward(&loss, None);
        let mut params = self.student.params_mut();
        self.student_optimizer.step(&mut params);

        let baseline_loss = loss::mse(&self.input, &self.baseline_prediction());
        let student_loss = loss::student_loss(&self.student_prediction(), &self.weights);

        if !baseline_loss.is_finite() || !student_loss.is_finite() {
            return Err(Error::Training(format!(
                "non-finite loss at step {}",
                self.step
            )));
        }

        if self.step % LOG_EVERY == 0 {
            self.push_log(format!(
                "step {}: baseline={baseline_loss:.4} student={student_loss:.4}",
                self.step
            ));
        }

        Ok(StepReport {
            step: self.step,
            baseline_loss,
            student_loss,
        })
    }

    /// Flip between `Idle` and `AutoRunning`; returns the new state
    pub fn toggle_auto(&mut self) -> RunState {
        self.run_state = match self.run_state {
            RunState::Idle => RunState::AutoRunning,
            RunState::AutoRunning => RunState::Idle,
        };
        self.run_state
    }

    /// One auto-run iteration: wait out the cadence interval, then step.
    ///
    /// Returns `None` when idle. A failed step logs the error and drops
    /// back to `Idle` so the caller's loop terminates cleanly.
    pub fn tick(&mut self) -> Option<StepReport> {
        if self.run_state != RunState::AutoRunning {
            return None;
        }
        std::thread::sleep(self.auto_interval);
        match self.step() {
            Ok(report) => Some(report),
            Err(e) => {
                self.push_log(format!("error: {e}"));
                self.run_state = RunState::Idle;
                None
            }
        }
    }

    /// Rebuild both models and optimizers from scratch, keeping the input
    /// grid. Any in-flight auto-run is stopped first.
    pub fn reset(&mut self, variant: ArchVariant) {
        self.run_state = RunState::Idle;
        self.baseline = build_baseline(&mut self.rng);
        self.student = build_student(variant, &mut self.rng);
        self.baseline_optimizer = Adam::default_params(LEARNING_RATE);
        self.student_optimizer = Adam::default_params(LEARNING_RATE);
        self.variant = variant;
        self.step = 0;
        self.push_log(format!("reset: \"{}\" architecture", variant.as_str()));
    }
}
