//! Pattern gradient demo: two small networks trained side by side on the
//! same random grid, one to reproduce its input and one to satisfy a
//! hand-built composite objective (ramp target, neighbor contrast,
//! smoothness).

mod grid;
mod loss;
mod model;
mod session;

pub use grid::PixelGrid;
pub use loss::{
    chess_neighbor_loss, mse, ramp_loss, smoothness, student_loss, student_loss_op, LossWeights,
};
pub use model::{build_baseline, build_student, ArchVariant, GRID_SIZE};
pub use session::{PatternSession, RunState, StepReport};
