//! Backward operation trait

/// A node on the gradient tape. Implementations read the upstream gradient
/// from the result tensor's grad cell, accumulate into their inputs' grad
/// cells, and recurse into the inputs' own backward ops.
pub trait BackwardOp {
    fn backward(&self);
}
