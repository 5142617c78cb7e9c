//! Backward operation trait

/// A node in the gradient tape.
///
/// Each differentiable operation installs one of these on its output
/// tensor; `backward` reads the output's gradient cell, accumulates into
/// the operation's inputs, and recurses into their backward ops.
pub trait BackwardOp {
    fn backward(&self);
}
