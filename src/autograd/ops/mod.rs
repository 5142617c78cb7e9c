//! Differentiable operations used by the layered forward pass

mod activations;
mod conv;
mod dense;
mod pool;

pub use activations::{relu, sigmoid};
pub use conv::{conv2d, ConvGeometry};
pub use dense::dense;
pub use pool::{max_pool2d, PoolGeometry};
