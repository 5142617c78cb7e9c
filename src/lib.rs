//! Explicar: explainable inference for binary convolutional classifiers.
//!
//! Given a trained layered network and a prepared input image, the pipeline
//! produces a classification, a Grad-CAM saliency heatmap blended over the
//! input, and a clinically-oriented risk annotation. Every call is a pure
//! function of `(network, input, configuration)`: the network is shared
//! read-only, all other state is call-local, and concurrent inferences
//! build independent gradient tapes.
//!
//! # Quick Start
//!
//! ```
//! use explicar::{
//!     compute_explainable_prediction, Conv2D, Dense, ImageTensor, Layer,
//!     LayeredNetwork, ThresholdMode,
//! };
//!
//! let network = LayeredNetwork::new(
//!     (4, 4, 1),
//!     vec![
//!         Layer::Conv2D(Conv2D::new(3, 3, 1, 2, vec![0.2; 18], vec![0.1; 2]).unwrap()),
//!         Layer::ReLU,
//!         Layer::Flatten,
//!         Layer::Dense(Dense::new(8, 1, vec![0.4; 8], vec![-0.5]).unwrap()),
//!         Layer::Sigmoid,
//!     ],
//! )
//! .unwrap();
//!
//! let pixels: Vec<f32> = (0..16).map(|i| i as f32 / 16.0).collect();
//! let input = ImageTensor::new(pixels, 4, 4, 1).unwrap();
//!
//! let result =
//!     compute_explainable_prediction(&network, &input, ThresholdMode::Dynamic, 0.6).unwrap();
//! assert!(result.heatmap.is_some());
//! ```
//!
//! # Modules
//!
//! - [`network`]: read-only layered view over a trained classifier
//! - [`autograd`]: tape-based autograd engine behind the tapped forward pass
//! - [`infer`]: forward inference to a raw score
//! - [`policy`]: threshold presets and dynamic score-dependent selection
//! - [`cam`]: gradient-weighted class-activation mapping
//! - [`render`]: heatmap upsampling, colorization, blending, PNG encoding
//! - [`annotate`]: confidence-banded warnings and risk levels
//! - [`present`]: display-name mapping and transport encoding
//! - [`pipeline`]: the `compute_explainable_prediction` entry point

pub mod annotate;
pub mod autograd;
pub mod cam;
pub mod error;
pub mod infer;
pub mod network;
pub mod pipeline;
pub mod policy;
pub mod present;
pub mod render;

pub use annotate::{ClinicalAnnotator, ClinicalAssessment, RiskIndicator, RiskLevel};
pub use cam::{ActivationMap, GradCamEngine};
pub use error::{ExplainError, Result};
pub use infer::{InferenceRunner, RawScore};
pub use network::{Conv2D, Dense, FeatureShape, ImageTensor, Layer, LayeredNetwork};
pub use pipeline::{compute_explainable_prediction, ExplainablePrediction};
pub use policy::{Decision, Label, ThresholdMode, ThresholdPolicy};
pub use present::DisplayNames;
pub use render::{Heatmap, HeatmapRenderer, DEFAULT_ALPHA};
