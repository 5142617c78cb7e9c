//! The explainable-inference pipeline entry point
//!
//! Runs the classifier, applies the threshold policy, annotates the result,
//! and renders the Grad-CAM overlay. Classification and explanation are
//! decoupled: a failed heatmap never withholds a successful classification,
//! the explanation is simply reported as unavailable.

use log::{info, warn};
use serde::Serialize;

use crate::annotate::{ClinicalAnnotator, RiskIndicator, RiskLevel};
use crate::cam::GradCamEngine;
use crate::error::Result;
use crate::infer::InferenceRunner;
use crate::network::{ImageTensor, LayeredNetwork};
use crate::policy::{Label, ThresholdMode, ThresholdPolicy};
use crate::render::{Heatmap, HeatmapRenderer};

/// Structured pipeline output, consumed by the persistence, notification,
/// and presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainablePrediction {
    pub label: Label,
    pub confidence_percent: f32,
    /// Threshold the raw score was compared against.
    pub threshold: f32,
    pub risk_level: RiskLevel,
    pub risk_indicator: RiskIndicator,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    /// PNG overlay at the input's resolution; `None` when the explanation
    /// path failed (see `explanation_error`).
    pub heatmap: Option<Heatmap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_error: Option<String>,
}

/// Run the full pipeline over one prepared input.
///
/// Pure function of `(network, input, mode, alpha)`; the network is the
/// only shared state and is read-only, so concurrent calls are safe.
/// Errors are returned only when classification itself is impossible
/// (shape mismatch); explanation failures are deterministic structural
/// conditions reported in `explanation_error` instead.
pub fn compute_explainable_prediction(
    network: &LayeredNetwork,
    input: &ImageTensor,
    mode: ThresholdMode,
    alpha: f32,
) -> Result<ExplainablePrediction> {
    let score = InferenceRunner::run(network, input)?;
    let decision = ThresholdPolicy::new(mode).classify(score);
    info!(
        "classified score {score:.4} as {:?} at {:.1}% (threshold {})",
        decision.label, decision.confidence_percent, decision.threshold
    );

    let assessment = ClinicalAnnotator::annotate(decision.label, decision.confidence_percent);

    let explanation = GradCamEngine::compute(network, input)
        .and_then(|map| HeatmapRenderer::render(&map, input, alpha));
    let (heatmap, explanation_error) = match explanation {
        Ok(heatmap) => {
            info!("rendered {}x{} heatmap overlay", heatmap.width(), heatmap.height());
            (Some(heatmap), None)
        }
        Err(e) => {
            warn!("explanation unavailable: {e}");
            (None, Some(e.to_string()))
        }
    };

    Ok(ExplainablePrediction {
        label: decision.label,
        confidence_percent: decision.confidence_percent,
        threshold: decision.threshold,
        risk_level: assessment.risk_level,
        risk_indicator: assessment.risk_indicator,
        warnings: assessment.warnings,
        recommendations: assessment.recommendations,
        heatmap,
        explanation_error,
    })
}
