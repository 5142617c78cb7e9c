//! Threshold policy: raw score → label + confidence
//!
//! The decision boundary is deliberately asymmetric: the dynamic mode picks
//! lower thresholds for low and ambiguous scores so borderline studies tip
//! toward the positive label. This trades extra false positives for fewer
//! missed-disease false negatives and is a policy choice, not a bug.

use serde::{Deserialize, Serialize};

use crate::infer::RawScore;

/// Binary classification outcome.
///
/// Domain display strings ("Pneumonia"/"Normal") are applied only at the
/// presentation boundary, see [`crate::present::DisplayNames`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Positive,
    Negative,
}

/// Decision threshold presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdMode {
    /// Very sensitive, catches more positives (0.30).
    Conservative,
    /// Balanced sensitivity (0.40).
    #[default]
    Balanced,
    /// Original operating point (0.50).
    Strict,
    /// Select one of the fixed presets from the score itself.
    Dynamic,
}

/// Classification outcome with the threshold that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    pub label: Label,
    /// Confidence in the *decided* label, 0..100.
    pub confidence_percent: f32,
    /// Threshold the score was compared against.
    pub threshold: f32,
}

/// Immutable threshold policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdPolicy {
    mode: ThresholdMode,
}

impl ThresholdPolicy {
    pub const CONSERVATIVE: f32 = 0.30;
    pub const BALANCED: f32 = 0.40;
    pub const STRICT: f32 = 0.50;

    pub fn new(mode: ThresholdMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    /// Threshold applied to `score`.
    ///
    /// Dynamic mode is a pure function of the score; bracket boundaries
    /// (0.2, 0.4, 0.7) fall into the upper bracket.
    pub fn threshold_for(&self, score: RawScore) -> f32 {
        match self.mode {
            ThresholdMode::Conservative => Self::CONSERVATIVE,
            ThresholdMode::Balanced => Self::BALANCED,
            ThresholdMode::Strict => Self::STRICT,
            ThresholdMode::Dynamic => {
                if score < 0.4 {
                    Self::CONSERVATIVE
                } else if score < 0.7 {
                    Self::BALANCED
                } else {
                    Self::STRICT
                }
            }
        }
    }

    /// Classify a raw score.
    ///
    /// Strict `>`: a score exactly equal to the threshold is Negative.
    pub fn classify(&self, score: RawScore) -> Decision {
        let threshold = self.threshold_for(score);
        if score > threshold {
            Decision {
                label: Label::Positive,
                confidence_percent: score * 100.0,
                threshold,
            }
        } else {
            Decision {
                label: Label::Negative,
                confidence_percent: (1.0 - score) * 100.0,
                threshold,
            }
        }
    }
}
