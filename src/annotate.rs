//! Clinical annotation: warnings, recommendations, and risk level
//!
//! Each warning rule is evaluated independently over the normalized
//! confidence, so a single result can carry several warnings at once.

use serde::{Deserialize, Serialize};

use crate::policy::Label;

/// Confidence-banded risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    HighConfidence,
    ModerateConfidence,
    LowConfidence,
    LowConfidenceReviewNeeded,
}

/// Dashboard indicator color paired with the risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskIndicator {
    Red,
    Yellow,
    Orange,
    Green,
}

/// Full annotation for one classification result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClinicalAssessment {
    pub risk_level: RiskLevel,
    pub risk_indicator: RiskIndicator,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Derives the assessment from a label and its confidence.
pub struct ClinicalAnnotator;

impl ClinicalAnnotator {
    /// Annotate a decision; `confidence_percent` is in `0..=100`.
    pub fn annotate(label: Label, confidence_percent: f32) -> ClinicalAssessment {
        let c = confidence_percent / 100.0;
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        if label == Label::Negative && c < 0.8 {
            warnings.push("Low-confidence negative: consider medical review".to_string());
            recommendations.push("Recommend clinical correlation with symptoms".to_string());
        }
        if label == Label::Positive && c < 0.7 {
            warnings.push("Uncertain positive: clinical correlation strongly recommended".to_string());
            recommendations.push("Suggest radiologist review for confirmation".to_string());
        }
        if c > 0.35 && c < 0.65 {
            warnings.push("Borderline case: expert radiologist review recommended".to_string());
            recommendations
                .push("Consider additional imaging or clinical assessment".to_string());
        }
        if label == Label::Negative && c > 0.4 && c < 0.6 {
            warnings
                .push("Potential false-negative risk: high priority for medical review".to_string());
            recommendations
                .push("Do not rule out disease based on this result alone".to_string());
        }

        let (risk_level, risk_indicator) = match label {
            Label::Positive => {
                if c > 0.8 {
                    (RiskLevel::HighConfidence, RiskIndicator::Red)
                } else if c > 0.6 {
                    (RiskLevel::ModerateConfidence, RiskIndicator::Yellow)
                } else {
                    (RiskLevel::LowConfidence, RiskIndicator::Orange)
                }
            }
            Label::Negative => {
                if c > 0.8 {
                    (RiskLevel::HighConfidence, RiskIndicator::Green)
                } else if c > 0.6 {
                    (RiskLevel::ModerateConfidence, RiskIndicator::Yellow)
                } else {
                    (RiskLevel::LowConfidenceReviewNeeded, RiskIndicator::Orange)
                }
            }
        };

        ClinicalAssessment { risk_level, risk_indicator, warnings, recommendations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_confident_positive_is_clean_high_risk() {
        let a = ClinicalAnnotator::annotate(Label::Positive, 90.0);
        assert_eq!(a.risk_level, RiskLevel::HighConfidence);
        assert_eq!(a.risk_indicator, RiskIndicator::Red);
        assert!(a.warnings.is_empty());
        assert!(a.recommendations.is_empty());
    }

    #[test]
    fn test_confident_negative_is_clean_green() {
        let a = ClinicalAnnotator::annotate(Label::Negative, 95.0);
        assert_eq!(a.risk_level, RiskLevel::HighConfidence);
        assert_eq!(a.risk_indicator, RiskIndicator::Green);
        assert!(a.warnings.is_empty());
    }

    #[test]
    fn test_negative_at_fifty_triggers_both_range_warnings() {
        // c = 0.5 satisfies both the borderline band and the
        // false-negative band, plus the low-confidence-negative rule.
        let a = ClinicalAnnotator::annotate(Label::Negative, 50.0);
        assert!(a.warnings.iter().any(|w| w.contains("false-negative")));
        assert!(a.warnings.iter().any(|w| w.contains("Borderline")));
        assert!(a.warnings.iter().any(|w| w.contains("Low-confidence negative")));
        assert_eq!(a.warnings.len(), 3);
        assert_eq!(a.risk_level, RiskLevel::LowConfidenceReviewNeeded);
    }

    #[test]
    fn test_uncertain_positive_warning() {
        let a = ClinicalAnnotator::annotate(Label::Positive, 66.0);
        assert!(a.warnings.iter().any(|w| w.contains("Uncertain positive")));
        assert_eq!(a.risk_level, RiskLevel::ModerateConfidence);
        assert_eq!(a.risk_indicator, RiskIndicator::Yellow);
    }

    #[test]
    fn test_low_positive_is_flagged_orange() {
        let a = ClinicalAnnotator::annotate(Label::Positive, 55.0);
        assert_eq!(a.risk_level, RiskLevel::LowConfidence);
        assert_eq!(a.risk_indicator, RiskIndicator::Orange);
    }

    #[test]
    fn test_band_boundaries_are_exclusive() {
        // Exactly 0.35 and 0.65 sit outside the borderline band; exactly
        // 0.4 and 0.6 sit outside the false-negative band.
        let a = ClinicalAnnotator::annotate(Label::Negative, 35.0);
        assert!(!a.warnings.iter().any(|w| w.contains("Borderline")));
        let b = ClinicalAnnotator::annotate(Label::Negative, 65.0);
        assert!(!b.warnings.iter().any(|w| w.contains("Borderline")));
        let c = ClinicalAnnotator::annotate(Label::Negative, 40.0);
        assert!(!c.warnings.iter().any(|w| w.contains("false-negative")));
        let d = ClinicalAnnotator::annotate(Label::Negative, 60.0);
        assert!(!d.warnings.iter().any(|w| w.contains("false-negative")));
    }

    proptest! {
        #[test]
        fn prop_recommendations_track_warnings(
            confidence in 0.0f32..=100.0,
            positive in proptest::bool::ANY,
        ) {
            let label = if positive { Label::Positive } else { Label::Negative };
            let a = ClinicalAnnotator::annotate(label, confidence);
            prop_assert_eq!(a.warnings.len(), a.recommendations.len());
        }

        #[test]
        fn prop_high_confidence_never_warns(confidence in 90.0f32..=100.0) {
            for label in [Label::Positive, Label::Negative] {
                let a = ClinicalAnnotator::annotate(label, confidence);
                prop_assert!(a.warnings.is_empty());
                prop_assert_eq!(a.risk_level, RiskLevel::HighConfidence);
            }
        }
    }
}
