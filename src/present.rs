//! Presentation boundary: display names and transport encoding
//!
//! Labels stay as the two-variant [`Label`] type everywhere inside the
//! pipeline; domain wording is applied here, at the edge, so the core never
//! threads display strings through its layers.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::policy::Label;
use crate::render::Heatmap;

/// Domain display strings for the two labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNames {
    pub positive: String,
    pub negative: String,
}

impl Default for DisplayNames {
    fn default() -> Self {
        Self {
            positive: "Pneumonia".to_string(),
            negative: "Normal".to_string(),
        }
    }
}

impl DisplayNames {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self { positive: positive.into(), negative: negative.into() }
    }

    pub fn display(&self, label: Label) -> &str {
        match label {
            Label::Positive => &self.positive,
            Label::Negative => &self.negative,
        }
    }
}

/// Data URL for embedding the heatmap PNG in reports and emails.
pub fn heatmap_data_url(heatmap: &Heatmap) -> String {
    format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(heatmap.png_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_display_names() {
        let names = DisplayNames::default();
        assert_eq!(names.display(Label::Positive), "Pneumonia");
        assert_eq!(names.display(Label::Negative), "Normal");
    }

    #[test]
    fn test_custom_display_names() {
        let names = DisplayNames::new("Malignant", "Benign");
        assert_eq!(names.display(Label::Positive), "Malignant");
        assert_eq!(names.display(Label::Negative), "Benign");
    }

    #[test]
    fn test_data_url_round_trips_png_bytes() {
        let map = crate::cam::test_support::map_from_array(ndarray::array![[1.0]]);
        let image = crate::network::ImageTensor::new(vec![0.5], 1, 1, 1).unwrap();
        let heatmap = crate::render::HeatmapRenderer::render(&map, &image, 0.6).unwrap();

        let url = heatmap_data_url(&heatmap);
        let encoded = url.strip_prefix("data:image/png;base64,").unwrap();
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(decoded, heatmap.png_bytes());
    }
}
