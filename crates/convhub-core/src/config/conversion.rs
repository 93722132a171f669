//! Converter tuning knobs.

use serde::{Deserialize, Serialize};

/// Defaults applied by the document and image converters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Quality used by `/api/compress` when the client sends none.
    #[serde(default = "default_quality")]
    pub default_quality: u8,
    /// Font size in points for text rendered into PDF.
    #[serde(default = "default_font_size")]
    pub pdf_font_size: f32,
    /// Page margin in points for text rendered into PDF.
    #[serde(default = "default_margin")]
    pub pdf_margin: f32,
    /// CSS font family for watermark text.
    #[serde(default = "default_watermark_font")]
    pub watermark_font_family: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            pdf_font_size: default_font_size(),
            pdf_margin: default_margin(),
            watermark_font_family: default_watermark_font(),
        }
    }
}

fn default_quality() -> u8 {
    80
}

fn default_font_size() -> f32 {
    12.0
}

fn default_margin() -> f32 {
    50.0
}

fn default_watermark_font() -> String {
    "Arial, sans-serif".to_string()
}
