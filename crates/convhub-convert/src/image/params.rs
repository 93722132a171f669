//! Typed parameters for compress, crop, and watermark.

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ConversionError;

/// Default watermark opacity.
pub const DEFAULT_OPACITY: f32 = 0.5;

/// Parameters for `compress`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct CompressParams {
    /// Encoder quality; must lie in 0..=100.
    #[validate(range(min = 0, max = 100))]
    pub quality: i64,
}

impl CompressParams {
    /// Build and validate.
    pub fn new(quality: i64) -> Result<Self, ConversionError> {
        let params = Self { quality };
        params
            .validate()
            .map_err(|_| ConversionError::InvalidQuality {
                value: quality.to_string(),
            })?;
        Ok(params)
    }

    /// Quality as a byte; valid after construction through [`Self::new`].
    pub fn quality(&self) -> u8 {
        self.quality.clamp(0, 100) as u8
    }
}

/// Raw crop request. Width and height are required and must be non-zero;
/// the offsets default to 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Validate)]
pub struct CropParams {
    /// Region width in pixels.
    #[validate(required)]
    pub width: Option<f64>,
    /// Region height in pixels.
    #[validate(required)]
    pub height: Option<f64>,
    /// Left offset in pixels.
    pub left: Option<f64>,
    /// Top offset in pixels.
    pub top: Option<f64>,
}

/// A crop region after flooring and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left offset, at least 0.
    pub left: u32,
    /// Top offset, at least 0.
    pub top: u32,
    /// Width, at least 1.
    pub width: u32,
    /// Height, at least 1.
    pub height: u32,
}

impl CropParams {
    /// Convenience constructor for a fully specified region.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            left: Some(left),
            top: Some(top),
        }
    }

    /// Validate and normalize into a pixel rectangle.
    ///
    /// Missing, zero, or NaN width/height are rejected before clamping.
    pub fn rect(&self) -> Result<CropRect, ConversionError> {
        self.validate().map_err(|_| ConversionError::MissingCropSize)?;

        let size = |v: Option<f64>| match v {
            Some(v) if v != 0.0 && !v.is_nan() => Ok(clamp_floor(v, 1.0)),
            _ => Err(ConversionError::MissingCropSize),
        };
        let offset = |v: Option<f64>| clamp_floor(v.filter(|v| !v.is_nan()).unwrap_or(0.0), 0.0);

        Ok(CropRect {
            width: size(self.width)?,
            height: size(self.height)?,
            left: offset(self.left),
            top: offset(self.top),
        })
    }
}

fn clamp_floor(value: f64, min: f64) -> u32 {
    value.floor().clamp(min, u32::MAX as f64) as u32
}

/// Where the watermark text is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    /// Top-left corner.
    TopLeft,
    /// Top-right corner.
    TopRight,
    /// Image center.
    #[default]
    Center,
    /// Bottom-left corner.
    BottomLeft,
    /// Bottom-right corner.
    BottomRight,
}

impl Anchor {
    /// Parse an anchor name; unknown names fall back to [`Anchor::Center`].
    pub fn parse_or_center(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "top-left" | "northwest" => Self::TopLeft,
            "top-right" | "northeast" => Self::TopRight,
            "bottom-left" | "southwest" => Self::BottomLeft,
            "bottom-right" | "southeast" => Self::BottomRight,
            _ => Self::Center,
        }
    }

    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::Center => "center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Watermark request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WatermarkParams {
    /// Text to overlay; required and non-empty.
    #[validate(required, length(min = 1))]
    pub text: Option<String>,
    /// Placement.
    #[serde(default)]
    pub position: Anchor,
    /// Fill opacity of the text, 0.0..=1.0.
    #[validate(range(min = 0.0, max = 1.0))]
    pub opacity: f32,
}

impl WatermarkParams {
    /// Build from text with default placement and opacity.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            position: Anchor::Center,
            opacity: DEFAULT_OPACITY,
        }
    }

    /// Set the anchor.
    pub fn with_position(mut self, position: Anchor) -> Self {
        self.position = position;
        self
    }

    /// Set the opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Validate and return the watermark text.
    pub fn checked_text(&self) -> Result<&str, ConversionError> {
        let text = self
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConversionError::MissingWatermarkText)?;
        if self.opacity.is_nan() {
            return Err(ConversionError::InvalidOpacity {
                value: self.opacity,
            });
        }
        self.validate()?;
        Ok(text)
    }
}
