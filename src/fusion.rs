//! Confidence-weighted fusion of image and statistical measurements.

use serde::{Deserialize, Serialize};

use crate::metrics::PixelMetrics;
use crate::types::{BodyWidths, Measurements};

/// Below this confidence the image path is discarded.
pub const CONFIDENCE_LOW: f64 = 0.4;
/// At or above this confidence the image path is used alone.
pub const CONFIDENCE_HIGH: f64 = 0.75;
/// Weight of the image value in a hybrid blend.
pub const IMAGE_WEIGHT: f64 = 0.6;
/// Weight of the statistical value in a hybrid blend.
pub const STATISTICAL_WEIGHT: f64 = 0.4;

/// Which source the final measurements came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Image,
    Hybrid,
    Anthropometric,
}

impl Method {
    /// Select a method from the image confidence.
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence < CONFIDENCE_LOW {
            Method::Anthropometric
        } else if confidence < CONFIDENCE_HIGH {
            Method::Hybrid
        } else {
            Method::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Image => "image",
            Method::Hybrid => "hybrid",
            Method::Anthropometric => "anthropometric",
        }
    }

    /// Capitalized name for display.
    pub fn title(&self) -> &'static str {
        match self {
            Method::Image => "Image",
            Method::Hybrid => "Hybrid",
            Method::Anthropometric => "Anthropometric",
        }
    }

    pub fn note(&self) -> &'static str {
        match self {
            Method::Image => "High confidence image analysis.",
            Method::Hybrid => "Blended image analysis with statistical data.",
            Method::Anthropometric => "Low image confidence; used statistical averages.",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert pixel widths to centimeters using the known body height.
///
/// A zero pixel height is clamped to 1 so the scale stays finite.
pub fn image_widths(metrics: &PixelMetrics, height_cm: f64) -> BodyWidths {
    let scale = height_cm / (metrics.height_px as f64).max(1.0);
    BodyWidths {
        shoulder: metrics.shoulder_px as f64 * scale,
        chest: metrics.chest_px as f64 * scale,
        waist: metrics.waist_px as f64 * scale,
        hip: metrics.hip_px as f64 * scale,
    }
}

/// Blend two width sets field by field; unknown image fields take the statistical value.
pub fn blend(image: &BodyWidths, statistical: &BodyWidths) -> BodyWidths {
    image.zip_with(statistical, |img, stat| {
        if img > 0.0 {
            IMAGE_WEIGHT * img + STATISTICAL_WEIGHT * stat
        } else {
            stat
        }
    })
}

/// Result of fusing the two measurement sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused {
    pub method: Method,
    pub measurements: Measurements,
}

/// Fuse image and statistical widths according to `confidence`.
///
/// The user-supplied height is always carried through unchanged.
pub fn fuse(image: &BodyWidths, statistical: &BodyWidths, confidence: f64, height_cm: f64) -> Fused {
    let method = Method::for_confidence(confidence);
    let widths = match method {
        Method::Anthropometric => *statistical,
        Method::Hybrid => blend(image, statistical),
        Method::Image => *image,
    };
    Fused {
        method,
        measurements: Measurements { widths, height_cm },
    }
}
