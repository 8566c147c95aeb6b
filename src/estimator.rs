//! The estimation entry point.
//!
//! [`SizeEstimator::estimate`] runs the whole pipeline on one photo: decode,
//! detect keypoints, extract the silhouette, measure in pixels, score
//! confidence, predict statistically, fuse, pick a size, and annotate. A call
//! holds no state beyond the shared read-only pose detector, so one estimator
//! can serve concurrent callers.

use image::RgbImage;
use serde::Serialize;

use crate::annotate::{self, Overlay};
use crate::anthropometry;
use crate::confidence;
use crate::config::{EstimatorConfig, PoseConfig};
use crate::error::{Error, Result};
use crate::fusion::{self, Method};
use crate::metrics::PixelMetrics;
use crate::pose::{PoseDetector, PoseNetwork};
use crate::silhouette::SilhouetteMask;
use crate::sizing;
use crate::types::{round_to, AnthropometricInputs, Measurements};

/// A completed estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimation {
    pub method_used: Method,
    /// Image-path confidence, rounded to two decimals.
    pub confidence: f64,
    /// Final measurements, rounded to one decimal.
    pub measurements: Measurements,
    pub recommended_size: String,
    pub size_details: String,
    pub notes: String,
    /// Annotated photo as a `data:image/jpeg;base64,` URI, or empty if it
    /// could not be encoded.
    pub annotated_image: String,
}

/// Wire-level result: either a full estimate or an error message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    pub success: bool,
    #[serde(flatten)]
    pub estimation: Option<Estimation>,
    pub error: Option<String>,
}

impl EstimationResult {
    pub fn success(estimation: Estimation) -> Self {
        Self {
            success: true,
            estimation: Some(estimation),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            estimation: None,
            error: Some(message.into()),
        }
    }
}

impl From<Result<Estimation>> for EstimationResult {
    fn from(result: Result<Estimation>) -> Self {
        match result {
            Ok(estimation) => Self::success(estimation),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Decode raw image bytes (any format the `image` crate recognizes) to RGB.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgb8())
        .map_err(Error::Decode)
}

/// Hybrid body-measurement estimator.
#[derive(Debug, Clone, Default)]
pub struct SizeEstimator {
    detector: PoseDetector,
    config: EstimatorConfig,
}

impl SizeEstimator {
    pub fn new(detector: PoseDetector, config: EstimatorConfig) -> Self {
        Self { detector, config }
    }

    /// Load the pose model named in `config` with `loader`.
    ///
    /// If the model cannot be loaded the estimator still works, relying on
    /// the silhouette and statistical paths.
    pub fn load_with<N, F>(config: EstimatorConfig, loader: F) -> Self
    where
        N: PoseNetwork + 'static,
        F: FnOnce(&PoseConfig) -> Result<N>,
    {
        let detector = PoseDetector::load_with(&config.pose, loader);
        Self::new(detector, config)
    }

    pub fn detector(&self) -> &PoseDetector {
        &self.detector
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate body measurements and a clothing size from a photo.
    ///
    /// Missing or invalid inputs fall back to 170 cm, 70 kg and male. The only
    /// failure is undecodable image bytes, reported through
    /// [`EstimationResult::error`].
    pub fn estimate(
        &self,
        image_bytes: &[u8],
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
        gender: Option<&str>,
    ) -> EstimationResult {
        let result = self.try_estimate(image_bytes, height_cm, weight_kg, gender);
        if let Err(e) = &result {
            tracing::warn!("Size estimation failed: {}", e);
        }
        result.into()
    }

    /// Like [`estimate`](Self::estimate), returning the error as a `Result`.
    pub fn try_estimate(
        &self,
        image_bytes: &[u8],
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
        gender: Option<&str>,
    ) -> Result<Estimation> {
        let image = decode_image(image_bytes)?;
        let inputs = AnthropometricInputs::from_optional(height_cm, weight_kg, gender);
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            ?inputs,
            "estimating"
        );

        let detection = self.detector.detect(&image, self.config.pose.min_confidence);
        let silhouette = SilhouetteMask::extract(&image, &self.config.silhouette);
        let metrics = PixelMetrics::compute(&detection.keypoints, &silhouette);
        let confidence = confidence::score(&detection.keypoints, detection.mean_confidence);

        let image_widths = fusion::image_widths(&metrics, inputs.height_cm);
        let statistical = anthropometry::predict(&inputs);
        let fused = fusion::fuse(&image_widths, &statistical, confidence, inputs.height_cm);
        let size = sizing::recommend(fused.measurements.widths.chest, inputs.gender);

        let annotated = annotate::annotate(
            &image,
            &Overlay {
                method: fused.method,
                measurements: &fused.measurements,
                metrics: &metrics,
                keypoints: &detection.keypoints,
                size: &size,
            },
        );
        let annotated_image = annotate::to_data_uri(&annotated, self.config.annotate.jpeg_quality)
            .unwrap_or_else(|e| {
                tracing::warn!("Annotated image unavailable: {}", e);
                String::new()
            });

        tracing::info!(
            method = %fused.method,
            confidence,
            keypoints = detection.keypoints.num_present(),
            size = size.size,
            "size estimate complete"
        );

        Ok(Estimation {
            method_used: fused.method,
            confidence: round_to(confidence, 2),
            measurements: fused.measurements.rounded(),
            recommended_size: size.size.to_string(),
            size_details: size.details.to_string(),
            notes: fused.method.note().to_string(),
            annotated_image,
        })
    }
}
