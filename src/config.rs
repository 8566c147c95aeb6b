//! Runtime configuration for the estimator.
//!
//! Every section has defaults matching the reference pose model and the
//! silhouette pipeline, so an empty JSON object is a valid configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level estimator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub pose: PoseConfig,
    pub silhouette: SilhouetteConfig,
    pub annotate: AnnotateConfig,
}

impl EstimatorConfig {
    /// Load a configuration from a JSON file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pose model artifacts and keypoint acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Trained weights file.
    pub weights: PathBuf,
    /// Network description file paired with `weights`.
    pub descriptor: PathBuf,
    /// Network input width in pixels; height follows the image aspect ratio.
    pub input_width: u32,
    /// Landmarks at or below this confidence are treated as absent.
    pub min_confidence: f32,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            weights: PathBuf::from("models/pose_iter_440000.caffemodel"),
            descriptor: PathBuf::from("models/pose_deploy_linevec.prototxt"),
            input_width: 368,
            min_confidence: 0.1,
        }
    }
}

/// Foreground mask extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Gaussian blur sigma applied before thresholding.
    pub blur_sigma: f32,
    /// Chebyshev radius of the morphological opening.
    pub open_radius: u8,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        // 5x5 kernel: sigma 1.1; opening with a 5x5 square twice: radius 4
        Self {
            blur_sigma: 1.1,
            open_radius: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    pub jpeg_quality: u8,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self { jpeg_quality: 90 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config: EstimatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EstimatorConfig::default());
        assert_eq!(config.pose.input_width, 368);
        assert!((config.pose.min_confidence - 0.1).abs() < 1e-6);
    }

    #[test]
    fn partial_override() {
        let config: EstimatorConfig =
            serde_json::from_str(r#"{"pose": {"input_width": 256}, "annotate": {"jpeg_quality": 75}}"#)
                .unwrap();
        assert_eq!(config.pose.input_width, 256);
        assert_eq!(config.pose.weights, PoseConfig::default().weights);
        assert_eq!(config.annotate.jpeg_quality, 75);
        assert_eq!(config.silhouette, SilhouetteConfig::default());
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join("size_estimator_config_test.json");
        std::fs::write(&path, r#"{"silhouette": {"open_radius": 2}}"#).unwrap();

        let config = EstimatorConfig::load(&path).unwrap();
        assert_eq!(config.silhouette.open_radius, 2);

        std::fs::remove_file(path).ok();
    }
}
