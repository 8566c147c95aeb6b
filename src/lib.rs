//! # size-estimator
//!
//! Body-measurement and clothing-size estimation from a single full-body photo.
//!
//! This crate provides:
//! - **Pose Keypoints**: an injectable [`PoseNetwork`] behind a [`PoseDetector`]
//!   that degrades to "no keypoints" when no model is available
//! - **Silhouette Extraction**: Otsu threshold and morphological opening to
//!   find the body outline
//! - **Pixel Metrics**: shoulder, chest, waist and hip widths measured through
//!   keypoint, contour and proportional fallback tiers
//! - **Fusion**: confidence-weighted blending of image measurements with a
//!   statistical predictor driven by height, weight and gender
//! - **Sizing**: chest-circumference lookup into men's and women's size tables
//! - **Annotation**: an overlay image returned as a JPEG data URI
//!
//! ## Pipeline
//!
//! 1. Decode the photo and detect the 18 COCO body landmarks
//! 2. Threshold the photo and keep the largest outer contour
//! 3. Measure body height and each width in pixels
//! 4. Score how much the keypoints can be trusted
//! 5. Convert pixels to centimeters using the supplied height and fuse with
//!    the statistical prediction:
//!    - confidence below 0.4: statistical only
//!    - below 0.75: 60/40 blend
//!    - otherwise: image only
//! 6. Recommend a size and draw the overlay
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use size_estimator::{EstimatorConfig, PoseDetector, SizeEstimator};
//!
//! // Without a pose model every estimate uses the statistical path.
//! let estimator = SizeEstimator::new(PoseDetector::Unavailable, EstimatorConfig::default());
//!
//! let photo = std::fs::read("person.jpg").unwrap();
//! let result = estimator.estimate(&photo, Some(178.0), Some(74.0), Some("male"));
//! if let Some(estimate) = result.estimation {
//!     println!("{} ({})", estimate.recommended_size, estimate.method_used);
//! }
//! ```
//!
//! ## Custom Pose Backends
//!
//! Implement [`PoseNetwork`] to plug in an inference runtime:
//!
//! ```rust
//! use image::RgbImage;
//! use size_estimator::{Candidate, PoseDetector, PoseNetwork, Result};
//!
//! struct MyNetwork;
//!
//! impl PoseNetwork for MyNetwork {
//!     fn detect(&self, _image: &RgbImage) -> Result<Vec<Candidate>> {
//!         // One candidate per landmark, in COCO order
//!         Ok(vec![Candidate::none(); 18])
//!     }
//! }
//!
//! let detector = PoseDetector::new(MyNetwork);
//! assert!(detector.is_available());
//! ```

pub mod annotate;
pub mod anthropometry;
pub mod confidence;
pub mod config;
mod error;
mod estimator;
pub mod fallback;
pub mod fusion;
mod glyphs;
pub mod metrics;
pub mod pose;
pub mod silhouette;
pub mod sizing;
mod types;

pub use config::{AnnotateConfig, EstimatorConfig, PoseConfig, SilhouetteConfig};
pub use error::{Error, Result};
pub use estimator::{decode_image, Estimation, EstimationResult, SizeEstimator};
pub use fusion::Method;
pub use metrics::PixelMetrics;
pub use pose::{Candidate, Detection, PoseDetector, PoseNetwork, RecordedPose};
pub use silhouette::SilhouetteMask;
pub use sizing::{reference_charts, SizeRecommendation};
pub use types::{
    round_to, AnthropometricInputs, BodyWidths, BoundingBox, Gender, Keypoint, KeypointSet,
    Landmark, Measurements, Point,
};
