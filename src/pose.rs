//! Keypoint detection through an external pose-estimation capability.
//!
//! The network itself is opaque: anything implementing [`PoseNetwork`] can be
//! plugged into a [`PoseDetector`]. The detector owns the shared handle, turns
//! raw candidates into a [`KeypointSet`], and represents a missing model as the
//! explicit [`PoseDetector::Unavailable`] state rather than an error.
//!
//! Heatmap-based networks (the OpenPose family) can use [`network_input`] and
//! [`peaks_from_heatmaps`] to do their pre- and post-processing.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, RgbImage};
use serde::{Deserialize, Serialize};

use crate::config::PoseConfig;
use crate::error::{Error, Result};
use crate::types::{Keypoint, KeypointSet, Landmark, Point};

/// Per-landmark confidence map produced by a heatmap network.
pub type Heatmap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Raw per-slot network output in image coordinates, before thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub point: Point,
    pub confidence: f32,
}

impl Candidate {
    pub const fn new(point: Point, confidence: f32) -> Self {
        Self { point, confidence }
    }

    pub const fn none() -> Self {
        Self::new(Point::zero(), 0.0)
    }
}

/// A pretrained pose-estimation capability.
///
/// Implementations return one candidate per slot of [`Landmark::ALL`], in that
/// order. Missing trailing slots are treated as absent landmarks.
pub trait PoseNetwork: Send + Sync {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Candidate>>;
}

/// Resize an image to `config.input_width`, keeping its aspect ratio.
pub fn network_input(image: &RgbImage, config: &PoseConfig) -> RgbImage {
    let input_width = config.input_width;
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 || input_width == 0 {
        return image.clone();
    }
    let input_height = ((input_width as f32 / w as f32) * h as f32) as u32;
    imageops::resize(image, input_width, input_height.max(1), FilterType::Triangle)
}

/// Take the global maximum of each confidence map and rescale it to an
/// `image_width` x `image_height` image.
pub fn peaks_from_heatmaps(maps: &[Heatmap], image_width: u32, image_height: u32) -> Vec<Candidate> {
    maps.iter()
        .take(Landmark::COUNT)
        .map(|map| {
            let (map_w, map_h) = map.dimensions();
            match arg_max(map) {
                Some((px, py, prob)) => {
                    let x = (image_width as u64 * px as u64 / map_w as u64) as f32;
                    let y = (image_height as u64 * py as u64 / map_h as u64) as f32;
                    Candidate::new(Point::new(x, y), prob)
                }
                None => Candidate::none(),
            }
        })
        .collect()
}

/// First location holding the largest value, scanning row by row.
fn arg_max(map: &Heatmap) -> Option<(u32, u32, f32)> {
    let mut best: Option<(u32, u32, f32)> = None;
    for (x, y, pixel) in map.enumerate_pixels() {
        let value = pixel[0];
        if best.map_or(true, |(_, _, b)| value > b) {
            best = Some((x, y, value));
        }
    }
    best
}

/// Landmarks found in one image.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Detection {
    pub keypoints: KeypointSet,
    /// Mean confidence over present landmarks; 0 when none are present.
    pub mean_confidence: f64,
}

impl Detection {
    pub fn absent() -> Self {
        Self::default()
    }

    /// Keep candidates whose confidence exceeds `min_confidence` and whose
    /// point lies inside a `width` x `height` image.
    pub fn from_candidates(
        candidates: &[Candidate],
        min_confidence: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let mut keypoints = KeypointSet::empty();
        for (landmark, candidate) in Landmark::ALL.iter().zip(candidates) {
            let Point { x, y } = candidate.point;
            let valid = candidate.confidence.is_finite()
                && (0.0..width as f32).contains(&x)
                && (0.0..height as f32).contains(&y);
            if valid && candidate.confidence > min_confidence {
                keypoints.set(
                    *landmark,
                    Some(Keypoint::new(candidate.point, candidate.confidence.min(1.0))),
                );
            }
        }
        Self {
            mean_confidence: keypoints.mean_confidence(),
            keypoints,
        }
    }
}

/// Shared, read-only handle to the pose capability.
///
/// Cloning is cheap; every clone refers to the same loaded network.
#[derive(Clone, Default)]
pub enum PoseDetector {
    Available(Arc<dyn PoseNetwork>),
    /// No network loaded. Detection always yields an empty keypoint set.
    #[default]
    Unavailable,
}

impl PoseDetector {
    pub fn new<N: PoseNetwork + 'static>(network: N) -> Self {
        PoseDetector::Available(Arc::new(network))
    }

    /// Build a detector from the model file pair named in `config`.
    ///
    /// `loader` receives the whole pose configuration; heatmap backends pass
    /// it on to [`network_input`] so `input_width` sizes the network input.
    /// Missing files or a failing `loader` leave the detector unavailable,
    /// which downstream stages handle by falling back to statistics.
    pub fn load_with<N, F>(config: &PoseConfig, loader: F) -> Self
    where
        N: PoseNetwork + 'static,
        F: FnOnce(&PoseConfig) -> Result<N>,
    {
        if !config.weights.exists() || !config.descriptor.exists() {
            tracing::warn!(
                "Pose model files missing at {} / {}; running without keypoints",
                config.weights.display(),
                config.descriptor.display()
            );
            return PoseDetector::Unavailable;
        }

        match loader(config) {
            Ok(network) => {
                tracing::info!("Pose model loaded from {}", config.weights.display());
                PoseDetector::new(network)
            }
            Err(e) => {
                tracing::warn!("Failed to load pose model: {}", e);
                PoseDetector::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, PoseDetector::Available(_))
    }

    /// Detect landmarks. Backend failures degrade to an empty detection.
    pub fn detect(&self, image: &RgbImage, min_confidence: f32) -> Detection {
        let network = match self {
            PoseDetector::Available(network) => network,
            PoseDetector::Unavailable => return Detection::absent(),
        };

        match network.detect(image) {
            Ok(candidates) => {
                Detection::from_candidates(&candidates, min_confidence, image.width(), image.height())
            }
            Err(e) => {
                tracing::warn!("Pose inference failed: {}", e);
                Detection::absent()
            }
        }
    }
}

impl fmt::Debug for PoseDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseDetector::Available(_) => f.write_str("PoseDetector::Available"),
            PoseDetector::Unavailable => f.write_str("PoseDetector::Unavailable"),
        }
    }
}

/// Landmarks recorded by an external pose tool, replayed as a network.
///
/// JSON layout: `{"keypoints": [[x, y, confidence] | null, ...]}` in
/// [`Landmark::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedPose {
    pub keypoints: Vec<Option<[f32; 3]>>,
}

impl RecordedPose {
    pub fn from_json(text: &str) -> Result<Self> {
        let pose: Self = serde_json::from_str(text)?;
        if pose.keypoints.len() > Landmark::COUNT {
            return Err(Error::InvalidModel(format!(
                "Expected at most {} keypoints, got {}",
                Landmark::COUNT,
                pose.keypoints.len()
            )));
        }
        Ok(pose)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

impl PoseNetwork for RecordedPose {
    fn detect(&self, _image: &RgbImage) -> Result<Vec<Candidate>> {
        Ok(self
            .keypoints
            .iter()
            .map(|slot| match slot {
                Some([x, y, c]) => Candidate::new(Point::new(*x, *y), *c),
                None => Candidate::none(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedNetwork(Vec<Candidate>);

    impl PoseNetwork for FixedNetwork {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Candidate>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenNetwork;

    impl PoseNetwork for BrokenNetwork {
        fn detect(&self, _image: &RgbImage) -> Result<Vec<Candidate>> {
            Err(Error::InvalidModel("backend crashed".into()))
        }
    }

    fn blank() -> RgbImage {
        RgbImage::new(100, 100)
    }

    #[test]
    fn heatmap_peaks_rescale_to_image() {
        let mut map = Heatmap::new(46, 46);
        map.put_pixel(23, 10, Luma([0.9]));
        let candidates = peaks_from_heatmaps(&[map], 460, 920);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].point, Point::new(230.0, 200.0));
        assert!((candidates[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn arg_max_prefers_first_maximum() {
        let mut map = Heatmap::new(4, 4);
        map.put_pixel(1, 2, Luma([0.5]));
        map.put_pixel(3, 3, Luma([0.5]));
        assert_eq!(arg_max(&map), Some((1, 2, 0.5)));
    }

    #[test]
    fn network_input_keeps_aspect() {
        let img = RgbImage::new(184, 368);
        let input = network_input(&img, &PoseConfig::default());
        assert_eq!(input.dimensions(), (368, 736));

        let narrow = PoseConfig {
            input_width: 92,
            ..Default::default()
        };
        assert_eq!(network_input(&img, &narrow).dimensions(), (92, 184));
    }

    #[test]
    fn threshold_is_strict() {
        let candidates = vec![
            Candidate::new(Point::new(10.0, 5.0), 0.9),
            Candidate::new(Point::new(10.0, 15.0), 0.1),
            Candidate::new(Point::new(4.0, 20.0), 0.5),
        ];
        let detection = Detection::from_candidates(&candidates, 0.1, 100, 100);

        assert!(detection.keypoints.get(Landmark::Nose).is_some());
        assert!(detection.keypoints.get(Landmark::Neck).is_none());
        assert!(detection.keypoints.get(Landmark::RightShoulder).is_some());
        assert_eq!(detection.keypoints.num_present(), 2);
        assert!((detection.mean_confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn unavailable_detector_yields_nothing() {
        let detector = PoseDetector::Unavailable;
        assert!(!detector.is_available());
        let detection = detector.detect(&blank(), 0.1);
        assert_eq!(detection.keypoints.num_present(), 0);
        assert_eq!(detection.mean_confidence, 0.0);
    }

    #[test]
    fn backend_failure_degrades() {
        let detector = PoseDetector::new(BrokenNetwork);
        assert!(detector.is_available());
        assert_eq!(detector.detect(&blank(), 0.1), Detection::absent());
    }

    #[test]
    fn available_detector_thresholds_candidates() {
        let detector = PoseDetector::new(FixedNetwork(vec![Candidate::new(Point::new(1.0, 2.0), 0.6)]));
        let detection = detector.detect(&blank(), 0.1);
        assert_eq!(detection.keypoints.point(Landmark::Nose), Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn missing_model_files_leave_detector_unavailable() {
        let dir = std::env::temp_dir();
        let config = PoseConfig {
            weights: dir.join("no_such_weights.bin"),
            descriptor: dir.join("no_such_descriptor.txt"),
            ..Default::default()
        };
        let detector = PoseDetector::load_with(&config, |_| Ok(FixedNetwork(Vec::new())));
        assert!(!detector.is_available());
    }

    #[test]
    fn loader_error_leaves_detector_unavailable() {
        let config = PoseConfig {
            weights: std::env::temp_dir().join("size_estimator_weights_test.bin"),
            descriptor: std::env::temp_dir().join("size_estimator_descriptor_test.txt"),
            ..Default::default()
        };
        std::fs::write(&config.weights, b"w").unwrap();
        std::fs::write(&config.descriptor, b"d").unwrap();

        let failing = PoseDetector::load_with(&config, |_| -> Result<FixedNetwork> {
            Err(Error::InvalidModel("bad layer".into()))
        });
        assert!(!failing.is_available());

        let loaded = PoseDetector::load_with(&config, |c| {
            assert_eq!(c.input_width, 368);
            Ok(FixedNetwork(Vec::new()))
        });
        assert!(loaded.is_available());

        std::fs::remove_file(&config.weights).ok();
        std::fs::remove_file(&config.descriptor).ok();
    }

    #[test]
    fn recorded_pose_replays_landmarks() {
        let pose = RecordedPose::from_json(r#"{"keypoints": [[50, 20, 0.9], null, [30, 60, 0.05]]}"#)
            .unwrap();
        let detection = PoseDetector::new(pose).detect(&blank(), 0.1);

        assert_eq!(detection.keypoints.point(Landmark::Nose), Some(Point::new(50.0, 20.0)));
        assert!(detection.keypoints.get(Landmark::Neck).is_none());
        assert!(detection.keypoints.get(Landmark::RightShoulder).is_none());
    }

    #[test]
    fn points_outside_image_are_absent() {
        let candidates = vec![
            Candidate::new(Point::new(10.0, 3e10), 0.9),
            Candidate::new(Point::new(-1.0, 5.0), 0.9),
            Candidate::new(Point::new(99.5, 0.0), 0.9),
            Candidate::new(Point::new(100.0, 50.0), 0.9),
            Candidate::new(Point::new(f32::NAN, 50.0), 0.9),
        ];
        let detection = Detection::from_candidates(&candidates, 0.1, 100, 100);

        assert_eq!(detection.keypoints.num_present(), 1);
        assert!(detection.keypoints.get(Landmark::RightShoulder).is_some());
    }

    #[test]
    fn recorded_pose_rejects_extra_slots() {
        let entries = vec!["null"; 19].join(",");
        let json = format!(r#"{{"keypoints": [{}]}}"#, entries);
        assert!(matches!(RecordedPose::from_json(&json), Err(Error::InvalidModel(_))));
    }
}
