//! Reliability score for the image-based measurement path.

use crate::types::{KeypointSet, Landmark};

/// Multiplier applied when either shoulder is missing.
pub const MISSING_SHOULDERS_PENALTY: f64 = 0.6;
/// Multiplier applied when either hip is missing.
pub const MISSING_HIPS_PENALTY: f64 = 0.7;

/// Blend detector confidence with landmark coverage, penalizing a missing
/// shoulder or hip pair. The penalties compound.
///
/// `mean_confidence` is the detector's average over present landmarks.
pub fn score(keypoints: &KeypointSet, mean_confidence: f64) -> f64 {
    let coverage = keypoints.num_present() as f64 / Landmark::COUNT as f64;
    let mut score = 0.5 * mean_confidence + 0.5 * coverage;

    if keypoints.pair(Landmark::RightShoulder, Landmark::LeftShoulder).is_none() {
        score *= MISSING_SHOULDERS_PENALTY;
    }
    if keypoints.pair(Landmark::RightHip, Landmark::LeftHip).is_none() {
        score *= MISSING_HIPS_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Keypoint, Point};

    fn with_landmarks(landmarks: &[Landmark], confidence: f32) -> KeypointSet {
        landmarks.iter().fold(KeypointSet::empty(), |set, lm| {
            set.with(*lm, Keypoint::new(Point::new(1.0, 1.0), confidence))
        })
    }

    #[test]
    fn nothing_detected_scores_zero() {
        assert_eq!(score(&KeypointSet::empty(), 0.0), 0.0);
    }

    #[test]
    fn full_detection_scores_mean_blend() {
        let set = with_landmarks(&Landmark::ALL, 0.8);
        assert!((score(&set, 0.8) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn penalties_compound() {
        let torso = [Landmark::Nose, Landmark::Neck, Landmark::RightShoulder];
        let set = with_landmarks(&torso, 1.0);
        let raw = 0.5 + 0.5 * 3.0 / 18.0;
        assert!((score(&set, 1.0) - raw * 0.6 * 0.7).abs() < 1e-9);

        let shoulders_only = [Landmark::RightShoulder, Landmark::LeftShoulder];
        let set = with_landmarks(&shoulders_only, 1.0);
        let raw = 0.5 + 0.5 * 2.0 / 18.0;
        assert!((score(&set, 1.0) - raw * 0.7).abs() < 1e-9);
    }

    #[test]
    fn stays_in_unit_interval() {
        for n in 0..=Landmark::COUNT {
            let set = with_landmarks(&Landmark::ALL[..n], 1.0);
            for mean in [0.0, 0.25, 0.5, 1.0] {
                let s = score(&set, mean);
                assert!((0.0..=1.0).contains(&s), "n={} mean={} score={}", n, mean, s);
            }
        }
    }
}
