use serde::{Deserialize, Serialize};

/// A 2D point with floating-point pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Pixel row this point falls on (truncated toward zero).
    pub fn row(&self) -> i32 {
        self.y as i32
    }
}

/// An axis-aligned pixel rectangle defined by its top-left corner, width, and height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    ///
    /// Width and height count pixels inclusively, so a single point yields a 1x1 box.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut max_x) = (first.x, first.x);
        let (mut min_y, mut max_y) = (first.y, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x as i32,
            min_y as i32,
            (max_x - min_x) as i32 + 1,
            (max_y - min_y) as i32 + 1,
        ))
    }

    /// Row at a fraction of the box height below its top edge.
    pub fn row_at(&self, fraction: f32) -> i32 {
        self.y + (self.height as f32 * fraction) as i32
    }
}

/// The 18 body landmarks of the COCO/OpenPose layout, in network output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Landmark {
    Nose,
    Neck,
    RightShoulder,
    RightElbow,
    RightWrist,
    LeftShoulder,
    LeftElbow,
    LeftWrist,
    RightHip,
    RightKnee,
    RightAnkle,
    LeftHip,
    LeftKnee,
    LeftAnkle,
    RightEye,
    LeftEye,
    RightEar,
    LeftEar,
}

impl Landmark {
    pub const COUNT: usize = 18;

    pub const ALL: [Landmark; Self::COUNT] = [
        Landmark::Nose,
        Landmark::Neck,
        Landmark::RightShoulder,
        Landmark::RightElbow,
        Landmark::RightWrist,
        Landmark::LeftShoulder,
        Landmark::LeftElbow,
        Landmark::LeftWrist,
        Landmark::RightHip,
        Landmark::RightKnee,
        Landmark::RightAnkle,
        Landmark::LeftHip,
        Landmark::LeftKnee,
        Landmark::LeftAnkle,
        Landmark::RightEye,
        Landmark::LeftEye,
        Landmark::RightEar,
        Landmark::LeftEar,
    ];

    /// Slot index in the network's output order.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A detected landmark: pixel position plus detector confidence in (0.1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub point: Point,
    pub confidence: f32,
}

impl Keypoint {
    pub const fn new(point: Point, confidence: f32) -> Self {
        Self { point, confidence }
    }
}

/// Fixed-size set of optional landmarks, addressed by [`Landmark`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeypointSet {
    slots: [Option<Keypoint>; Landmark::COUNT],
}

impl KeypointSet {
    /// A set with every landmark absent.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, landmark: Landmark) -> Option<Keypoint> {
        self.slots[landmark.index()]
    }

    pub fn point(&self, landmark: Landmark) -> Option<Point> {
        self.get(landmark).map(|kp| kp.point)
    }

    pub fn set(&mut self, landmark: Landmark, keypoint: Option<Keypoint>) {
        self.slots[landmark.index()] = keypoint;
    }

    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.set(landmark, Some(keypoint));
        self
    }

    /// Both points of a left/right pair, or `None` if either is absent.
    pub fn pair(&self, a: Landmark, b: Landmark) -> Option<(Point, Point)> {
        Some((self.point(a)?, self.point(b)?))
    }

    pub fn num_present(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Arithmetic mean confidence over present landmarks; 0 when none are present.
    pub fn mean_confidence(&self) -> f64 {
        let present: Vec<f64> = self.present().map(|(_, kp)| kp.confidence as f64).collect();
        if present.is_empty() {
            0.0
        } else {
            present.iter().sum::<f64>() / present.len() as f64
        }
    }

    pub fn present(&self) -> impl Iterator<Item = (Landmark, Keypoint)> + '_ {
        Landmark::ALL
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(lm, slot)| slot.map(|kp| (*lm, kp)))
    }
}

/// Gender category used by the statistical predictor and size tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Child,
}

impl Gender {
    /// Parse a free-form gender string; anything unrecognized is treated as male.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "female" => Gender::Female,
            "child" => Gender::Child,
            _ => Gender::Male,
        }
    }
}

/// User-supplied body data with defaults already applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnthropometricInputs {
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
}

impl AnthropometricInputs {
    pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
    pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

    /// Substitute defaults for missing, non-finite, or non-positive values.
    pub fn from_optional(height_cm: Option<f64>, weight_kg: Option<f64>, gender: Option<&str>) -> Self {
        Self {
            height_cm: valid_or(height_cm, Self::DEFAULT_HEIGHT_CM),
            weight_kg: valid_or(weight_kg, Self::DEFAULT_WEIGHT_KG),
            gender: gender.map(Gender::parse).unwrap_or_default(),
        }
    }
}

impl Default for AnthropometricInputs {
    fn default() -> Self {
        Self::from_optional(None, None, None)
    }
}

fn valid_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

/// Frontal body widths in centimeters. A zero field means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyWidths {
    #[serde(rename = "shoulder_width_cm")]
    pub shoulder: f64,
    #[serde(rename = "chest_width_cm")]
    pub chest: f64,
    #[serde(rename = "waist_width_cm")]
    pub waist: f64,
    #[serde(rename = "hip_width_cm")]
    pub hip: f64,
}

impl BodyWidths {
    /// Apply `f` to each (self, other) field pair.
    pub fn zip_with(&self, other: &BodyWidths, f: impl Fn(f64, f64) -> f64) -> BodyWidths {
        BodyWidths {
            shoulder: f(self.shoulder, other.shoulder),
            chest: f(self.chest, other.chest),
            waist: f(self.waist, other.waist),
            hip: f(self.hip, other.hip),
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> BodyWidths {
        self.zip_with(self, |a, _| f(a))
    }
}

/// Final measurement set: fused widths plus the user-supplied height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(flatten)]
    pub widths: BodyWidths,
    pub height_cm: f64,
}

impl Measurements {
    /// Copy with every value rounded to one decimal place.
    pub fn rounded(&self) -> Self {
        Self {
            widths: self.widths.map(|v| round_to(v, 1)),
            height_cm: round_to(self.height_cm, 1),
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_box() {
        let points = [
            Point::new(10.0, 20.0),
            Point::new(30.0, 5.0),
            Point::new(15.0, 45.0),
        ];
        let bbox = BoundingBox::enclosing(&points).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 5, 21, 41));
        assert_eq!(bbox.row_at(0.5), 25);
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn landmark_indices_follow_network_order() {
        for (i, lm) in Landmark::ALL.iter().enumerate() {
            assert_eq!(lm.index(), i);
        }
        assert_eq!(Landmark::LeftAnkle.index(), 13);
    }

    #[test]
    fn keypoint_set_counts_and_mean() {
        let set = KeypointSet::empty()
            .with(Landmark::Nose, Keypoint::new(Point::new(5.0, 5.0), 0.8))
            .with(Landmark::Neck, Keypoint::new(Point::new(5.0, 15.0), 0.4));
        assert_eq!(set.num_present(), 2);
        assert!((set.mean_confidence() - 0.6).abs() < 1e-6);
        assert!(set.pair(Landmark::Nose, Landmark::Neck).is_some());
        assert!(set.pair(Landmark::Nose, Landmark::LeftHip).is_none());
        assert_eq!(KeypointSet::empty().mean_confidence(), 0.0);
    }

    #[test]
    fn gender_parsing() {
        assert_eq!(Gender::parse("Female"), Gender::Female);
        assert_eq!(Gender::parse(" child "), Gender::Child);
        assert_eq!(Gender::parse("male"), Gender::Male);
        assert_eq!(Gender::parse("robot"), Gender::Male);
    }

    #[test]
    fn input_defaults() {
        let inputs = AnthropometricInputs::from_optional(Some(-5.0), Some(f64::NAN), None);
        assert_eq!(inputs.height_cm, 170.0);
        assert_eq!(inputs.weight_kg, 70.0);
        assert_eq!(inputs.gender, Gender::Male);

        let inputs = AnthropometricInputs::from_optional(Some(182.0), Some(80.0), Some("female"));
        assert_eq!(inputs.height_cm, 182.0);
        assert_eq!(inputs.weight_kg, 80.0);
        assert_eq!(inputs.gender, Gender::Female);
    }

    #[test]
    fn measurements_round_to_one_decimal() {
        let m = Measurements {
            widths: BodyWidths {
                shoulder: 41.249,
                chest: 38.25,
                waist: 30.04,
                hip: 0.0,
            },
            height_cm: 175.0,
        };
        let r = m.rounded();
        assert!((r.widths.shoulder - 41.2).abs() < 1e-9);
        assert!((r.widths.waist - 30.0).abs() < 1e-9);
        assert_eq!(r.widths.hip, 0.0);
        assert!((round_to(0.456, 2) - 0.46).abs() < 1e-9);
    }
}
