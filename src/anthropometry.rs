//! Statistical body widths from height, weight and gender.
//!
//! Linear approximations of biacromial (shoulder) breadth scaled by height,
//! with chest, waist and hip widths derived from shoulder width and BMI.

use crate::types::{AnthropometricInputs, BodyWidths, Gender};

/// BMI assumed when weight is missing or non-positive.
pub const DEFAULT_BMI: f64 = 22.0;

/// Body mass index, falling back to [`DEFAULT_BMI`] for unusable inputs.
pub fn bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    if weight_kg > 0.0 && height_m > 0.0 {
        weight_kg / (height_m * height_m)
    } else {
        DEFAULT_BMI
    }
}

/// Predict frontal widths in centimeters.
pub fn predict(inputs: &AnthropometricInputs) -> BodyWidths {
    let h = inputs.height_cm;
    let bmi = bmi(h, inputs.weight_kg);

    match inputs.gender {
        Gender::Female => {
            let shoulder = 36.0 + (h - 162.0) * 0.12;
            let chest = shoulder * (0.85 + (bmi - 18.0) * 0.015);
            let hip = shoulder * (1.05 + (bmi - 20.0) * 0.01);
            BodyWidths {
                shoulder,
                chest,
                waist: hip * 0.72,
                hip,
            }
        }
        Gender::Male => {
            let shoulder = 41.0 + (h - 175.0) * 0.15;
            let chest = shoulder * (0.90 + (bmi - 22.0) * 0.01);
            BodyWidths {
                shoulder,
                chest,
                waist: chest * (0.78 + (bmi - 22.0) * 0.01),
                hip: shoulder * 0.94,
            }
        }
        Gender::Child => {
            let ratio = h / 170.0;
            BodyWidths {
                shoulder: 40.0 * ratio,
                chest: 35.0 * ratio,
                waist: 30.0 * ratio,
                hip: 34.0 * ratio,
            }
        }
    }
}
