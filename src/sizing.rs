//! Clothing size lookup from the fused chest width.

use serde::Serialize;

use crate::types::Gender;

/// Converts a frontal chest width to an approximate chest circumference.
///
/// Empirical factor (twice the width plus ~10% for body depth); kept as-is.
pub const CIRCUMFERENCE_FACTOR: f64 = 2.2;

/// A recommended size: the short code and a descriptive label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeRecommendation {
    pub size: &'static str,
    pub details: &'static str,
}

/// One row of a size table: circumferences strictly below `upper_cm` map to this size.
struct SizeBand {
    upper_cm: f64,
    size: &'static str,
    details: &'static str,
}

const MALE_BANDS: [SizeBand; 5] = [
    SizeBand { upper_cm: 86.0, size: "XS", details: "Extra Small (34)" },
    SizeBand { upper_cm: 94.0, size: "S", details: "Small (36-38)" },
    SizeBand { upper_cm: 102.0, size: "M", details: "Medium (38-40)" },
    SizeBand { upper_cm: 112.0, size: "L", details: "Large (42-44)" },
    SizeBand { upper_cm: 122.0, size: "XL", details: "Extra Large (46)" },
];
const MALE_LARGEST: SizeRecommendation = SizeRecommendation {
    size: "XXL",
    details: "Double Extra Large (48+)",
};

const FEMALE_BANDS: [SizeBand; 4] = [
    SizeBand { upper_cm: 80.0, size: "XS (0-2)", details: "Extra Small" },
    SizeBand { upper_cm: 88.0, size: "S (4-6)", details: "Small" },
    SizeBand { upper_cm: 96.0, size: "M (8-10)", details: "Medium" },
    SizeBand { upper_cm: 104.0, size: "L (12-14)", details: "Large" },
];
const FEMALE_LARGEST: SizeRecommendation = SizeRecommendation {
    size: "XL (16+)",
    details: "Extra Large",
};

/// Estimated chest circumference in centimeters.
pub fn chest_circumference(chest_width_cm: f64) -> f64 {
    chest_width_cm * CIRCUMFERENCE_FACTOR
}

/// Map a chest width to a size. Children and unknown genders use the men's table.
pub fn recommend(chest_width_cm: f64, gender: Gender) -> SizeRecommendation {
    let (bands, largest): (&[SizeBand], SizeRecommendation) = match gender {
        Gender::Female => (&FEMALE_BANDS, FEMALE_LARGEST),
        Gender::Male | Gender::Child => (&MALE_BANDS, MALE_LARGEST),
    };

    let circumference = chest_circumference(chest_width_cm);
    bands
        .iter()
        .find(|band| circumference < band.upper_cm)
        .map(|band| SizeRecommendation {
            size: band.size,
            details: band.details,
        })
        .unwrap_or(largest)
}

/// Reference chest/bust ranges for tops, per size code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeChart {
    pub name: &'static str,
    /// Body measurement the ranges refer to ("chest" or "bust").
    pub measure: &'static str,
    pub rows: Vec<ChartRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartRow {
    pub size: &'static str,
    pub min_cm: u32,
    pub max_cm: u32,
}

/// Standard men's and women's tops charts for display alongside a recommendation.
pub fn reference_charts() -> Vec<SizeChart> {
    let rows = |ranges: [(&'static str, u32, u32); 5]| -> Vec<ChartRow> {
        ranges
            .iter()
            .map(|&(size, min_cm, max_cm)| ChartRow { size, min_cm, max_cm })
            .collect()
    };
    vec![
        SizeChart {
            name: "mens_tops",
            measure: "chest",
            rows: rows([
                ("XS", 86, 91),
                ("S", 91, 96),
                ("M", 96, 101),
                ("L", 101, 106),
                ("XL", 106, 111),
            ]),
        },
        SizeChart {
            name: "womens_tops",
            measure: "bust",
            rows: rows([
                ("XS", 78, 82),
                ("S", 82, 86),
                ("M", 86, 90),
                ("L", 90, 94),
                ("XL", 94, 99),
            ]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn male_examples() {
        // 40cm * 2.2 = 88cm
        assert_eq!(recommend(40.0, Gender::Male).size, "S");
        assert_eq!(recommend(30.0, Gender::Male).size, "XS");
        assert_eq!(recommend(45.0, Gender::Male).size, "M");
        assert_eq!(recommend(50.0, Gender::Male).details, "Large (42-44)");
        assert_eq!(recommend(60.0, Gender::Male), MALE_LARGEST);
    }

    #[test]
    fn female_examples() {
        // 45cm * 2.2 = 99cm
        let rec = recommend(45.0, Gender::Female);
        assert_eq!(rec.size, "L (12-14)");
        assert_eq!(rec.details, "Large");
        assert_eq!(recommend(35.0, Gender::Female).size, "XS (0-2)");
        assert_eq!(recommend(50.0, Gender::Female).size, "XL (16+)");
    }

    #[test]
    fn upper_bounds_are_exclusive() {
        // 43cm * 2.2 = 94.6 -> M; exactly 94 would also be M
        assert_eq!(recommend(94.0 / 2.2 + 1e-9, Gender::Male).size, "M");
        assert_eq!(recommend(93.9 / 2.2, Gender::Male).size, "S");
    }

    #[test]
    fn child_uses_male_table() {
        for width in [20.0, 40.0, 48.0, 56.0] {
            assert_eq!(recommend(width, Gender::Child), recommend(width, Gender::Male));
        }
    }

    #[test]
    fn reference_charts_cover_both_tables() {
        let charts = reference_charts();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].rows[0], ChartRow { size: "XS", min_cm: 86, max_cm: 91 });
        assert_eq!(charts[1].measure, "bust");
        assert_eq!(charts[1].rows[4].max_cm, 99);
    }
}
