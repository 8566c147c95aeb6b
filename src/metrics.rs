//! Pixel-space body metrics.
//!
//! Combines detected landmarks with the silhouette mask to measure frontal
//! widths in pixels, and records the rows they were measured on so the
//! annotator can draw them. Every metric goes through a [`Fallback`] chain:
//! keypoints first, then the contour bounding box.

use serde::Serialize;

use crate::fallback::Fallback;
use crate::silhouette::SilhouetteMask;
use crate::types::{BoundingBox, KeypointSet, Landmark};

/// Shoulder width as a fraction of the contour box width when shoulders are not detected.
const CONTOUR_SHOULDER_WIDTH: f32 = 0.8;
/// Contour box height fractions for rows when keypoints are missing.
const CONTOUR_SHOULDER_ROW: f32 = 0.15;
const CONTOUR_CHEST_ROW: f32 = 0.25;
const CONTOUR_HIP_ROW: f32 = 0.5;
/// Chest row as a fraction of the neck-to-hip span.
const CHEST_NECK_TO_HIP: f32 = 0.25;
/// Chest row below the neck as a fraction of body height, without hips.
const CHEST_NECK_TO_HEIGHT: f32 = 0.2;
/// Waist width relative to chest when no narrowest row is found.
const WAIST_FROM_CHEST: f32 = 0.85;
/// Rows below the chest where the fallback waist line is placed.
const WAIST_FALLBACK_OFFSET: i32 = 50;
/// Top of the body above the neck when the nose is missing.
const HEAD_ABOVE_NECK: f32 = 50.0;
/// Margin kept from the chest and hip rows, and step between sampled rows, in the waist search.
const WAIST_MARGIN: i32 = 10;
const WAIST_STEP: usize = 5;

/// A width measured on a particular image row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scanline {
    pub y: i32,
    pub width: f32,
}

impl Scanline {
    fn measure(silhouette: &SilhouetteMask, y: i32) -> Self {
        Self {
            y,
            width: silhouette.row_width(y),
        }
    }
}

/// Body widths and reference rows in pixels.
///
/// Widths are non-negative and 0 when undeterminable; rows are `None` when
/// no source could place them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PixelMetrics {
    pub height_px: f32,
    pub shoulder_px: f32,
    pub chest_px: f32,
    pub waist_px: f32,
    pub hip_px: f32,
    pub wrist_px: f32,
    pub shoulder_y: Option<i32>,
    pub chest_y: Option<i32>,
    pub waist_y: Option<i32>,
    pub hip_y: Option<i32>,
}

impl PixelMetrics {
    pub fn compute(keypoints: &KeypointSet, silhouette: &SilhouetteMask) -> Self {
        let bbox = silhouette.bounding_box();
        let height_px = body_height(keypoints, bbox);

        let shoulder = Fallback::new()
            .keypoints(|| {
                paired_scanline(keypoints, silhouette, Landmark::RightShoulder, Landmark::LeftShoulder)
            })
            .contour(|| {
                let b = bbox?;
                Some(Scanline {
                    y: b.row_at(CONTOUR_SHOULDER_ROW),
                    width: b.width as f32 * CONTOUR_SHOULDER_WIDTH,
                })
            })
            .value();

        let hip = Fallback::new()
            .keypoints(|| paired_scanline(keypoints, silhouette, Landmark::RightHip, Landmark::LeftHip))
            .contour(|| Some(Scanline::measure(silhouette, bbox?.row_at(CONTOUR_HIP_ROW))))
            .value();

        let chest = Fallback::new()
            .keypoints(|| {
                let neck_y = keypoints.point(Landmark::Neck)?.y;
                let y = match hip {
                    Some(hip) => neck_y + (hip.y as f32 - neck_y) * CHEST_NECK_TO_HIP,
                    None => neck_y + height_px * CHEST_NECK_TO_HEIGHT,
                };
                Some(Scanline::measure(silhouette, y as i32))
            })
            .contour(|| Some(Scanline::measure(silhouette, bbox?.row_at(CONTOUR_CHEST_ROW))))
            .value();

        let chest_px = chest.map_or(0.0, |c| c.width);
        let waist = match (chest, hip) {
            (Some(chest), Some(hip)) => narrowest_row(silhouette, chest.y, hip.y),
            _ => None,
        };
        let (waist_px, waist_y) = match waist {
            Some(w) => (w.width, Some(w.y)),
            None => (
                chest_px * WAIST_FROM_CHEST,
                chest.map(|c| c.y.saturating_add(WAIST_FALLBACK_OFFSET)),
            ),
        };

        let metrics = Self {
            height_px,
            shoulder_px: shoulder.map_or(0.0, |s| s.width),
            chest_px,
            waist_px,
            hip_px: hip.map_or(0.0, |h| h.width),
            wrist_px: wrist_width(keypoints, silhouette),
            shoulder_y: shoulder.map(|s| s.y),
            chest_y: chest.map(|c| c.y),
            waist_y,
            hip_y: hip.map(|h| h.y),
        };
        tracing::debug!(?metrics, "pixel metrics");
        metrics
    }
}

/// Vertical extent from the top of the head (nose) to the lowest ankle.
fn body_height(keypoints: &KeypointSet, bbox: Option<BoundingBox>) -> f32 {
    let top = keypoints
        .point(Landmark::Nose)
        .map(|p| p.y)
        .or_else(|| keypoints.point(Landmark::Neck).map(|p| p.y - HEAD_ABOVE_NECK))
        .unwrap_or(0.0);

    let bottom = Fallback::new()
        .keypoints(|| {
            [Landmark::RightAnkle, Landmark::LeftAnkle]
                .iter()
                .filter_map(|lm| keypoints.point(*lm))
                .map(|p| p.y)
                .reduce(f32::max)
        })
        .contour(|| Some(top + bbox?.height as f32))
        .value()
        .unwrap_or(0.0);

    (bottom - top).max(0.0)
}

/// Width across a left/right landmark pair, widened to the silhouette if it is broader.
fn paired_scanline(
    keypoints: &KeypointSet,
    silhouette: &SilhouetteMask,
    right: Landmark,
    left: Landmark,
) -> Option<Scanline> {
    let (r, l) = keypoints.pair(right, left)?;
    let y = ((r.y + l.y) / 2.0) as i32;
    Some(Scanline {
        y,
        width: (r.x - l.x).abs().max(silhouette.row_width(y)),
    })
}

/// Narrowest non-empty row between chest and hips, sampled every few rows.
fn narrowest_row(silhouette: &SilhouetteMask, chest_y: i32, hip_y: i32) -> Option<Scanline> {
    (chest_y.saturating_add(WAIST_MARGIN)..hip_y.saturating_sub(WAIST_MARGIN))
        .step_by(WAIST_STEP)
        .map(|y| Scanline::measure(silhouette, y))
        .filter(|s| s.width > 0.0)
        .min_by(|a, b| a.width.total_cmp(&b.width))
}

/// Mean silhouette width on the rows of the detected wrists.
fn wrist_width(keypoints: &KeypointSet, silhouette: &SilhouetteMask) -> f32 {
    let widths: Vec<f32> = [Landmark::RightWrist, Landmark::LeftWrist]
        .iter()
        .filter_map(|lm| keypoints.point(*lm))
        .map(|p| silhouette.row_width(p.row()))
        .collect();
    if widths.is_empty() {
        0.0
    } else {
        widths.iter().sum::<f32>() / widths.len() as f32
    }
}
