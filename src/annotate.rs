//! Diagnostic overlay rendering.
//!
//! Draws the measurement lines, labels, method, size and (when the image path
//! contributed) a light pose skeleton on a copy of the input photo. Placement
//! only: no measurement happens here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::borrow::Cow;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;

use crate::error::{Error, Result};
use crate::fallback::Fallback;
use crate::fusion::Method;
use crate::glyphs::{glyph, text_size, ADVANCE, GLYPH_WIDTH};
use crate::metrics::PixelMetrics;
use crate::sizing::SizeRecommendation;
use crate::types::{KeypointSet, Landmark, Measurements};

pub const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Largest width or height a baseline JPEG can describe.
pub const JPEG_MAX_SIDE: u32 = u16::MAX as u32;

const COLOR_LINE: Rgb<u8> = Rgb([0, 0, 255]);
const COLOR_ESTIMATED: Rgb<u8> = Rgb([255, 165, 0]);
const COLOR_TEXT: Rgb<u8> = Rgb([50, 50, 50]);
const COLOR_TEXT_BG: Rgb<u8> = Rgb([255, 255, 255]);
const COLOR_METHOD_IMAGE: Rgb<u8> = Rgb([0, 255, 0]);
const COLOR_METHOD_STATISTICAL: Rgb<u8> = Rgb([255, 0, 0]);
const COLOR_SKELETON: Rgb<u8> = Rgb([200, 200, 200]);
const COLOR_JOINT: Rgb<u8> = Rgb([255, 0, 0]);
const COLOR_SIZE: Rgb<u8> = Rgb([0, 0, 255]);

const MARGIN: i32 = 30;
const DASH: usize = 15;
const LINE_THICKNESS: i32 = 2;
const LABEL_SCALE: i32 = 2;
const SIZE_SCALE: i32 = 4;
const JOINT_RADIUS: i32 = 3;

/// Image-height fractions used when a measurement row is unknown or synthetic.
const SHOULDER_ROW: f32 = 0.18;
const CHEST_ROW: f32 = 0.3;
const WAIST_ROW: f32 = 0.45;
const HIP_ROW: f32 = 0.55;

/// Limb segments drawn for the skeleton overlay.
pub const SKELETON: [(Landmark, Landmark); 12] = [
    (Landmark::Neck, Landmark::RightShoulder),
    (Landmark::Neck, Landmark::LeftShoulder),
    (Landmark::RightShoulder, Landmark::RightElbow),
    (Landmark::RightElbow, Landmark::RightWrist),
    (Landmark::LeftShoulder, Landmark::LeftElbow),
    (Landmark::LeftElbow, Landmark::LeftWrist),
    (Landmark::Neck, Landmark::RightHip),
    (Landmark::RightHip, Landmark::RightKnee),
    (Landmark::RightKnee, Landmark::RightAnkle),
    (Landmark::Neck, Landmark::LeftHip),
    (Landmark::LeftHip, Landmark::LeftKnee),
    (Landmark::LeftKnee, Landmark::LeftAnkle),
];

/// Everything the overlay shows for one estimate.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    pub method: Method,
    pub measurements: &'a Measurements,
    pub metrics: &'a PixelMetrics,
    pub keypoints: &'a KeypointSet,
    pub size: &'a SizeRecommendation,
}

/// Render the overlay on a copy of `image`.
pub fn annotate(image: &RgbImage, overlay: &Overlay<'_>) -> RgbImage {
    let mut canvas = image.clone();
    let height = canvas.height();
    let synthetic = overlay.method == Method::Anthropometric;

    draw_text(
        &mut canvas,
        MARGIN,
        20,
        &format!("Height: {:.1}cm", overlay.measurements.height_cm),
        LABEL_SCALE,
        COLOR_TEXT,
    );
    let method_color = if synthetic {
        COLOR_METHOD_STATISTICAL
    } else {
        COLOR_METHOD_IMAGE
    };
    draw_text(
        &mut canvas,
        MARGIN,
        50,
        &format!("Method: {}", overlay.method.title()),
        LABEL_SCALE,
        method_color,
    );

    let widths = &overlay.measurements.widths;
    let metrics = overlay.metrics;
    let lines = [
        ("Shoulder", widths.shoulder, metrics.shoulder_y, SHOULDER_ROW),
        ("Chest", widths.chest, metrics.chest_y, CHEST_ROW),
        ("Waist", widths.waist, metrics.waist_y, WAIST_ROW),
        ("Hips", widths.hip, metrics.hip_y, HIP_ROW),
    ];
    for (label, value, measured, fraction) in lines {
        if let Some(y) = line_row(measured, fraction, height, synthetic) {
            draw_measure(&mut canvas, y, label, value, synthetic);
        }
    }

    if !synthetic {
        draw_skeleton(&mut canvas, overlay.keypoints);
    }

    let size_text = format!("Size: {}", overlay.size.size);
    let (_, size_h) = text_size(&size_text, SIZE_SCALE);
    draw_text(
        &mut canvas,
        MARGIN,
        height as i32 - MARGIN - size_h,
        &size_text,
        SIZE_SCALE,
        COLOR_SIZE,
    );

    canvas
}

/// Row for a measurement line: the measured row unless the values are
/// synthetic, else a fixed fraction of the image height.
fn line_row(measured: Option<i32>, fraction: f32, image_height: u32, synthetic: bool) -> Option<i32> {
    Fallback::new()
        .contour(|| measured.filter(|y| *y > 0 && !synthetic))
        .proportional(|| Some((image_height as f32 * fraction) as i32))
        .value()
}

fn draw_measure(canvas: &mut RgbImage, y: i32, label: &str, value: f64, estimated: bool) {
    if y <= 0 || y >= canvas.height() as i32 {
        return;
    }
    let color = if estimated { COLOR_ESTIMATED } else { COLOR_LINE };
    let right = canvas.width() as i32 - MARGIN;
    draw_dashed_hline(canvas, y, MARGIN, right, color);

    let mut text = format!("{}: {:.1}cm", label, value);
    if estimated {
        text.push('*');
    }
    let (tw, th) = text_size(&text, LABEL_SCALE);
    let frame = Rect::at(MARGIN, y - th - 15).of_size((tw + 20) as u32, (th + 20) as u32);
    draw_filled_rect_mut(canvas, frame, COLOR_TEXT_BG);
    draw_hollow_rect_mut(canvas, frame, color);
    draw_text(canvas, MARGIN + 10, y - 5 - th, &text, LABEL_SCALE, COLOR_TEXT);
}

/// Alternating dashes between dash points spaced `DASH` pixels apart.
fn draw_dashed_hline(canvas: &mut RgbImage, y: i32, x0: i32, x1: i32, color: Rgb<u8>) {
    if x1 <= x0 {
        return;
    }
    let stops: Vec<f32> = (x0..x1).step_by(DASH).map(|x| x as f32).collect();
    for dash in stops.chunks_exact(2) {
        for t in 0..LINE_THICKNESS {
            let row = (y + t) as f32;
            draw_line_segment_mut(canvas, (dash[0], row), (dash[1], row), color);
        }
    }
}

fn draw_skeleton(canvas: &mut RgbImage, keypoints: &KeypointSet) {
    for (a, b) in SKELETON {
        let Some((p1, p2)) = keypoints.pair(a, b) else {
            continue;
        };
        for t in 0..LINE_THICKNESS {
            let offset = t as f32;
            draw_line_segment_mut(
                canvas,
                (p1.x + offset, p1.y),
                (p2.x + offset, p2.y),
                COLOR_SKELETON,
            );
        }
        draw_filled_circle_mut(canvas, (p1.x as i32, p1.y as i32), JOINT_RADIUS, COLOR_JOINT);
    }
}

/// Draw `text` with its top-left corner at (`x`, `y`).
fn draw_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, scale: i32, color: Rgb<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                    let px = cursor_x + col * scale;
                    let py = y + row as i32 * scale;
                    draw_filled_rect_mut(
                        canvas,
                        Rect::at(px, py).of_size(scale as u32, scale as u32),
                        color,
                    );
                }
            }
        }
        cursor_x += ADVANCE * scale;
    }
}

/// Encode as JPEG and wrap in a `data:` URI.
///
/// Images with a side above [`JPEG_MAX_SIDE`] are downscaled to fit first.
pub fn to_data_uri(image: &RgbImage, quality: u8) -> Result<String> {
    let image = fit_jpeg_limits(image);
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder.encode_image(image.as_ref()).map_err(Error::Encode)?;
    }
    Ok(format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(&bytes)))
}

fn fit_jpeg_limits(image: &RgbImage) -> Cow<'_, RgbImage> {
    let (w, h) = image.dimensions();
    let largest = w.max(h);
    if largest <= JPEG_MAX_SIDE {
        return Cow::Borrowed(image);
    }
    let scaled = |side: u32| ((side as u64 * JPEG_MAX_SIDE as u64 / largest as u64) as u32).max(1);
    tracing::debug!(width = w, height = h, "downscaling overlay to fit JPEG limits");
    Cow::Owned(imageops::resize(image, scaled(w), scaled(h), FilterType::Triangle))
}

/// Recover the JPEG bytes from a URI produced by [`to_data_uri`].
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let payload = uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or_else(|| Error::DataUri("expected a base64 JPEG data URI".into()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| Error::DataUri(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BodyWidths, Keypoint, Point};

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn canvas() -> RgbImage {
        RgbImage::from_pixel(400, 400, WHITE)
    }

    fn measurements() -> Measurements {
        Measurements {
            widths: BodyWidths {
                shoulder: 40.0,
                chest: 36.5,
                waist: 30.2,
                hip: 35.0,
            },
            height_cm: 175.0,
        }
    }

    fn metrics() -> PixelMetrics {
        PixelMetrics {
            height_px: 350.0,
            shoulder_px: 80.0,
            chest_px: 79.0,
            waist_px: 49.0,
            hip_px: 69.0,
            shoulder_y: Some(70),
            chest_y: Some(95),
            waist_y: Some(120),
            hip_y: Some(200),
            ..Default::default()
        }
    }

    fn keypoints() -> KeypointSet {
        KeypointSet::empty()
            .with(Landmark::RightHip, Keypoint::new(Point::new(75.0, 200.0), 0.9))
            .with(Landmark::RightKnee, Keypoint::new(Point::new(75.0, 290.0), 0.9))
    }

    fn render(method: Method) -> RgbImage {
        let m = measurements();
        let px = metrics();
        let kp = keypoints();
        let size = SizeRecommendation {
            size: "M",
            details: "Medium (38-40)",
        };
        annotate(
            &canvas(),
            &Overlay {
                method,
                measurements: &m,
                metrics: &px,
                keypoints: &kp,
                size: &size,
            },
        )
    }

    #[test]
    fn measured_rows_use_metrics() {
        let img = render(Method::Image);
        assert_eq!(img.dimensions(), (400, 400));
        // dash from x=330 to 345 on the chest row
        assert_eq!(*img.get_pixel(335, 95), COLOR_LINE);
        assert_eq!(*img.get_pixel(335, 96), COLOR_LINE);
        // gap between dashes
        assert_eq!(*img.get_pixel(350, 95), WHITE);
    }

    #[test]
    fn skeleton_only_when_image_contributes() {
        let image = render(Method::Hybrid);
        assert_eq!(*image.get_pixel(75, 250), COLOR_SKELETON);

        let synthetic = render(Method::Anthropometric);
        assert_eq!(*synthetic.get_pixel(75, 250), WHITE);
    }

    #[test]
    fn synthetic_lines_use_fixed_fractions() {
        let img = render(Method::Anthropometric);
        // 400 * 0.18 = 72
        assert_eq!(*img.get_pixel(335, 72), COLOR_ESTIMATED);
        // measured chest row is not used
        assert_eq!(*img.get_pixel(335, 95), WHITE);
    }

    #[test]
    fn line_row_resolution() {
        assert_eq!(line_row(Some(95), CHEST_ROW, 400, false), Some(95));
        assert_eq!(line_row(None, CHEST_ROW, 400, false), Some(120));
        assert_eq!(line_row(Some(0), WAIST_ROW, 400, false), Some(180));
        assert_eq!(line_row(Some(95), HIP_ROW, 400, true), Some(220));
    }

    #[test]
    fn out_of_image_rows_are_skipped() {
        let mut img = canvas();
        draw_measure(&mut img, 0, "Chest", 30.0, false);
        draw_measure(&mut img, 400, "Chest", 30.0, false);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(Method::Image), render(Method::Image));
    }

    #[test]
    fn data_uri_round_trip() {
        let img = render(Method::Hybrid);
        let uri = to_data_uri(&img, 90).unwrap();
        assert!(uri.starts_with(DATA_URI_PREFIX));

        let bytes = decode_data_uri(&uri).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 400));
    }

    #[test]
    fn oversized_overlay_is_downscaled() {
        let img = RgbImage::from_pixel(70_000, 2, WHITE);
        let bytes = decode_data_uri(&to_data_uri(&img, 90).unwrap()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (JPEG_MAX_SIDE, 1));

        let small = RgbImage::from_pixel(30, 20, WHITE);
        assert!(matches!(fit_jpeg_limits(&small), Cow::Borrowed(_)));
    }

    #[test]
    fn rejects_foreign_uri() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,AAAA"),
            Err(Error::DataUri(_))
        ));
    }
}
