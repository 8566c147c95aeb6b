//! Foreground silhouette extraction.
//!
//! The subject is assumed to be darker than (or otherwise separable from) the
//! background: grayscale, blur, Otsu threshold with the dark side as
//! foreground, then a morphological opening to drop speckle. The largest
//! external contour is taken to be the subject.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;

use crate::config::SilhouetteConfig;
use crate::types::{BoundingBox, Point};

/// Binary foreground mask plus the subject's outline, if any was found.
#[derive(Debug, Clone)]
pub struct SilhouetteMask {
    mask: GrayImage,
    contour: Option<Vec<Point>>,
}

impl SilhouetteMask {
    /// Segment the subject from `image`.
    pub fn extract(image: &RgbImage, config: &SilhouetteConfig) -> Self {
        let gray = image::imageops::grayscale(image);
        let blurred = if config.blur_sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(&gray, config.blur_sigma)
        } else {
            gray
        };

        let level = imageproc::contrast::otsu_level(&blurred);
        let thresholded = GrayImage::from_fn(blurred.width(), blurred.height(), |x, y| {
            if blurred.get_pixel(x, y)[0] <= level {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let mask = if config.open_radius > 0 {
            imageproc::morphology::open(&thresholded, Norm::LInf, config.open_radius)
        } else {
            thresholded
        };

        Self::from_mask(mask)
    }

    /// Wrap an existing mask (non-zero = foreground) and locate its largest
    /// external contour.
    pub fn from_mask(mask: GrayImage) -> Self {
        let contour = find_contours::<i32>(&mask)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .map(|c| {
                c.points
                    .iter()
                    .map(|p| Point::new(p.x as f32, p.y as f32))
                    .collect::<Vec<_>>()
            })
            .max_by(|a, b| polygon_area(a).total_cmp(&polygon_area(b)));

        if contour.is_none() {
            tracing::warn!("No foreground contour found");
        }

        Self { mask, contour }
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn contour(&self) -> Option<&[Point]> {
        self.contour.as_deref()
    }

    /// Bounding box of the subject contour.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.contour.as_deref().and_then(BoundingBox::enclosing)
    }

    /// Distance between the leftmost and rightmost foreground pixel in row `y`.
    ///
    /// Rows outside the image, or without foreground, have width 0.
    pub fn row_width(&self, y: i32) -> f32 {
        if y < 0 || y >= self.mask.height() as i32 {
            return 0.0;
        }
        let y = y as u32;
        let mut first = None;
        let mut last = 0u32;
        for x in 0..self.mask.width() {
            if self.mask.get_pixel(x, y)[0] > 0 {
                first.get_or_insert(x);
                last = x;
            }
        }
        first.map_or(0.0, |first| (last - first) as f32)
    }
}

/// Calculate the area of a polygon using the shoelace formula.
pub fn polygon_area(points: &[Point]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    (area / 2.0).abs()
}
