// src/detection/segmentation.rs
//
// Color segmentation for the ball detector.
//
// Pipeline per frame:
//   BGR frame → resize to working width → Gaussian blur → HSV
//             → in-range mask → erode ×N → dilate ×N → external contours
//
// HSV bounds are on OpenCV's 8-bit scale (H 0-179, S 0-255, V 0-255).

use super::types::{Circle, Contour, Moments};
use crate::types::{DetectorConfig, Frame};
use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat, Point, Point2f, Scalar, Size, Vector, CV_8UC3},
    imgproc,
    prelude::*,
};
use tracing::debug;

pub struct ColorSegmenter {
    config: DetectorConfig,
}

impl ColorSegmenter {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Extract candidate blobs. Coordinates are in the resized frame.
    pub fn contours(&self, frame: &Frame) -> Result<Vec<Contour>> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(Vec::new());
        }

        let bgr = frame_to_mat(frame)?;
        let resized = resize_to_width(bgr, self.config.resize_width)?;
        let mask = self.mask(&resized).context("Color mask failed")?;

        let mut raw = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &mask,
            &mut raw,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )?;

        let mut blobs = Vec::with_capacity(raw.len());
        for points in raw.iter() {
            blobs.push(describe(&points)?);
        }

        debug!(
            "Segmented {}x{} frame: {} blob(s)",
            resized.cols(),
            resized.rows(),
            blobs.len()
        );
        Ok(blobs)
    }

    fn mask(&self, bgr: &Mat) -> Result<Mat> {
        let k = self.config.blur_kernel as i32;
        let mut blurred = Mat::default();
        imgproc::gaussian_blur(bgr, &mut blurred, Size::new(k, k), 0.0, 0.0, core::BORDER_DEFAULT)?;

        let mut hsv = Mat::default();
        imgproc::cvt_color(&blurred, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

        let mut mask = Mat::default();
        core::in_range(
            &hsv,
            &hsv_bound(self.config.hsv_lower),
            &hsv_bound(self.config.hsv_upper),
            &mut mask,
        )?;

        // An empty kernel is OpenCV's 3x3 rectangle.
        let mut eroded = Mat::default();
        imgproc::erode(
            &mask,
            &mut eroded,
            &Mat::default(),
            Point::new(-1, -1),
            self.config.erode_iterations as i32,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let mut dilated = Mat::default();
        imgproc::dilate(
            &eroded,
            &mut dilated,
            &Mat::default(),
            Point::new(-1, -1),
            self.config.dilate_iterations as i32,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        Ok(dilated)
    }
}

fn hsv_bound([h, s, v]: [u8; 3]) -> Scalar {
    Scalar::new(h as f64, s as f64, v as f64, 0.0)
}

fn describe(points: &Vector<Point>) -> Result<Contour> {
    let area = imgproc::contour_area(points, false)?;
    let m = imgproc::moments(points, false)?;

    let mut center = Point2f::default();
    let mut radius = 0.0f32;
    imgproc::min_enclosing_circle(points, &mut center, &mut radius)?;

    Ok(Contour {
        area,
        moments: Moments {
            m00: m.m00,
            m10: m.m10,
            m01: m.m01,
        },
        enclosing: Circle {
            center: (center.x, center.y),
            radius,
        },
    })
}

/// Copy a packed BGR frame into a 3-channel Mat.
fn frame_to_mat(frame: &Frame) -> Result<Mat> {
    let expected = frame.width * frame.height * 3;
    if frame.data.len() != expected {
        bail!(
            "Frame buffer is {} bytes, expected {} for {}x{} BGR",
            frame.data.len(),
            expected,
            frame.width,
            frame.height
        );
    }

    let mut mat = Mat::new_rows_cols_with_default(
        frame.height as i32,
        frame.width as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(&frame.data);
    Ok(mat)
}

/// Resize keeping aspect ratio so the output is `width` pixels wide.
fn resize_to_width(src: Mat, width: usize) -> Result<Mat> {
    let (w, h) = (src.cols(), src.rows());
    let target_w = width as i32;
    if w == target_w {
        return Ok(src);
    }

    let target_h = ((h as f64 * target_w as f64 / w as f64) as i32).max(1);
    let mut dst = Mat::default();
    imgproc::resize(
        &src,
        &mut dst,
        Size::new(target_w, target_h),
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;
    Ok(dst)
}
