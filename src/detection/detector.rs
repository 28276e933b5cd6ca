// src/detection/detector.rs

use super::types::Contour;
use crate::types::{Config, Detection, Frame};
use anyhow::Result;

/// Turns a frame into a detection plus the raw blob set behind it.
pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<(Detection, Vec<Contour>)>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, frame: &Frame) -> Result<(Detection, Vec<Contour>)> {
        (**self).detect(frame)
    }
}

/// Build the color detector for this configuration.
#[cfg(feature = "vision")]
pub fn open(config: &Config) -> Result<Box<dyn Detector + Send>> {
    Ok(Box::new(vision::BallDetector::new(config)))
}

#[cfg(not(feature = "vision"))]
pub fn open(config: &Config) -> Result<Box<dyn Detector + Send>> {
    anyhow::bail!(
        "ball detection needs OpenCV; rebuild with the `vision` feature (hsv {:?}..{:?})",
        config.detector.hsv_lower,
        config.detector.hsv_upper
    )
}

#[cfg(feature = "vision")]
mod vision {
    use super::super::segmentation::ColorSegmenter;
    use super::super::validity::{DetectionFilter, EnclosingRadiusSpread};
    use super::{Contour, Detector};
    use crate::types::{Config, Detection, Frame};
    use anyhow::{Context, Result};

    /// Color segmentation followed by the validity filter.
    pub struct BallDetector {
        segmenter: ColorSegmenter,
        filter: DetectionFilter,
    }

    impl BallDetector {
        pub fn new(config: &Config) -> Self {
            let policy = EnclosingRadiusSpread {
                tolerance_px: config.detector.shape_tolerance_px,
            };
            Self {
                segmenter: ColorSegmenter::new(config.detector.clone()),
                filter: DetectionFilter::new(config.control.max_valid_radius, Box::new(policy)),
            }
        }
    }

    impl Detector for BallDetector {
        fn detect(&mut self, frame: &Frame) -> Result<(Detection, Vec<Contour>)> {
            let contours = self
                .segmenter
                .contours(frame)
                .context("Segmentation failed")?;
            let detection = self.filter.evaluate(&contours);
            Ok((detection, contours))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_detects_green_disc() {
            let (w, h) = (600usize, 450usize);
            let mut data = vec![0u8; w * h * 3];
            for y in 0..h as i32 {
                for x in 0..w as i32 {
                    if (x - 120).pow(2) + (y - 260).pow(2) <= 35 * 35 {
                        let i = (y as usize * w + x as usize) * 3;
                        data[i..i + 3].copy_from_slice(&[40, 200, 60]);
                    }
                }
            }

            let mut detector = BallDetector::new(&Config::default());
            let (det, contours) = detector.detect(&Frame::new(data, w, h)).unwrap();
            assert_eq!(contours.len(), 1);
            assert!(det.found);
            assert!((det.center.0 - 120).abs() <= 1);
            assert!((det.center.1 - 260).abs() <= 1);
            assert!(det.radius > 30.0);
        }

        #[test]
        fn test_blank_frame_has_no_ball() {
            let mut detector = BallDetector::new(&Config::default());
            let (det, contours) = detector
                .detect(&Frame::new(vec![0u8; 600 * 400 * 3], 600, 400))
                .unwrap();
            assert!(contours.is_empty());
            assert!(!det.found);
        }
    }
}
