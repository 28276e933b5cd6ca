// src/frame_source.rs

use crate::types::{Frame, SourceConfig, SourceKind};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use walkdir::WalkDir;

/// Pull-based, blocking frame provider. `Ok(None)` means the source is
/// exhausted and the run should end normally.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        (**self).read_frame()
    }
}

pub fn open(config: &SourceConfig) -> Result<Box<dyn FrameSource + Send>> {
    match &config.kind {
        SourceKind::Replay { dir } => Ok(Box::new(ReplaySource::open(dir)?)),
        SourceKind::Camera { index } => open_camera(*index, config.warmup_secs),
    }
}

#[cfg(feature = "vision")]
fn open_camera(index: i32, warmup_secs: f64) -> Result<Box<dyn FrameSource + Send>> {
    Ok(Box::new(camera::CameraSource::open(index, warmup_secs)?))
}

#[cfg(not(feature = "vision"))]
fn open_camera(index: i32, _warmup_secs: f64) -> Result<Box<dyn FrameSource + Send>> {
    bail!(
        "camera {} requested but this build has no camera support (enable the `vision` feature)",
        index
    )
}

// ============================================================================
// DIRECTORY REPLAY
// ============================================================================

/// Replays still images from a directory in file-name order.
pub struct ReplaySource {
    files: Vec<PathBuf>,
    next: usize,
}

impl ReplaySource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let image_extensions = ["png", "jpg", "jpeg", "bmp"];

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| image_extensions.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort_by_cached_key(|path| replay_key(path));

        if files.is_empty() {
            bail!("No replay images found in {}", dir.display());
        }

        info!("Replaying {} image(s) from {}", files.len(), dir.display());
        Ok(Self { files, next: 0 })
    }
}

/// Numeric-aware order, so `Frame2.jpg` replays before `Frame10.jpg`.
fn replay_key(path: &Path) -> (PathBuf, String, Option<u64>, PathBuf) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = stem[prefix.len()..].parse().ok();
    (
        path.parent().map(Path::to_path_buf).unwrap_or_default(),
        prefix.to_string(),
        number,
        path.to_path_buf(),
    )
}

impl FrameSource for ReplaySource {
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let rgb = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut data = rgb.into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }

        Ok(Some(Frame::new(data, width as usize, height as usize)))
    }
}

// ============================================================================
// CAMERA
// ============================================================================

#[cfg(feature = "vision")]
mod camera {
    use super::FrameSource;
    use crate::types::Frame;
    use anyhow::{bail, Context, Result};
    use opencv::{
        core::Mat,
        prelude::*,
        videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
    };
    use std::time::Duration;
    use tracing::info;

    pub struct CameraSource {
        cap: VideoCapture,
    }

    impl CameraSource {
        pub fn open(index: i32, warmup_secs: f64) -> Result<Self> {
            info!("Opening camera {}", index);
            let cap = VideoCapture::new(index, videoio::CAP_ANY)
                .with_context(|| format!("Failed to open camera {}", index))?;
            if !cap.is_opened()? {
                bail!("Camera {} is not available", index);
            }

            let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)?;
            let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)?;
            info!("Camera properties: {}x{}", width, height);

            // Let exposure and white balance settle.
            super::warm_up(Duration::from_secs_f64(warmup_secs));
            Ok(Self { cap })
        }
    }

    impl FrameSource for CameraSource {
        fn read_frame(&mut self) -> Result<Option<Frame>> {
            let mut mat = Mat::default();
            if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
                bail!("Camera returned no frame");
            }
            let mat = if mat.is_continuous() {
                mat
            } else {
                mat.try_clone()?
            };

            let data = mat.data_bytes()?.to_vec();
            Ok(Some(Frame::new(data, mat.cols() as usize, mat.rows() as usize)))
        }
    }
}

#[cfg_attr(not(feature = "vision"), allow(dead_code))]
fn warm_up(duration: Duration) {
    if !duration.is_zero() {
        info!("Waiting {:.1}s for camera warm-up", duration.as_secs_f64());
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ball-rover-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_replay_yields_bgr_frames_in_order() {
        let dir = scratch_dir("replay");
        RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]))
            .save(dir.join("b.png"))
            .unwrap();
        RgbImage::from_pixel(2, 2, Rgb([200, 100, 0]))
            .save(dir.join("a.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "not an image").unwrap();

        let mut source = ReplaySource::open(&dir).unwrap();

        let first = source.read_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (2, 2));
        assert_eq!(&first.data[..3], &[0, 100, 200]);

        let second = source.read_frame().unwrap().unwrap();
        assert_eq!((second.width, second.height), (4, 3));
        assert_eq!(&second.data[..3], &[30, 20, 10]);

        assert!(source.read_frame().unwrap().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_replay_orders_snapshot_numbers_numerically() {
        let dir = scratch_dir("replay-numeric");
        for (name, width) in [("Frame10.jpg", 3), ("Frame2.jpg", 2), ("Frame0.jpg", 1)] {
            RgbImage::from_pixel(width, 1, Rgb([0, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }

        let mut source = ReplaySource::open(&dir).unwrap();
        let widths: Vec<usize> = std::iter::from_fn(|| source.read_frame().unwrap())
            .map(|f| f.width)
            .collect();
        assert_eq!(widths, vec![1, 2, 3]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_replay_without_images_is_fatal() {
        let dir = scratch_dir("replay-empty");
        assert!(ReplaySource::open(&dir).is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(not(feature = "vision"))]
    #[test]
    fn test_camera_needs_feature() {
        let err = open(&SourceConfig::default()).err().unwrap();
        assert!(err.to_string().contains("camera"));
    }
}
