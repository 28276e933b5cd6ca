// src/snapshot.rs
//
// Periodic frame snapshots for offline tuning of the color thresholds.
// Purely observational: nothing here feeds back into control.

use crate::types::{Frame, SnapshotConfig};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::PathBuf;
use tracing::debug;

pub struct SnapshotSink {
    max_frames: u64,
    frame_divider: u64,
    output_dir: PathBuf,
}

impl SnapshotSink {
    /// `None` when snapshots are disabled.
    pub fn open(config: &SnapshotConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }
        let output_dir = PathBuf::from(&config.output_dir);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        Ok(Some(Self {
            max_frames: config.max_frames,
            frame_divider: config.frame_divider.max(1),
            output_dir,
        }))
    }

    pub fn wants(&self, index: u64) -> bool {
        index < self.max_frames && index % self.frame_divider == 0
    }

    /// Save the frame as `Frame{index}.jpg` if the index is due.
    pub fn offer(&self, index: u64, frame: &Frame) -> Result<Option<PathBuf>> {
        if !self.wants(index) {
            return Ok(None);
        }

        let mut rgb = frame.data.clone();
        for px in rgb.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        let image = RgbImage::from_raw(frame.width as u32, frame.height as u32, rgb)
            .context("Frame buffer does not match its dimensions")?;

        let path = self.output_dir.join(format!("Frame{}.jpg", index));
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Saved snapshot {}", path.display());
        Ok(Some(path))
    }
}
