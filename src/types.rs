// src/types.rs

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub control: ControlConfig,
    pub detector: DetectorConfig,
    pub snapshot: SnapshotConfig,
    pub source: SourceConfig,
    pub actuator: ActuatorConfig,
}

/// Thresholds for the approach/scoop state machine and the loop rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Below this x coordinate the ball counts as close.
    pub close_x_threshold: i32,
    pub turn_band_low: i32,
    pub turn_band_high: i32,
    pub min_intake_radius: f32,
    pub max_valid_radius: f32,
    pub scoop_hold_seconds: f64,
    pub target_fps: u32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            close_x_threshold: 100,
            turn_band_low: 150,
            turn_band_high: 300,
            min_intake_radius: 30.0,
            max_valid_radius: 100.0,
            scoop_hold_seconds: 3.0,
            target_fps: 10,
        }
    }
}

impl ControlConfig {
    pub fn scoop_hold(&self) -> Duration {
        Duration::from_secs_f64(self.scoop_hold_seconds)
    }
}

/// Color segmentation parameters. HSV bounds use the OpenCV scale
/// (H 0-179, S 0-255, V 0-255).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub hsv_lower: [u8; 3],
    pub hsv_upper: [u8; 3],
    pub resize_width: usize,
    pub blur_kernel: usize,
    pub erode_iterations: usize,
    pub dilate_iterations: usize,
    /// Max enclosing-radius spread between largest and smallest blob.
    pub shape_tolerance_px: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hsv_lower: [29, 86, 6],
            hsv_upper: [64, 255, 255],
            resize_width: 600,
            blur_kernel: 11,
            erode_iterations: 2,
            dilate_iterations: 2,
            shape_tolerance_px: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub enabled: bool,
    pub max_frames: u64,
    pub frame_divider: u64,
    pub output_dir: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_frames: 50,
            frame_divider: 10,
            output_dir: "snapshots".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceKind {
    Camera { index: i32 },
    Replay { dir: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub warmup_secs: f64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Camera { index: 0 },
            warmup_secs: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorBackend {
    Sysfs,
    DryRun,
}

/// How an H-bridge channel is parked when told to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopMode {
    /// Both inputs low.
    Coast,
    /// Both inputs high.
    Brake,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeChannel {
    pub forward_pin: u32,
    pub backward_pin: u32,
    pub stop: StopMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub backend: ActuatorBackend,
    pub gpio_root: String,
    pub left: BridgeChannel,
    pub right: BridgeChannel,
    /// Forward drives the belt inward (intake).
    pub belt: BridgeChannel,
}

impl Default for ActuatorConfig {
    // BCM line numbers; header pins in the comments.
    fn default() -> Self {
        Self {
            backend: ActuatorBackend::DryRun,
            gpio_root: "/sys/class/gpio".to_string(),
            left: BridgeChannel {
                forward_pin: 24,  // header 18
                backward_pin: 18, // header 12
                stop: StopMode::Coast,
            },
            right: BridgeChannel {
                forward_pin: 26,  // header 37
                backward_pin: 19, // header 35
                stop: StopMode::Brake,
            },
            belt: BridgeChannel {
                forward_pin: 12, // header 32
                backward_pin: 8, // header 24
                stop: StopMode::Brake,
            },
        }
    }
}

// ============================================================================
// FRAMES & DETECTIONS
// ============================================================================

/// Interleaved 8-bit BGR pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Self {
        Self {
            data,
            width,
            height,
        }
    }
}

/// Per-frame judgment of whether a ball is visible and where.
/// `center` and `radius` carry no meaning when `found` is false.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub found: bool,
    pub center: (i32, i32),
    pub radius: f32,
}

impl Detection {
    pub fn none() -> Self {
        Self {
            found: false,
            center: (0, 0),
            radius: 0.0,
        }
    }

    pub fn at(x: i32, y: i32, radius: f32) -> Self {
        Self {
            found: true,
            center: (x, y),
            radius,
        }
    }
}

// ============================================================================
// MOTION COMMANDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriveAction {
    DriveForward,
    TurnLeft,
    TurnRight,
    SearchSpin,
    /// Part of the command vocabulary; the approach controller never emits it.
    #[cfg(test)]
    HoldForward,
}

impl DriveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveAction::DriveForward => "DRIVE_FORWARD",
            DriveAction::TurnLeft => "TURN_LEFT",
            DriveAction::TurnRight => "TURN_RIGHT",
            DriveAction::SearchSpin => "SEARCH_SPIN",
            #[cfg(test)]
            DriveAction::HoldForward => "HOLD_FORWARD",
        }
    }

    /// Per-side wheel directions as (left, right).
    pub fn wheels(&self) -> (WheelDirection, WheelDirection) {
        use WheelDirection::*;
        match self {
            DriveAction::DriveForward => (Forward, Forward),
            #[cfg(test)]
            DriveAction::HoldForward => (Forward, Forward),
            DriveAction::TurnLeft => (Stop, Forward),
            DriveAction::TurnRight => (Forward, Stop),
            DriveAction::SearchSpin => (Backward, Forward),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BeltAction {
    Intake,
    /// Reverses the belt; no control path ejects a ball.
    #[cfg(test)]
    Outtake,
    Stop,
}

impl BeltAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BeltAction::Intake => "INTAKE",
            #[cfg(test)]
            BeltAction::Outtake => "OUTTAKE",
            BeltAction::Stop => "STOP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WheelDirection {
    Forward,
    Backward,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Motion {
    pub drive: DriveAction,
    pub belt: BeltAction,
}

impl Motion {
    pub fn new(drive: DriveAction, belt: BeltAction) -> Self {
        Self { drive, belt }
    }

    pub fn search() -> Self {
        Self::new(DriveAction::SearchSpin, BeltAction::Stop)
    }

    pub fn scoop() -> Self {
        Self::new(DriveAction::DriveForward, BeltAction::Intake)
    }
}

impl std::fmt::Display for Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.drive.as_str(), self.belt.as_str())
    }
}
