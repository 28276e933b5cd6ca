// src/pipeline/metrics.rs
//
// Per-run counters, logged as one JSON line at shutdown.

use crate::control::ControllerState;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub ticks: u64,
    pub frames_with_ball: u64,
    pub scoops_started: u64,
    pub ticks_searching: u64,
    pub ticks_tracking: u64,
    pub ticks_scooping: u64,
    pub last_fps: Option<u32>,
    pub elapsed_secs: f64,
    #[serde(skip)]
    started_at: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            ticks: 0,
            frames_with_ball: 0,
            scoops_started: 0,
            ticks_searching: 0,
            ticks_tracking: 0,
            ticks_scooping: 0,
            last_fps: None,
            elapsed_secs: 0.0,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, found: bool, before: ControllerState, after: ControllerState) {
        self.ticks += 1;
        if found {
            self.frames_with_ball += 1;
        }
        match after {
            ControllerState::Searching => self.ticks_searching += 1,
            ControllerState::Tracking { .. } => self.ticks_tracking += 1,
            ControllerState::Scooping { .. } => {
                self.ticks_scooping += 1;
                if !matches!(before, ControllerState::Scooping { .. }) {
                    self.scoops_started += 1;
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.elapsed_secs = self.started_at.elapsed().as_secs_f64();
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}
