// src/control/state_machine.rs
//
// Approach / scoop state machine.
//
//   SEARCHING ──ball──▶ TRACKING ──lost while close──▶ SCOOPING
//       ▲                  │                              │
//       └────lost, far─────┘◀───────── (never) ───────────┤
//       └────────────────── deadline reached ─────────────┘
//
// Evaluation order per tick:
//   1. active scoop window  → hold forward + intake, detection ignored
//   2. expired scoop window → SEARCHING
//   3. valid detection      → TRACKING (steer, closeness, belt)
//   4. lost right after a close TRACKING tick → SCOOPING
//   5. anything else        → SEARCHING
//
// Steering reads the detection's y coordinate and closeness reads x. The
// mapping comes from how the camera was mounted on the first rover and has
// not been re-derived for other mounts.

use crate::types::{BeltAction, ControlConfig, Detection, DriveAction, Motion};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerState {
    Searching,
    Tracking { ball_is_close: bool },
    Scooping { deadline: Instant },
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Searching => "SEARCHING",
            ControllerState::Tracking { .. } => "TRACKING",
            ControllerState::Scooping { .. } => "SCOOPING",
        }
    }
}

pub struct ApproachController {
    config: ControlConfig,
    state: ControllerState,
    /// Belt action of the last emitted motion.
    belt: BeltAction,
}

impl ApproachController {
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            state: ControllerState::Searching,
            belt: BeltAction::Stop,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Advance one tick and return the motion to issue.
    pub fn update(&mut self, detection: &Detection, now: Instant) -> Motion {
        let (next, motion) = self.transition(detection, now);

        if next.as_str() != self.state.as_str() {
            info!("{} → {} ({})", self.state.as_str(), next.as_str(), motion);
        } else {
            debug!("{} ({})", next.as_str(), motion);
        }

        self.state = next;
        self.belt = motion.belt;
        motion
    }

    fn transition(&self, detection: &Detection, now: Instant) -> (ControllerState, Motion) {
        if let ControllerState::Scooping { deadline } = self.state {
            if now < deadline {
                return (self.state, Motion::scoop());
            }
            return (ControllerState::Searching, Motion::search());
        }

        if detection.found {
            return self.track(detection);
        }

        if let ControllerState::Tracking {
            ball_is_close: true,
        } = self.state
        {
            let deadline = now + self.config.scoop_hold();
            return (ControllerState::Scooping { deadline }, Motion::scoop());
        }

        (ControllerState::Searching, Motion::search())
    }

    fn track(&self, detection: &Detection) -> (ControllerState, Motion) {
        let (x, y) = detection.center;

        let drive = if y < self.config.turn_band_low {
            DriveAction::TurnLeft
        } else if y > self.config.turn_band_high {
            DriveAction::TurnRight
        } else {
            DriveAction::DriveForward
        };

        let ball_is_close = x < self.config.close_x_threshold;

        let belt = if detection.radius > self.config.min_intake_radius {
            BeltAction::Intake
        } else {
            self.belt
        };

        (
            ControllerState::Tracking { ball_is_close },
            Motion::new(drive, belt),
        )
    }
}
