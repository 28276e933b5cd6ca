// src/actuator/mod.rs
//
// Drive and belt outputs. Every call fully determines the output state of
// the channels it names and may be repeated freely.

mod bridge;
mod pins;

pub use bridge::PinActuator;
pub use pins::{DryRunPins, SysfsPins};

use crate::types::{ActuatorBackend, ActuatorConfig, BeltAction, Motion, WheelDirection};
use anyhow::Result;
use std::ops::{Deref, DerefMut};
use tracing::{error, info};

pub trait Actuator {
    fn drive(&mut self, left: WheelDirection, right: WheelDirection) -> Result<()>;

    fn belt(&mut self, action: BeltAction) -> Result<()>;

    fn apply(&mut self, motion: &Motion) -> Result<()> {
        let (left, right) = motion.drive.wheels();
        self.drive(left, right)?;
        self.belt(motion.belt)
    }

    /// Best effort: the belt is stopped even if the drive write fails.
    fn stop_all(&mut self) -> Result<()> {
        let drive = self.drive(WheelDirection::Stop, WheelDirection::Stop);
        let belt = self.belt(BeltAction::Stop);
        drive.and(belt)
    }
}

impl<A: Actuator + ?Sized> Actuator for Box<A> {
    fn drive(&mut self, left: WheelDirection, right: WheelDirection) -> Result<()> {
        (**self).drive(left, right)
    }

    fn belt(&mut self, action: BeltAction) -> Result<()> {
        (**self).belt(action)
    }
}

/// Build the configured backend.
pub fn open(config: &ActuatorConfig) -> Result<Box<dyn Actuator + Send>> {
    match config.backend {
        ActuatorBackend::Sysfs => {
            let pins = SysfsPins::open(
                &config.gpio_root,
                &PinActuator::<SysfsPins>::pin_list(config),
            )?;
            Ok(Box::new(PinActuator::new(pins, config)))
        }
        ActuatorBackend::DryRun => {
            info!("Actuator backend: dry-run (no GPIO writes)");
            Ok(Box::new(PinActuator::new(DryRunPins, config)))
        }
    }
}

/// Owns an actuator for the lifetime of the control loop and stops every
/// output when it goes away, including during a panic unwind.
pub struct ActuatorGuard<A: Actuator> {
    inner: A,
    stopped: bool,
}

impl<A: Actuator> ActuatorGuard<A> {
    /// Stops all outputs before handing the actuator over.
    pub fn new(mut inner: A) -> Result<Self> {
        inner.stop_all()?;
        Ok(Self {
            inner,
            stopped: false,
        })
    }

    /// Stop all outputs, surfacing a failure to the caller.
    pub fn shutdown(&mut self) -> Result<()> {
        self.stopped = true;
        self.inner.stop_all()
    }
}

impl<A: Actuator> Deref for ActuatorGuard<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.inner
    }
}

impl<A: Actuator> DerefMut for ActuatorGuard<A> {
    fn deref_mut(&mut self) -> &mut A {
        self.stopped = false;
        &mut self.inner
    }
}

impl<A: Actuator> Drop for ActuatorGuard<A> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }
        if let Err(e) = self.inner.stop_all() {
            error!("Failed to stop actuators on teardown: {:#}", e);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingActuator};
    use super::*;
    use crate::types::DriveAction;
    use WheelDirection::*;

    const STOP_ALL: [Call; 2] = [Call::Drive(Stop, Stop), Call::Belt(BeltAction::Stop)];

    #[test]
    fn test_guard_stops_on_creation_and_drop() {
        let rec = RecordingActuator::default();
        {
            let mut guard = ActuatorGuard::new(rec.clone()).unwrap();
            guard
                .apply(&Motion::new(DriveAction::TurnRight, BeltAction::Intake))
                .unwrap();
        }
        let calls = rec.calls();
        assert_eq!(calls[..2], STOP_ALL);
        assert_eq!(calls[2], Call::Drive(Forward, Stop));
        assert_eq!(calls[3], Call::Belt(BeltAction::Intake));
        assert_eq!(calls[4..], STOP_ALL);
    }

    #[test]
    fn test_guard_stops_during_panic() {
        let rec = RecordingActuator::default();
        let inner = rec.clone();
        let result = std::panic::catch_unwind(move || {
            let mut guard = ActuatorGuard::new(inner).unwrap();
            guard.apply(&Motion::scoop()).unwrap();
            panic!("detector blew up");
        });
        assert!(result.is_err());
        assert_eq!(rec.calls()[rec.calls().len() - 2..], STOP_ALL);
    }

    #[test]
    fn test_shutdown_is_not_repeated_on_drop() {
        let rec = RecordingActuator::default();
        let mut guard = ActuatorGuard::new(rec.clone()).unwrap();
        guard.shutdown().unwrap();
        drop(guard);
        assert_eq!(rec.calls().len(), 4);
    }

    #[test]
    fn test_stop_all_still_stops_belt_when_drive_fails() {
        struct BrokenDrive(Vec<BeltAction>);
        impl Actuator for BrokenDrive {
            fn drive(&mut self, _: WheelDirection, _: WheelDirection) -> Result<()> {
                anyhow::bail!("bridge fault")
            }
            fn belt(&mut self, action: BeltAction) -> Result<()> {
                self.0.push(action);
                Ok(())
            }
        }
        let mut a = BrokenDrive(Vec::new());
        assert!(a.stop_all().is_err());
        assert_eq!(a.0, vec![BeltAction::Stop]);
    }

    #[test]
    fn test_dry_run_backend_opens() {
        let mut actuator = open(&ActuatorConfig::default()).unwrap();
        actuator.apply(&Motion::search()).unwrap();
        actuator.stop_all().unwrap();
    }
}
