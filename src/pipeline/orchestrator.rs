// src/pipeline/orchestrator.rs
//
// The control loop. One thread, strictly sequential ticks:
//
//   throttle → read frame → snapshot → detect → state machine → actuate
//
// The motion of tick n is written before tick n+1 reads its frame. Outputs
// are stopped when the loop is built and again on every way out of it.

use super::metrics::RunStats;
use crate::actuator::{Actuator, ActuatorGuard};
use crate::control::ApproachController;
use crate::detection::Detector;
use crate::frame_clock::{Clock, FrameClock};
use crate::frame_source::FrameSource;
use crate::snapshot::SnapshotSink;
use crate::types::ControlConfig;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    SourceExhausted,
}

pub struct PipelineOrchestrator<S, D, A, C>
where
    S: FrameSource,
    D: Detector,
    A: Actuator,
    C: Clock,
{
    source: S,
    detector: D,
    controller: ApproachController,
    actuator: ActuatorGuard<A>,
    clock: FrameClock<C>,
    snapshots: Option<SnapshotSink>,
    stats: RunStats,
    frame_index: u64,
}

impl<S, D, A, C> PipelineOrchestrator<S, D, A, C>
where
    S: FrameSource,
    D: Detector,
    A: Actuator,
    C: Clock,
{
    pub fn new(
        config: &ControlConfig,
        source: S,
        detector: D,
        actuator: A,
        clock: C,
        snapshots: Option<SnapshotSink>,
    ) -> Result<Self> {
        let actuator = ActuatorGuard::new(actuator).context("Failed to park actuators")?;
        Ok(Self {
            source,
            detector,
            controller: ApproachController::new(config.clone()),
            actuator,
            clock: FrameClock::new(clock, config.target_fps),
            snapshots,
            stats: RunStats::new(),
            frame_index: 0,
        })
    }

    /// Run until `stop` is raised, the source runs dry, or a fault occurs.
    /// Outputs are stopped before this returns, whatever the outcome.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(StopReason, RunStats)> {
        info!(
            "Control loop starting, frame period {} ms",
            self.clock.period().as_millis()
        );

        let outcome = self.run_loop(stop);
        let shutdown = self.actuator.shutdown();

        self.stats.finish();
        info!("Run summary: {}", self.stats.to_json());

        match (outcome, shutdown) {
            (Ok(reason), Ok(())) => {
                info!("✓ Control loop stopped: {:?}", reason);
                Ok((reason, self.stats.clone()))
            }
            (Ok(_), Err(e)) => Err(e.context("Failed to stop actuators")),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(stop_err)) => {
                error!("Failed to stop actuators after fault: {:#}", stop_err);
                Err(e)
            }
        }
    }

    fn run_loop(&mut self, stop: &AtomicBool) -> Result<StopReason> {
        loop {
            if stop.load(Ordering::SeqCst) {
                return Ok(StopReason::Interrupted);
            }

            if let Some(fps) = self.clock.tick() {
                info!("fps is: {}", fps);
                self.stats.last_fps = Some(fps);
            }

            let Some(frame) = self.source.read_frame().context("Frame acquisition failed")? else {
                return Ok(StopReason::SourceExhausted);
            };
            self.frame_index += 1;

            if let Some(sink) = &self.snapshots {
                if let Err(e) = sink.offer(self.frame_index, &frame) {
                    warn!("Snapshot {} skipped: {:#}", self.frame_index, e);
                }
            }

            let (detection, _contours) = self.detector.detect(&frame).context("Detection failed")?;

            let before = self.controller.state();
            let now = self.clock.clock().now();
            let motion = self.controller.update(&detection, now);

            self.actuator
                .apply(&motion)
                .with_context(|| format!("Actuator write failed for {}", motion))?;

            self.stats
                .record(detection.found, before, self.controller.state());
        }
    }
}
