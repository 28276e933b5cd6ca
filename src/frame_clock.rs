// src/frame_clock.rs
//
// Loop-rate governor. Sleeps away whatever is left of the frame period and
// counts ticks per one-second window. Running behind is not an error: the
// sleep is simply zero and the reported fps drops.

use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct FrameClock<C: Clock> {
    clock: C,
    period: Duration,
    last_tick: Option<Instant>,
    window_start: Option<Instant>,
    window_count: u32,
}

impl<C: Clock> FrameClock<C> {
    pub fn new(clock: C, target_fps: u32) -> Self {
        Self {
            clock,
            period: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            last_tick: None,
            window_start: None,
            window_count: 0,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Block until the next tick may start, then record it.
    ///
    /// Returns the realized fps of the window that just closed, if the
    /// one-second window rolled over on this tick.
    pub fn tick(&mut self) -> Option<u32> {
        if let Some(last) = self.last_tick {
            let elapsed = self.clock.now().saturating_duration_since(last);
            if elapsed < self.period {
                self.clock.sleep(self.period - elapsed);
            }
        }

        let now = self.clock.now();
        self.last_tick = Some(now);

        let start = *self.window_start.get_or_insert(now);
        let mut report = None;
        if now.saturating_duration_since(start) >= Duration::from_secs(1) {
            report = Some(self.window_count);
            self.window_count = 0;
            self.window_start = Some(now);
        }
        self.window_count += 1;
        report
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;

    #[test]
    fn test_first_tick_does_not_sleep() {
        let clock = ManualClock::new();
        let mut fc = FrameClock::new(clock.clone(), 10);
        assert_eq!(fc.tick(), None);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_sleeps_remaining_period() {
        let clock = ManualClock::new();
        let mut fc = FrameClock::new(clock.clone(), 10);
        fc.tick();
        clock.advance(Duration::from_millis(30));
        fc.tick();
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(70)]);
    }

    #[test]
    fn test_slow_tick_does_not_sleep() {
        let clock = ManualClock::new();
        let mut fc = FrameClock::new(clock.clone(), 10);
        fc.tick();
        clock.advance(Duration::from_millis(250));
        fc.tick();
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn test_reports_fps_once_per_second() {
        let clock = ManualClock::new();
        let mut fc = FrameClock::new(clock.clone(), 10);
        let reports: Vec<u32> = (0..31).filter_map(|_| fc.tick()).collect();
        // Ticks land every 100 ms: windows close at 1 s, 2 s, 3 s.
        assert_eq!(reports, vec![10, 10, 10]);
    }

    #[test]
    fn test_reported_fps_reflects_shortfall() {
        let clock = ManualClock::new();
        let mut fc = FrameClock::new(clock.clone(), 10);
        let mut reports = Vec::new();
        for _ in 0..12 {
            if let Some(fps) = fc.tick() {
                reports.push(fps);
            }
            clock.advance(Duration::from_millis(250));
        }
        assert_eq!(reports, vec![4, 4]);
    }
}
