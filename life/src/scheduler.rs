//! Step cadence, pausing, and single stepping.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::config::Options;
use crate::engine::{LifeEngine, StepOutcome};

/// Steps kept for the frame rate estimate.
const FRAME_WINDOW: usize = 30;

#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    min_interval: Duration,
    last_run: Option<Instant>,
    paused: bool,
    single_step: bool,
    frames: VecDeque<Instant>,
}

impl Scheduler {
    pub fn new(interval: Duration, min_interval: Duration) -> Self {
        Scheduler {
            interval,
            min_interval,
            last_run: None,
            paused: false,
            single_step: false,
            frames: VecDeque::with_capacity(FRAME_WINDOW + 1),
        }
    }

    pub fn from_options(options: &Options) -> Self {
        Self::new(options.step_interval(), options.min_step_interval())
    }

    /// How long to wait before the next tick: whatever is left of the target
    /// interval since the last tick, but never less than the minimum.
    pub fn delay(&self, now: Instant) -> Duration {
        let elapsed = self
            .last_run
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.interval.saturating_sub(elapsed).max(self.min_interval)
    }

    /// Runs one scheduled tick. Returns `None` when paused.
    pub fn tick(&mut self, engine: &mut LifeEngine, now: Instant) -> Option<StepOutcome> {
        self.last_run = Some(now);
        if self.paused {
            return None;
        }
        if self.single_step {
            self.single_step = false;
            self.paused = true;
        }

        self.frames.push_back(now);
        if self.frames.len() > FRAME_WINDOW + 1 {
            self.frames.pop_front();
        }
        Some(engine.step())
    }

    pub fn pause(&mut self) {
        self.paused = true;
        self.single_step = false;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.single_step = false;
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Lets exactly one more generation through, then pauses.
    pub fn single_step(&mut self) {
        self.paused = false;
        self.single_step = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Steps per second over the last window, once the window has filled.
    pub fn frames_per_second(&self) -> Option<f64> {
        if self.frames.len() <= FRAME_WINDOW {
            return None;
        }
        let (first, last) = (self.frames.front()?, self.frames.back()?);
        let span = last.saturating_duration_since(*first).as_secs_f64();
        (span > 0.0).then(|| FRAME_WINDOW as f64 / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SurfaceSize;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn engine() -> LifeEngine {
        LifeEngine::seeded(Options::default(), SurfaceSize::new(50.0, 50.0), 9).unwrap()
    }

    #[test]
    fn delay_shrinks_with_elapsed_time_down_to_the_minimum() {
        let mut scheduler = Scheduler::new(ms(100), ms(5));
        let mut engine = engine();
        let start = Instant::now();
        assert_eq!(scheduler.delay(start), ms(100));

        scheduler.tick(&mut engine, start);
        assert_eq!(scheduler.delay(start + ms(30)), ms(70));
        assert_eq!(scheduler.delay(start + ms(99)), ms(5));
        assert_eq!(scheduler.delay(start + ms(500)), ms(5));
    }

    #[test]
    fn paused_ticks_do_not_step() {
        let mut scheduler = Scheduler::new(ms(10), ms(1));
        let mut engine = engine();
        let now = Instant::now();
        scheduler.tick(&mut engine, now);
        let generation = engine.generation();

        scheduler.pause();
        assert_eq!(scheduler.tick(&mut engine, now), None);
        assert_eq!(engine.generation(), generation);

        scheduler.toggle_pause();
        assert!(scheduler.tick(&mut engine, now).is_some());
    }

    #[test]
    fn single_step_advances_once_then_pauses() {
        let mut scheduler = Scheduler::new(ms(10), ms(1));
        let mut engine = engine();
        let now = Instant::now();
        scheduler.pause();

        scheduler.single_step();
        assert!(scheduler.tick(&mut engine, now).is_some());
        assert!(scheduler.is_paused());
        assert_eq!(scheduler.tick(&mut engine, now), None);
    }

    #[test]
    fn frame_rate_needs_a_full_window() {
        let mut scheduler = Scheduler::new(ms(10), ms(1));
        let mut engine = engine();
        let start = Instant::now();
        for i in 0..FRAME_WINDOW as u64 {
            scheduler.tick(&mut engine, start + ms(10 * i));
        }
        assert_eq!(scheduler.frames_per_second(), None);

        scheduler.tick(&mut engine, start + ms(10 * FRAME_WINDOW as u64));
        let fps = scheduler.frames_per_second().unwrap();
        assert!((fps - 100.0).abs() < 1e-6, "fps {fps}");
    }
}
