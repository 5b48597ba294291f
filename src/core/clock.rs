use std::time::{Duration, Instant};

use log::info;

/// Tracks delta time between ticks
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
}

impl Clock {
    /// Create new clock starting now
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    /// Time since the last tick; advances the clock
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        delta
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames-per-second over fixed reporting intervals
#[derive(Debug)]
pub struct FpsMeter {
    clock: Clock,
    interval: Duration,
    elapsed: Duration,
    frames: u32,
    last: Option<f32>,
}

impl FpsMeter {
    pub fn new(interval: Duration) -> Self {
        Self {
            clock: Clock::new(),
            interval,
            elapsed: Duration::ZERO,
            frames: 0,
            last: None,
        }
    }

    /// Count one presented frame; logs and returns the rate once per interval
    pub fn frame(&mut self) -> Option<f32> {
        let delta = self.clock.tick();
        self.record(delta)
    }

    fn record(&mut self, delta: Duration) -> Option<f32> {
        self.frames += 1;
        self.elapsed += delta;
        if self.elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f32 / self.elapsed.as_secs_f32();
        info!("FPS: {:.1}", fps);
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        self.last = Some(fps);
        self.last
    }

    /// Rate from the most recent completed interval
    pub fn fps(&self) -> Option<f32> {
        self.last
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clock_measures_delta() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        assert!(clock.tick() >= Duration::from_millis(9));
    }

    #[test]
    fn tick_restarts_the_interval() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        clock.tick();
        assert!(clock.tick() < Duration::from_millis(10));
    }

    #[test]
    fn fps_reported_once_per_interval() {
        let mut meter = FpsMeter::new(Duration::from_secs(1));
        for _ in 0..9 {
            assert_eq!(meter.record(Duration::from_millis(100)), None);
        }
        let fps = meter.record(Duration::from_millis(100)).unwrap();
        assert!((fps - 10.0).abs() < 1e-3);
        assert_eq!(meter.fps(), Some(fps));
        assert_eq!(meter.record(Duration::from_millis(100)), None);
    }
}
