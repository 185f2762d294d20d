use std::time::{Duration, Instant};

/// Longest step handed to the controller; longer stalls are clipped.
const MAX_STEP: Duration = Duration::from_millis(250);
const FIRST_STEP: Duration = Duration::from_millis(16);
const SAMPLE_WINDOW: Duration = Duration::from_millis(500);

/// Wall-clock frame steps plus a rolling frame-rate sample.
#[derive(Debug, Default)]
pub struct FrameClock {
    previous: Option<Instant>,
    window_start: Option<Instant>,
    frames_in_window: u32,
}

impl FrameClock {
    /// Seconds since the previous tick.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let step = self
            .previous
            .map_or(FIRST_STEP, |previous| now.saturating_duration_since(previous));
        self.previous = Some(now);
        self.frames_in_window += 1;
        step.min(MAX_STEP).as_secs_f32()
    }

    /// Frames per second over the last sample window, once it has elapsed.
    pub fn sample_fps(&mut self, now: Instant) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(start);
        if elapsed < SAMPLE_WINDOW {
            return None;
        }
        let fps = self.frames_in_window as f32 / elapsed.as_secs_f32();
        self.window_start = Some(now);
        self.frames_in_window = 0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;
    use std::time::{Duration, Instant};

    #[test]
    fn test_steps_follow_the_wall_clock_and_clip_stalls() {
        let mut clock = FrameClock::default();
        let start = Instant::now();
        assert!((clock.tick(start) - 0.016).abs() < 1e-6);
        assert!((clock.tick(start + Duration::from_millis(20)) - 0.02).abs() < 1e-6);
        assert_eq!(clock.tick(start + Duration::from_secs(3)), 0.25);
    }

    #[test]
    fn test_fps_is_sampled_every_half_second() {
        let mut clock = FrameClock::default();
        let start = Instant::now();
        assert_eq!(clock.sample_fps(start), None);
        for i in 1..=30 {
            let now = start + Duration::from_millis(i * 20);
            clock.tick(now);
            if i < 25 {
                assert_eq!(clock.sample_fps(now), None);
            }
        }
        let fps = clock.sample_fps(start + Duration::from_millis(600));
        assert!(fps.is_some_and(|fps| (fps - 50.0).abs() < 1e-3));
        assert_eq!(clock.sample_fps(start + Duration::from_millis(700)), None);
    }
}
