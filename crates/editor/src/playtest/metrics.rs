use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
}

/// Accumulates frame and tick counts over a logging interval and yields a
/// rate snapshot once the interval elapses.
#[derive(Debug)]
pub struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_time_sum: Duration,
}

impl MetricsAccumulator {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval_start: Instant::now(),
            interval,
            frames: 0,
            ticks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub fn record_frame(&mut self, frame_dt: Duration) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_dt);
    }

    pub fn record_ticks(&mut self, count: u32) {
        self.ticks = self.ticks.saturating_add(count);
    }

    pub fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.frames == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0
        };
        let snapshot = LoopMetricsSnapshot {
            fps: self.frames as f32 / elapsed_seconds,
            tps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
        };

        self.interval_start = now;
        self.frames = 0;
        self.ticks = 0;
        self.frame_time_sum = Duration::ZERO;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_waits_for_the_full_interval() {
        let mut metrics = MetricsAccumulator::new(Duration::from_secs(1));
        let start = metrics.interval_start;
        metrics.record_frame(Duration::from_millis(16));

        assert!(metrics
            .maybe_snapshot(start + Duration::from_millis(500))
            .is_none());
        assert!(metrics
            .maybe_snapshot(start + Duration::from_secs(1))
            .is_some());
    }

    #[test]
    fn snapshot_reports_rates_over_the_elapsed_interval() {
        let mut metrics = MetricsAccumulator::new(Duration::from_secs(1));
        let start = metrics.interval_start;
        for _ in 0..60 {
            metrics.record_frame(Duration::from_millis(16));
        }
        metrics.record_ticks(60);

        let snapshot = metrics
            .maybe_snapshot(start + Duration::from_secs(1))
            .expect("interval elapsed");
        assert!((snapshot.fps - 60.0).abs() < 1.0);
        assert!((snapshot.tps - 60.0).abs() < 1.0);
        assert!((snapshot.frame_time_ms - 16.0).abs() < 0.5);
    }

    #[test]
    fn counters_reset_after_each_snapshot() {
        let mut metrics = MetricsAccumulator::new(Duration::from_secs(1));
        let start = metrics.interval_start;
        metrics.record_frame(Duration::from_millis(16));
        metrics.record_ticks(1);
        metrics
            .maybe_snapshot(start + Duration::from_secs(1))
            .expect("first snapshot");

        let second = metrics
            .maybe_snapshot(start + Duration::from_secs(2))
            .expect("second snapshot");
        assert_eq!(second.fps, 0.0);
        assert_eq!(second.tps, 0.0);
        assert_eq!(second.frame_time_ms, 0.0);
    }
}
