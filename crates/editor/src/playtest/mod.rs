mod metrics;
mod sim;

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::scene::SceneStore;

pub use metrics::{LoopMetricsSnapshot, MetricsAccumulator};
pub use sim::Simulation;

#[derive(Debug, Clone)]
pub struct PlaytestConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
}

impl Default for PlaytestConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaytestPhase {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub ticks_run: u32,
    pub backlog_dropped: bool,
}

/// Drives the gravity simulation from measured wall time while the store's
/// play flag is set. Ticks are planned through a fixed-timestep accumulator
/// so simulation speed does not drift with the caller's frame rate; backlog
/// beyond the per-frame tick cap is dropped rather than replayed.
#[derive(Debug)]
pub struct PlaytestLoop {
    fixed_dt: Duration,
    fixed_dt_seconds: f32,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    phase: PlaytestPhase,
    accumulator: Duration,
    last_frame_instant: Option<Instant>,
    simulation: Simulation,
}

impl PlaytestLoop {
    pub fn new(config: PlaytestConfig) -> Self {
        let target_tps = config.target_tps.max(1);
        let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
        Self {
            fixed_dt,
            fixed_dt_seconds: fixed_dt.as_secs_f32(),
            max_frame_delta: if config.max_frame_delta.is_zero() {
                Duration::from_millis(250)
            } else {
                config.max_frame_delta
            },
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            phase: PlaytestPhase::Stopped,
            accumulator: Duration::ZERO,
            last_frame_instant: None,
            simulation: Simulation::new(),
        }
    }

    pub fn phase(&self) -> PlaytestPhase {
        self.phase
    }

    pub fn fixed_dt_seconds(&self) -> f32 {
        self.fixed_dt_seconds
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    /// Advances the simulation for one frame. Synchronizes the internal
    /// phase with the store's play flag first, so toggling play mode takes
    /// effect on the next call with no tick source left behind.
    pub fn advance(&mut self, store: &mut SceneStore, now: Instant) -> FrameReport {
        self.sync_phase(store.is_playing(), now);
        if self.phase == PlaytestPhase::Stopped {
            return FrameReport::default();
        }

        let last = self.last_frame_instant.unwrap_or(now);
        let raw_frame_dt = now.saturating_duration_since(last);
        self.last_frame_instant = Some(now);

        let clamped = raw_frame_dt.min(self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped);

        let plan = plan_ticks(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        for _ in 0..plan.ticks_to_run {
            self.simulation.step(store, self.fixed_dt_seconds);
        }
        self.accumulator = plan.remaining_accumulator;

        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        FrameReport {
            ticks_run: plan.ticks_to_run,
            backlog_dropped: plan.dropped_backlog > Duration::ZERO,
        }
    }

    /// Cancels scheduled work. Idempotent; must be called on every exit path
    /// so no tick source survives the owner.
    pub fn stop(&mut self) {
        if self.phase == PlaytestPhase::Running {
            debug!("playtest_stopped");
        }
        self.phase = PlaytestPhase::Stopped;
        self.accumulator = Duration::ZERO;
        self.last_frame_instant = None;
        self.simulation.reset();
    }

    fn sync_phase(&mut self, playing: bool, now: Instant) {
        match (self.phase, playing) {
            (PlaytestPhase::Stopped, true) => {
                debug!("playtest_started");
                self.phase = PlaytestPhase::Running;
                self.accumulator = Duration::ZERO;
                self.last_frame_instant = Some(now);
                self.simulation.reset();
            }
            (PlaytestPhase::Running, false) => self.stop(),
            _ => {}
        }
    }
}

impl Drop for PlaytestLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TickPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Converts accumulated time into whole ticks. Anything past the cap is
/// dropped wholesale, including its sub-tick remainder; under the cap the
/// remainder stays banked for the next frame.
pub fn plan_ticks(accumulator: Duration, fixed_dt: Duration, max_ticks: u32) -> TickPlan {
    if fixed_dt.is_zero() {
        return TickPlan {
            ticks_to_run: 0,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        };
    }

    let pending = (accumulator.as_nanos() / fixed_dt.as_nanos()).min(u128::from(u32::MAX)) as u32;
    if pending > max_ticks {
        TickPlan {
            ticks_to_run: max_ticks,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator.saturating_sub(fixed_dt * max_ticks),
        }
    } else {
        TickPlan {
            ticks_to_run: pending,
            remaining_accumulator: accumulator.saturating_sub(fixed_dt * pending),
            dropped_backlog: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectId, ObjectPatch, SettingsPatch, Vec3};
    use crate::templates::find_template;

    fn playing_store() -> SceneStore {
        let mut store = SceneStore::new();
        store.load_template(find_template("shooting").expect("preset"));
        store.update_settings(&SettingsPatch {
            gravity: Some(9.8),
            ..SettingsPatch::default()
        });
        store.update_object(
            &ObjectId::new("player1"),
            &ObjectPatch {
                position: Some(Vec3::new(0.0, 1.0, 0.0)),
                ..ObjectPatch::default()
            },
        );
        store.toggle_play_mode();
        store
    }

    #[test]
    fn plan_ticks_converts_whole_multiples_under_the_cap() {
        let fixed_dt = Duration::from_millis(10);
        let plan = plan_ticks(Duration::from_millis(35), fixed_dt, 6);

        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(5));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_ticks_drops_everything_past_the_cap() {
        let fixed_dt = Duration::from_millis(10);
        let plan = plan_ticks(Duration::from_millis(97), fixed_dt, 4);

        assert_eq!(plan.ticks_to_run, 4);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        // The sub-tick remainder goes with the backlog, not the bank.
        assert_eq!(plan.dropped_backlog, Duration::from_millis(57));
    }

    #[test]
    fn plan_ticks_banks_time_shorter_than_one_tick() {
        let fixed_dt = Duration::from_millis(10);
        let plan = plan_ticks(Duration::from_millis(7), fixed_dt, 8);

        assert_eq!(plan.ticks_to_run, 0);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(7));
    }

    #[test]
    fn plan_ticks_refuses_a_zero_length_tick() {
        let plan = plan_ticks(Duration::from_millis(100), Duration::ZERO, 5);

        assert_eq!(plan.ticks_to_run, 0);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(100));
    }

    #[test]
    fn advance_is_a_no_op_while_stopped() {
        let mut store = playing_store();
        store.toggle_play_mode(); // back to stopped
        let mut playtest = PlaytestLoop::new(PlaytestConfig::default());

        let now = Instant::now();
        let report = playtest.advance(&mut store, now + Duration::from_millis(100));
        assert_eq!(report.ticks_run, 0);
        assert_eq!(playtest.phase(), PlaytestPhase::Stopped);
    }

    #[test]
    fn elapsed_wall_time_drives_tick_count() {
        let mut store = playing_store();
        let mut playtest = PlaytestLoop::new(PlaytestConfig::default());
        let start = Instant::now();

        // First call arms the clock; no time has passed yet.
        let first = playtest.advance(&mut store, start);
        assert_eq!(first.ticks_run, 0);
        assert_eq!(playtest.phase(), PlaytestPhase::Running);

        let second = playtest.advance(&mut store, start + Duration::from_millis(40));
        assert_eq!(second.ticks_run, 2);
    }

    #[test]
    fn toggling_play_off_discards_velocities() {
        let mut store = playing_store();
        let mut playtest = PlaytestLoop::new(PlaytestConfig::default());
        let start = Instant::now();

        playtest.advance(&mut store, start);
        playtest.advance(&mut store, start + Duration::from_millis(100));
        assert!(playtest
            .simulation()
            .velocity(&ObjectId::new("player1"))
            .is_some());

        store.toggle_play_mode();
        playtest.advance(&mut store, start + Duration::from_millis(120));
        assert_eq!(playtest.phase(), PlaytestPhase::Stopped);
        assert!(playtest
            .simulation()
            .velocity(&ObjectId::new("player1"))
            .is_none());
    }

    #[test]
    fn resume_restarts_from_zero_velocity() {
        let mut store = playing_store();
        let mut playtest = PlaytestLoop::new(PlaytestConfig::default());
        let start = Instant::now();

        playtest.advance(&mut store, start);
        playtest.advance(&mut store, start + Duration::from_millis(200));
        store.toggle_play_mode();
        playtest.advance(&mut store, start + Duration::from_millis(210));

        store.toggle_play_mode();
        playtest.advance(&mut store, start + Duration::from_millis(220));
        let report = playtest.advance(
            &mut store,
            start + Duration::from_millis(220) + playtest.fixed_dt,
        );
        assert_eq!(report.ticks_run, 1);

        let velocity = playtest
            .simulation()
            .velocity(&ObjectId::new("player1"))
            .expect("velocity");
        let expected = -9.8 * playtest.fixed_dt_seconds();
        assert!((velocity.y - expected).abs() < 1e-6);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut playtest = PlaytestLoop::new(PlaytestConfig::default());
        playtest.stop();
        playtest.stop();
        assert_eq!(playtest.phase(), PlaytestPhase::Stopped);
    }

    #[test]
    fn huge_frame_gap_is_clamped_and_capped() {
        let mut store = playing_store();
        let mut playtest = PlaytestLoop::new(PlaytestConfig {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
        });
        let start = Instant::now();

        playtest.advance(&mut store, start);
        let report = playtest.advance(&mut store, start + Duration::from_secs(10));
        assert_eq!(report.ticks_run, 5);
        assert!(report.backlog_dropped);
    }
}
