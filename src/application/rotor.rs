// Fan rotor angle integration
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::debug;

use crate::application::dashboard_state::SharedDashboard;

/// Cadence of the rotor render loop (~60 frames per second).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Integrates the rotor angle over elapsed wall-time from a target speed
/// that only changes when a new reading arrives. The angle decreases over
/// time: the fan spins counter-clockwise, a fixed presentational constant
/// that visual regression tests rely on.
#[derive(Debug)]
pub struct AnimationClock {
    angle: f64,
    last_tick: Option<Instant>,
    max_rotations_per_second: f64,
}

impl AnimationClock {
    pub fn new(max_rotations_per_second: f64) -> Self {
        Self {
            angle: 0.0,
            last_tick: None,
            max_rotations_per_second,
        }
    }

    /// Advances the angle by the time elapsed since the previous tick.
    /// The first tick only arms the clock (dt = 0).
    pub fn tick(&mut self, now: Instant, speed01: f64) -> f64 {
        let dt = self
            .last_tick
            .map(|previous| now.duration_since(previous).as_secs_f64())
            .unwrap_or(0.0);
        self.last_tick = Some(now);
        self.angle -= TAU * self.max_rotations_per_second * speed01 * dt;
        self.angle
    }
}

/// Ticks the clock at a fixed cadence until shutdown, mirroring the current
/// fan-speed target into the rotor angle on the shared state. The loop keeps
/// ticking at speed 0 (angle delta 0) so its shape never depends on the data.
pub async fn run(
    state: SharedDashboard,
    max_rotations_per_second: f64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut clock = AnimationClock::new(max_rotations_per_second);
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = frames.tick() => {}
        }
        let now = Instant::now();
        let mut state = state.write().await;
        let speed = state.fan_speed_target();
        state.set_rotor_angle(clock.tick(now, speed));
    }
    debug!("rotor loop stopped");
}
