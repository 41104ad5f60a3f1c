// Aggregate dashboard state and the feed event drive loop
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tracing::debug;

use crate::application::feed::FeedEvent;
use crate::domain::dashboard::{ConnectionStatus, DashboardSnapshot};
use crate::domain::reading::{AirFlow, Reading};
use crate::domain::series::TrendSeries;

pub type SharedDashboard = Arc<RwLock<DashboardState>>;

/// The single aggregation point for everything the dashboard displays.
/// All mutations happen through `apply_reading`, `on_disconnect`, and the
/// rotor angle setter, each one short write-lock critical section, so a
/// reader never observes a torn update.
pub struct DashboardState {
    status: ConnectionStatus,
    current: Option<Reading>,
    max_temperature: f64,
    max_humidity: f64,
    fan_speed_target: f64,
    rotor_angle: f64,
    series: TrendSeries,
    max_fan_rpm: f64,
}

impl DashboardState {
    pub fn new(max_fan_rpm: f64, window_capacity: usize) -> Self {
        Self {
            status: ConnectionStatus::Idle,
            current: None,
            max_temperature: 0.0,
            max_humidity: 0.0,
            fan_speed_target: 0.0,
            rotor_angle: 0.0,
            series: TrendSeries::new(window_capacity),
            max_fan_rpm,
        }
    }

    /// Applies one decoded frame as a single unit: current values, running
    /// maxima, fan-speed target, and the lockstep series push.
    pub fn apply_reading(&mut self, reading: Reading) {
        if let Some(temperature) = reading.temperature {
            self.max_temperature = self.max_temperature.max(temperature);
        }
        if let Some(humidity) = reading.humidity {
            self.max_humidity = self.max_humidity.max(humidity);
        }
        self.fan_speed_target = (reading.fan_rpm / self.max_fan_rpm).clamp(0.0, 1.0);
        self.series
            .push(reading.time_label(), reading.temperature, reading.humidity);
        self.current = Some(reading);
    }

    /// Clears everything tied to the closed connection epoch: current
    /// reading, the per-epoch maxima, the fan target, and all three series
    /// buffers. Idempotent.
    pub fn on_disconnect(&mut self) {
        self.current = None;
        self.max_temperature = 0.0;
        self.max_humidity = 0.0;
        self.fan_speed_target = 0.0;
        self.series.clear();
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    pub fn fan_speed_target(&self) -> f64 {
        self.fan_speed_target
    }

    pub fn set_rotor_angle(&mut self, angle: f64) {
        self.rotor_angle = angle;
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let current = self.current.as_ref();
        DashboardSnapshot {
            status: self.status,
            status_label: self.status.label().to_string(),
            temperature: current.and_then(|r| r.temperature),
            humidity: current.and_then(|r| r.humidity),
            max_temperature: self.max_temperature,
            max_humidity: self.max_humidity,
            fan_rpm: current.map(|r| r.fan_rpm).unwrap_or(0.0),
            fan_speed_target: self.fan_speed_target,
            cold_air_out: current.is_some_and(|r| r.cold_air_out),
            hot_air_out: current.is_some_and(|r| r.hot_air_out),
            air_flow: current
                .map(Reading::air_flow)
                .unwrap_or(AirFlow::Idle)
                .label()
                .to_string(),
            rotor_angle: self.rotor_angle,
            labels: self.series.labels(),
            temperatures: self.series.temperatures(),
            humidities: self.series.humidities(),
        }
    }
}

/// Applies feed events strictly in arrival order and publishes a snapshot
/// per update for streaming subscribers. A `Disconnected` status carries the
/// atomic epoch reset with it, so no reading from a closed epoch can land
/// after the reset. Ends when the manager side of the channel closes.
pub async fn drive(
    state: SharedDashboard,
    mut events: mpsc::Receiver<FeedEvent>,
    updates: broadcast::Sender<DashboardSnapshot>,
) {
    while let Some(event) = events.recv().await {
        let snapshot = {
            let mut state = state.write().await;
            match event {
                FeedEvent::Status(status) => {
                    debug!("feed status: {}", status.label());
                    state.set_status(status);
                    if status == ConnectionStatus::Disconnected {
                        state.on_disconnect();
                    }
                }
                FeedEvent::Reading(reading) => state.apply_reading(reading),
            }
            state.snapshot()
        };
        // No streaming subscriber is fine.
        let _ = updates.send(snapshot);
    }
    debug!("feed event loop ended");
}
