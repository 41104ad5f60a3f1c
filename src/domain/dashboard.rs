// Dashboard read model shared with display clients
use serde::Serialize;

/// Connection lifecycle of the sensor feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
}

impl ConnectionStatus {
    /// Status text shown in the dashboard header.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Connecting => "connecting…",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Reconnecting => "reconnecting…",
        }
    }
}

/// Read-only view of the aggregate dashboard state, serialized as-is to
/// display clients. Series vectors are owned copies; mutating the live
/// history through a snapshot is not possible.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub status: ConnectionStatus,
    pub status_label: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub max_temperature: f64,
    pub max_humidity: f64,
    pub fan_rpm: f64,
    pub fan_speed_target: f64,
    pub cold_air_out: bool,
    pub hot_air_out: bool,
    pub air_flow: String,
    /// Rotor angle in radians; negative values spin counter-clockwise.
    pub rotor_angle: f64,
    pub labels: Vec<String>,
    pub temperatures: Vec<Option<f64>>,
    pub humidities: Vec<Option<f64>>,
}
