// Measurement frame domain model
use chrono::{DateTime, Local};

/// One decoded measurement frame from the climate device.
#[derive(Debug, Clone)]
pub struct Reading {
    /// None when the device reports the value as not available.
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub fan_rpm: f64,
    pub cold_air_out: bool,
    pub hot_air_out: bool,
    /// Client-side arrival time; the device reports no clock of its own.
    pub received_at: DateTime<Local>,
}

impl Reading {
    /// Chart x-axis label for this frame's arrival time.
    pub fn time_label(&self) -> String {
        self.received_at.format("%H:%M:%S").to_string()
    }

    pub fn air_flow(&self) -> AirFlow {
        if self.cold_air_out {
            AirFlow::Cold
        } else if self.hot_air_out {
            AirFlow::Hot
        } else {
            AirFlow::Idle
        }
    }
}

/// Air output mode shown next to the fan. Cold takes priority if the device
/// ever reports both flags at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AirFlow {
    Cold,
    Hot,
    Idle,
}

impl AirFlow {
    pub fn label(&self) -> &'static str {
        match self {
            AirFlow::Cold => "Cold air",
            AirFlow::Hot => "Hot air",
            AirFlow::Idle => "Idle",
        }
    }
}
