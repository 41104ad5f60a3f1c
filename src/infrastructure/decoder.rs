// Inbound measurement frame decoding
use chrono::Local;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::reading::Reading;

/// Wire shape of one measurement frame from the device.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
    // The device occasionally reports rpm in odd shapes; anything that is
    // not a number falls back to 0 instead of failing the whole frame.
    #[serde(default)]
    rpm: Option<serde_json::Value>,
    #[serde(default)]
    cold_air_out: Option<bool>,
    #[serde(default)]
    hot_air_out: Option<bool>,
}

#[derive(Debug, Error)]
#[error("malformed measurement frame: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// Decodes one raw feed message into a `Reading` stamped with the client
/// arrival time. Null or missing temperature/humidity stay `None` (distinct
/// from 0); missing air flags default to false.
pub fn decode_frame(raw: &str) -> Result<Reading, DecodeError> {
    let frame: RawFrame = serde_json::from_str(raw)?;
    let fan_rpm = frame
        .rpm
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0);

    Ok(Reading {
        temperature: frame.temp,
        humidity: frame.humidity,
        fan_rpm,
        cold_air_out: frame.cold_air_out.unwrap_or(false),
        hot_air_out: frame.hot_air_out.unwrap_or(false),
        received_at: Local::now(),
    })
}
