use serde::Serialize;

use crate::sensor::Reading;

/// Append-only collection receiving one document per sampling tick.
pub const MEASUREMENTS_PATH: &str = "measurements";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Epoch seconds.
    pub timestamp: f64,

    pub pressure: i32,

    pub temperature: i32,

    /// Relative humidity in percent. A failed hygrometer read is NaN and is
    /// serialized as `null`.
    pub humidity: f32,

    pub session_uid: String,
}

impl Measurement {
    pub fn new(epoch_seconds: i64, reading: Reading, session_uid: &str) -> Self {
        Self {
            timestamp: epoch_seconds as f64,
            pressure: reading.pressure,
            temperature: reading.temperature,
            humidity: reading.humidity,
            session_uid: session_uid.to_string(),
        }
    }
}
