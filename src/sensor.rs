mod iio;

use anyhow::Result;
use async_trait::async_trait;

pub use iio::IioSensors;

/// One sample from the barometer and hygrometer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Pa
    pub pressure: i32,

    /// °C, truncated
    pub temperature: i32,

    /// Relative humidity in percent, NaN when the hygrometer could not be read.
    pub humidity: f32,
}

#[async_trait]
pub trait Sensors: Send {
    async fn read(&mut self) -> Result<Reading>;
}
