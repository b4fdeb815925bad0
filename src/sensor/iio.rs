use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use crate::sensor::{Reading, Sensors};

// Ref: https://www.kernel.org/doc/Documentation/ABI/testing/sysfs-bus-iio
const PRESSURE_INPUT: &str = "in_pressure_input";
const TEMPERATURE_INPUT: &str = "in_temp_input";
const HUMIDITY_INPUT: &str = "in_humidityrelative_input";

/// Barometer and hygrometer exposed by the kernel's IIO subsystem, e.g. a
/// BMP180 (`bmp280` driver) and a DHT22 (`dht11` driver).
#[derive(Debug, Clone)]
pub struct IioSensors {
    barometer: PathBuf,
    hygrometer: Option<PathBuf>,
}

impl IioSensors {
    pub fn new(barometer: PathBuf, hygrometer: Option<PathBuf>) -> Self {
        Self {
            barometer,
            hygrometer,
        }
    }

    /// Whether the barometer exposes a pressure channel.
    pub async fn barometer_present(&self) -> bool {
        fs::try_exists(self.barometer.join(PRESSURE_INPUT))
            .await
            .unwrap_or(false)
    }

    async fn humidity(&self) -> f32 {
        let Some(hygrometer) = &self.hygrometer else {
            return f32::NAN;
        };

        // DHT sensors fail transiently; report NaN like the driver libraries do
        match read_value(hygrometer, HUMIDITY_INPUT).await {
            Ok(milli_percent) => (milli_percent / 1000.0) as f32,
            Err(err) => {
                warn!("failed to read humidity: {err:#}");
                f32::NAN
            }
        }
    }
}

#[async_trait]
impl Sensors for IioSensors {
    async fn read(&mut self) -> Result<Reading> {
        let kilo_pascal = read_value(&self.barometer, PRESSURE_INPUT)
            .await
            .context("failed to read pressure")?;
        let milli_celsius = read_value(&self.barometer, TEMPERATURE_INPUT)
            .await
            .context("failed to read temperature")?;

        Ok(Reading {
            pressure: (kilo_pascal * 1000.0).round() as i32,
            temperature: (milli_celsius / 1000.0) as i32,
            humidity: self.humidity().await,
        })
    }
}

async fn read_value(device: &Path, channel: &str) -> Result<f64> {
    let path = device.join(channel);
    let raw = fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    raw.trim()
        .parse()
        .with_context(|| format!("failed to parse {}: {}", path.display(), raw.trim()))
}
