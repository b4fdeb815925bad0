use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::measurement::{MEASUREMENTS_PATH, Measurement};
use crate::mirror::LocalMirror;
use crate::sensor::Sensors;
use crate::store::RemoteStore;
use crate::sync::sync;

pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Measuring,
}

impl State {
    pub fn of(mirror: &LocalMirror) -> Self {
        if mirror.is_measuring {
            State::Measuring
        } else {
            State::Idle
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Measuring => "measuring",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Uploaded { key: String },
    UploadFailed,
    SensorFailed,
}

/// Decides once per tick whether to sample and upload, then waits for the
/// next tick.
///
/// The state is recomputed from the mirror on every tick, so a remote toggle
/// takes effect on the tick after the sync that observed it.
#[derive(Debug)]
pub struct Scheduler<N, C> {
    sensors: N,
    clock: C,
    idle_backoff: Duration,
}

impl<N, C> Scheduler<N, C>
where
    N: Sensors,
    C: Clock,
{
    pub fn new(sensors: N, clock: C) -> Self {
        Self {
            sensors,
            clock,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }

    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    pub async fn tick<S>(&mut self, store: &S, mirror: &LocalMirror) -> TickOutcome
    where
        S: RemoteStore + ?Sized,
    {
        let state = State::of(mirror);
        debug!(state = state.as_str(), "tick");

        match state {
            State::Idle => {
                sleep(self.idle_backoff).await;
                TickOutcome::Idle
            }
            State::Measuring => {
                let outcome = self.measure(store, mirror).await;
                sleep(mirror.interval).await;
                outcome
            }
        }
    }

    async fn measure<S>(&mut self, store: &S, mirror: &LocalMirror) -> TickOutcome
    where
        S: RemoteStore + ?Sized,
    {
        let reading = match self.sensors.read().await {
            Ok(reading) => reading,
            Err(err) => {
                error!("failed to read sensors: {err:#}");
                return TickOutcome::SensorFailed;
            }
        };
        let measurement =
            Measurement::new(self.clock.epoch_seconds(), reading, &mirror.last_session_uid);
        info!(
            pressure = measurement.pressure,
            temperature = measurement.temperature,
            humidity = measurement.humidity,
            "measured"
        );

        match store.push(MEASUREMENTS_PATH, &json!(measurement)).await {
            Ok(key) => {
                info!(%key, session = %mirror.last_session_uid, "measurement uploaded");
                TickOutcome::Uploaded { key }
            }
            Err(err) => {
                error!("failed to upload measurement: {err}");
                TickOutcome::UploadFailed
            }
        }
    }

    /// Runs `ticks` iterations of tick-then-sync.
    pub async fn run_ticks<S>(&mut self, store: &S, mirror: &mut LocalMirror, ticks: usize)
    where
        S: RemoteStore + ?Sized,
    {
        for _ in 0..ticks {
            self.tick(store, mirror).await;
            sync(store, mirror).await;
        }
    }

    /// Runs tick-then-sync until the process is stopped.
    pub async fn run<S>(&mut self, store: &S, mirror: &mut LocalMirror)
    where
        S: RemoteStore + ?Sized,
    {
        loop {
            self.tick(store, mirror).await;
            sync(store, mirror).await;
        }
    }
}
