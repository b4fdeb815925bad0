mod args;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use args::Args;
use clap::Parser as _;
use sensor_node::{
    clock::SystemClock,
    device::DeviceIdentity,
    mirror::LocalMirror,
    registry::resolve_until_registered,
    scheduler::Scheduler,
    sensor::{IioSensors, Sensors},
    store::{MemoryStore, RemoteStore, RestConfig, RestStore},
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// Overriden by RUST_LOG
const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn";

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(fmt::format().compact().with_target(false)),
        )
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    initialize_tracing();

    let result = tokio::select! {
        result = run() => result,
        result = signal::ctrl_c() => result.context("failed to listen for shutdown signal"),
    };

    if let Err(e) = result {
        error!("{e:#}");
        return ExitCode::from(1);
    }

    info!("shutting down");
    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let args = Args::parse();

    let identity = DeviceIdentity {
        name: args.device_name.clone(),
        mac: args.device_mac.to_string(),
        owner_id: args.owner_id.clone(),
    };
    let sensors = IioSensors::new(args.barometer.clone(), args.hygrometer.clone());
    if !sensors.barometer_present().await {
        warn!(
            path = %args.barometer.display(),
            "could not find a barometer, check wiring"
        );
    }
    let scheduler = Scheduler::new(sensors, SystemClock)
        .with_idle_backoff(Duration::from_millis(args.idle_backoff));

    match args.database_url.clone() {
        Some(database_url) => {
            let store = RestStore::new(RestConfig {
                database_url,
                auth: args.database_auth.clone(),
                timeout: Duration::from_millis(args.request_timeout),
            })
            .context("failed to create datastore client")?;
            operate(&store, &identity, scheduler, &args).await;
        }
        None => {
            warn!("no database URL provided, running against an in-memory store");
            operate(&MemoryStore::new(), &identity, scheduler, &args).await;
        }
    }

    Ok(())
}

async fn operate<S, N>(
    store: &S,
    identity: &DeviceIdentity,
    mut scheduler: Scheduler<N, SystemClock>,
    args: &Args,
) where
    S: RemoteStore,
    N: Sensors,
{
    let mut mirror = LocalMirror::new(Duration::from_millis(args.interval));
    let retry = Duration::from_millis(args.registration_retry);

    let device_uid = resolve_until_registered(store, identity, &mut mirror, retry).await;
    info!(%device_uid, is_measuring = mirror.is_measuring, "device resolved");

    scheduler.run(store, &mut mirror).await;
}
