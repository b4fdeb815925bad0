use std::path::PathBuf;

use clap::Parser;
use macaddr::MacAddr6;

#[derive(Debug, Parser)]
pub struct Args {
    /// Realtime database host. Without it the node runs against an
    /// in-memory store.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    #[arg(long, env = "DATABASE_AUTH", hide_env_values = true)]
    pub database_auth: Option<String>,

    #[arg(long, env = "DEVICE_NAME")]
    pub device_name: String,

    #[arg(long, env = "DEVICE_MAC_ADDRESS")]
    pub device_mac: MacAddr6,

    #[arg(long, env = "DEVICE_OWNER_ID")]
    pub owner_id: String,

    /// IIO device directory of the barometer
    #[arg(long, env = "BAROMETER_PATH")]
    pub barometer: PathBuf,

    /// IIO device directory of the hygrometer
    #[arg(long, env = "HYGROMETER_PATH")]
    pub hygrometer: Option<PathBuf>,

    /// Measurement interval in ms until the device record sets one
    #[arg(long, default_value_t = 60_000)]
    pub interval: u64,

    /// Wait between ticks while not measuring, in ms
    #[arg(long, default_value_t = 5_000)]
    pub idle_backoff: u64,

    /// Datastore request timeout in ms
    #[arg(long, default_value_t = 10_000)]
    pub request_timeout: u64,

    /// Wait between registration attempts, in ms
    #[arg(long, default_value_t = 10_000)]
    pub registration_retry: u64,
}
