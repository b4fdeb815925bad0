use tracing::{debug, info, instrument, warn};

use crate::device::device_path;
use crate::mirror::{Layout, LocalMirror, decode};
use crate::store::RemoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The document was decoded into the mirror.
    Updated,

    /// The device path holds no data.
    Absent,

    /// The document was not an object.
    Ignored,

    /// The fetch failed; the mirror keeps its last known values.
    Failed,
}

/// Refreshes the mirror from the device's own record.
#[instrument(skip_all, fields(device = %mirror.device_uid))]
pub async fn sync<S>(store: &S, mirror: &mut LocalMirror) -> SyncOutcome
where
    S: RemoteStore + ?Sized,
{
    let document = match store.get(&device_path(&mirror.device_uid)).await {
        Ok(Some(document)) => document,
        Ok(None) => {
            debug!("device record is absent");
            return SyncOutcome::Absent;
        }
        Err(err) => {
            warn!("failed to fetch device record: {err}");
            return SyncOutcome::Failed;
        }
    };

    let Some(update) = decode(&document, Layout::Record) else {
        debug!("device record is not an object");
        return SyncOutcome::Ignored;
    };

    let previous = mirror.clone();
    mirror.apply(update);
    if *mirror != previous {
        info!(
            is_measuring = mirror.is_measuring,
            interval_ms = mirror.interval.as_millis() as u64,
            session = %mirror.last_session_uid,
            "device configuration changed"
        );
    }

    SyncOutcome::Updated
}
