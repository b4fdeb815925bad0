use std::time::Duration;

use serde_json::json;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::device::{DEVICES_PATH, DeviceIdentity, DeviceRecord, DeviceUid};
use crate::mirror::{Layout, LocalMirror, decode};
use crate::store::{QueryFilter, RemoteStore, StoreError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to retrieve device record: {0}")]
    Retrieval(#[from] StoreError),

    #[error("device record {key} was created but could not be read back")]
    Vanished { key: String },

    #[error("device lookup returned no device record")]
    Malformed,
}

fn lookup_filter(identity: &DeviceIdentity) -> QueryFilter {
    QueryFilter::new()
        .order_by("mac")
        .equal_to(identity.mac.as_str())
        .limit_to_first(1)
}

/// Finds the device record for `identity`, creating it on first boot, and
/// seeds `mirror` from the record.
///
/// At most one record is created per call: after a create the record is
/// looked up exactly once more. Two nodes booting with the same MAC before
/// either registration lands can still both create a record.
#[instrument(skip_all, fields(mac = %identity.mac))]
pub async fn resolve<S>(
    store: &S,
    identity: &DeviceIdentity,
    mirror: &mut LocalMirror,
) -> Result<DeviceUid, RegistryError>
where
    S: RemoteStore + ?Sized,
{
    let filter = lookup_filter(identity);

    if let Some(document) = store.query(DEVICES_PATH, &filter).await? {
        return seed(mirror, &document);
    }

    info!("no device record found, registering");
    let record = DeviceRecord::new(identity);
    let key = store.push(DEVICES_PATH, &json!(record)).await?;
    info!(%key, "device registered");

    let Some(document) = store.query(DEVICES_PATH, &filter).await? else {
        return Err(RegistryError::Vanished { key });
    };
    let uid = seed(mirror, &document)?;
    if uid != key {
        warn!(%key, %uid, "another record with this MAC address was found first");
    }

    Ok(uid)
}

/// Runs [`resolve`] until it succeeds, waiting `retry` after each failure.
pub async fn resolve_until_registered<S>(
    store: &S,
    identity: &DeviceIdentity,
    mirror: &mut LocalMirror,
    retry: Duration,
) -> DeviceUid
where
    S: RemoteStore + ?Sized,
{
    loop {
        match resolve(store, identity, mirror).await {
            Ok(device_uid) => return device_uid,
            Err(err) => {
                warn!("device registration failed: {err}, retrying in {retry:?}");
                sleep(retry).await;
            }
        }
    }
}

fn seed(mirror: &mut LocalMirror, document: &serde_json::Value) -> Result<DeviceUid, RegistryError> {
    let update = decode(document, Layout::Lookup).ok_or(RegistryError::Malformed)?;
    let uid = update.device_uid.clone().ok_or(RegistryError::Malformed)?;

    mirror.apply(update);
    Ok(uid)
}
