use serde::Serialize;

/// Collection holding one record per physical device.
pub const DEVICES_PATH: &str = "devices";

/// Key assigned to a device record by the datastore.
pub type DeviceUid = String;

/// Hardware identity the node registers itself with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: String,

    pub mac: String,

    pub owner_id: String,
}

/// Device document created under [`DEVICES_PATH`] on first boot.
///
/// An operator console later flips `isMeasuring` and adds `lastSessionUid`
/// and `interval`; those are read back through the mirror decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub name: String,

    pub mac: String,

    pub owner_id: String,

    pub is_measuring: bool,
}

impl DeviceRecord {
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self {
            name: identity.name.clone(),
            mac: identity.mac.clone(),
            owner_id: identity.owner_id.clone(),
            is_measuring: false,
        }
    }
}

pub fn device_path(uid: &str) -> String {
    format!("{DEVICES_PATH}/{uid}")
}
