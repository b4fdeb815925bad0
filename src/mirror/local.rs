use std::time::Duration;

use crate::device::DeviceUid;
use crate::mirror::MirrorUpdate;

/// Local copy of the remotely configured device fields.
///
/// Owned by the control loop and refreshed once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalMirror {
    pub device_uid: DeviceUid,

    pub last_session_uid: String,

    pub is_measuring: bool,

    pub interval: Duration,
}

impl LocalMirror {
    pub fn new(default_interval: Duration) -> Self {
        Self {
            device_uid: DeviceUid::new(),
            last_session_uid: String::new(),
            is_measuring: false,
            interval: default_interval,
        }
    }

    /// Overwrites every field present in `update`; absent fields keep their
    /// last known value.
    pub fn apply(&mut self, update: MirrorUpdate) {
        if let Some(device_uid) = update.device_uid {
            self.device_uid = device_uid;
        }
        if let Some(last_session_uid) = update.last_session_uid {
            self.last_session_uid = last_session_uid;
        }
        if let Some(is_measuring) = update.is_measuring {
            self.is_measuring = is_measuring;
        }
        if let Some(interval) = update.interval {
            self.interval = interval;
        }
    }
}
