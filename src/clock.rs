use chrono::Utc;

/// Wall-clock source for measurement timestamps.
pub trait Clock: Send {
    fn epoch_seconds(&self) -> i64;
}

/// The system clock, kept in sync by the host's NTP daemon.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}
