pub mod clock;
pub mod device;
pub mod measurement;
pub mod mirror;
pub mod registry;
pub mod scheduler;
pub mod sensor;
pub mod store;
pub mod sync;
