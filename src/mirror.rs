mod decode;
mod local;

pub use decode::*;
pub use local::*;
