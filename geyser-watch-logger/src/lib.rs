//! Logging setup shared by the geyser-watch binaries.
mod logging;

pub use logging::{init, LogConfig, LogFormat, LogOutput};
