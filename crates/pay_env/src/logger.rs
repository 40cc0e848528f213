//!
//! Logger of the system.
//!

pub use tracing::{debug, error, event as log, info, warn, Level};

pub mod config;
mod setup;

pub use config::{Log, LogConsole, LogFile, LogFormat};
pub use setup::{setup, LoggerError, TelemetryGuard};
