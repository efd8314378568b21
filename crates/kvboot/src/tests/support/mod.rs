//! Test harness utilities for the bootstrap coordinator suites.

mod instance;
mod monitor;
mod reporter;
mod world;

pub use instance::TestInstance;
pub use monitor::{Journal, MonitorCalls, RecordingMonitor};
pub use reporter::{BootstrapEvent, RecordingBootstrapReporter};
pub use world::{TestWorld, world};
