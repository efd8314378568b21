//! Cluster-bootstrap coordination for a key-value store client.
//!
//! A client must obtain a cluster configuration before it can route any
//! operation, keep that configuration fresh as the cluster changes, and
//! notice when its view has gone stale. [`Bootstrap`] orchestrates all three
//! on top of two external collaborators: a [`ConfigMonitor`] that fetches and
//! tracks configuration, and a [`Timer`] supplied by the event loop.
//!
//! ## Event model
//!
//! Execution is single-threaded and callback driven. The coordinator never
//! blocks; the owning loop routes collaborator events back in:
//!
//! - a monitor notification becomes [`Bootstrap::on_config_ready`],
//! - a fired timer becomes [`Bootstrap::on_timer`].
//!
//! Each event carries the token the collaborator handed out when the listener
//! or timer was registered. Tokens that no longer match the coordinator's
//! live subscription or timer are ignored, so a cancelled deadline can never
//! fire into a finished bootstrap.
//!
//! ## Lifecycle
//!
//! [`Bootstrap::initial`] arms a deadline of `config_timeout` and starts the
//! fetch. The first configuration notification applies the topology; the
//! deadline firing first reports [`ErrorCode::TimedOut`] (or the monitor's own
//! error) through [`Instance::report_error`]. [`Bootstrap::refresh`] waits
//! without a deadline and applies the monitor's best configuration on the
//! loop turn after the notification. [`Bootstrap::record_error`] turns a burst
//! of suspicious transport errors into a single refresh.
//!
//! [`ManualReactor`] is a deterministic virtual-time [`Timer`] useful for
//! embedding in tests or simulations.

mod bootstrap;
mod health;
mod instance;
mod monitor;
pub mod reactor;
mod setup;
mod status;
pub mod telemetry;
mod timer;
mod topology;

pub use bootstrap::{
    Bootstrap, BootstrapError, BootstrapState, DEADLINE_MESSAGE, ListenerMode,
};
pub use health::{BootstrapReporter, StructuredBootstrapReporter};
pub use instance::Instance;
pub use kvboot_config::Settings;
pub use monitor::{ConfigMonitor, ListenerId, SubscribeError};
pub use reactor::{ManualReactor, ReactorStats};
pub use setup::{
    ClientEnvironment, SettingsLoader, SetupError, StaticSettingsLoader, SystemSettingsLoader,
    prepare_with,
};
pub use status::{ErrorCode, ErrorCodeParseError};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use timer::{Timer, TimerError, TimerId};
pub use topology::{ClusterConfig, ConfigHandle, ConfigSource};

#[cfg(test)]
mod tests;
