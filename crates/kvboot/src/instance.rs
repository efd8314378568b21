//! Hooks the owning client instance exposes to the coordinator.

use kvboot_config::Settings;

use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Owning client instance.
///
/// The coordinator borrows the instance for the duration of each call rather
/// than holding a reference, so the instance may own the coordinator.
pub trait Instance {
    /// Resolved client settings.
    fn settings(&self) -> &Settings;

    /// Records the outcome of the latest bootstrap attempt.
    fn set_last_error(&mut self, error: ErrorCode);

    /// Applies a freshly received configuration to the routing state.
    fn apply_topology(&mut self, config: &ConfigHandle);

    /// Surfaces an asynchronous bootstrap failure to the application.
    fn report_error(&mut self, error: ErrorCode, message: &str);

    /// Asks the event loop to stop if no operations remain pending.
    fn maybe_stop_loop(&mut self);
}
