//! Instance double capturing every hook invocation.

use kvboot_config::Settings;

use crate::instance::Instance;
use crate::status::ErrorCode;
use crate::topology::ConfigHandle;

/// Client instance that records topology updates and reported errors.
#[derive(Debug, Default)]
pub struct TestInstance {
    pub settings: Settings,
    pub last_error: Option<ErrorCode>,
    pub applied: Vec<ConfigHandle>,
    pub reported: Vec<(ErrorCode, String)>,
    pub stop_checks: usize,
}

impl TestInstance {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Revisions applied so far, in order.
    #[must_use]
    pub fn applied_revisions(&self) -> Vec<u64> {
        self.applied.iter().map(|config| config.revision()).collect()
    }
}

impl Instance for TestInstance {
    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn set_last_error(&mut self, error: ErrorCode) {
        self.last_error = Some(error);
    }

    fn apply_topology(&mut self, config: &ConfigHandle) {
        self.applied.push(config.clone());
    }

    fn report_error(&mut self, error: ErrorCode, message: &str) {
        self.reported.push((error, message.to_owned()));
    }

    fn maybe_stop_loop(&mut self) {
        self.stop_checks += 1;
    }
}
