//! Settings resolution and telemetry start-up for a client instance.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use kvboot_config::{Settings, SettingsError};

use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting settings loading for testability.
pub trait SettingsLoader: Send + Sync {
    /// Loads the client settings.
    fn load(&self) -> Result<Settings, Arc<OrthoError>>;
}

/// Loader that delegates to [`Settings::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSettingsLoader;

impl SettingsLoader for SystemSettingsLoader {
    fn load(&self) -> Result<Settings, Arc<OrthoError>> {
        Settings::load()
    }
}

/// Loader that returns a fixed set of settings.
#[derive(Debug, Default, Clone)]
pub struct StaticSettingsLoader {
    settings: Settings,
}

impl StaticSettingsLoader {
    /// Wraps already resolved settings.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsLoader for StaticSettingsLoader {
    fn load(&self) -> Result<Settings, Arc<OrthoError>> {
        Ok(self.settings.clone())
    }
}

/// Errors surfaced while preparing the client environment.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Settings failed to load.
    #[error("failed to load settings: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Settings loaded but cannot be used.
    #[error("invalid settings: {source}")]
    Validation {
        /// Validation failure.
        #[source]
        source: SettingsError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Resolved settings together with the telemetry handle.
#[derive(Debug, Clone)]
pub struct ClientEnvironment {
    settings: Settings,
    telemetry: TelemetryHandle,
}

impl ClientEnvironment {
    /// Resolved settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Consumes the environment, returning the settings.
    #[must_use]
    pub fn into_settings(self) -> Settings {
        self.settings
    }
}

/// Loads and validates settings, then installs structured telemetry.
pub fn prepare_with(loader: &dyn SettingsLoader) -> Result<ClientEnvironment, SetupError> {
    let settings = loader
        .load()
        .map_err(|source| SetupError::Configuration { source })?;
    settings
        .validate()
        .map_err(|source| SetupError::Validation { source })?;
    let telemetry =
        telemetry::initialise(&settings).map_err(|source| SetupError::Telemetry { source })?;

    tracing::info!(
        target: "kvboot::setup",
        config_timeout_ms = settings.config_timeout_ms,
        weird_things_threshold = settings.weird_things_threshold(),
        log_format = %settings.log_format(),
        "client settings resolved"
    );

    Ok(ClientEnvironment {
        settings,
        telemetry,
    })
}
