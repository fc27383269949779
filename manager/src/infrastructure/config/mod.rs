//! Configuration management for the model manager.
//!
//! Settings come from built-in defaults, then `CHORUS_`-prefixed environment
//! variables using `__` as the section separator, then explicit overrides.
//!
//! # Example
//!
//! ```
//! use chorus_manager::infrastructure::config::Settings;
//!
//! let settings = Settings::with_overrides(&[("manager.generation_timeout_ms", "250")])
//!     .expect("Failed to load configuration");
//! assert_eq!(settings.manager.generation_timeout_ms, Some(250));
//! ```

pub mod manager;
pub mod telemetry;

pub use manager::ManagerSettings;
pub use telemetry::{LogFormat, TelemetrySettings};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Dispatch settings.
    #[serde(default)]
    pub manager: ManagerSettings,
    /// Logging settings.
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Loads settings from defaults and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be built or deserialized.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_overrides(&[])
    }

    /// Loads settings from defaults and the environment, then applies
    /// `overrides` as dotted `key = value` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if an override key is malformed or a value does not
    /// deserialize into its field.
    pub fn with_overrides(overrides: &[(&str, &str)]) -> Result<Self, ConfigError> {
        let mut builder = Self::base()?;
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        builder.build()?.try_deserialize()
    }

    fn base() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("telemetry.service_name", telemetry::default_service_name())?
            .set_default("telemetry.log_level", telemetry::default_log_level())?
            .add_source(
                Environment::with_prefix("CHORUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ))
    }
}
