use crate::infrastructure::config::{LogFormat, TelemetrySettings};
use anyhow::{Context, Result};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Builder for the process-wide tracing subscriber.
pub struct TelemetryBuilder {
    service_name: String,
    log_level: String,
    format: LogFormat,
    span_events: bool,
}

impl TelemetryBuilder {
    /// Starts a builder with `info` level JSON output.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
        }
    }

    /// Starts a builder from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &TelemetrySettings) -> Self {
        Self::new(settings.service_name.clone())
            .with_log_level(settings.log_level.clone())
            .with_format(settings.format)
    }

    /// Fallback filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Also log span close events, which carry span timings.
    #[must_use]
    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    /// Installs the subscriber as the global default.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter directive is invalid or a global
    /// subscriber is already installed.
    pub fn init(self) -> Result<()> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.log_level)
                .with_context(|| format!("Invalid log level '{}'", self.log_level))?,
        };

        let span_events = if self.span_events {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let fmt_layer = match self.format {
            LogFormat::Json => fmt::layer().json().with_span_events(span_events).boxed(),
            LogFormat::Pretty => fmt::layer().pretty().with_span_events(span_events).boxed(),
            LogFormat::Compact => fmt::layer().compact().with_span_events(span_events).boxed(),
        };

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to init subscriber")?;

        tracing::info!(service = %self.service_name, "Telemetry initialized");
        Ok(())
    }
}
