/// Audit logging for lifecycle events.
pub mod audit;
/// Configuration management.
pub mod config;
/// Tracing subscriber setup.
pub mod telemetry;
