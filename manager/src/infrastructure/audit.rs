use serde::Serialize;
use tracing::{info, info_span};

/// Lifecycle event for audit logging.
/// Structured for JSON serialization to enable machine-readable audit trails.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A model type was added to the registry.
    ModelTypeRegistered {
        /// Registered type identifier.
        model_type: String,
    },
    /// A model type was removed from the registry.
    ModelTypeUnregistered {
        /// Removed type identifier.
        model_type: String,
    },
    /// An instance was created under a new name.
    InstanceCreated {
        /// Instance name.
        instance: String,
        /// Type it was built from.
        model_type: String,
    },
    /// An existing name was rebound to a new instance.
    InstanceReplaced {
        /// Instance name.
        instance: String,
        /// Type of the new instance.
        model_type: String,
    },
    /// An instance and its history were discarded.
    InstanceRemoved {
        /// Instance name.
        instance: String,
    },
    /// All instances were discarded.
    ManagerReset {
        /// Number of instances removed.
        removed: usize,
    },
    /// One instance's history was emptied.
    HistoryCleared {
        /// Instance name.
        instance: String,
        /// Number of messages dropped.
        messages: usize,
    },
}

/// Logs an audit event to the dedicated audit channel as structured JSON.
/// This uses a specific `target` which can be filtered by the subscriber to redirect to a secure file.
pub fn log_audit(event: &AuditEvent) {
    let span = info_span!(target: "audit", "audit_event");
    let _enter = span.enter();

    let json = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
    info!(target: "audit", audit_json = %json, "Lifecycle Audit Event");
}
