//! Error types for manager operations.

use crate::inference::{ConfigError, InferenceError, ModelTypeId};

/// Errors returned by [`ModelManager`](crate::manager::ModelManager).
///
/// Registry and store variants are precondition failures of the call that
/// raised them. In batch dispatch, every variant is reported per instance as
/// data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    /// The model type is already registered
    #[error("model type '{0}' is already registered")]
    DuplicateType(ModelTypeId),
    /// The model type is not registered
    #[error("model type '{0}' is not registered")]
    UnknownType(ModelTypeId),
    /// An instance with this name already exists
    #[error("instance '{0}' already exists")]
    DuplicateInstance(String),
    /// No instance with this name exists
    #[error("instance '{0}' not found")]
    UnknownInstance(String),
    /// The model failed while generating a response
    #[error("generation failed for instance '{instance}': {cause}")]
    Generation {
        /// Name of the instance whose model failed.
        instance: String,
        /// The model's own error.
        #[source]
        cause: InferenceError,
    },
    /// The factory rejected the configuration at instantiation time
    #[error("invalid configuration for model type '{model_type}': {cause}")]
    Config {
        /// Type whose factory rejected the configuration.
        model_type: ModelTypeId,
        /// The factory's reason.
        #[source]
        cause: ConfigError,
    },
    /// A batch worker could not be joined
    #[error("dispatch worker failed: {0}")]
    Dispatch(String),
}

impl ManagerError {
    /// Name of the instance this error concerns, if any.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        match self {
            Self::DuplicateInstance(name)
            | Self::UnknownInstance(name)
            | Self::Generation { instance: name, .. } => Some(name),
            _ => None,
        }
    }

    /// The underlying model error for [`ManagerError::Generation`].
    #[must_use]
    pub fn inference_error(&self) -> Option<&InferenceError> {
        match self {
            Self::Generation { cause, .. } => Some(cause),
            _ => None,
        }
    }
}
