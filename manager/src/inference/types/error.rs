//! Error types for model generation.
//!
//! Every [`LanguageModel`](crate::inference::LanguageModel) implementation
//! reports failures through [`InferenceError`]; the manager wraps it with the
//! originating instance name.

use std::time::Duration;

/// Errors a model can raise while generating a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    /// Error from the model backend
    #[error("Provider Error: {0}")]
    ProviderError(String),
    /// Rate limit exceeded
    #[error("Rate Limit Exceeded")]
    RateLimit,
    /// Context length exceeded the model's limit
    #[error("Context Length Exceeded")]
    ContextLengthExceeded,
    /// Network error during request
    #[error("Network Error: {0}")]
    NetworkError(String),
    /// The generation did not finish within the configured deadline
    #[error("Generation Timed Out after {0:?}")]
    Timeout(Duration),
    /// The model implementation panicked
    #[error("Model Panicked: {0}")]
    Panicked(String),
}

impl InferenceError {
    /// Returns `true` if this error is transient and retry may succeed.
    ///
    /// The manager never retries on its own; this is advisory for callers.
    /// Backend errors are opaque here, so [`InferenceError::ProviderError`]
    /// counts as permanent; models that know better report
    /// [`InferenceError::NetworkError`] or [`InferenceError::RateLimit`].
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit | Self::NetworkError(_) | Self::Timeout(_) => true,
            Self::ProviderError(_) | Self::ContextLengthExceeded | Self::Panicked(_) => false,
        }
    }

    /// Returns `true` if this error is permanent and should not be retried.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }
}
