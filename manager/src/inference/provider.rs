use crate::inference::types::{InferenceError, Message};
use async_trait::async_trait;

/// The capability every pluggable model implementation provides.
///
/// The manager depends only on this trait. Implementations own their
/// transport, credentials and any backend-specific state.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produces a response for an ordered conversation, oldest message first.
    async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError>;
}
