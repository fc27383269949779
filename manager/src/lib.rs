//! Chorus model manager.
//!
//! A runtime registry and dispatch layer for pluggable language-model
//! backends: register model types, create named and independently configured
//! instances of them, send prompts to one or many instances concurrently, and
//! optionally keep a per-instance conversation history.
//!
//! ```
//! use async_trait::async_trait;
//! use chorus_manager::inference::{
//!     ConfigError, InferenceError, LanguageModel, Message, ModelConfig, ModelType,
//! };
//! use chorus_manager::manager::ModelManager;
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl LanguageModel for Shout {
//!     async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
//!         Ok(messages.last().map(|m| m.content().to_uppercase()).unwrap_or_default())
//!     }
//! }
//!
//! impl ModelType for Shout {
//!     fn from_config(_config: &ModelConfig) -> Result<Self, ConfigError> {
//!         Ok(Shout)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ModelManager::new();
//! manager.register_model_type::<Shout>()?;
//! manager.instantiate::<Shout>("loud", ModelConfig::new())?;
//!
//! let reply = manager.use_model("loud", "hello", true, true).await?;
//! assert_eq!(reply, "HELLO");
//! assert_eq!(manager.get_history("loud")?.len(), 2);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Model capability contract and the types it speaks.
pub mod inference;
/// Infrastructure components (config, telemetry, audit).
pub mod infrastructure;
/// Registry, instance lifecycle and dispatch.
pub mod manager;

pub use inference::{
    ConfigError, FnFactory, InferenceError, LanguageModel, Message, ModelConfig, ModelFactory,
    ModelType, ModelTypeId, Role, TypedFactory,
};
pub use manager::{
    BatchResults, ContextPolicy, DispatchOptions, InstanceInfo, ManagerError, ModelManager,
};
