/// Model configuration bundle and its errors.
pub mod config;
/// Model type identity and construction.
pub mod factory;
/// The model capability contract.
pub mod provider;
/// Messages and generation errors.
pub mod types;

pub use config::{ConfigError, ModelConfig};
pub use factory::{FnFactory, ModelFactory, ModelType, ModelTypeId, TypedFactory};
pub use provider::LanguageModel;
pub use types::*;
