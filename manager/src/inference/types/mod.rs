//! Type definitions shared by every model implementation.

pub mod error;
pub mod message;

pub use error::InferenceError;
pub use message::{Message, Role};
