//! Live model instances.
//!
//! An [`Instance`] binds a name to a model type, its configuration, the model
//! object built from it, and the conversation history. Calls against one
//! instance are serialized by its turn lock, which is held from reading the
//! history to committing the result. Calls against different instances never
//! contend.

use crate::inference::{InferenceError, LanguageModel, Message, ModelConfig, ModelTypeId};
use crate::manager::context::{ContextPolicy, Conversation, Turn};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::Mutex;

/// A named, configured, live model binding.
pub(crate) struct Instance {
    name: String,
    model_type: ModelTypeId,
    config: ModelConfig,
    model: Box<dyn LanguageModel>,
    conversation: Conversation,
    turn: Mutex<()>,
}

/// Read-only view of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceInfo {
    /// Unique instance name.
    pub name: String,
    /// Type the instance was built from.
    pub model_type: ModelTypeId,
    /// Configuration bound at creation.
    pub config: ModelConfig,
    /// Number of messages in the history.
    pub history_len: usize,
}

impl Instance {
    pub(crate) fn new(
        name: String,
        model_type: ModelTypeId,
        config: ModelConfig,
        model: Box<dyn LanguageModel>,
    ) -> Self {
        Self {
            name,
            model_type,
            config,
            model,
            conversation: Conversation::new(),
            turn: Mutex::new(()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn info(&self) -> InstanceInfo {
        InstanceInfo {
            name: self.name.clone(),
            model_type: self.model_type.clone(),
            config: self.config.clone(),
            history_len: self.conversation.len(),
        }
    }

    /// Snapshot of the history. Does not wait for an in-flight turn.
    pub(crate) fn history(&self) -> Vec<Message> {
        self.conversation.snapshot()
    }

    /// Sends `prompt` on top of the current history and commits what
    /// `policy` asks for once the model has answered.
    ///
    /// Nothing is committed if the model fails, panics, exceeds `deadline`,
    /// or the returned future is dropped before completion.
    pub(crate) async fn run_turn(
        &self,
        prompt: Message,
        policy: ContextPolicy,
        deadline: Option<Duration>,
    ) -> Result<String, InferenceError> {
        let _turn = self.turn.lock().await;

        let outgoing = self.conversation.outgoing(&prompt);
        // Built inside the guarded future so a panic while creating the
        // model's future is caught too.
        let generation =
            AssertUnwindSafe(async { self.model.generate(&outgoing).await }).catch_unwind();

        let outcome = match deadline {
            Some(limit) => tokio::time::timeout(limit, generation)
                .await
                .map_err(|_| InferenceError::Timeout(limit))?,
            None => generation.await,
        };
        let response =
            outcome.map_err(|panic| InferenceError::Panicked(panic_message(panic.as_ref())))??;

        self.conversation
            .commit(Turn::staged(policy, prompt, &response));
        Ok(response)
    }

    /// Empties the history once any in-flight turn has committed.
    pub(crate) async fn clear_history(&self) -> usize {
        let _turn = self.turn.lock().await;
        self.conversation.clear()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
