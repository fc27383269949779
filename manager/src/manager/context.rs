//! Per-instance conversation context.
//!
//! An instance's history only changes through [`Conversation::commit`], which
//! applies one staged [`Turn`] under a single write lock. The dispatcher stages
//! a turn from the [`ContextPolicy`] only after the model call succeeds, so a
//! failed call leaves no trace and readers never observe half a turn.

use crate::inference::Message;
use parking_lot::RwLock;

/// Controls what a dispatch persists into the instance's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ContextPolicy {
    /// Persist the model's response as an assistant message.
    pub save_context: bool,
    /// Persist the outgoing prompt ahead of the response.
    pub append_prompt: bool,
}

impl ContextPolicy {
    /// Nothing is persisted; the prompt is a one-off turn on top of history.
    pub const STATELESS: Self = Self {
        save_context: false,
        append_prompt: false,
    };

    /// Prompt and response are both persisted.
    pub const CONVERSATION: Self = Self {
        save_context: true,
        append_prompt: true,
    };

    /// Creates a policy from the two flags.
    #[must_use]
    pub const fn new(save_context: bool, append_prompt: bool) -> Self {
        Self {
            save_context,
            append_prompt,
        }
    }

    /// Returns true if a successful call changes the history.
    #[must_use]
    pub const fn persists_anything(self) -> bool {
        self.save_context || self.append_prompt
    }
}

/// Messages to append for one successful call, in order.
#[derive(Debug, Default)]
pub(crate) struct Turn {
    prompt: Option<Message>,
    response: Option<Message>,
}

impl Turn {
    /// Stages what `policy` says to keep from a completed exchange.
    pub(crate) fn staged(policy: ContextPolicy, prompt: Message, response: &str) -> Self {
        Self {
            prompt: policy.append_prompt.then_some(prompt),
            response: policy
                .save_context
                .then(|| Message::assistant(response)),
        }
    }

    fn is_empty(&self) -> bool {
        self.prompt.is_none() && self.response.is_none()
    }
}

/// Ordered message history owned by one instance.
#[derive(Debug, Default)]
pub(crate) struct Conversation {
    messages: RwLock<Vec<Message>>,
}

impl Conversation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of the history.
    pub(crate) fn snapshot(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    /// History followed by `prompt`: the sequence sent to the model.
    pub(crate) fn outgoing(&self, prompt: &Message) -> Vec<Message> {
        let messages = self.messages.read();
        let mut outgoing = Vec::with_capacity(messages.len() + 1);
        outgoing.extend(messages.iter().cloned());
        outgoing.push(prompt.clone());
        outgoing
    }

    /// Appends a staged turn atomically.
    pub(crate) fn commit(&self, turn: Turn) {
        if turn.is_empty() {
            return;
        }
        let mut messages = self.messages.write();
        messages.extend(turn.prompt);
        messages.extend(turn.response);
    }

    /// Drops all messages, returning how many were held.
    pub(crate) fn clear(&self) -> usize {
        let mut messages = self.messages.write();
        let count = messages.len();
        messages.clear();
        count
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.read().len()
    }
}
