//! Prompt dispatch to one or many instances.
//!
//! A batch fans out one task per distinct instance name and waits for all of
//! them. Per-instance failures, including unknown names, model panics and a
//! worker that cannot be joined, are returned as data in [`BatchResults`]
//! under the name they concern.

use crate::inference::{Message, Role};
use crate::manager::context::ContextPolicy;
use crate::manager::error::ManagerError;
use crate::manager::ModelManager;
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info_span, warn, Instrument};

/// How a single dispatch treats the instance's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// What to persist on success.
    pub policy: ContextPolicy,
    /// Role of the outgoing prompt.
    pub role: Role,
}

impl DispatchOptions {
    /// Options with the given flags and a user prompt.
    #[must_use]
    pub const fn new(save_context: bool, append_prompt: bool) -> Self {
        Self {
            policy: ContextPolicy::new(save_context, append_prompt),
            role: Role::User,
        }
    }

    /// Persist both prompt and response.
    #[must_use]
    pub const fn conversation() -> Self {
        Self {
            policy: ContextPolicy::CONVERSATION,
            role: Role::User,
        }
    }

    /// Sends the prompt with a different role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Outcome of a batch dispatch: exactly one entry per distinct requested name.
#[derive(Debug, Default)]
pub struct BatchResults {
    outcomes: BTreeMap<String, Result<String, ManagerError>>,
}

impl BatchResults {
    /// Outcome for one instance.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Result<String, ManagerError>> {
        self.outcomes.get(name)
    }

    /// Successful response for one instance.
    #[must_use]
    pub fn response(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|outcome| outcome.as_ref().ok())
            .map(String::as_str)
    }

    /// Error for one instance.
    #[must_use]
    pub fn error(&self, name: &str) -> Option<&ManagerError> {
        self.get(name).and_then(|outcome| outcome.as_ref().err())
    }

    /// Successful responses in name order.
    pub fn successes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| Some((name.as_str(), outcome.as_ref().ok()?.as_str())))
    }

    /// Failures in name order.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ManagerError)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| Some((name.as_str(), outcome.as_ref().err()?)))
    }

    /// Returns true if every target succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(Result::is_ok)
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns true if the batch had no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Target names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.outcomes.keys().map(String::as_str)
    }

    /// Unwraps the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Result<String, ManagerError>> {
        self.outcomes
    }
}

impl IntoIterator for BatchResults {
    type Item = (String, Result<String, ManagerError>);
    type IntoIter = btree_map::IntoIter<String, Result<String, ManagerError>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl ModelManager {
    /// Sends a user prompt to one instance.
    ///
    /// `append_prompt` persists the prompt and `save_context` the response;
    /// both are committed only if the model succeeds.
    ///
    /// # Errors
    ///
    /// [`ManagerError::UnknownInstance`] if `name` is not bound (no state is
    /// touched), or [`ManagerError::Generation`] if the model fails.
    pub async fn use_model(
        &self,
        name: &str,
        prompt: impl Into<String>,
        save_context: bool,
        append_prompt: bool,
    ) -> Result<String, ManagerError> {
        self.dispatch(name, prompt, DispatchOptions::new(save_context, append_prompt))
            .await
    }

    /// Sends a prompt to one instance with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`ModelManager::use_model`].
    pub async fn dispatch(
        &self,
        name: &str,
        prompt: impl Into<String>,
        options: DispatchOptions,
    ) -> Result<String, ManagerError> {
        let instance = self.inner.instances.get(name)?;
        let prompt = Message::new(options.role, prompt);
        let span = info_span!(
            "instance_dispatch",
            instance = %name,
            save_context = options.policy.save_context,
            append_prompt = options.policy.append_prompt,
        );

        async move {
            let started = Instant::now();
            let outcome = instance
                .run_turn(prompt, options.policy, self.inner.settings.generation_timeout())
                .await;
            let elapsed = started.elapsed();
            metrics::histogram!("chorus_generation_seconds").record(elapsed.as_secs_f64());

            match outcome {
                Ok(response) => {
                    metrics::counter!("chorus_generations_total", "outcome" => "success")
                        .increment(1);
                    debug!(elapsed_ms = elapsed.as_millis(), "Generation succeeded");
                    Ok(response)
                }
                Err(cause) => {
                    metrics::counter!("chorus_generations_total", "outcome" => "failure")
                        .increment(1);
                    warn!(elapsed_ms = elapsed.as_millis(), error = %cause, "Generation failed");
                    Err(ManagerError::Generation {
                        instance: name.to_string(),
                        cause,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Sends the same user prompt to several instances concurrently.
    ///
    /// # Errors
    ///
    /// Only [`ManagerError::Dispatch`], if a finished worker cannot be matched
    /// to the name it ran for.
    /// Per-instance errors are inside the returned [`BatchResults`].
    pub async fn use_multiple_models<I, S>(
        &self,
        names: I,
        prompt: impl Into<String>,
        save_context: bool,
        append_prompt: bool,
    ) -> Result<BatchResults, ManagerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch_many(
            names,
            prompt,
            DispatchOptions::new(save_context, append_prompt),
        )
        .await
    }

    /// Sends the same prompt to several instances concurrently.
    ///
    /// Duplicate names are dispatched once. Every worker is awaited; a slow or
    /// failing instance never holds back or cancels another. Dropping the
    /// returned future aborts the workers that have not finished, and those
    /// commit nothing.
    ///
    /// # Errors
    ///
    /// Same as [`ModelManager::use_multiple_models`].
    pub async fn dispatch_many<I, S>(
        &self,
        names: I,
        prompt: impl Into<String>,
        options: DispatchOptions,
    ) -> Result<BatchResults, ManagerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = dedup_preserving_order(names);
        let prompt: String = prompt.into();
        let batch_id = uuid::Uuid::new_v4();
        let span = info_span!("batch_dispatch", %batch_id, targets = targets.len());
        metrics::histogram!("chorus_batch_targets").record(targets.len() as f64);

        async move {
            let mut workers = JoinSet::new();
            let mut pending = HashMap::with_capacity(targets.len());
            for name in targets {
                let manager = self.clone();
                let prompt = prompt.clone();
                let target = name.clone();
                let handle = workers.spawn(
                    async move { manager.dispatch(&target, prompt, options).await }
                        .in_current_span(),
                );
                pending.insert(handle.id(), name);
            }

            let mut results = BatchResults::default();
            while let Some(joined) = workers.join_next_with_id().await {
                let (id, outcome) = match joined {
                    Ok((id, outcome)) => (id, outcome),
                    Err(err) => {
                        warn!(error = %err, "Batch worker failed");
                        (err.id(), Err(ManagerError::Dispatch(err.to_string())))
                    }
                };
                let name = pending.remove(&id).ok_or_else(|| {
                    ManagerError::Dispatch(format!("worker {id} has no dispatch target"))
                })?;
                results.outcomes.insert(name, outcome);
            }

            debug!(
                succeeded = results.successes().count(),
                failed = results.failures().count(),
                "Batch complete"
            );
            Ok(results)
        }
        .instrument(span)
        .await
    }
}

fn dedup_preserving_order<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(Into::into)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
