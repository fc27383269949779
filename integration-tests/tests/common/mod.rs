//! Shared test utilities for integration tests.
//!
//! Provides mock language models and a helper that builds a manager with a
//! set of named instances already registered.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chorus_manager::inference::{
    FnFactory, InferenceError, LanguageModel, Message, ModelConfig, ModelTypeId,
};
use chorus_manager::manager::ModelManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Type id of [`EchoModel`].
pub const ECHO: ModelTypeId = ModelTypeId::from_static("echo");
/// Type id of [`FailingModel`].
pub const FAILING: ModelTypeId = ModelTypeId::from_static("failing");
/// Type id of [`SlowModel`].
pub const SLOW: ModelTypeId = ModelTypeId::from_static("slow");

/// Replies `<prefix><prompt>`, where `prefix` comes from the config.
pub struct EchoModel {
    prefix: String,
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
        let prompt = messages.last().map(Message::content).unwrap_or_default();
        Ok(format!("{}{prompt}", self.prefix))
    }
}

/// Always fails with a network error.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    async fn generate(&self, _messages: &[Message]) -> Result<String, InferenceError> {
        Err(InferenceError::NetworkError("connection reset".to_string()))
    }
}

/// Sleeps for `delay_ms` then replies with the number of messages it saw.
pub struct SlowModel {
    delay: Duration,
}

#[async_trait]
impl LanguageModel for SlowModel {
    async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
        tokio::time::sleep(self.delay).await;
        Ok(messages.len().to_string())
    }
}

/// Blocks every call until released, tracking how many calls are inside.
#[derive(Clone, Default)]
pub struct Gate {
    release: Arc<Notify>,
    entered: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Gate {
    /// Lets one waiting call through.
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    /// Calls that have reached the model so far.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed inside the model at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Yields until `count` calls have reached the model.
    pub async fn wait_for_entered(&self, count: usize) {
        while self.entered() < count {
            tokio::task::yield_now().await;
        }
    }
}

/// Model that waits on a [`Gate`] before echoing the transcript length.
pub struct GatedModel {
    gate: Gate,
}

#[async_trait]
impl LanguageModel for GatedModel {
    async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
        let gate = &self.gate;
        gate.entered.fetch_add(1, Ordering::SeqCst);
        let now = gate.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        gate.peak.fetch_max(now, Ordering::SeqCst);

        gate.release.notified().await;

        gate.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(messages.len().to_string())
    }
}

/// Builds a manager with the mock types registered.
pub fn manager() -> Result<ModelManager> {
    let manager = ModelManager::new();
    register_mocks(&manager)?;
    Ok(manager)
}

/// Registers the echo, failing and slow types.
pub fn register_mocks(manager: &ModelManager) -> Result<()> {
    manager.register_factory(FnFactory::new(ECHO, |config: &ModelConfig| {
        Ok(EchoModel {
            prefix: config.get_str("prefix").unwrap_or_default().to_string(),
        })
    }))?;
    manager.register_factory(FnFactory::new(FAILING, |_: &ModelConfig| Ok(FailingModel)))?;
    manager.register_factory(FnFactory::new(SLOW, |config: &ModelConfig| {
        Ok(SlowModel {
            delay: Duration::from_millis(config.get_u64("delay_ms").unwrap_or(0)),
        })
    }))?;
    Ok(())
}

/// Registers a gated type under `id` whose instances all share `gate`.
pub fn register_gated(manager: &ModelManager, id: &'static str, gate: &Gate) -> Result<()> {
    let gate = gate.clone();
    manager.register_factory(FnFactory::new(id, move |_: &ModelConfig| {
        Ok(GatedModel { gate: gate.clone() })
    }))?;
    Ok(())
}

/// Echo instance config with the given prefix.
pub fn echo(prefix: &str) -> ModelConfig {
    ModelConfig::new().with("prefix", prefix)
}

/// Slow instance config.
pub fn slow(delay_ms: u64) -> ModelConfig {
    ModelConfig::new().with("delay_ms", delay_ms)
}
