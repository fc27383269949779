//! Benchmarks for prompt dispatch
//!
//! Performance-critical paths:
//! - `ModelManager::use_model`: history snapshot, turn lock and commit
//! - `ModelManager::use_multiple_models`: fan-out and result collection
//! - History growth: cost of the outgoing message sequence as context grows

use async_trait::async_trait;
use chorus_manager::inference::{
    ConfigError, InferenceError, LanguageModel, Message, ModelConfig, ModelType,
};
use chorus_manager::manager::ModelManager;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

/// Returns immediately so only manager overhead is measured.
struct Instant;

#[async_trait]
impl LanguageModel for Instant {
    async fn generate(&self, messages: &[Message]) -> Result<String, InferenceError> {
        Ok(messages.len().to_string())
    }
}

impl ModelType for Instant {
    fn from_config(_config: &ModelConfig) -> Result<Self, ConfigError> {
        Ok(Self)
    }
}

fn manager_with(count: usize) -> (ModelManager, Vec<String>) {
    let manager = ModelManager::new();
    manager
        .register_model_type::<Instant>()
        .expect("register");
    let names: Vec<String> = (0..count).map(|i| format!("model-{i}")).collect();
    for name in &names {
        manager
            .instantiate::<Instant>(name.clone(), ModelConfig::new())
            .expect("instantiate");
    }
    (manager, names)
}

fn bench_single_dispatch(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let (manager, _) = manager_with(1);

    c.bench_function("use_model_stateless", |b| {
        b.to_async(&runtime).iter(|| async {
            manager
                .use_model(black_box("model-0"), "ping", false, false)
                .await
                .expect("dispatch")
        });
    });
}

fn bench_history_growth(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("use_model_with_history");

    for turns in [0usize, 16, 256] {
        let (manager, _) = manager_with(1);
        runtime.block_on(async {
            for _ in 0..turns {
                manager
                    .use_model("model-0", "warmup", true, true)
                    .await
                    .expect("warmup");
            }
        });

        group.bench_with_input(BenchmarkId::from_parameter(turns * 2), &turns, |b, _| {
            b.to_async(&runtime).iter(|| async {
                manager
                    .use_model("model-0", black_box("ping"), false, false)
                    .await
                    .expect("dispatch")
            });
        });
    }

    group.finish();
}

fn bench_batch_dispatch(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("use_multiple_models");

    for count in [1usize, 8, 64] {
        let (manager, names) = manager_with(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &names, |b, names| {
            b.to_async(&runtime).iter(|| async {
                manager
                    .use_multiple_models(names.iter().cloned(), "ping", false, false)
                    .await
                    .expect("batch")
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_dispatch,
    bench_history_growth,
    bench_batch_dispatch
);
criterion_main!(benches);
