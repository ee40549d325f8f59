//! vscore demo entrypoint: scores a synthetic index with every strategy.

use std::sync::Arc;
use std::time::Instant;

use mimalloc::MiMalloc;
use serde::Serialize;

use vscore::config::Config;
use vscore::index::MemoryIndex;
use vscore::query::VectorQuery;
use vscore::scoring::{ScorerFactory, ScoringStrategy};
use vscore::search::{ScoredDoc, top_k};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEMO_DOCS: usize = 20_000;
const DEMO_SEED: u64 = 0x5eed_cafe;

#[derive(Serialize)]
struct StrategyRun {
    strategy: ScoringStrategy,
    elapsed_ms: f64,
    hits: Vec<ScoredDoc>,
}

/// Deterministic component in `[-1, 1)`.
fn component(seed: u64, doc: u64, i: usize) -> f32 {
    let mut x = seed ^ doc.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (i as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^= x >> 31;
    ((x >> 40) as f32 / (1u64 << 23) as f32) - 1.0
}

fn synthetic_vector(seed: u64, doc: u64, dim: usize) -> Vec<f32> {
    (0..dim).map(|i| component(seed, doc, i)).collect()
}

fn build_index(config: &Config) -> MemoryIndex {
    let mut builder = MemoryIndex::builder(config.field.clone());
    for doc in 0..DEMO_DOCS as u64 {
        builder.add_vector(&synthetic_vector(DEMO_SEED, doc, config.vector_dim), doc % 2 == 0);
    }
    builder.build()
}

fn factory_for(config: &Config, strategy: ScoringStrategy) -> anyhow::Result<ScorerFactory> {
    let config = Config {
        strategy,
        ..config.clone()
    };
    Ok(config.build_factory()?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        strategy = %config.strategy,
        field = %config.field,
        dim = config.vector_dim,
        top_k = config.top_k,
        "vscore demo starting"
    );

    let index = build_index(&config);
    tracing::info!(
        docs = index.max_doc(),
        segments = index.segments().len(),
        "synthetic index built"
    );

    let query_vector = synthetic_vector(DEMO_SEED, 42, config.vector_dim);

    let mut strategies = vec![config.strategy];
    strategies.extend(
        ScoringStrategy::ALL
            .into_iter()
            .filter(|s| *s != config.strategy),
    );

    let mut runs = Vec::with_capacity(strategies.len());
    for strategy in strategies {
        let factory = Arc::new(factory_for(&config, strategy)?);
        let query = VectorQuery::new(config.field.clone(), query_vector.clone(), Arc::clone(&factory))?;

        let started = Instant::now();
        let hits = top_k(&query, index.segments(), config.top_k)?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let report = query.close();
        if !report.is_clean() {
            tracing::warn!(strategy = %strategy, failures = report.failures.len(), "query closed with failures");
        }
        if let Err(e) = factory.close() {
            tracing::warn!(strategy = %strategy, error = %e, "failed to close scorer factory");
        }

        tracing::info!(strategy = %strategy, elapsed_ms, hits = hits.len(), "strategy finished");
        runs.push(StrategyRun {
            strategy,
            elapsed_ms,
            hits,
        });
    }

    println!("{}", serde_json::to_string_pretty(&runs)?);
    Ok(())
}
