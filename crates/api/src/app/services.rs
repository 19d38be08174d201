use std::sync::Arc;

use anyhow::Context;

use hubledger_auth::RolePolicy;
use hubledger_infra::config::{LedgerConfig, StorageBackend};
use hubledger_infra::{AdjustmentEngine, InMemoryStore, SharedStore, store};

/// Engine over a backend chosen at runtime.
pub type SharedEngine = AdjustmentEngine<SharedStore>;

/// Wire the store, the role policy and the engine from configuration.
pub async fn build_services(config: &LedgerConfig) -> anyhow::Result<Arc<SharedEngine>> {
    config.validate().context("invalid ledger configuration")?;

    let store = store::open(&config.storage)
        .await
        .with_context(|| format!("failed to open {:?} store", config.storage.backend))?;

    if config.storage.backend == StorageBackend::Memory {
        tracing::warn!("in-memory store selected, data is lost on restart");
    }

    Ok(Arc::new(engine_over(store, config)))
}

/// In-memory wiring (dev/test) with the default role policy.
pub fn build_in_memory_services() -> Arc<SharedEngine> {
    let store: SharedStore = Arc::new(InMemoryStore::new());
    Arc::new(engine_over(store, &LedgerConfig::default()))
}

fn engine_over(store: SharedStore, config: &LedgerConfig) -> SharedEngine {
    AdjustmentEngine::new(store)
        .with_policy(Arc::new(RolePolicy::default()))
        .with_config(&config.engine)
}
